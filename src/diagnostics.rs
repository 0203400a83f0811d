//! Advisory reporting: histograms, threading and bandwidth summaries.
//!
//! Nothing here influences a numbering. Values are emitted through
//! `log::info!`; callers gathering per-rank values may feed them to
//! [`Histogram`] themselves.

use std::fmt;

use itertools::{Itertools, MinMaxResult};

use crate::mesh::Mesh;
use crate::numbering::Numbering;
use crate::partitioning::metrics::{self, BandwidthProfile};

/// Number of subdivisions of a histogram over a wide value range.
pub const N_STEPS: usize = 5;

/// Value-range → count histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `(lower, upper, count)`; the last bucket includes its upper bound.
    buckets: Vec<(f64, f64, usize)>,
}

impl Histogram {
    /// Bucket `values` into [`N_STEPS`] subdivisions, fewer when the range
    /// is narrower than [`N_STEPS`], one when all values are equal.
    pub fn new(values: &[f64]) -> Self {
        let (min, max) = match values.iter().copied().minmax() {
            MinMaxResult::NoElements => return Self { buckets: Vec::new() },
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };
        let range = max - min;
        if range <= 0.0 {
            return Self {
                buckets: vec![(min, max, values.len())],
            };
        }
        let n_steps = if range < N_STEPS as f64 {
            range.floor() as usize + 1
        } else {
            N_STEPS
        };
        let step = range / n_steps as f64;
        let mut counts = vec![0usize; n_steps];
        for &v in values {
            let k = (((v - min) / step).floor() as usize).min(n_steps - 1);
            counts[k] += 1;
        }
        let buckets = counts
            .into_iter()
            .enumerate()
            .map(|(k, n)| {
                let lo = min + k as f64 * step;
                let hi = if k + 1 == n_steps { max } else { lo + step };
                (lo, hi, n)
            })
            .collect();
        Self { buckets }
    }

    pub fn from_counts(values: &[usize]) -> Self {
        let v: Vec<f64> = values.iter().map(|&x| x as f64).collect();
        Self::new(&v)
    }

    pub fn buckets(&self) -> &[(f64, f64, usize)] {
        &self.buckets
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.2).sum()
    }
}

impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.buckets.is_empty() {
            return write!(f, "    no value");
        }
        for (k, (lo, hi, n)) in self.buckets.iter().enumerate() {
            if k > 0 {
                writeln!(f)?;
            }
            write!(f, "  {:3} : [ {lo:10.3} ; {hi:10.3} ] = {n:10}", k + 1)?;
        }
        Ok(())
    }
}

/// Bandwidth and profile of the mesh's interior-face matrix.
pub fn bandwidth_profile(mesh: &Mesh) -> BandwidthProfile {
    metrics::bandwidth_profile(mesh.n_cells, mesh.n_cells_with_ghosts, &mesh.i_face_cells)
}

/// Log thread/group counts, imbalance and per-range face counts of a
/// numbering.
pub fn log_threading_info(name: &str, numbering: &Numbering) {
    let imbalance = metrics::numbering_imbalance(numbering);
    log::info!(
        "{name} ({}): {} threads, {} groups, imbalance {imbalance:.3}",
        numbering.kind(),
        numbering.n_threads(),
        numbering.n_groups()
    );
    match numbering {
        Numbering::Threaded(tg) => {
            let sizes: Vec<usize> = (0..tg.n_groups())
                .flat_map(|g| tg.group(g).map(|(_, r)| r.len()))
                .collect();
            log::info!("{name}, faces per (thread, group):\n{}", Histogram::from_counts(&sizes));
        }
        Numbering::Vectorized { block_width, .. } => {
            log::info!("{name}: vector block width {block_width}");
        }
        Numbering::None { .. } => {}
    }
}

/// Log an already measured bandwidth and profile under `title`.
pub fn log_bandwidth_info(title: &str, bp: &BandwidthProfile) {
    log::info!(
        "{title}: bandwidth {}, profile {}",
        bp.bandwidth,
        bp.profile
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_histogram() {
        let h = Histogram::new(&[]);
        assert!(h.is_empty());
        assert_eq!(h.to_string(), "    no value");
    }

    #[test]
    fn equal_values_single_bucket() {
        let h = Histogram::from_counts(&[4, 4, 4]);
        assert_eq!(h.buckets(), &[(4.0, 4.0, 3)]);
    }

    #[test]
    fn narrow_range_collapses() {
        let h = Histogram::from_counts(&[1, 2, 3, 3]);
        let counts: Vec<usize> = h.buckets().iter().map(|b| b.2).collect();
        assert_eq!(counts, vec![1, 1, 2]);
    }

    #[test]
    fn wide_range_has_five_steps() {
        let h = Histogram::from_counts(&[0, 10, 20, 30, 40, 50]);
        assert_eq!(h.buckets().len(), N_STEPS);
        assert_eq!(h.total(), 6);
        assert_eq!(h.buckets()[N_STEPS - 1].1, 50.0);
        assert_eq!(h.buckets()[N_STEPS - 1].2, 2);
    }
}
