//! Partitioning metrics utilities.
//!
//! Load-imbalance and matrix bandwidth/profile estimates, used for logging
//! and tests. None of these values affect the produced numbering.

use crate::numbering::{Numbering, ThreadGroups};

/// Estimates the thread imbalance of a threaded numbering.
///
/// For each group, the imbalance is `max / mean − 1` over all threads of
/// the pool (empty threads count as zero); group values are averaged
/// weighted by the group's face count.
///
/// # Arguments
/// - `groups`: the (thread × group) table.
///
/// # Returns
/// The weighted imbalance, or 0 for an empty table.
pub fn estimate_imbalance(groups: &ThreadGroups) -> f64 {
    let n_threads = groups.n_threads();
    let mut total = 0.0;
    let mut n_faces = 0usize;
    for g in 0..groups.n_groups() {
        let counts = (0..n_threads).map(|t| groups.len_of(t, g));
        let (sum, max) = counts.fold((0usize, 0usize), |(s, m), c| (s + c, m.max(c)));
        if sum == 0 {
            continue;
        }
        let mean = sum as f64 / n_threads as f64;
        total += (max as f64 / mean - 1.0) * sum as f64;
        n_faces += sum;
    }
    if n_faces == 0 {
        0.0
    } else {
        total / n_faces as f64
    }
}

/// Imbalance of any numbering; non-threaded numberings report 0.
pub fn numbering_imbalance(numbering: &Numbering) -> f64 {
    match numbering {
        Numbering::Threaded(tg) => estimate_imbalance(tg),
        _ => 0.0,
    }
}

/// Bandwidth and profile of the cell matrix implied by interior faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BandwidthProfile {
    /// Largest `|c0 − c1|` over interior faces.
    pub bandwidth: usize,
    /// Mean over local cells of the largest distance to a neighbour.
    pub profile: usize,
}

/// Computes bandwidth and profile (O(faces + cells)).
///
/// # Arguments
/// - `n_cells`: local cell count (ghosts excluded from the profile mean).
/// - `n_cells_ext`: local plus ghost cell count.
/// - `face_cells`: interior face → cell connectivity.
pub fn bandwidth_profile(
    n_cells: usize,
    n_cells_ext: usize,
    face_cells: &[[usize; 2]],
) -> BandwidthProfile {
    let mut max_distance = vec![0usize; n_cells_ext];
    let mut bandwidth = 0;
    for &[c0, c1] in face_cells {
        let d = c0.abs_diff(c1);
        bandwidth = bandwidth.max(d);
        max_distance[c0] = max_distance[c0].max(d);
        max_distance[c1] = max_distance[c1].max(d);
    }
    let profile = if n_cells == 0 {
        0
    } else {
        max_distance[..n_cells].iter().sum::<usize>() / n_cells
    };
    BandwidthProfile { bandwidth, profile }
}
