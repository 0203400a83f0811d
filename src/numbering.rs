//! Numbering descriptors attached to an entity class.
//!
//! A [`Numbering`] tells a face loop how it may be split: not at all,
//! by (thread, group) ranges with a barrier between groups, or in fixed-width
//! vector blocks. The descriptor is read-only once built and is replaced
//! whenever the entity class is renumbered.

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::RenumberError;
use std::ops::Range;

/// Thread × group range table over the renumbered order.
///
/// `group_index` holds `n_threads * n_groups` pairs laid out as
/// `[(t * n_groups + g) * 2]` = start, `[... + 1]` = end. Empty pairs carry
/// [`ThreadGroups::EMPTY`] in both slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadGroups {
    n_threads: usize,
    n_groups: usize,
    group_index: Vec<isize>,
}

impl ThreadGroups {
    pub const EMPTY: isize = -1;

    /// Build from a raw index table, validating its shape and ranges against
    /// `n_elts`.
    pub fn new(
        n_threads: usize,
        n_groups: usize,
        group_index: Vec<isize>,
        n_elts: usize,
    ) -> Result<Self, RenumberError> {
        let out = Self {
            n_threads,
            n_groups,
            group_index,
        };
        out.check(n_elts)?;
        Ok(out)
    }

    /// One thread, one group covering `[0, n_elts)`.
    pub fn serial(n_elts: usize) -> Self {
        let group_index = if n_elts > 0 {
            vec![0, n_elts as isize]
        } else {
            vec![Self::EMPTY, Self::EMPTY]
        };
        Self {
            n_threads: 1,
            n_groups: 1,
            group_index,
        }
    }

    #[inline]
    pub fn n_threads(&self) -> usize {
        self.n_threads
    }

    #[inline]
    pub fn n_groups(&self) -> usize {
        self.n_groups
    }

    #[inline]
    pub fn group_index(&self) -> &[isize] {
        &self.group_index
    }

    /// Range of renumbered elements handled by thread `t` in group `g`,
    /// or `None` when the pair is empty.
    pub fn range(&self, t: usize, g: usize) -> Option<Range<usize>> {
        let k = (t * self.n_groups + g) * 2;
        let (s, e) = (*self.group_index.get(k)?, *self.group_index.get(k + 1)?);
        if s < 0 || e <= s {
            None
        } else {
            Some(s as usize..e as usize)
        }
    }

    /// All non-empty `(thread, range)` pairs of group `g`.
    pub fn group(&self, g: usize) -> impl Iterator<Item = (usize, Range<usize>)> + '_ {
        (0..self.n_threads).filter_map(move |t| self.range(t, g).map(|r| (t, r)))
    }

    /// Number of elements in group `g` on thread `t`.
    pub fn len_of(&self, t: usize, g: usize) -> usize {
        self.range(t, g).map_or(0, |r| r.len())
    }

    /// Sum of all range lengths.
    pub fn covered(&self) -> usize {
        (0..self.n_groups)
            .flat_map(|g| (0..self.n_threads).map(move |t| (t, g)))
            .map(|(t, g)| self.len_of(t, g))
            .sum()
    }

    fn check(&self, n_elts: usize) -> Result<(), RenumberError> {
        if self.n_threads == 0 || self.n_groups == 0 {
            return Err(RenumberError::InvalidIndex {
                what: "thread groups",
                reason: "thread and group counts must be positive".into(),
            });
        }
        let expected = self.n_threads * self.n_groups * 2;
        if self.group_index.len() != expected {
            return Err(RenumberError::LengthMismatch {
                what: "group index",
                expected,
                found: self.group_index.len(),
            });
        }
        for pair in self.group_index.chunks_exact(2) {
            let (s, e) = (pair[0], pair[1]);
            let empty = s == Self::EMPTY && e == Self::EMPTY;
            if !empty && (s < 0 || e < s || e as usize > n_elts) {
                return Err(RenumberError::InvalidIndex {
                    what: "group index",
                    reason: format!("range [{s}, {e}) invalid for {n_elts} elements"),
                });
            }
        }
        let mut ranges: Vec<(isize, isize)> = self
            .group_index
            .chunks_exact(2)
            .map(|p| (p[0], p[1]))
            .filter(|&(s, e)| s >= 0 && e > s)
            .collect();
        ranges.sort_unstable();
        if let Some(w) = ranges.windows(2).find(|w| w[0].1 > w[1].0) {
            return Err(RenumberError::InvalidIndex {
                what: "group index",
                reason: format!(
                    "ranges [{}, {}) and [{}, {}) overlap",
                    w[0].0, w[0].1, w[1].0, w[1].1
                ),
            });
        }
        Ok(())
    }

    /// Table taken as is, bypassing every check.
    #[cfg(test)]
    pub(crate) fn from_raw_unchecked(n_threads: usize, n_groups: usize, group_index: Vec<isize>) -> Self {
        Self {
            n_threads,
            n_groups,
            group_index,
        }
    }
}

impl DebugInvariants for ThreadGroups {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "ThreadGroups");
    }

    fn validate_invariants(&self) -> Result<(), RenumberError> {
        let upper = self
            .group_index
            .iter()
            .copied()
            .filter(|&v| v >= 0)
            .max()
            .unwrap_or(0) as usize;
        self.check(upper)
    }
}

/// Numbering descriptor of one entity class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Numbering {
    /// No particular structure; loops must run serially or with their own
    /// synchronization.
    None { n_elts: usize },
    Threaded(ThreadGroups),
    /// Any `block_width` consecutive elements may be processed as one vector.
    Vectorized { n_elts: usize, block_width: usize },
}

impl Numbering {
    pub fn n_elts(&self) -> usize {
        match self {
            Numbering::None { n_elts } | Numbering::Vectorized { n_elts, .. } => *n_elts,
            Numbering::Threaded(tg) => tg.covered(),
        }
    }

    pub fn n_threads(&self) -> usize {
        match self {
            Numbering::Threaded(tg) => tg.n_threads(),
            _ => 1,
        }
    }

    pub fn n_groups(&self) -> usize {
        match self {
            Numbering::Threaded(tg) => tg.n_groups(),
            _ => 1,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Numbering::None { .. } => "none",
            Numbering::Threaded(_) => "threaded",
            Numbering::Vectorized { .. } => "vectorized",
        }
    }
}
