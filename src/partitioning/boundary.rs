//! Boundary-face thread partitioner.
//!
//! A boundary face touches a single cell, so one group suffices: faces are
//! sorted by cell and cut into near-equal contiguous slices whose ends are
//! pushed forward past any run of faces sharing a cell.

use super::FacePartition;
use super::error::PartitionError;
use crate::numbering::ThreadGroups;
use crate::permutation::Permutation;

/// Renumber boundary faces for `n_threads` threads.
///
/// Slices hold `ceil(n / n_threads)` faces, at least `min_subset_size`;
/// trailing threads may receive nothing.
pub fn partition_boundary(
    b_face_cells: &[usize],
    n_threads: usize,
    min_subset_size: usize,
) -> Result<FacePartition, PartitionError> {
    let n = b_face_cells.len();
    if n == 0 {
        return Err(PartitionError::Empty("boundary faces"));
    }
    let n_threads = n_threads.max(1);

    let mut new_to_old: Vec<usize> = (0..n).collect();
    new_to_old.sort_unstable_by_key(|&f| (b_face_cells[f], f));

    let subset_size = n.div_ceil(n_threads).max(min_subset_size);
    let mut group_index = Vec::with_capacity(n_threads * 2);
    let mut end = 0;
    for t in 0..n_threads {
        let start = end;
        end = ((t + 1) * subset_size).clamp(start, n);
        if end > 0 && end < n {
            let c = b_face_cells[new_to_old[end - 1]];
            while end < n && b_face_cells[new_to_old[end]] == c {
                end += 1;
            }
        }
        if end > start {
            group_index.extend([start as isize, end as isize]);
        } else {
            group_index.extend([ThreadGroups::EMPTY, ThreadGroups::EMPTY]);
        }
    }

    Ok(FacePartition {
        groups: ThreadGroups::new(n_threads, 1, group_index, n)?,
        permutation: Permutation::try_from_new_to_old(new_to_old)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fails() {
        assert_eq!(
            partition_boundary(&[], 4, 1).unwrap_err(),
            PartitionError::Empty("boundary faces")
        );
    }

    #[test]
    fn runs_are_not_split() {
        // cells: 0 0 0 1 1 2 ; 2 threads, slice 3 -> ends after the run of cell 0
        let cells = [1, 0, 2, 0, 1, 0];
        let part = partition_boundary(&cells, 2, 1).unwrap();
        assert_eq!(part.permutation.new_to_old(), &[1, 3, 5, 0, 4, 2]);
        assert_eq!(part.groups.range(0, 0), Some(0..3));
        assert_eq!(part.groups.range(1, 0), Some(3..6));
    }

    #[test]
    fn boundary_extends_past_shared_cell() {
        // 0 1 1 1 2 with slices of 2: first slice grows to swallow cell 1
        let cells = [0, 1, 1, 1, 2];
        let part = partition_boundary(&cells, 3, 1).unwrap();
        assert_eq!(part.groups.range(0, 0), Some(0..4));
        // thread 1's slice would end where thread 0 now ends
        assert_eq!(part.groups.range(1, 0), None);
        assert_eq!(part.groups.range(2, 0), Some(4..5));
        assert_eq!(part.groups.n_groups(), 1);
    }

    #[test]
    fn min_subset_concentrates_work() {
        let cells: Vec<usize> = (0..10).collect();
        let part = partition_boundary(&cells, 4, 64).unwrap();
        assert_eq!(part.groups.range(0, 0), Some(0..10));
        assert!((1..4).all(|t| part.groups.range(t, 0).is_none()));
    }
}
