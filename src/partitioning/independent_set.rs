//! Greedy independent face groups ("block" interior-face algorithm).
//!
//! Faces are packed into groups in which no two faces share a cell; each
//! group is then cut into per-thread slices. Because group members are
//! pairwise cell-disjoint, any slicing is race-free.

use super::FacePartition;
use super::error::PartitionError;
use crate::algs::adjacency_graph::build_cell_face_incidence;
use crate::numbering::ThreadGroups;
use crate::permutation::Permutation;

/// Greedily partition faces into cell-disjoint groups of at most
/// `max_group_size` faces.
///
/// Returns `new_to_old` (faces of group 0 first, in scan order, then group
/// 1, ...) and the size of each group.
pub fn independent_face_groups(
    max_group_size: usize,
    n_cells_ext: usize,
    face_cells: &[[usize; 2]],
) -> (Vec<usize>, Vec<usize>) {
    let n_faces = face_cells.len();
    let max_group_size = max_group_size.max(1);
    let cell_faces = build_cell_face_incidence(n_cells_ext, face_cells);

    let mut face_marker: Vec<Option<usize>> = vec![None; n_faces];
    let mut new_to_old = Vec::with_capacity(n_faces);
    let mut group_sizes = Vec::new();
    let mut first_unmarked = 0;

    while new_to_old.len() < n_faces {
        let group_id = group_sizes.len();
        let mut g_size = 0;

        for f in first_unmarked..n_faces {
            if face_marker[f].is_some() {
                continue;
            }
            let conflict = face_cells[f].iter().any(|&c| {
                cell_faces
                    .neighbors(c)
                    .iter()
                    .any(|&other| face_marker[other] == Some(group_id))
            });
            if !conflict {
                if first_unmarked == f {
                    first_unmarked = f + 1;
                }
                face_marker[f] = Some(group_id);
                new_to_old.push(f);
                g_size += 1;
            }
            if g_size == max_group_size {
                break;
            }
        }

        // advance past faces marked out of order
        while first_unmarked < n_faces && face_marker[first_unmarked].is_some() {
            first_unmarked += 1;
        }
        group_sizes.push(g_size);
    }

    (new_to_old, group_sizes)
}

/// Cut each group among `n_threads` threads.
///
/// A group of `s` faces is split as `s / T` faces per thread (one more for
/// the first `s % T` threads) when `s / T > 4`; smaller groups go entirely
/// to thread 0.
pub fn thread_bounds_by_group_size(
    n_faces: usize,
    n_threads: usize,
    group_sizes: &[usize],
) -> Result<ThreadGroups, PartitionError> {
    let n_threads = n_threads.max(1);
    let n_groups = group_sizes.len();
    if n_groups == 0 {
        return Err(PartitionError::Empty("groups"));
    }
    let mut group_index = vec![ThreadGroups::EMPTY; n_threads * n_groups * 2];
    let slot = |t: usize, g: usize| (t * n_groups + g) * 2;
    let mut ip = 0usize;

    for (g, &size) in group_sizes.iter().enumerate() {
        let (j, jr) = (size / n_threads, size % n_threads);
        if j > 4 {
            for t in 0..n_threads {
                group_index[slot(t, g)] = ip as isize;
                ip += j + usize::from(t < jr);
                group_index[slot(t, g) + 1] = ip as isize;
            }
        } else if size > 0 {
            group_index[slot(0, g)] = ip as isize;
            ip += size;
            group_index[slot(0, g) + 1] = ip as isize;
        }
    }

    if ip != n_faces {
        return Err(PartitionError::Coverage {
            covered: ip,
            expected: n_faces,
        });
    }
    Ok(ThreadGroups::new(n_threads, n_groups, group_index, n_faces)?)
}

/// Lower the block group size cap until every thread can expect work.
///
/// Starting at `max_group_size`, subtract 64 while
/// `n_faces / size < 2 * n_threads` and `size > min_subset_size`, then clamp
/// to at least `min_subset_size` and at least `2 * n_threads`.
pub fn adjust_max_group_size(
    n_faces: usize,
    n_threads: usize,
    max_group_size: usize,
    min_subset_size: usize,
) -> usize {
    let mut size = max_group_size.max(1);
    while n_faces / size < 2 * n_threads && size > min_subset_size {
        size = size.saturating_sub(64).max(1);
        if size == 1 {
            break;
        }
    }
    size.max(min_subset_size).max(2 * n_threads)
}

/// Renumber interior faces with the block algorithm.
pub fn partition_block(
    n_cells_ext: usize,
    face_cells: &[[usize; 2]],
    n_threads: usize,
    max_group_size: usize,
    min_subset_size: usize,
) -> Result<FacePartition, PartitionError> {
    let n_faces = face_cells.len();
    if n_faces == 0 {
        return Err(PartitionError::Empty("interior faces"));
    }
    let size = adjust_max_group_size(n_faces, n_threads, max_group_size, min_subset_size);
    let (new_to_old, group_sizes) = independent_face_groups(size, n_cells_ext, face_cells);
    log::debug!(
        "block renumbering: group size cap {size}, {} groups",
        group_sizes.len()
    );
    let groups = thread_bounds_by_group_size(n_faces, n_threads, &group_sizes)?;
    let permutation = Permutation::try_from_new_to_old(new_to_old)?;
    Ok(FacePartition {
        permutation,
        groups,
    })
}
