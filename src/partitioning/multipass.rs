//! Multipass interior-face thread partitioner.
//!
//! Each pass splits the (residual) cell index space into contiguous
//! per-thread ranges and gives a thread every face whose two cells fall in
//! its range. Faces straddling two ranges are left for the next pass, which
//! works on a compacted cell numbering restricted to the cells those faces
//! touch. Each pass becomes one group; when too few faces remain, they form
//! a final group on thread 0.
//!
//! Within a group two threads never share a cell, since their cell ranges
//! are disjoint.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use super::FacePartition;
use super::error::PartitionError;
use crate::numbering::ThreadGroups;
use crate::permutation::Permutation;

/// Per-thread outcome of one assignment sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Assignment {
    n_t_faces: Vec<usize>,
    /// Position in the face list of the last face given to each thread,
    /// or the list length when the thread got none.
    t_face_last: Vec<usize>,
}

/// Working state of the partitioner across passes.
struct Multipass<'a> {
    n_threads: usize,
    relax: f64,
    /// Face cells in the current (compacted) numbering, lower id first.
    l_face_cells: Vec<[usize; 2]>,
    /// `Some(g * n_threads + t)` once a face is placed.
    f_t_id: Vec<Option<usize>>,
    original: &'a [[usize; 2]],
}

#[inline]
fn ordered([a, b]: [usize; 2]) -> [usize; 2] {
    if a <= b { [a, b] } else { [b, a] }
}

/// Max/mean − 1 over the given per-thread counts; 0 when nothing is assigned.
pub fn group_imbalance(n_t_faces: &[usize]) -> f64 {
    let sum: usize = n_t_faces.iter().sum();
    if sum == 0 || n_t_faces.is_empty() {
        return 0.0;
    }
    let max = n_t_faces.iter().copied().max().unwrap_or(0);
    let mean = sum as f64 / n_t_faces.len() as f64;
    max as f64 / mean - 1.0
}

impl Multipass<'_> {
    #[inline]
    fn c0(&self, faces_list: &[usize], fl: usize) -> usize {
        self.l_face_cells[faces_list[fl]][0]
    }

    /// Give each face to the thread whose cell range holds both its cells.
    fn assign(
        &mut self,
        g_id: usize,
        faces_list: &[usize],
        t_cell_index: &[usize],
    ) -> Assignment {
        let n_g = t_cell_index.len() - 1;
        let mut out = Assignment {
            n_t_faces: vec![0; n_g],
            t_face_last: vec![faces_list.len(); n_g],
        };
        let mut t = 0;
        for (fl, &f) in faces_list.iter().enumerate() {
            let [c0, c1] = self.l_face_cells[f];
            while t + 1 < n_g && c0 >= t_cell_index[t + 1] {
                t += 1;
            }
            if c0 >= t_cell_index[t] && c1 < t_cell_index[t + 1] {
                self.f_t_id[f] = Some(g_id * self.n_threads + t);
                out.n_t_faces[t] += 1;
                out.t_face_last[t] = fl;
            } else {
                self.f_t_id[f] = None;
            }
        }
        out
    }

    /// Shift boundaries between adjacent threads toward the mean load,
    /// keeping the result only if it does not worsen the imbalance.
    fn redistribute(
        &mut self,
        g_id: usize,
        faces_list: &[usize],
        t_cell_index: &mut [usize],
        current: Assignment,
    ) -> Assignment {
        let n_g = t_cell_index.len() - 1;
        if n_g < 2 || faces_list.is_empty() {
            return current;
        }
        let prev_index = t_cell_index.to_vec();
        let unbalance_0 = group_imbalance(&current.n_t_faces);
        let sum: usize = current.n_t_faces.iter().sum();
        let target = (sum as f64 / n_g as f64) as isize;
        let len = faces_list.len() as isize;
        let last = |t: usize| current.t_face_last[t] as isize;

        for t in 0..n_g - 1 {
            let t1 = t + 1;
            let t0_c_start = t_cell_index[t];
            let t1_c_start = t_cell_index[t1];
            let t1_c_end = t_cell_index[t1 + 1];

            let mut n_move =
                ((current.n_t_faces[t] as isize - target) as f64 * self.relax) as isize;

            if n_move > 0 {
                // overloaded: walk back over this thread's faces
                let key = Some(g_id * self.n_threads + t);
                let mut fl_end = last(t) - 1;
                while fl_end > -1
                    && self.c0(faces_list, fl_end as usize) >= t0_c_start
                    && n_move > 0
                {
                    if self.f_t_id[faces_list[fl_end as usize]] == key {
                        n_move -= 1;
                    }
                    fl_end -= 1;
                }
                if fl_end < 0 {
                    continue;
                }
                // do not split the faces of one cell
                while fl_end < last(t)
                    && self.c0(faces_list, fl_end as usize + 1)
                        == self.c0(faces_list, fl_end as usize)
                {
                    fl_end += 1;
                }
                let b = self.c0(faces_list, fl_end as usize) + 1;
                t_cell_index[t1] = b.min(t1_c_start).max(t0_c_start);
            } else if n_move < 0 {
                // underloaded: walk forward over the next thread's faces
                let key = Some(g_id * self.n_threads + t1);
                let fl_max = last(t1).min(len - 1);
                let mut fl_end = last(t);
                while fl_end <= fl_max
                    && self.c0(faces_list, fl_end as usize) <= t1_c_end
                    && n_move < 0
                {
                    if self.f_t_id[faces_list[fl_end as usize]] == key {
                        n_move += 1;
                    }
                    fl_end += 1;
                }
                fl_end = fl_end.min(len - 1);
                while fl_end >= last(t)
                    && fl_end > 0
                    && self.c0(faces_list, fl_end as usize)
                        == self.c0(faces_list, fl_end as usize - 1)
                {
                    fl_end -= 1;
                }
                let b = self.c0(faces_list, fl_end as usize);
                t_cell_index[t1] = b.max(t0_c_start).min(t1_c_end);
            }
        }

        let shifted = self.assign(g_id, faces_list, t_cell_index);
        let unbalance_1 = group_imbalance(&shifted.n_t_faces);
        if unbalance_1 > unbalance_0 {
            t_cell_index.copy_from_slice(&prev_index);
            return self.assign(g_id, faces_list, t_cell_index);
        }
        shifted
    }

    /// Renumber the cells still touched by `faces_list` densely, in order of
    /// first appearance, and return their count.
    fn compact_cells(&mut self, n_f_cells: usize, faces_list: &[usize]) -> usize {
        let mut new_cell_id: Vec<Option<usize>> = vec![None; n_f_cells];
        let mut n_new = 0;
        for &f in faces_list {
            let [c0, c1] = self.l_face_cells[f];
            let mut id = |c: usize| {
                *new_cell_id[c].get_or_insert_with(|| {
                    n_new += 1;
                    n_new - 1
                })
            };
            let (n0, n1) = (id(c0), id(c1));
            self.l_face_cells[f] = ordered([n0, n1]);
        }
        n_new
    }

    fn sort_faces(&self, faces_list: &mut [usize]) {
        let l = &self.l_face_cells;
        faces_list.sort_unstable_by_key(|&f| (l[f], f));
    }
}

/// Evenly split `[0, n_cells)` among `n_g` threads.
fn initial_cell_index(n_cells: usize, n_g: usize) -> Vec<usize> {
    (0..=n_g).map(|t| t * n_cells / n_g).collect()
}

/// Renumber interior faces with the multipass algorithm.
///
/// # Arguments
/// - `n_cells_ext`: number of local plus ghost cells.
/// - `face_cells`: interior face → cell connectivity.
/// - `n_threads`: target thread count.
/// - `min_subset_size`: minimum faces per thread per group; passes stop when
///   at most this many faces remain.
/// - `relax`: boundary-shift relaxation factor.
///
/// # Returns
/// The face permutation and its (thread × group) table, or
/// [`PartitionError::TooFewFaces`] when the mesh is too small to split.
pub fn partition_multipass(
    n_cells_ext: usize,
    face_cells: &[[usize; 2]],
    n_threads: usize,
    min_subset_size: usize,
    relax: f64,
) -> Result<FacePartition, PartitionError> {
    let n_faces = face_cells.len();
    let n_threads = n_threads.max(1);
    let min_subset_size = min_subset_size.max(1);
    if n_faces <= min_subset_size {
        return Err(PartitionError::TooFewFaces {
            n_faces,
            n_threads,
            min_subset_size,
        });
    }

    #[cfg(feature = "rayon")]
    let l_face_cells: Vec<[usize; 2]> = face_cells.par_iter().map(|&fc| ordered(fc)).collect();
    #[cfg(not(feature = "rayon"))]
    let l_face_cells: Vec<[usize; 2]> = face_cells.iter().map(|&fc| ordered(fc)).collect();

    let mut mp = Multipass {
        n_threads,
        relax,
        l_face_cells,
        f_t_id: vec![None; n_faces],
        original: face_cells,
    };

    let mut faces_list: Vec<usize> = (0..n_faces).collect();
    let mut n_f_cells = n_cells_ext;
    let mut g_id = 0;

    while faces_list.len() > min_subset_size {
        mp.sort_faces(&mut faces_list);

        let n_g = (faces_list.len() / min_subset_size).clamp(1, n_threads);
        let mut t_cell_index = initial_cell_index(n_f_cells, n_g);

        let first = mp.assign(g_id, &faces_list, &t_cell_index);
        let assigned = mp.redistribute(g_id, &faces_list, &mut t_cell_index, first);
        let n_assigned: usize = assigned.n_t_faces.iter().sum();

        log::debug!(
            "multipass group {g_id}: {n_g} threads over {n_f_cells} cells, {n_assigned}/{} faces assigned, imbalance {:.3}",
            faces_list.len(),
            group_imbalance(&assigned.n_t_faces)
        );

        if n_assigned == 0 {
            // no face fits a single thread range; leave the rest to the final group
            break;
        }

        faces_list.retain(|&f| mp.f_t_id[f].is_none());
        g_id += 1;
        if !faces_list.is_empty() {
            n_f_cells = mp.compact_cells(n_f_cells, &faces_list);
        }
    }

    if !faces_list.is_empty() {
        for &f in &faces_list {
            mp.f_t_id[f] = Some(g_id * n_threads);
        }
        g_id += 1;
    }
    let n_groups = g_id;

    build_numbering(&mp, n_groups)
}

/// Order faces by (group, thread, original cells) and index the result.
fn build_numbering(mp: &Multipass<'_>, n_groups: usize) -> Result<FacePartition, PartitionError> {
    let n_threads = mp.n_threads;
    let mut keyed: Vec<(usize, [usize; 2], usize)> = Vec::with_capacity(mp.f_t_id.len());
    for (f, &key) in mp.f_t_id.iter().enumerate() {
        let key = key.ok_or(PartitionError::Coverage {
            covered: f,
            expected: mp.f_t_id.len(),
        })?;
        keyed.push((key, ordered(mp.original[f]), f));
    }
    #[cfg(feature = "rayon")]
    keyed.par_sort_unstable();
    #[cfg(not(feature = "rayon"))]
    keyed.sort_unstable();

    let slot = |t: usize, g: usize| (t * n_groups + g) * 2;
    let mut group_index = vec![ThreadGroups::EMPTY; n_threads * n_groups * 2];
    let mut new_to_old = Vec::with_capacity(keyed.len());
    for (fl, &(key, _, f)) in keyed.iter().enumerate() {
        new_to_old.push(f);
        let (t, g) = (key % n_threads, key / n_threads);
        group_index[slot(t, g) + 1] = (fl + 1) as isize;
    }

    // starts follow the furthest end reached so far, in (group, thread) order
    let mut running = 0isize;
    for g in 0..n_groups {
        for t in 0..n_threads {
            let end = group_index[slot(t, g) + 1];
            if end < 0 {
                group_index[slot(t, g)] = ThreadGroups::EMPTY;
            } else {
                group_index[slot(t, g)] = running;
                running = running.max(end);
            }
        }
    }

    let n_faces = new_to_old.len();
    Ok(FacePartition {
        permutation: Permutation::try_from_new_to_old(new_to_old)?,
        groups: ThreadGroups::new(n_threads, n_groups, group_index, n_faces)?,
    })
}
