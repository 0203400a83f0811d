//! Race checks for face numberings.
//!
//! A threaded numbering is checked in two steps. First every (thread, group)
//! range is swept and each face index counted; a face visited zero times or
//! more than once is an error, which catches lost or duplicated faces. Then,
//! group by group, the owning thread of every touched cell is recorded
//! serially and each face reaching a cell owned by another thread counts as
//! a conflict. Vectorized numberings are checked block by block.

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "rayon")]
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::algs::vectorize::count_vector_conflicts;
use crate::mesh::{FaceCells, Mesh};
use crate::mesh_error::RenumberError;
use crate::numbering::{Numbering, ThreadGroups};

/// Times each face of `[0, n_faces)` appears in a range of `groups`.
/// Ranges must already be known to lie within `n_faces`.
fn face_visits(n_faces: usize, groups: &ThreadGroups) -> Vec<usize> {
    #[cfg(feature = "rayon")]
    {
        let visits: Vec<AtomicUsize> = (0..n_faces).map(|_| AtomicUsize::new(0)).collect();
        for g in 0..groups.n_groups() {
            groups.group(g).collect::<Vec<_>>().into_par_iter().for_each(|(_, r)| {
                for f in r {
                    visits[f].fetch_add(1, Ordering::Relaxed);
                }
            });
        }
        visits.into_iter().map(AtomicUsize::into_inner).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        let mut visits = vec![0usize; n_faces];
        for g in 0..groups.n_groups() {
            for (_, r) in groups.group(g) {
                for f in r {
                    visits[f] += 1;
                }
            }
        }
        visits
    }
}

/// Number of faces of a threaded numbering that are lost, duplicated, or
/// could race with another thread of the same group.
pub fn count_thread_conflicts<C>(faces: &C, n_cells_ext: usize, groups: &ThreadGroups) -> usize
where
    C: FaceCells + Sync + ?Sized,
{
    let n_faces = faces.n_faces();
    let out_of_range = (0..groups.n_groups())
        .flat_map(|g| groups.group(g))
        .any(|(_, r)| r.end > n_faces);
    if out_of_range {
        return n_faces.max(1);
    }

    let mut errors = face_visits(n_faces, groups)
        .iter()
        .enumerate()
        .filter(|&(f, &n)| {
            if n != 1 {
                log::debug!("face {f} visited {n} times");
            }
            n != 1
        })
        .count();
    if errors > 0 {
        return errors;
    }

    let mut owner: Vec<Option<usize>> = vec![None; n_cells_ext];
    for g in 0..groups.n_groups() {
        owner.iter_mut().for_each(|o| *o = None);
        for (t, r) in groups.group(g) {
            for f in r {
                let cells = faces.cells(f);
                if cells.iter().any(|&c| owner[c].is_some_and(|o| o != t)) {
                    log::debug!("face {f} {cells:?} conflicts in group {g} thread {t}");
                    errors += 1;
                }
                cells.iter().for_each(|&c| owner[c] = Some(t));
            }
        }
    }
    errors
}

/// Conflicts of any numbering over the given faces.
pub fn count_numbering_conflicts<C>(faces: &C, n_cells_ext: usize, numbering: &Numbering) -> usize
where
    C: FaceCells + Sync + ?Sized,
{
    let n_faces = faces.n_faces();
    match numbering {
        Numbering::None { n_elts } => n_elts.abs_diff(n_faces),
        Numbering::Threaded(tg) => count_thread_conflicts(faces, n_cells_ext, tg),
        Numbering::Vectorized {
            n_elts,
            block_width,
        } => {
            let ids: Vec<usize> = (0..n_faces).collect();
            n_elts.abs_diff(n_faces) + count_vector_conflicts(faces, &ids, *block_width)
        }
    }
}

/// Check the numberings attached to a mesh.
///
/// Returns [`RenumberError::Conflicts`] when either face class could race.
pub fn verify_mesh_numbering(mesh: &Mesh) -> Result<(), RenumberError> {
    let n_ext = mesh.n_cells_with_ghosts;
    let interior = count_numbering_conflicts(&mesh.i_face_cells[..], n_ext, &mesh.i_face_numbering);
    let boundary = count_numbering_conflicts(&mesh.b_face_cells[..], n_ext, &mesh.b_face_numbering);
    if interior > 0 || boundary > 0 {
        log::error!(
            "Conflicts detected using mesh renumbering: {interior} for interior faces, {boundary} for boundary faces"
        );
        return Err(RenumberError::Conflicts { interior, boundary });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_threads_pass() {
        let faces: &[[usize; 2]] = &[[0, 1], [2, 3]];
        let tg = ThreadGroups::new(2, 1, vec![0, 1, 1, 2], 2).unwrap();
        assert_eq!(count_thread_conflicts(faces, 4, &tg), 0);
    }

    #[test]
    fn shared_cell_across_threads_fails() {
        let faces: &[[usize; 2]] = &[[0, 1], [1, 2]];
        let tg = ThreadGroups::new(2, 1, vec![0, 1, 1, 2], 2).unwrap();
        assert_eq!(count_thread_conflicts(faces, 3, &tg), 1);
        // same faces in two groups are fine
        let tg = ThreadGroups::new(2, 2, vec![0, 1, -1, -1, -1, -1, 1, 2], 2).unwrap();
        assert_eq!(count_thread_conflicts(faces, 3, &tg), 0);
    }

    #[test]
    fn missing_face_is_counted() {
        let faces: &[usize] = &[0, 1, 2];
        let tg = ThreadGroups::new(1, 1, vec![0, 2], 3).unwrap();
        assert_eq!(count_thread_conflicts(faces, 3, &tg), 1);
    }

    #[test]
    fn duplicated_face_is_not_mistaken_for_coverage() {
        let faces: &[[usize; 2]] = &[[0, 1], [2, 3], [4, 5]];
        // face 1 in both groups, face 2 never: touch totals still match
        let tg = ThreadGroups::from_raw_unchecked(1, 2, vec![0, 2, 1, 2]);
        assert_eq!(tg.covered(), 3);
        assert_eq!(count_thread_conflicts(faces, 6, &tg), 2);

        let mut m = Mesh::new(6, faces.to_vec(), vec![]).unwrap();
        m.i_face_numbering = Numbering::Threaded(tg);
        assert_eq!(
            verify_mesh_numbering(&m),
            Err(RenumberError::Conflicts {
                interior: 2,
                boundary: 0
            })
        );
    }

    #[test]
    fn mesh_check_reports_both_classes() {
        let mut m = Mesh::new(3, vec![[0, 1], [1, 2]], vec![0, 0]).unwrap();
        assert!(verify_mesh_numbering(&m).is_ok());
        m.i_face_numbering =
            Numbering::Threaded(ThreadGroups::new(2, 1, vec![0, 1, 1, 2], 2).unwrap());
        m.b_face_numbering = Numbering::Vectorized {
            n_elts: 2,
            block_width: 2,
        };
        assert_eq!(
            verify_mesh_numbering(&m),
            Err(RenumberError::Conflicts {
                interior: 1,
                boundary: 1
            })
        );
    }
}
