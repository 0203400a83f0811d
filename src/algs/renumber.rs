//! Apply cell and face permutations to every dependent mesh array.
//!
//! All updates are gathers driven by a validated [`Permutation`]. New arrays
//! are built from the old ones first; the mesh is only modified once every
//! new array exists and the halo has accepted the cell renumbering, so a
//! failure leaves the connectivity untouched.

use crate::mesh::{IndexedList, Mesh, RenumberObserver};
use crate::mesh_error::RenumberError;
use crate::numbering::Numbering;
use crate::permutation::Permutation;

fn expect_len(what: &'static str, perm: &Permutation, expected: usize) -> Result<(), RenumberError> {
    if perm.len() != expected {
        return Err(RenumberError::LengthMismatch {
            what,
            expected,
            found: perm.len(),
        });
    }
    Ok(())
}

fn gather_opt<T: Clone>(
    perm: &Permutation,
    arr: &Option<Vec<T>>,
) -> Result<Option<Vec<T>>, RenumberError> {
    arr.as_deref().map(|a| perm.gather(a)).transpose()
}

/// Gathered global numbers, or `new_to_old + 1` when the mesh had none.
fn global_num(perm: &Permutation, arr: &Option<Vec<u64>>) -> Result<Vec<u64>, RenumberError> {
    match arr {
        Some(a) => perm.gather(a),
        None => Ok(perm.new_to_old().iter().map(|&o| o as u64 + 1).collect()),
    }
}

fn relayout(
    perm: &Permutation,
    list: &Option<IndexedList>,
) -> Result<Option<IndexedList>, RenumberError> {
    list.as_ref().map(|l| l.permuted(perm.new_to_old())).transpose()
}

/// Old → new lookup over local and ghost cells; ghosts map to themselves.
fn extended_old_to_new(perm: &Permutation, n_cells_ext: usize) -> Vec<usize> {
    let mut map = perm.old_to_new().to_vec();
    map.extend(perm.len()..n_cells_ext);
    map
}

/// Renumber local cells.
///
/// Order: halo, face → cell connectivity, extended neighbour lists, cell
/// families, global cell numbers, then the observer hook.
pub fn renumber_cells(
    mesh: &mut Mesh,
    perm: &Permutation,
    observer: &mut dyn RenumberObserver,
) -> Result<(), RenumberError> {
    expect_len("cell permutation", perm, mesh.n_cells)?;
    let map = extended_old_to_new(perm, mesh.n_cells_with_ghosts);
    let lookup = |c: usize| -> Result<usize, RenumberError> {
        map.get(c).copied().ok_or(RenumberError::CellOutOfRange {
            what: "face",
            entity: 0,
            cell: c,
            n_cells: map.len(),
        })
    };

    let i_face_cells = mesh
        .i_face_cells
        .iter()
        .map(|&[a, b]| Ok([lookup(a)?, lookup(b)?]))
        .collect::<Result<Vec<_>, RenumberError>>()?;
    let b_face_cells = mesh
        .b_face_cells
        .iter()
        .map(|&c| lookup(c))
        .collect::<Result<Vec<_>, RenumberError>>()?;
    let cell_cells = match relayout(perm, &mesh.cell_cells)? {
        Some(mut l) => {
            l.remap_values(&map)?;
            Some(l)
        }
        None => None,
    };
    let cell_family = match &mesh.cell_family {
        Some(fam) => {
            let (local, ghosts) = fam.split_at(mesh.n_cells.min(fam.len()));
            let mut out = perm.gather(local)?;
            out.extend_from_slice(ghosts);
            Some(out)
        }
        None => None,
    };
    let global_cell_num = global_num(perm, &mesh.global_cell_num)?;

    if let Some(halo) = mesh.halo.as_mut() {
        halo.renumber_cells(&map)?;
    }

    mesh.i_face_cells = i_face_cells;
    mesh.b_face_cells = b_face_cells;
    mesh.cell_cells = cell_cells;
    mesh.cell_family = cell_family;
    mesh.global_cell_num = Some(global_cell_num);
    mesh.cell_numbering = Numbering::None {
        n_elts: mesh.n_cells,
    };

    observer.renumber_cells(perm.new_to_old());
    Ok(())
}

/// Renumber interior and/or boundary faces. A class given `None` is left
/// untouched, including its numbering descriptor.
pub fn renumber_faces(
    mesh: &mut Mesh,
    i_perm: Option<&Permutation>,
    b_perm: Option<&Permutation>,
    observer: &mut dyn RenumberObserver,
) -> Result<(), RenumberError> {
    if i_perm.is_none() && b_perm.is_none() {
        return Ok(());
    }

    let interior = match i_perm {
        Some(p) => {
            expect_len("interior face permutation", p, mesh.n_i_faces())?;
            Some((
                p.gather(&mesh.i_face_cells)?,
                relayout(p, &mesh.i_face_vertices)?,
                gather_opt(p, &mesh.i_face_family)?,
                global_num(p, &mesh.global_i_face_num)?,
            ))
        }
        None => None,
    };
    let boundary = match b_perm {
        Some(p) => {
            expect_len("boundary face permutation", p, mesh.n_b_faces())?;
            Some((
                p.gather(&mesh.b_face_cells)?,
                relayout(p, &mesh.b_face_vertices)?,
                gather_opt(p, &mesh.b_face_family)?,
                global_num(p, &mesh.global_b_face_num)?,
            ))
        }
        None => None,
    };

    if let Some((cells, vertices, family, global)) = interior {
        mesh.i_face_cells = cells;
        mesh.i_face_vertices = vertices;
        mesh.i_face_family = family;
        mesh.global_i_face_num = Some(global);
        mesh.i_face_numbering = Numbering::None {
            n_elts: mesh.n_i_faces(),
        };
    }
    if let Some((cells, vertices, family, global)) = boundary {
        mesh.b_face_cells = cells;
        mesh.b_face_vertices = vertices;
        mesh.b_face_family = family;
        mesh.global_b_face_num = Some(global);
        mesh.b_face_numbering = Numbering::None {
            n_elts: mesh.n_b_faces(),
        };
    }

    observer.renumber_faces(
        i_perm.map(Permutation::new_to_old),
        b_perm.map(Permutation::new_to_old),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::NoObserver;

    fn small_mesh() -> Mesh {
        let mut m = Mesh::with_ghosts(3, 4, vec![[0, 1], [1, 2], [2, 3]], vec![0, 2]).unwrap();
        m.cell_family = Some(vec![10, 11, 12, 13]);
        m.cell_cells = Some(IndexedList::from_rows([vec![2], vec![3], vec![0]]));
        m
    }

    #[test]
    fn cell_permutation_remaps_and_keeps_ghosts() {
        let mut m = small_mesh();
        let p = Permutation::try_from_new_to_old(vec![2, 0, 1]).unwrap();
        renumber_cells(&mut m, &p, &mut NoObserver).unwrap();
        // old -> new: 0 -> 1, 1 -> 2, 2 -> 0, ghost 3 stays
        assert_eq!(m.i_face_cells, vec![[1, 2], [2, 0], [0, 3]]);
        assert_eq!(m.b_face_cells, vec![1, 0]);
        assert_eq!(m.cell_family, Some(vec![12, 10, 11, 13]));
        let cc = m.cell_cells.as_ref().unwrap();
        assert_eq!(cc.row(0), &[1]);
        assert_eq!(cc.row(1), &[0]);
        assert_eq!(cc.row(2), &[3]);
        assert_eq!(m.global_cell_num, Some(vec![3, 1, 2]));
    }

    #[test]
    fn wrong_length_leaves_mesh_alone() {
        let mut m = small_mesh();
        let p = Permutation::identity(4);
        assert!(matches!(
            renumber_cells(&mut m, &p, &mut NoObserver),
            Err(RenumberError::LengthMismatch { .. })
        ));
        assert_eq!(m.i_face_cells, vec![[0, 1], [1, 2], [2, 3]]);
        assert!(m.global_cell_num.is_none());
    }

    #[test]
    fn faces_renumbered_independently() {
        let mut m = small_mesh();
        m.global_b_face_num = Some(vec![7, 9]);
        let b = Permutation::try_from_new_to_old(vec![1, 0]).unwrap();
        renumber_faces(&mut m, None, Some(&b), &mut NoObserver).unwrap();
        assert_eq!(m.b_face_cells, vec![2, 0]);
        assert_eq!(m.global_b_face_num, Some(vec![9, 7]));
        assert_eq!(m.i_face_cells, vec![[0, 1], [1, 2], [2, 3]]);
        assert!(m.global_i_face_num.is_none());
    }
}
