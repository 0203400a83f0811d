//! Mesh connectivity owned by the caller and rewritten in place by the
//! renumbering engine.
//!
//! The engine only needs flat arrays: interior faces carry two cell ids,
//! boundary faces one, and variable-length relations (face → vertices,
//! extended cell → cell neighbours) are stored as [`IndexedList`]s. Cells in
//! `[n_cells, n_cells_with_ghosts)` are ghosts owned by the [`Halo`].

pub mod halo;
pub mod observer;

pub use halo::{CellHalo, Halo};
pub use observer::{NoObserver, RenumberObserver};

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::RenumberError;
use crate::numbering::Numbering;

/// Variable-length rows stored as an offset table and a flat value array.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexedList {
    index: Vec<usize>,
    values: Vec<usize>,
}

impl IndexedList {
    pub fn new(index: Vec<usize>, values: Vec<usize>) -> Result<Self, RenumberError> {
        let out = Self { index, values };
        out.validate_invariants()?;
        Ok(out)
    }

    /// Build from explicit rows.
    pub fn from_rows<R, I>(rows: R) -> Self
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = usize>,
    {
        let mut index = vec![0];
        let mut values = Vec::new();
        for row in rows {
            values.extend(row);
            index.push(values.len());
        }
        Self { index, values }
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.index.len().saturating_sub(1)
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[usize] {
        &self.values[self.index[i]..self.index[i + 1]]
    }

    #[inline]
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    #[inline]
    pub fn values(&self) -> &[usize] {
        &self.values
    }

    /// Re-lay rows out in `new_to_old` order, keeping each row's contents.
    pub fn permuted(&self, new_to_old: &[usize]) -> Result<Self, RenumberError> {
        if new_to_old.len() != self.n_rows() {
            return Err(RenumberError::LengthMismatch {
                what: "indexed list rows",
                expected: self.n_rows(),
                found: new_to_old.len(),
            });
        }
        let mut index = Vec::with_capacity(self.index.len());
        let mut values = Vec::with_capacity(self.values.len());
        index.push(0);
        for &old in new_to_old {
            values.extend_from_slice(self.row(old));
            index.push(values.len());
        }
        Ok(Self { index, values })
    }

    /// Replace every value `v` by `map[v]`.
    pub fn remap_values(&mut self, map: &[usize]) -> Result<(), RenumberError> {
        for v in &mut self.values {
            *v = *map.get(*v).ok_or_else(|| RenumberError::InvalidIndex {
                what: "indexed list value",
                reason: format!("value {v} outside lookup of size {}", map.len()),
            })?;
        }
        Ok(())
    }
}

impl DebugInvariants for IndexedList {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "IndexedList");
    }

    fn validate_invariants(&self) -> Result<(), RenumberError> {
        let invalid = |reason: String| RenumberError::InvalidIndex {
            what: "indexed list",
            reason,
        };
        match self.index.first() {
            Some(0) => {}
            _ => return Err(invalid("offset table must start at 0".into())),
        }
        if let Some(w) = self.index.windows(2).position(|w| w[1] < w[0]) {
            return Err(invalid(format!("offsets decrease at row {w}")));
        }
        let last = self.index.last().copied().unwrap_or(0);
        if last != self.values.len() {
            return Err(invalid(format!(
                "last offset {last} != value count {}",
                self.values.len()
            )));
        }
        Ok(())
    }
}

/// Uniform access to the cells touched by each face of a class.
pub trait FaceCells {
    fn n_faces(&self) -> usize;
    fn cells(&self, f: usize) -> &[usize];
}

impl FaceCells for [[usize; 2]] {
    #[inline]
    fn n_faces(&self) -> usize {
        self.len()
    }
    #[inline]
    fn cells(&self, f: usize) -> &[usize] {
        &self[f]
    }
}

impl FaceCells for [usize] {
    #[inline]
    fn n_faces(&self) -> usize {
        self.len()
    }
    #[inline]
    fn cells(&self, f: usize) -> &[usize] {
        std::slice::from_ref(&self[f])
    }
}

/// Local mesh of one rank.
#[derive(Debug)]
pub struct Mesh {
    pub n_cells: usize,
    /// Local plus ghost cells; ghosts keep their ids across renumbering.
    pub n_cells_with_ghosts: usize,
    pub i_face_cells: Vec<[usize; 2]>,
    pub b_face_cells: Vec<usize>,
    pub i_face_vertices: Option<IndexedList>,
    pub b_face_vertices: Option<IndexedList>,
    /// Extended neighbourhood (cells sharing a vertex but no face).
    pub cell_cells: Option<IndexedList>,
    pub cell_family: Option<Vec<i32>>,
    pub i_face_family: Option<Vec<i32>>,
    pub b_face_family: Option<Vec<i32>>,
    pub global_cell_num: Option<Vec<u64>>,
    pub global_i_face_num: Option<Vec<u64>>,
    pub global_b_face_num: Option<Vec<u64>>,
    pub halo: Option<Box<dyn Halo>>,
    pub cell_numbering: Numbering,
    pub i_face_numbering: Numbering,
    pub b_face_numbering: Numbering,
}

impl Mesh {
    /// Mesh without ghosts, optional arrays or numberings.
    pub fn new(
        n_cells: usize,
        i_face_cells: Vec<[usize; 2]>,
        b_face_cells: Vec<usize>,
    ) -> Result<Self, RenumberError> {
        Self::with_ghosts(n_cells, n_cells, i_face_cells, b_face_cells)
    }

    pub fn with_ghosts(
        n_cells: usize,
        n_cells_with_ghosts: usize,
        i_face_cells: Vec<[usize; 2]>,
        b_face_cells: Vec<usize>,
    ) -> Result<Self, RenumberError> {
        let n_i = i_face_cells.len();
        let n_b = b_face_cells.len();
        let mesh = Self {
            n_cells,
            n_cells_with_ghosts,
            i_face_cells,
            b_face_cells,
            i_face_vertices: None,
            b_face_vertices: None,
            cell_cells: None,
            cell_family: None,
            i_face_family: None,
            b_face_family: None,
            global_cell_num: None,
            global_i_face_num: None,
            global_b_face_num: None,
            halo: None,
            cell_numbering: Numbering::None { n_elts: n_cells },
            i_face_numbering: Numbering::None { n_elts: n_i },
            b_face_numbering: Numbering::None { n_elts: n_b },
        };
        mesh.validate_invariants()?;
        Ok(mesh)
    }

    #[inline]
    pub fn n_i_faces(&self) -> usize {
        self.i_face_cells.len()
    }

    #[inline]
    pub fn n_b_faces(&self) -> usize {
        self.b_face_cells.len()
    }

    /// Attach default numberings to every entity class.
    pub fn reset_numberings(&mut self) {
        self.cell_numbering = Numbering::None {
            n_elts: self.n_cells,
        };
        self.i_face_numbering = Numbering::None {
            n_elts: self.n_i_faces(),
        };
        self.b_face_numbering = Numbering::None {
            n_elts: self.n_b_faces(),
        };
    }
}

fn check_len<T>(
    what: &'static str,
    arr: &Option<Vec<T>>,
    expected: usize,
) -> Result<(), RenumberError> {
    match arr {
        Some(a) if a.len() != expected => Err(RenumberError::LengthMismatch {
            what,
            expected,
            found: a.len(),
        }),
        _ => Ok(()),
    }
}

fn check_rows(
    what: &'static str,
    list: &Option<IndexedList>,
    expected: usize,
) -> Result<(), RenumberError> {
    if let Some(l) = list {
        l.validate_invariants()?;
        if l.n_rows() != expected {
            return Err(RenumberError::LengthMismatch {
                what,
                expected,
                found: l.n_rows(),
            });
        }
    }
    Ok(())
}

impl DebugInvariants for Mesh {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Mesh");
    }

    fn validate_invariants(&self) -> Result<(), RenumberError> {
        let n_ext = self.n_cells_with_ghosts;
        if n_ext < self.n_cells {
            return Err(RenumberError::LengthMismatch {
                what: "cells with ghosts",
                expected: self.n_cells,
                found: n_ext,
            });
        }
        for (f, pair) in self.i_face_cells.iter().enumerate() {
            if let Some(&c) = pair.iter().find(|&&c| c >= n_ext) {
                return Err(RenumberError::CellOutOfRange {
                    what: "interior face",
                    entity: f,
                    cell: c,
                    n_cells: n_ext,
                });
            }
        }
        if let Some((f, &c)) = self
            .b_face_cells
            .iter()
            .enumerate()
            .find(|&(_, &c)| c >= n_ext)
        {
            return Err(RenumberError::CellOutOfRange {
                what: "boundary face",
                entity: f,
                cell: c,
                n_cells: n_ext,
            });
        }
        check_rows("interior face vertices", &self.i_face_vertices, self.n_i_faces())?;
        check_rows("boundary face vertices", &self.b_face_vertices, self.n_b_faces())?;
        check_rows("extended cell neighbours", &self.cell_cells, self.n_cells)?;
        if let Some(cc) = &self.cell_cells {
            if let Some(&c) = cc.values().iter().find(|&&c| c >= n_ext) {
                return Err(RenumberError::CellOutOfRange {
                    what: "extended neighbour list",
                    entity: 0,
                    cell: c,
                    n_cells: n_ext,
                });
            }
        }
        check_len("cell families", &self.cell_family, n_ext)?;
        check_len("interior face families", &self.i_face_family, self.n_i_faces())?;
        check_len("boundary face families", &self.b_face_family, self.n_b_faces())?;
        check_len("global cell numbers", &self.global_cell_num, self.n_cells)?;
        check_len("global interior face numbers", &self.global_i_face_num, self.n_i_faces())?;
        check_len("global boundary face numbers", &self.global_b_face_num, self.n_b_faces())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_list_relayout_keeps_runs() {
        let l = IndexedList::from_rows([vec![1, 2], vec![], vec![3, 4, 5]]);
        let p = l.permuted(&[2, 0, 1]).unwrap();
        assert_eq!(p.index(), &[0, 3, 5, 5]);
        assert_eq!(p.values(), &[3, 4, 5, 1, 2]);
        assert_eq!(p.row(2), &[] as &[usize]);
    }

    #[test]
    fn indexed_list_rejects_bad_offsets() {
        assert!(IndexedList::new(vec![1, 2], vec![0, 0]).is_err());
        assert!(IndexedList::new(vec![0, 2, 1], vec![0, 0]).is_err());
        assert!(IndexedList::new(vec![0, 3], vec![0, 0]).is_err());
        assert!(IndexedList::new(vec![0], vec![]).is_ok());
    }

    #[test]
    fn remap_values_checks_range() {
        let mut l = IndexedList::from_rows([vec![0, 1]]);
        l.remap_values(&[1, 0]).unwrap();
        assert_eq!(l.values(), &[1, 0]);
        assert!(l.remap_values(&[0]).is_err());
    }

    #[test]
    fn mesh_rejects_out_of_range_cells() {
        assert!(matches!(
            Mesh::new(2, vec![[0, 2]], vec![]),
            Err(RenumberError::CellOutOfRange { .. })
        ));
        assert!(Mesh::with_ghosts(2, 3, vec![[0, 2]], vec![1]).is_ok());
    }

    #[test]
    fn face_cells_views() {
        let i: &[[usize; 2]] = &[[0, 1], [1, 2]];
        let b: &[usize] = &[4, 5];
        assert_eq!(i.cells(1), &[1, 2]);
        assert_eq!(b.cells(0), &[4]);
        assert_eq!(FaceCells::n_faces(b), 2);
    }
}
