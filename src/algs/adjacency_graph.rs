//! Build CSR graphs from face → cell connectivity.
//!
//! Two variants are provided:
//! - [`build_cell_adjacency`]: rows are cells, columns the neighbouring cells
//!   reached through at least one face;
//! - [`build_cell_face_incidence`]: rows are cells, columns the ids of the
//!   faces incident to them.
//!
//! Determinism:
//! - Rows are always sorted ascending. Adjacency rows are deduplicated so
//!   that several faces between the same pair of cells (periodic or
//!   non-conforming joins) count once; self-loops are dropped.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::RenumberError;

/// Compressed sparse-row graph over `n_rows` vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrGraph {
    /// CSR offsets into `col_id` for each row (`n_rows + 1` entries).
    pub row_index: Vec<usize>,
    /// Column ids, row after row.
    pub col_id: Vec<usize>,
    /// Length of the longest row.
    pub n_cols_max: usize,
}

impl Default for CsrGraph {
    fn default() -> Self {
        Self {
            row_index: vec![0],
            col_id: Vec::new(),
            n_cols_max: 0,
        }
    }
}

impl CsrGraph {
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.row_index.len() - 1
    }

    /// Return the column slice for row `i`.
    #[inline]
    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.col_id[self.row_index[i]..self.row_index[i + 1]]
    }

    /// Whether `j` appears in row `i`.
    #[inline]
    pub fn contains(&self, i: usize, j: usize) -> bool {
        self.neighbors(i).binary_search(&j).is_ok()
    }

    /// Total number of stored columns.
    #[inline]
    pub fn n_entries(&self) -> usize {
        self.col_id.len()
    }
}

impl DebugInvariants for CsrGraph {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "CsrGraph");
    }

    fn validate_invariants(&self) -> Result<(), RenumberError> {
        let invalid = |reason: String| RenumberError::InvalidIndex {
            what: "csr graph",
            reason,
        };
        if self.row_index.first() != Some(&0) {
            return Err(invalid("row index must start at 0".into()));
        }
        if self.row_index.last() != Some(&self.col_id.len()) {
            return Err(invalid("row index does not end at column count".into()));
        }
        let mut widest = 0;
        for i in 0..self.n_rows() {
            let (s, e) = (self.row_index[i], self.row_index[i + 1]);
            if e < s {
                return Err(invalid(format!("row {i} has negative length")));
            }
            let row = &self.col_id[s..e];
            if row.windows(2).any(|w| w[1] < w[0]) {
                return Err(invalid(format!("row {i} is not sorted")));
            }
            widest = widest.max(e - s);
        }
        if widest != self.n_cols_max {
            return Err(invalid(format!(
                "n_cols_max {} but widest row has {widest}",
                self.n_cols_max
            )));
        }
        Ok(())
    }
}

/// Degree count, prefix sum and fill, shared by both builders.
fn fill_rows<F>(n_rows: usize, n_faces: usize, mut edges: F) -> (Vec<usize>, Vec<usize>)
where
    F: FnMut(usize, &mut dyn FnMut(usize, usize)),
{
    let mut count = vec![0usize; n_rows];
    for f in 0..n_faces {
        edges(f, &mut |row, _| count[row] += 1);
    }
    let mut row_index = Vec::with_capacity(n_rows + 1);
    row_index.push(0);
    for &c in &count {
        let last = row_index[row_index.len() - 1];
        row_index.push(last + c);
    }
    let mut col_id = vec![0usize; row_index[n_rows]];
    count.iter_mut().for_each(|c| *c = 0);
    for f in 0..n_faces {
        edges(f, &mut |row, col| {
            col_id[row_index[row] + count[row]] = col;
            count[row] += 1;
        });
    }
    (row_index, col_id)
}

/// Split `col_id` into one mutable slice per row.
fn rows_mut<'a>(row_index: &[usize], col_id: &'a mut [usize]) -> Vec<&'a mut [usize]> {
    let mut rows = Vec::with_capacity(row_index.len().saturating_sub(1));
    let mut rest = col_id;
    for w in row_index.windows(2) {
        let (row, tail) = std::mem::take(&mut rest).split_at_mut(w[1] - w[0]);
        rows.push(row);
        rest = tail;
    }
    rows
}

fn sort_rows(row_index: &[usize], col_id: &mut [usize]) {
    let mut rows = rows_mut(row_index, col_id);
    #[cfg(feature = "rayon")]
    rows.par_iter_mut().for_each(|r| r.sort_unstable());
    #[cfg(not(feature = "rayon"))]
    rows.iter_mut().for_each(|r| r.sort_unstable());
}

fn widest_row(row_index: &[usize]) -> usize {
    row_index.windows(2).map(|w| w[1] - w[0]).max().unwrap_or(0)
}

/// Cell → neighbouring cells graph over `n_rows` cells (local and ghost).
///
/// # Panics
/// If a face references a cell `>= n_rows`; [`Mesh`](crate::mesh::Mesh)
/// validation rules this out.
pub fn build_cell_adjacency(n_rows: usize, face_cells: &[[usize; 2]]) -> CsrGraph {
    if n_rows == 0 {
        return CsrGraph::default();
    }
    let (mut row_index, mut col_id) = fill_rows(n_rows, face_cells.len(), |f, push| {
        let [a, b] = face_cells[f];
        if a != b {
            push(a, b);
            push(b, a);
        }
    });
    sort_rows(&row_index, &mut col_id);

    // compact duplicate columns in place
    let mut kk = 0;
    let mut start = 0;
    for i in 0..n_rows {
        let end = row_index[i + 1];
        row_index[i] = kk;
        let mut prev = None;
        for k in start..end {
            let c = col_id[k];
            if prev != Some(c) {
                col_id[kk] = c;
                kk += 1;
                prev = Some(c);
            }
        }
        start = end;
    }
    row_index[n_rows] = kk;
    col_id.truncate(kk);

    let n_cols_max = widest_row(&row_index);
    CsrGraph {
        row_index,
        col_id,
        n_cols_max,
    }
}

/// Cell → incident faces graph over `n_rows` cells; a face joining a cell to
/// itself is listed once.
///
/// # Panics
/// If a face references a cell `>= n_rows`.
pub fn build_cell_face_incidence(n_rows: usize, face_cells: &[[usize; 2]]) -> CsrGraph {
    if n_rows == 0 {
        return CsrGraph::default();
    }
    let (row_index, col_id) = fill_rows(n_rows, face_cells.len(), |f, push| {
        let [a, b] = face_cells[f];
        push(a, f);
        if b != a {
            push(b, f);
        }
    });
    // faces are pushed in increasing id order, rows are already sorted
    debug_assert!(
        row_index
            .windows(2)
            .all(|w| col_id[w[0]..w[1]].windows(2).all(|p| p[0] < p[1]))
    );
    let n_cols_max = widest_row(&row_index);
    CsrGraph {
        row_index,
        col_id,
        n_cols_max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_graph() {
        let g = build_cell_adjacency(0, &[]);
        assert_eq!(g.n_rows(), 0);
        assert_eq!(g.row_index, vec![0]);
        assert!(g.validate_invariants().is_ok());
    }

    #[test]
    fn duplicate_faces_collapse() {
        // two faces between 0 and 1 (periodic join), one between 1 and 2
        let g = build_cell_adjacency(3, &[[0, 1], [1, 0], [1, 2]]);
        assert_eq!(g.neighbors(0), &[1]);
        assert_eq!(g.neighbors(1), &[0, 2]);
        assert_eq!(g.neighbors(2), &[1]);
        assert_eq!(g.n_cols_max, 2);
        assert!(g.contains(1, 2));
        assert!(!g.contains(0, 2));
        assert!(g.validate_invariants().is_ok());
    }

    #[test]
    fn incidence_lists_face_ids() {
        let g = build_cell_face_incidence(3, &[[0, 1], [1, 2], [2, 2]]);
        assert_eq!(g.neighbors(0), &[0]);
        assert_eq!(g.neighbors(1), &[0, 1]);
        assert_eq!(g.neighbors(2), &[1, 2]);
        assert_eq!(g.n_entries(), 5);
        assert!(g.validate_invariants().is_ok());
    }

    #[test]
    fn isolated_rows_are_empty() {
        let g = build_cell_adjacency(4, &[[2, 3]]);
        assert!(g.neighbors(0).is_empty());
        assert_eq!(g.neighbors(3), &[2]);
    }
}
