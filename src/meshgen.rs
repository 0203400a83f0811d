//! Structured mesh generators used by tests and benches.
//!
//! Cells are numbered row-major (`x` fastest). Interior faces come in two
//! sweeps: first the faces normal to `x`, then those normal to `y` (and `z`
//! for boxes); every face lists its lower-numbered cell first. Boundary faces
//! follow the same sweep order over the domain sides.

use crate::mesh::{IndexedList, Mesh};
use crate::mesh_error::RenumberError;

fn invalid_size(message: impl Into<String>) -> RenumberError {
    RenumberError::InvalidConfig(message.into())
}

/// Family ids written on boundary faces, one per side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum Side {
    XMin = 1,
    XMax = 2,
    YMin = 3,
    YMax = 4,
    ZMin = 5,
    ZMax = 6,
}

/// `nx × ny` quadrilateral mesh with face → vertex lists, families and
/// 1-based global numbers left absent.
pub fn structured_quad_mesh(nx: usize, ny: usize) -> Result<Mesh, RenumberError> {
    if nx == 0 || ny == 0 {
        return Err(invalid_size("structured_quad_mesh: nx and ny must be positive"));
    }
    let cell = |i: usize, j: usize| j * nx + i;
    let vert = |i: usize, j: usize| j * (nx + 1) + i;

    let mut i_cells = Vec::with_capacity((nx - 1) * ny + nx * (ny - 1));
    let mut i_verts = Vec::with_capacity(i_cells.capacity());
    for j in 0..ny {
        for i in 0..nx - 1 {
            i_cells.push([cell(i, j), cell(i + 1, j)]);
            i_verts.push(vec![vert(i + 1, j), vert(i + 1, j + 1)]);
        }
    }
    for j in 0..ny - 1 {
        for i in 0..nx {
            i_cells.push([cell(i, j), cell(i, j + 1)]);
            i_verts.push(vec![vert(i, j + 1), vert(i + 1, j + 1)]);
        }
    }

    let mut b_cells = Vec::with_capacity(2 * (nx + ny));
    let mut b_verts = Vec::with_capacity(b_cells.capacity());
    let mut b_family = Vec::with_capacity(b_cells.capacity());
    for j in 0..ny {
        b_cells.push(cell(0, j));
        b_verts.push(vec![vert(0, j + 1), vert(0, j)]);
        b_family.push(Side::XMin as i32);
        b_cells.push(cell(nx - 1, j));
        b_verts.push(vec![vert(nx, j), vert(nx, j + 1)]);
        b_family.push(Side::XMax as i32);
    }
    for i in 0..nx {
        b_cells.push(cell(i, 0));
        b_verts.push(vec![vert(i, 0), vert(i + 1, 0)]);
        b_family.push(Side::YMin as i32);
        b_cells.push(cell(i, ny - 1));
        b_verts.push(vec![vert(i + 1, ny), vert(i, ny)]);
        b_family.push(Side::YMax as i32);
    }

    let n_cells = nx * ny;
    let i_family = vec![0; i_cells.len()];
    let mut mesh = Mesh::new(n_cells, i_cells, b_cells)?;
    mesh.i_face_vertices = Some(IndexedList::from_rows(i_verts));
    mesh.b_face_vertices = Some(IndexedList::from_rows(b_verts));
    mesh.cell_family = Some(vec![1; n_cells]);
    mesh.i_face_family = Some(i_family);
    mesh.b_face_family = Some(b_family);
    mesh.cell_cells = Some(diagonal_neighbours(nx, ny));
    Ok(mesh)
}

/// Cells sharing only a corner with each cell of an `nx × ny` grid.
fn diagonal_neighbours(nx: usize, ny: usize) -> IndexedList {
    let rows = (0..ny).flat_map(|j| (0..nx).map(move |i| (i, j))).map(|(i, j)| {
        let mut row = Vec::with_capacity(4);
        for (di, dj) in [(-1isize, -1isize), (1, -1), (-1, 1), (1, 1)] {
            let (ii, jj) = (i as isize + di, j as isize + dj);
            if ii >= 0 && jj >= 0 && (ii as usize) < nx && (jj as usize) < ny {
                row.push(jj as usize * nx + ii as usize);
            }
        }
        row
    });
    IndexedList::from_rows(rows)
}

/// `nx × ny × nz` hexahedral box; connectivity only (no vertex lists).
pub fn structured_hex_mesh(nx: usize, ny: usize, nz: usize) -> Result<Mesh, RenumberError> {
    if nx == 0 || ny == 0 || nz == 0 {
        return Err(invalid_size("structured_hex_mesh: nx, ny and nz must be positive"));
    }
    let cell = |i: usize, j: usize, k: usize| (k * ny + j) * nx + i;
    let mut i_cells = Vec::new();
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx - 1 {
                i_cells.push([cell(i, j, k), cell(i + 1, j, k)]);
            }
        }
    }
    for k in 0..nz {
        for j in 0..ny - 1 {
            for i in 0..nx {
                i_cells.push([cell(i, j, k), cell(i, j + 1, k)]);
            }
        }
    }
    for k in 0..nz - 1 {
        for j in 0..ny {
            for i in 0..nx {
                i_cells.push([cell(i, j, k), cell(i, j, k + 1)]);
            }
        }
    }

    let mut b_cells = Vec::new();
    let mut b_family = Vec::new();
    for k in 0..nz {
        for j in 0..ny {
            b_cells.extend([cell(0, j, k), cell(nx - 1, j, k)]);
            b_family.extend([Side::XMin as i32, Side::XMax as i32]);
        }
    }
    for k in 0..nz {
        for i in 0..nx {
            b_cells.extend([cell(i, 0, k), cell(i, ny - 1, k)]);
            b_family.extend([Side::YMin as i32, Side::YMax as i32]);
        }
    }
    for j in 0..ny {
        for i in 0..nx {
            b_cells.extend([cell(i, j, 0), cell(i, j, nz - 1)]);
            b_family.extend([Side::ZMin as i32, Side::ZMax as i32]);
        }
    }

    let mut mesh = Mesh::new(nx * ny * nz, i_cells, b_cells)?;
    mesh.b_face_family = Some(b_family);
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug_invariants::DebugInvariants;

    #[test]
    fn quad_counts() {
        let m = structured_quad_mesh(4, 4).unwrap();
        assert_eq!(m.n_cells, 16);
        assert_eq!(m.n_i_faces(), 24);
        assert_eq!(m.n_b_faces(), 16);
        assert!(m.validate_invariants().is_ok());
        assert!(m.i_face_cells.iter().all(|[a, b]| a < b));
        // corner cell has a single diagonal neighbour
        assert_eq!(m.cell_cells.as_ref().unwrap().row(0), &[5]);
    }

    #[test]
    fn hex_counts() {
        let m = structured_hex_mesh(3, 2, 2).unwrap();
        assert_eq!(m.n_cells, 12);
        assert_eq!(m.n_i_faces(), 2 * 2 * 2 + 3 * 1 * 2 + 3 * 2 * 1);
        assert_eq!(m.n_b_faces(), 2 * (2 * 2 + 3 * 2 + 3 * 2));
    }

    #[test]
    fn zero_extent_is_rejected() {
        assert!(structured_quad_mesh(0, 3).is_err());
        assert!(structured_hex_mesh(1, 1, 0).is_err());
    }
}
