use mesh_renumber::algs::adjacency_graph::{build_cell_adjacency, build_cell_face_incidence};
use mesh_renumber::debug_invariants::DebugInvariants;
use mesh_renumber::meshgen::{structured_hex_mesh, structured_quad_mesh};

#[test]
fn quad_grid_adjacency_matches_stencil() {
    let m = structured_quad_mesh(4, 3).unwrap();
    let g = build_cell_adjacency(m.n_cells, &m.i_face_cells);
    assert!(g.validate_invariants().is_ok());
    assert_eq!(g.n_rows(), 12);
    // interior cell (1, 1) = 5 has four neighbours
    assert_eq!(g.neighbors(5), &[1, 4, 6, 9]);
    assert_eq!(g.neighbors(0), &[1, 4]);
    // every interior face appears once per side
    assert_eq!(g.n_entries(), 2 * m.n_i_faces());
}

#[test]
fn incidence_rows_list_faces_of_each_cell() {
    let m = structured_hex_mesh(3, 3, 3).unwrap();
    let g = build_cell_face_incidence(m.n_cells, &m.i_face_cells);
    assert!(g.validate_invariants().is_ok());
    for c in 0..m.n_cells {
        for &f in g.neighbors(c) {
            assert!(m.i_face_cells[f].contains(&c));
        }
    }
    // centre cell touches six faces
    assert_eq!(g.neighbors(13).len(), 6);
}

#[test]
fn ghost_rows_are_built() {
    let faces = [[0, 3], [1, 3], [2, 4]];
    let g = build_cell_adjacency(5, &faces);
    assert_eq!(g.neighbors(3), &[0, 1]);
    assert_eq!(g.neighbors(4), &[2]);
}
