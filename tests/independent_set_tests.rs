mod util;

use mesh_renumber::meshgen::structured_quad_mesh;
use mesh_renumber::partitioning::independent_set::{
    adjust_max_group_size, independent_face_groups,
};
use mesh_renumber::partitioning::partition_block;
use proptest::prelude::*;
use util::*;

/// Faces of one group never share a cell.
fn assert_groups_independent(faces: &[[usize; 2]], n2o: &[usize], sizes: &[usize]) {
    let mut start = 0;
    for (g, &s) in sizes.iter().enumerate() {
        let mut cells: Vec<usize> = n2o[start..start + s].iter().flat_map(|&f| faces[f]).collect();
        let n = cells.len();
        cells.sort_unstable();
        cells.dedup();
        assert_eq!(cells.len(), n, "group {g} reuses a cell");
        start += s;
    }
    assert_eq!(start, faces.len());
}

#[test]
fn quad_grid_groups_are_independent() {
    let mesh = structured_quad_mesh(6, 6).unwrap();
    let (n2o, sizes) = independent_face_groups(1014, 36, &mesh.i_face_cells);
    assert_bijection(&n2o, mesh.n_i_faces());
    assert_groups_independent(&mesh.i_face_cells, &n2o, &sizes);
    // a face conflicts with at most six others
    assert!(sizes.len() <= 7);
}

#[test]
fn block_partition_on_grid() {
    let mesh = structured_quad_mesh(16, 16).unwrap();
    let part = partition_block(256, &mesh.i_face_cells, 2, 1014, 8).unwrap();
    assert_bijection(part.permutation.new_to_old(), mesh.n_i_faces());
    assert_eq!(coverage(&part.groups), mesh.n_i_faces());
    assert_groups_disjoint(&mesh.i_face_cells, part.permutation.new_to_old(), &part.groups);
}

#[test]
fn group_cap_shrinks_for_small_meshes() {
    assert_eq!(adjust_max_group_size(100_000, 4, 1014, 64), 1014);
    assert!(adjust_max_group_size(1000, 4, 1014, 64) < 1014);
}

proptest! {
    #[test]
    fn random_groups_are_independent(
        seed in any::<u64>(),
        n_cells in 2usize..30,
        n_faces in 1usize..80,
        cap in 1usize..20,
    ) {
        let faces = random_faces(seed, n_cells, n_faces);
        let (n2o, sizes) = independent_face_groups(cap, n_cells, &faces);
        assert_bijection(&n2o, n_faces);
        prop_assert!(sizes.iter().all(|&s| s >= 1 && s <= cap));
        assert_groups_independent(&faces, &n2o, &sizes);
    }
}
