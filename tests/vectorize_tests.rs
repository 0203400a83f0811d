mod util;

use mesh_renumber::algs::vectorize::{
    count_vector_conflicts, vectorize_boundary_faces, vectorize_interior_faces,
};
use mesh_renumber::partitioning::PartitionError;
use proptest::prelude::*;
use util::*;

#[test]
fn disjoint_pairs_need_no_moves() {
    let faces: Vec<[usize; 2]> = (0..12).map(|i| [2 * i, 2 * i + 1]).collect();
    let p = vectorize_interior_faces(&faces, 4).unwrap();
    assert!(p.is_identity());
}

#[test]
fn boundary_faces_of_distinct_cells() {
    let cells: Vec<usize> = (0..10).collect();
    let p = vectorize_boundary_faces(&cells, 10, 4).unwrap();
    assert!(p.is_identity());
}

#[test]
fn empty_classes_are_reported() {
    assert_eq!(
        vectorize_interior_faces(&[], 4),
        Err(PartitionError::Empty("interior faces"))
    );
    assert_eq!(
        vectorize_boundary_faces(&[], 0, 4),
        Err(PartitionError::Empty("boundary faces"))
    );
}

proptest! {
    #[test]
    fn success_means_no_conflict(
        seed in any::<u64>(),
        n_cells in 8usize..60,
        n_faces in 1usize..40,
        w in 2usize..5,
    ) {
        let faces = random_faces(seed, n_cells, n_faces);
        if let Ok(p) = vectorize_interior_faces(&faces, w) {
            assert_bijection(p.new_to_old(), n_faces);
            prop_assert_eq!(count_vector_conflicts(&faces[..], p.new_to_old(), w), 0);
        }
    }
}
