use mesh_renumber::config::{IFaceAlgorithm, RenumberConfig};
use mesh_renumber::diagnostics::{Histogram, bandwidth_profile};
use mesh_renumber::mesh::NoObserver;
use mesh_renumber::meshgen::structured_quad_mesh;
use mesh_renumber::numbering::Numbering;
use mesh_renumber::partitioning::estimate_imbalance;
use mesh_renumber::pipeline::renumber_mesh;

#[test]
fn grid_bandwidth_is_row_length() {
    let m = structured_quad_mesh(5, 4).unwrap();
    let bp = bandwidth_profile(&m);
    assert_eq!(bp.bandwidth, 5);
    assert!(bp.profile <= 5 && bp.profile >= 1);
}

#[test]
fn report_matches_attached_numbering() {
    let mut m = structured_quad_mesh(16, 16).unwrap();
    let cfg = RenumberConfig {
        n_threads: 4,
        min_i_subset_size: 8,
        min_b_subset_size: 8,
        i_face_algorithm: IFaceAlgorithm::Multipass,
        ..Default::default()
    };
    let report = renumber_mesh(&mut m, &cfg, &mut NoObserver).unwrap();
    let Numbering::Threaded(tg) = &m.i_face_numbering else {
        panic!("expected a threaded numbering");
    };
    assert_eq!(report.interior.imbalance, estimate_imbalance(tg));
    assert!(report.interior.imbalance >= 0.0);
    assert_eq!(report.bandwidth, bandwidth_profile(&m));
}

#[test]
fn histogram_display_lists_buckets() {
    let h = Histogram::from_counts(&[1, 1, 2, 9, 17]);
    let text = h.to_string();
    assert_eq!(text.lines().count(), 5);
    assert_eq!(h.total(), 5);
}
