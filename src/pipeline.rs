//! Top-level face renumbering.
//!
//! For each face class the pipeline first tries vectorization (when the
//! configured block width exceeds 1), then thread partitioning, and keeps a
//! default numbering if both give up. Strategy failures are logged and
//! never escape. The tentative result is checked for races before the mesh
//! is touched: on a conflict the mesh keeps its connectivity, every class
//! gets a default numbering and [`RenumberError::Conflicts`] is returned.

use std::fmt;

use crate::algs::renumber::renumber_faces;
use crate::algs::vectorize::{vectorize_boundary_faces, vectorize_interior_faces};
use crate::algs::verify::count_numbering_conflicts;
use crate::config::{IFaceAlgorithm, RenumberConfig};
use crate::debug_invariants::DebugInvariants;
use crate::diagnostics::{bandwidth_profile, log_bandwidth_info, log_threading_info};
use crate::mesh::{FaceCells, Mesh, RenumberObserver};
use crate::mesh_error::RenumberError;
use crate::numbering::Numbering;
use crate::partitioning::{
    BandwidthProfile, FacePartition, PartitionError, numbering_imbalance, partition_block,
    partition_boundary, partition_multipass,
};
use crate::permutation::Permutation;

/// How a face class ended up numbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    None,
    Vectorized,
    Block,
    Multipass,
    Boundary,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::None => "none",
            Strategy::Vectorized => "vectorized",
            Strategy::Block => "block",
            Strategy::Multipass => "multipass",
            Strategy::Boundary => "boundary",
        };
        f.write_str(s)
    }
}

/// Outcome for one face class.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EntityReport {
    pub strategy: Strategy,
    pub n_threads: usize,
    pub n_groups: usize,
    pub imbalance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenumberReport {
    pub interior: EntityReport,
    pub boundary: EntityReport,
    /// Measured after renumbering.
    pub bandwidth: BandwidthProfile,
}

/// A permutation waiting to be committed, with the numbering it enables.
struct Plan {
    strategy: Strategy,
    permutation: Option<Permutation>,
    numbering: Numbering,
}

impl Plan {
    fn serial(n_elts: usize) -> Self {
        Self {
            strategy: Strategy::None,
            permutation: None,
            numbering: Numbering::None { n_elts },
        }
    }

    fn vectorized(permutation: Permutation, block_width: usize) -> Self {
        Self {
            strategy: Strategy::Vectorized,
            numbering: Numbering::Vectorized {
                n_elts: permutation.len(),
                block_width,
            },
            permutation: Some(permutation),
        }
    }

    fn threaded(strategy: Strategy, fp: FacePartition) -> Self {
        Self {
            strategy,
            permutation: Some(fp.permutation),
            numbering: Numbering::Threaded(fp.groups),
        }
    }

    fn report(&self) -> EntityReport {
        EntityReport {
            strategy: self.strategy,
            n_threads: self.numbering.n_threads(),
            n_groups: self.numbering.n_groups(),
            imbalance: numbering_imbalance(&self.numbering),
        }
    }

    /// Conflicts of the numbering over the faces as they would be laid out.
    fn conflicts<T>(&self, faces: &[T], n_cells_ext: usize) -> Result<usize, RenumberError>
    where
        T: Clone,
        [T]: FaceCells + Sync,
    {
        Ok(match &self.permutation {
            Some(p) => {
                let laid_out = p.gather(faces)?;
                count_numbering_conflicts(&laid_out[..], n_cells_ext, &self.numbering)
            }
            None => count_numbering_conflicts(faces, n_cells_ext, &self.numbering),
        })
    }
}

fn fallback(what: &str, e: &PartitionError) {
    match e {
        PartitionError::VectorizationDisabled => {}
        _ => log::warn!("{what}: {e}; keeping current numbering"),
    }
}

fn plan_interior(mesh: &Mesh, config: &RenumberConfig, n_threads: usize) -> Plan {
    let n_faces = mesh.n_i_faces();
    if n_faces == 0 {
        return Plan::serial(0);
    }
    let faces = &mesh.i_face_cells;

    if config.vector_size > 1 {
        match vectorize_interior_faces(faces, config.vector_size) {
            Ok(p) => return Plan::vectorized(p, config.vector_size),
            Err(e) => fallback("interior face vectorization", &e),
        }
    }
    if n_threads < 2 {
        log::debug!("interior faces: single thread, no thread renumbering");
        return Plan::serial(n_faces);
    }

    let n_ext = mesh.n_cells_with_ghosts;
    let attempt = match config.i_face_algorithm {
        IFaceAlgorithm::None => return Plan::serial(n_faces),
        IFaceAlgorithm::Block => partition_block(
            n_ext,
            faces,
            n_threads,
            config.max_group_size,
            config.min_i_subset_size,
        )
        .map(|fp| Plan::threaded(Strategy::Block, fp)),
        IFaceAlgorithm::Multipass => partition_multipass(
            n_ext,
            faces,
            n_threads,
            config.min_i_subset_size,
            config.multipass_relaxation,
        )
        .map(|fp| Plan::threaded(Strategy::Multipass, fp)),
    };
    attempt.unwrap_or_else(|e| {
        fallback("interior face thread renumbering", &e);
        Plan::serial(n_faces)
    })
}

fn plan_boundary(mesh: &Mesh, config: &RenumberConfig, n_threads: usize) -> Plan {
    let n_faces = mesh.n_b_faces();
    if n_faces == 0 {
        return Plan::serial(0);
    }
    let faces = &mesh.b_face_cells;

    if config.vector_size > 1 {
        match vectorize_boundary_faces(faces, mesh.n_cells_with_ghosts, config.vector_size) {
            Ok(p) => return Plan::vectorized(p, config.vector_size),
            Err(e) => fallback("boundary face vectorization", &e),
        }
    }
    if n_threads < 2 {
        return Plan::serial(n_faces);
    }
    partition_boundary(faces, n_threads, config.min_b_subset_size)
        .map(|fp| Plan::threaded(Strategy::Boundary, fp))
        .unwrap_or_else(|e| {
            fallback("boundary face thread renumbering", &e);
            Plan::serial(n_faces)
        })
}

/// Renumber the interior and boundary faces of `mesh` for threaded or
/// vectorized face loops and attach the resulting numberings.
///
/// # Errors
/// - invalid configuration or mesh connectivity;
/// - [`RenumberError::Conflicts`] if the computed numbering would let two
///   threads or vector lanes touch the same cell. The mesh is then left
///   as it was, with default numberings.
pub fn renumber_mesh(
    mesh: &mut Mesh,
    config: &RenumberConfig,
    observer: &mut dyn RenumberObserver,
) -> Result<RenumberReport, RenumberError> {
    config.validate()?;
    mesh.validate_invariants()?;

    if !config.enabled {
        log::info!("mesh renumbering disabled");
        mesh.reset_numberings();
        return Ok(RenumberReport {
            bandwidth: bandwidth_profile(mesh),
            ..Default::default()
        });
    }

    let n_threads = config.effective_n_threads();
    log::info!(
        "renumbering faces: {n_threads} threads, interior algorithm {}, vector size {}",
        config.i_face_algorithm,
        config.vector_size
    );
    let interior = plan_interior(mesh, config, n_threads);
    let boundary = plan_boundary(mesh, config, n_threads);
    commit(mesh, config.verify, interior, boundary, observer)
}

/// Check both plans if `verify` is set, then apply them to the mesh.
fn commit(
    mesh: &mut Mesh,
    verify: bool,
    interior: Plan,
    boundary: Plan,
    observer: &mut dyn RenumberObserver,
) -> Result<RenumberReport, RenumberError> {
    if verify {
        let n_ext = mesh.n_cells_with_ghosts;
        let n_interior = interior.conflicts(&mesh.i_face_cells[..], n_ext)?;
        let n_boundary = boundary.conflicts(&mesh.b_face_cells[..], n_ext)?;
        if n_interior > 0 || n_boundary > 0 {
            log::error!(
                "Conflicts detected using mesh renumbering: {n_interior} for interior faces, {n_boundary} for boundary faces"
            );
            mesh.reset_numberings();
            return Err(RenumberError::Conflicts {
                interior: n_interior,
                boundary: n_boundary,
            });
        }
    }

    renumber_faces(
        mesh,
        interior.permutation.as_ref(),
        boundary.permutation.as_ref(),
        observer,
    )?;
    let report = RenumberReport {
        interior: interior.report(),
        boundary: boundary.report(),
        bandwidth: bandwidth_profile(mesh),
    };
    mesh.i_face_numbering = interior.numbering;
    mesh.b_face_numbering = boundary.numbering;
    mesh.debug_assert_invariants();

    log_threading_info("interior faces", &mesh.i_face_numbering);
    log_threading_info("boundary faces", &mesh.b_face_numbering);
    log_bandwidth_info("cell numbering", &report.bandwidth);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::NoObserver;
    use crate::meshgen::structured_quad_mesh;
    use crate::numbering::ThreadGroups;

    #[test]
    fn disabled_only_resets_numberings() {
        let mut m = structured_quad_mesh(3, 3).unwrap();
        let before = m.i_face_cells.clone();
        let cfg = RenumberConfig {
            enabled: false,
            ..Default::default()
        };
        let report = renumber_mesh(&mut m, &cfg, &mut NoObserver).unwrap();
        assert_eq!(report.interior.strategy, Strategy::None);
        assert_eq!(m.i_face_cells, before);
        assert_eq!(m.i_face_numbering, Numbering::None { n_elts: 12 });
    }

    #[test]
    fn single_thread_keeps_faces() {
        let mut m = structured_quad_mesh(4, 4).unwrap();
        let before = m.i_face_cells.clone();
        let cfg = RenumberConfig {
            n_threads: 1,
            ..Default::default()
        };
        let report = renumber_mesh(&mut m, &cfg, &mut NoObserver).unwrap();
        assert_eq!(report.interior.strategy, Strategy::None);
        assert_eq!(report.boundary.strategy, Strategy::None);
        assert_eq!(m.i_face_cells, before);
    }

    #[test]
    fn conflicting_plan_aborts_before_touching_faces() {
        let mut m = structured_quad_mesh(3, 3).unwrap();
        m.i_face_numbering = Numbering::Threaded(ThreadGroups::serial(12));
        m.b_face_numbering = Numbering::Threaded(ThreadGroups::serial(12));
        let i_before = m.i_face_cells.clone();
        let b_before = m.b_face_cells.clone();

        // x-normal faces on thread 0, y-normal faces on thread 1: face 6
        // joins cells 0 and 3, both already owned by thread 0
        let reversed: Vec<usize> = (0..12).rev().collect();
        let interior = Plan {
            strategy: Strategy::Block,
            permutation: Some(Permutation::identity(12)),
            numbering: Numbering::Threaded(
                ThreadGroups::new(2, 1, vec![0, 6, 6, 12], 12).unwrap(),
            ),
        };
        let boundary = Plan {
            strategy: Strategy::Vectorized,
            permutation: Some(Permutation::try_from_new_to_old(reversed).unwrap()),
            numbering: Numbering::Vectorized {
                n_elts: 12,
                block_width: 1,
            },
        };
        let err = commit(&mut m, true, interior, boundary, &mut NoObserver).unwrap_err();
        assert!(matches!(err, RenumberError::Conflicts { interior, boundary: 0 } if interior > 0));
        assert_eq!(m.i_face_cells, i_before);
        assert_eq!(m.b_face_cells, b_before);
        assert_eq!(m.i_face_numbering, Numbering::None { n_elts: 12 });
        assert_eq!(m.b_face_numbering, Numbering::None { n_elts: 12 });
    }

    #[test]
    fn report_bandwidth_matches_final_mesh() {
        let mut m = structured_quad_mesh(8, 8).unwrap();
        let cfg = RenumberConfig {
            n_threads: 4,
            ..Default::default()
        };
        let report = renumber_mesh(&mut m, &cfg, &mut NoObserver).unwrap();
        assert_eq!(report.bandwidth, bandwidth_profile(&m));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut m = structured_quad_mesh(2, 2).unwrap();
        let cfg = RenumberConfig {
            vector_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            renumber_mesh(&mut m, &cfg, &mut NoObserver),
            Err(RenumberError::InvalidConfig(_))
        ));
    }
}
