#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-renumber
//!
//! mesh-renumber reorders the faces and cells of an unstructured finite-volume
//! mesh so that face-based loops can run on several threads, or in fixed-width
//! vector blocks, without two concurrent work items updating the same cell.
//!
//! ## Features
//! - CSR cell adjacency and cell → face incidence graphs
//! - Block (greedy independent set) and multipass interior face partitioners
//! - Boundary face slicing that never splits a cell across threads
//! - Vector block layout search with bounded retries
//! - Permutation-consistent update of connectivity, families, global ids and halos
//! - Race verification of every numbering before it is committed
//!
//! ## Threaded numberings
//!
//! A [`numbering::ThreadGroups`] table lists, for each (thread, group) pair, a
//! half-open range of renumbered faces. Callers run all threads of one group in
//! parallel and synchronize between groups.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! mesh-renumber = "0.1"
//! # Optional features:
//! # features = ["rayon"]
//! ```
//!
//! ```no_run
//! use mesh_renumber::prelude::*;
//!
//! let mut mesh = structured_quad_mesh(64, 64).unwrap();
//! let config = RenumberConfig::from_env().unwrap();
//! let report = renumber_mesh(&mut mesh, &config, &mut NoObserver).unwrap();
//! println!("{:?}", report.interior);
//! ```

pub mod algs;
pub mod config;
pub mod debug_invariants;
pub mod diagnostics;
pub mod mesh;
pub mod mesh_error;
pub mod meshgen;
pub mod numbering;
pub mod partitioning;
pub mod permutation;
pub mod pipeline;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::renumber::{renumber_cells, renumber_faces};
    pub use crate::algs::verify::verify_mesh_numbering;
    pub use crate::config::{IFaceAlgorithm, RenumberConfig};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::mesh::{CellHalo, Halo, IndexedList, Mesh, NoObserver, RenumberObserver};
    pub use crate::mesh_error::RenumberError;
    pub use crate::meshgen::{structured_hex_mesh, structured_quad_mesh};
    pub use crate::numbering::{Numbering, ThreadGroups};
    pub use crate::partitioning::PartitionError;
    pub use crate::permutation::Permutation;
    pub use crate::pipeline::{RenumberReport, Strategy, renumber_mesh};
}
