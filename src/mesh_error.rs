//! RenumberError: Unified error type for mesh-renumber public APIs
//!
//! Every public operation that reads or mutates a [`Mesh`](crate::mesh::Mesh)
//! reports failures through this type. Recoverable strategy failures
//! (a partitioner that cannot meet its size constraints, a layout that
//! cannot be vectorized) live in
//! [`PartitionError`](crate::partitioning::error::PartitionError) instead and
//! never escape the pipeline.

use thiserror::Error;

/// Unified error type for mesh-renumber operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenumberError {
    /// A `new_to_old` array is not a bijection on `[0, n)`.
    #[error("Invalid permutation: {0}")]
    InvalidPermutation(String),
    /// A permutation or array has the wrong number of entries for its entity class.
    #[error("Length mismatch for {what}: expected {expected}, found {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// A connectivity entry references a cell outside the mesh.
    #[error("Connectivity error: {what} {entity} references cell {cell} (only {n_cells} cells)")]
    CellOutOfRange {
        what: &'static str,
        entity: usize,
        cell: usize,
        n_cells: usize,
    },
    /// An index array is not a valid CSR-style offset table.
    #[error("Invalid index for {what}: {reason}")]
    InvalidIndex { what: &'static str, reason: String },
    /// A configuration value could not be parsed or is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The numbering would let two threads (or two lanes of a vector block)
    /// touch the same cell concurrently. This is a logic defect, not a
    /// sizing limitation.
    #[error(
        "Conflicts detected using mesh renumbering: {interior} for interior faces, {boundary} for boundary faces"
    )]
    Conflicts { interior: usize, boundary: usize },
}
