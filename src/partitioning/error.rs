//! Partitioning errors for mesh-renumber
//!
//! These are strategy failures: the caller is expected to try another
//! strategy or keep the current numbering.

use crate::mesh_error::RenumberError;
use thiserror::Error;

/// Errors from thread partitioners and the vectorization permuter
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartitionError {
    /// Not enough faces to give each thread its minimum subset
    #[error("Too few faces ({n_faces}) for {n_threads} threads with minimum subset size {min_subset_size}")]
    TooFewFaces {
        n_faces: usize,
        n_threads: usize,
        min_subset_size: usize,
    },
    /// The entity class has no elements
    #[error("No {0} to partition")]
    Empty(&'static str),
    /// Thread bounds do not cover every face exactly once
    #[error("Thread bounds cover {covered} of {expected} faces")]
    Coverage { covered: usize, expected: usize },
    /// Vector block width of 1 requested
    #[error("Vectorization disabled (block width 1)")]
    VectorizationDisabled,
    /// Bounded search exhausted, or an impossible layout detected up front
    #[error("Not vectorizable: {0}")]
    NotVectorizable(String),
    /// A partitioner produced an inconsistent permutation or group table
    #[error("Invalid numbering: {0}")]
    InvalidNumbering(#[from] RenumberError),
}
