//! Entry-point for intra-rank face partitioning.
//!
//! Every partitioner returns a [`FacePartition`]: the permutation to apply to
//! its face class and the (thread × group) table over the renumbered order.
//! Failures are [`PartitionError`]s; the pipeline turns them into a serial
//! fallback.

pub mod boundary;
pub mod error;
pub mod independent_set;
pub mod metrics;
pub mod multipass;

pub use self::boundary::partition_boundary;
pub use self::error::PartitionError;
pub use self::independent_set::partition_block;
pub use self::metrics::*;
pub use self::multipass::partition_multipass;

use crate::numbering::ThreadGroups;
use crate::permutation::Permutation;

/// Output of a thread partitioner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacePartition {
    pub permutation: Permutation,
    pub groups: ThreadGroups,
}
