//! Structural self-checks for the renumbering data model.
//!
//! [`Permutation`](crate::permutation::Permutation) must stay a bijection
//! with matching inverse, [`ThreadGroups`](crate::numbering::ThreadGroups)
//! must hold disjoint in-bounds ranges, and a
//! [`Mesh`](crate::mesh::Mesh) must keep every face → cell id below its
//! ghost-inclusive cell count with optional arrays sized to their entity
//! class. Full checks are O(n), so the asserting form only runs in debug
//! builds or with the `strict-invariants` / `check-invariants` features.

use crate::mesh_error::RenumberError;

/// A type whose internal consistency can be checked after construction or
/// after a renumbering has been applied to it.
pub trait DebugInvariants {
    /// Panic on a broken invariant when checks are compiled in.
    fn debug_assert_invariants(&self);
    /// First broken invariant, if any.
    fn validate_invariants(&self) -> Result<(), RenumberError>;
}

/// Panic with `[invariants] <context>: <error>` if `$expr` fails, when
/// checks are compiled in; expands to nothing otherwise.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}
