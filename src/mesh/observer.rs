//! Notification hooks for views derived from the mesh (post-processing,
//! export meshes) that must follow a renumbering.

/// Called after the corresponding connectivity update has been applied.
/// Both hooks default to no-ops.
pub trait RenumberObserver {
    fn renumber_cells(&mut self, _new_to_old: &[usize]) {}

    /// `None` for a face class that was not renumbered.
    fn renumber_faces(&mut self, _i_new_to_old: Option<&[usize]>, _b_new_to_old: Option<&[usize]>) {}
}

/// Observer for meshes without derived views.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoObserver;

impl RenumberObserver for NoObserver {}
