//! Ghost-cell exchange descriptors.

use crate::mesh_error::RenumberError;
use std::fmt;

/// A ghost-cell exchange pattern that must follow local cell renumbering.
///
/// `old_to_new` covers local and ghost cells; ghost entries map to
/// themselves. Called before any other cell-dependent array is updated.
pub trait Halo: fmt::Debug + Send + Sync {
    fn renumber_cells(&mut self, old_to_new: &[usize]) -> Result<(), RenumberError>;
}

/// Point-to-point halo: per neighbouring rank, the local cells sent and the
/// ghost slots received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellHalo {
    pub neighbor_ranks: Vec<usize>,
    /// Per neighbour: local cell ids packed into the outgoing message.
    pub send_indices: Vec<Vec<usize>>,
    /// Per neighbour: ghost cell ids written from the incoming message.
    pub recv_indices: Vec<Vec<usize>>,
}

impl CellHalo {
    pub fn n_neighbors(&self) -> usize {
        self.neighbor_ranks.len()
    }
}

fn remap(list: &[usize], old_to_new: &[usize]) -> Result<Vec<usize>, RenumberError> {
    list.iter()
        .map(|&c| {
            old_to_new.get(c).copied().ok_or(RenumberError::CellOutOfRange {
                what: "halo",
                entity: 0,
                cell: c,
                n_cells: old_to_new.len(),
            })
        })
        .collect()
}

impl Halo for CellHalo {
    /// All lists are remapped before any is replaced; on error the halo is
    /// unchanged.
    fn renumber_cells(&mut self, old_to_new: &[usize]) -> Result<(), RenumberError> {
        let send = self
            .send_indices
            .iter()
            .map(|l| remap(l, old_to_new))
            .collect::<Result<Vec<_>, _>>()?;
        let recv = self
            .recv_indices
            .iter()
            .map(|l| remap(l, old_to_new))
            .collect::<Result<Vec<_>, _>>()?;
        self.send_indices = send;
        self.recv_indices = recv;
        Ok(())
    }
}
