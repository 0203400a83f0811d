//! Permutations of one mesh entity class.
//!
//! A [`Permutation`] stores the `new_to_old` map (entry `i` is the old id of
//! the entity placed at new position `i`) together with its inverse, so the
//! connectivity updater can remap values and gather arrays without
//! rebuilding lookups.

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::RenumberError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    new_to_old: Vec<usize>,
    old_to_new: Vec<usize>,
}

impl Permutation {
    /// The identity permutation on `[0, n)`.
    pub fn identity(n: usize) -> Self {
        let ids: Vec<usize> = (0..n).collect();
        Self {
            new_to_old: ids.clone(),
            old_to_new: ids,
        }
    }

    /// Build from a `new_to_old` array, checking that it is a bijection on
    /// `[0, n)`.
    pub fn try_from_new_to_old(new_to_old: Vec<usize>) -> Result<Self, RenumberError> {
        let n = new_to_old.len();
        let mut old_to_new = vec![usize::MAX; n];
        for (new, &old) in new_to_old.iter().enumerate() {
            if old >= n {
                return Err(RenumberError::InvalidPermutation(format!(
                    "entry {new} maps to {old}, outside [0, {n})"
                )));
            }
            if old_to_new[old] != usize::MAX {
                return Err(RenumberError::InvalidPermutation(format!(
                    "old id {old} appears at positions {} and {new}",
                    old_to_new[old]
                )));
            }
            old_to_new[old] = new;
        }
        Ok(Self {
            new_to_old,
            old_to_new,
        })
    }

    #[inline]
    pub fn new_to_old(&self) -> &[usize] {
        &self.new_to_old
    }

    #[inline]
    pub fn old_to_new(&self) -> &[usize] {
        &self.old_to_new
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.new_to_old.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.new_to_old.is_empty()
    }

    pub fn is_identity(&self) -> bool {
        self.new_to_old.iter().enumerate().all(|(i, &o)| i == o)
    }

    pub fn inverse(&self) -> Self {
        Self {
            new_to_old: self.old_to_new.clone(),
            old_to_new: self.new_to_old.clone(),
        }
    }

    /// `out[i] = src[new_to_old[i]]`.
    pub fn gather<T: Clone>(&self, src: &[T]) -> Result<Vec<T>, RenumberError> {
        if src.len() != self.len() {
            return Err(RenumberError::LengthMismatch {
                what: "gathered array",
                expected: self.len(),
                found: src.len(),
            });
        }
        Ok(self.new_to_old.iter().map(|&o| src[o].clone()).collect())
    }

    /// Consume the permutation, returning its `new_to_old` array.
    pub fn into_new_to_old(self) -> Vec<usize> {
        self.new_to_old
    }
}

impl DebugInvariants for Permutation {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Permutation");
    }

    fn validate_invariants(&self) -> Result<(), RenumberError> {
        if self.old_to_new.len() != self.new_to_old.len() {
            return Err(RenumberError::LengthMismatch {
                what: "inverse permutation",
                expected: self.new_to_old.len(),
                found: self.old_to_new.len(),
            });
        }
        for (new, &old) in self.new_to_old.iter().enumerate() {
            if self.old_to_new.get(old) != Some(&new) {
                return Err(RenumberError::InvalidPermutation(format!(
                    "inverse mismatch at new id {new}"
                )));
            }
        }
        Ok(())
    }
}
