//! Renumbering configuration.
//!
//! All tuning knobs are carried in an explicit [`RenumberConfig`] value that
//! is passed into [`renumber_mesh`](crate::pipeline::renumber_mesh); nothing
//! here is process-wide state. [`RenumberConfig::from_env`] is a convenience
//! for drivers that want the usual environment overrides.

use crate::mesh_error::RenumberError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Environment variable selecting the interior-face algorithm, or `off`.
pub const ENV_RENUMBER: &str = "MESH_RENUMBER";
/// Environment variable overriding the target thread count.
pub const ENV_N_THREADS: &str = "MESH_RENUMBER_N_THREADS";
/// Environment variable overriding both minimum subset sizes.
pub const ENV_MIN_SUBSET: &str = "MESH_RENUMBER_MIN_SUBSET";
/// Environment variable overriding the vector block width.
pub const ENV_VECTOR_SIZE: &str = "MESH_RENUMBER_VECTOR_SIZE";

/// Interior-face thread partitioning algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IFaceAlgorithm {
    /// Leave interior faces in their current order.
    None,
    /// Greedy independent face groups, each split evenly among threads.
    Block,
    /// Iterative cell-range splitting with rebalancing.
    #[default]
    Multipass,
}

impl fmt::Display for IFaceAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IFaceAlgorithm::None => "none",
            IFaceAlgorithm::Block => "block",
            IFaceAlgorithm::Multipass => "multipass",
        };
        f.write_str(s)
    }
}

impl FromStr for IFaceAlgorithm {
    type Err = RenumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(IFaceAlgorithm::None),
            "block" => Ok(IFaceAlgorithm::Block),
            "multipass" => Ok(IFaceAlgorithm::Multipass),
            other => Err(RenumberError::InvalidConfig(format!(
                "unknown interior face algorithm '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenumberConfig {
    /// When false, the pipeline only attaches default numberings.
    pub enabled: bool,
    /// Target worker thread count; 0 means the platform worker count.
    pub n_threads: usize,
    /// Minimum interior faces per thread per group.
    pub min_i_subset_size: usize,
    /// Minimum boundary faces per thread per group.
    pub min_b_subset_size: usize,
    pub i_face_algorithm: IFaceAlgorithm,
    /// Initial group size cap for [`IFaceAlgorithm::Block`].
    pub max_group_size: usize,
    /// Relaxation applied to multipass boundary shifts, in `(0, 1]`.
    pub multipass_relaxation: f64,
    /// Vector block width; 1 disables vectorization.
    pub vector_size: usize,
    /// Check the tentative numbering for races before committing it.
    pub verify: bool,
}

impl Default for RenumberConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            n_threads: 0,
            min_i_subset_size: 64,
            min_b_subset_size: 64,
            i_face_algorithm: IFaceAlgorithm::Multipass,
            max_group_size: 1014,
            multipass_relaxation: 0.5,
            vector_size: 1,
            verify: true,
        }
    }
}

impl RenumberConfig {
    /// Defaults overlaid with the `MESH_RENUMBER*` environment variables.
    pub fn from_env() -> Result<Self, RenumberError> {
        let mut cfg = Self::default();
        cfg.apply_env()?;
        Ok(cfg)
    }

    /// Overlay the `MESH_RENUMBER*` environment variables on `self`.
    pub fn apply_env(&mut self) -> Result<(), RenumberError> {
        if let Ok(v) = std::env::var(ENV_RENUMBER) {
            if v.trim().eq_ignore_ascii_case("off") {
                self.enabled = false;
            } else {
                self.i_face_algorithm = v.parse()?;
            }
        }
        if let Some(n) = env_usize(ENV_N_THREADS)? {
            self.n_threads = n;
        }
        if let Some(n) = env_usize(ENV_MIN_SUBSET)? {
            self.min_i_subset_size = n;
            self.min_b_subset_size = n;
        }
        if let Some(n) = env_usize(ENV_VECTOR_SIZE)? {
            self.vector_size = n;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), RenumberError> {
        if self.vector_size == 0 {
            return Err(RenumberError::InvalidConfig(
                "vector_size must be at least 1".into(),
            ));
        }
        if self.min_i_subset_size == 0 || self.min_b_subset_size == 0 {
            return Err(RenumberError::InvalidConfig(
                "minimum subset sizes must be at least 1".into(),
            ));
        }
        if self.max_group_size == 0 {
            return Err(RenumberError::InvalidConfig(
                "max_group_size must be at least 1".into(),
            ));
        }
        if !(self.multipass_relaxation > 0.0 && self.multipass_relaxation <= 1.0) {
            return Err(RenumberError::InvalidConfig(format!(
                "multipass_relaxation must lie in (0, 1], got {}",
                self.multipass_relaxation
            )));
        }
        Ok(())
    }

    /// Thread count actually used: `n_threads`, or the platform worker
    /// count when it is 0.
    pub fn effective_n_threads(&self) -> usize {
        if self.n_threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.n_threads
        }
    }
}

fn env_usize(key: &str) -> Result<Option<usize>, RenumberError> {
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| RenumberError::InvalidConfig(format!("{key}='{v}': {e}"))),
        Err(_) => Ok(None),
    }
}
