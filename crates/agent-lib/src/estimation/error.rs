//! Estimation error types.

use thiserror::Error;

/// Raised when an allocation target is requested from an empty candidate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no suitable instances found for workload allocation")]
pub struct NoCandidatesError;
