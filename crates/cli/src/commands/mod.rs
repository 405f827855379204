//! CLI command implementations

pub mod allocate;
pub mod configure;
pub mod energy;
pub mod estimate;
pub mod status;
