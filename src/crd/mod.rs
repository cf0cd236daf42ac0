//! Custom Resource Definitions for the Atlas platform operator.
//!
//! `AtlasInfra` is the owning resource: a declaration of which platform
//! dependencies a namespace should have installed. `MessagingCluster` is the
//! third-party managed kind this operator creates on the owner's behalf.

mod atlas_infra;
mod messaging;
pub mod types;

#[cfg(test)]
mod tests;

pub use atlas_infra::{AtlasInfra, AtlasInfraSpec, AtlasInfraStatus, SpecValidationError};
pub use messaging::{MessagingCluster, MessagingClusterSpec, MessagingClusterStatus};
pub use types::*;
