//! Atlas-K8s: Kubernetes operator for Atlas platform infrastructure
//!
//! This crate provides a Kubernetes operator that converges managed platform
//! dependencies (currently the messaging cluster) to the state declared by
//! AtlasInfra resources.

pub mod controller;
pub mod crd;
pub mod error;
pub mod telemetry;

pub use crate::error::{Error, Result};
