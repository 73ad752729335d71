//! Shared claims dashboard contracts.
//!
//! This crate is the Rust source of truth for the JSON shapes exchanged between
//! the analytics pipeline, the advisor provider, the email provider and the
//! dashboard HTTP API.

pub mod advisor;
pub mod analysis;
pub mod claim;
pub mod policy;

pub use advisor::*;
pub use analysis::*;
pub use claim::*;
pub use policy::*;
