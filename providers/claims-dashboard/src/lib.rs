//! # Claims Dashboard
//!
//! Browser dashboard for insurance claims analysis. An analyst logs in,
//! uploads a claims file, and inspects metrics, threshold alerts, a regional
//! chart and the exposure to the current external event. Questions go to the
//! advisor, findings can be exported as an HTML report or sent by email.
//!
//! ## Architecture
//!
//! - **routes**: warp filters, bearer-token session guard, JSON error recovery
//! - **handlers**: one async function per endpoint
//! - **session**: per-analyst in-memory state behind an async `RwLock`
//! - **report / chart / templates**: handlebars rendering
//! - **config**: layered configuration with secrets from the environment

pub mod auth;
pub mod chart;
pub mod config;
pub mod error;
pub mod handlers;
pub mod report;
pub mod routes;
pub mod session;
pub mod state;
pub mod templates;

pub use auth::{AuthError, AuthProvider, ConfiguredCredentials, Session};
pub use config::DashboardConfig;
pub use error::DashboardError;
pub use routes::routes;
pub use session::{SessionState, SessionStore};
pub use state::AppState;
