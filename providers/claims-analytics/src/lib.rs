//! Claims dataset loading and analysis.
//!
//! The pipeline runs loader → metrics → alerts → exposure. Every stage is a pure
//! function over an immutable [`ClaimsTable`].

pub mod alerts;
pub mod error;
pub mod exposure;
pub mod loader;
pub mod metrics;
pub mod registry;
pub mod snapshot;
pub mod table;

pub use alerts::{filter_alerts, ThresholdRange, DEFAULT_ALERT_THRESHOLD};
pub use error::{AnalysisError, UnreadableFile};
pub use exposure::estimate_exposure;
pub use loader::{load_claims, DatasetFormat, LoadLimits};
pub use metrics::{average_amount, compute_metrics, region_totals};
pub use registry::{EventFeed, PolicyRegistry, RegistryError, StaticEventFeed, StaticPolicyRegistry};
pub use snapshot::AnalysisSnapshot;
pub use table::ClaimsTable;
