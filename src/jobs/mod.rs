//! Job registry for export requests
//!
//! Every export gets a time-ordered UUID and a [`JobState`] holding one
//! [`ReportStatus`] per sub-report. Statuses only move forward:
//!
//! ```text
//! pending -> starting -> finished in <secs>
//!                     -> failed: <reason>
//! ```
//!
//! The registry lives in process memory. Complete jobs are dropped after
//! `retention.job_ttl_secs`, and the oldest entries go once the registry
//! holds more than `retention.max_jobs`. Ids that are unknown (never issued,
//! or already pruned) read back as all-idle.

pub mod models;
pub mod pruning;
pub mod store;

pub use models::{JobRecord, JobState, ReportStatus, StatusParseError};
pub use pruning::{PruneStats, RetentionLimits};
pub use store::{JobRegistry, RegistryStats};
