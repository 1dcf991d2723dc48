//! Wire types for the report export API
//!
//! - `POST /api/v1/reports` answers with [`ExportAccepted`]
//! - `GET /api/v1/reports/{id}` answers with a [`JobState`](crate::jobs::JobState),
//!   one plain-text status per report:
//!
//! ```json
//! {
//!   "accounts": "finished in 0.02",
//!   "yearly": "starting",
//!   "fs": "failed: Ledger file not found: q1.csv"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::jobs::RegistryStats;
use crate::observability::MetricsSnapshot;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExportAccepted {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, String>,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
    pub jobs: RegistryStats,
    pub cached_files: usize,
}
