use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::models::{JobRecord, JobState, ReportStatus};
use super::pruning::{PruneStats, RetentionLimits, prune};
use crate::reports::ReportKind;

/// In-memory record of every export request and its sub-report progress
#[derive(Debug)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobRecord>>,
    limits: RetentionLimits,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new(RetentionLimits::default())
    }
}

impl JobRegistry {
    pub fn new(limits: RetentionLimits) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            limits,
        }
    }

    pub fn limits(&self) -> &RetentionLimits {
        &self.limits
    }

    /// Register a new request with every sub-report pending
    pub async fn create(&self) -> String {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now();

        let mut jobs = self.jobs.write().await;
        jobs.insert(id.clone(), JobRecord::new(now));
        let stats = prune(&mut jobs, &self.limits, now);
        drop(jobs);

        if stats.total() > 0 {
            debug!(expired = stats.expired, evicted = stats.evicted, "Pruned job registry on insert");
        }
        debug!(request_id = %id, "Registered export request");
        id
    }

    /// Current state, or all-idle for ids never seen (or already pruned)
    pub async fn state(&self, id: &str) -> JobState {
        self.jobs
            .read()
            .await
            .get(id)
            .map(|record| record.state.clone())
            .unwrap_or_else(JobState::idle)
    }

    pub async fn record(&self, id: &str) -> Option<JobRecord> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Move one sub-report forward.
    ///
    /// Returns false when the id is unknown or the sub-report already reached
    /// a terminal status; neither case changes anything.
    pub async fn set_status(&self, id: &str, kind: ReportKind, status: ReportStatus) -> bool {
        let mut jobs = self.jobs.write().await;
        let Some(record) = jobs.get_mut(id) else {
            return false;
        };

        let slot = record.state.get_mut(kind);
        if slot.is_terminal() {
            return false;
        }
        *slot = status;
        record.updated_at = Utc::now();
        true
    }

    pub async fn prune_expired(&self) -> PruneStats {
        let stats = {
            let mut jobs = self.jobs.write().await;
            prune(&mut jobs, &self.limits, Utc::now())
        };
        if stats.total() > 0 {
            info!(expired = stats.expired, evicted = stats.evicted, "Pruned job registry");
        }
        stats
    }

    pub async fn stats(&self) -> RegistryStats {
        let jobs = self.jobs.read().await;
        let complete = jobs.values().filter(|r| r.state.is_complete()).count();
        RegistryStats {
            job_count: jobs.len(),
            complete,
            in_flight: jobs.len() - complete,
        }
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub job_count: usize,
    pub complete: usize,
    pub in_flight: usize,
}
