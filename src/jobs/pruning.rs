//! Retention policy for the in-memory job registry
use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use super::models::JobRecord;
use crate::config::RetentionConfig;

pub const DEFAULT_MAX_JOBS: usize = 10_000;
pub const DEFAULT_JOB_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Bounds applied whenever the registry is pruned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionLimits {
    /// Upper bound on stored jobs; at least 1
    pub max_jobs: usize,
    /// Age after which a complete job may be dropped
    pub job_ttl: Duration,
}

impl Default for RetentionLimits {
    fn default() -> Self {
        Self {
            max_jobs: DEFAULT_MAX_JOBS,
            job_ttl: DEFAULT_JOB_TTL,
        }
    }
}

impl From<&RetentionConfig> for RetentionLimits {
    fn from(config: &RetentionConfig) -> Self {
        Self {
            max_jobs: config.max_jobs.max(1),
            job_ttl: Duration::from_secs(config.job_ttl_secs),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PruneStats {
    /// Complete jobs older than the TTL
    pub expired: usize,
    /// Jobs dropped to get back under `max_jobs`
    pub evicted: usize,
}

impl PruneStats {
    pub fn total(&self) -> usize {
        self.expired + self.evicted
    }
}

/// Drop expired jobs, then the oldest ones while over capacity.
///
/// Jobs still in flight never expire. Capacity eviction prefers complete
/// jobs and only touches running ones when nothing else is left.
pub fn prune(
    jobs: &mut HashMap<String, JobRecord>,
    limits: &RetentionLimits,
    now: DateTime<Utc>,
) -> PruneStats {
    let mut stats = PruneStats::default();

    let ttl = TimeDelta::from_std(limits.job_ttl).unwrap_or(TimeDelta::MAX);
    let before = jobs.len();
    jobs.retain(|_, record| {
        !(record.state.is_complete() && now.signed_duration_since(record.updated_at) > ttl)
    });
    stats.expired = before - jobs.len();

    let max_jobs = limits.max_jobs.max(1);
    if jobs.len() > max_jobs {
        let mut order: Vec<(bool, DateTime<Utc>, String)> = jobs
            .iter()
            .map(|(id, record)| (!record.state.is_complete(), record.created_at, id.clone()))
            .collect();
        order.sort();

        let excess = jobs.len() - max_jobs;
        for (_, _, id) in order.into_iter().take(excess) {
            jobs.remove(&id);
        }
        stats.evicted = excess;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::models::ReportStatus;
    use crate::reports::ReportKind;

    fn finished(mut record: JobRecord) -> JobRecord {
        for kind in ReportKind::ALL {
            *record.state.get_mut(kind) = ReportStatus::Finished {
                elapsed: Duration::from_millis(5),
            };
        }
        record
    }

    fn limits(max_jobs: usize, ttl_secs: u64) -> RetentionLimits {
        RetentionLimits {
            max_jobs,
            job_ttl: Duration::from_secs(ttl_secs),
        }
    }

    #[test]
    fn test_expires_only_complete_jobs() {
        let now = Utc::now();
        let old = now - TimeDelta::seconds(120);

        let mut jobs = HashMap::new();
        jobs.insert("done".to_string(), finished(JobRecord::new(old)));
        jobs.insert("running".to_string(), JobRecord::new(old));
        jobs.insert("fresh".to_string(), finished(JobRecord::new(now)));

        let stats = prune(&mut jobs, &limits(100, 60), now);

        assert_eq!(stats, PruneStats { expired: 1, evicted: 0 });
        assert!(!jobs.contains_key("done"));
        assert!(jobs.contains_key("running"));
        assert!(jobs.contains_key("fresh"));
    }

    #[test]
    fn test_capacity_evicts_complete_jobs_first() {
        let now = Utc::now();
        let mut jobs = HashMap::new();
        jobs.insert(
            "old-running".to_string(),
            JobRecord::new(now - TimeDelta::seconds(30)),
        );
        jobs.insert(
            "old-done".to_string(),
            finished(JobRecord::new(now - TimeDelta::seconds(20))),
        );
        jobs.insert(
            "new-done".to_string(),
            finished(JobRecord::new(now - TimeDelta::seconds(10))),
        );

        let stats = prune(&mut jobs, &limits(2, 3600), now);

        assert_eq!(stats.evicted, 1);
        assert!(!jobs.contains_key("old-done"));
        assert!(jobs.contains_key("old-running"));

        let stats = prune(&mut jobs, &limits(1, 3600), now);
        assert_eq!(stats.total(), 1);
        assert!(jobs.contains_key("old-running"));
    }

    #[test]
    fn test_running_jobs_evicted_when_nothing_else_left() {
        let now = Utc::now();
        let mut jobs = HashMap::new();
        jobs.insert("a".to_string(), JobRecord::new(now - TimeDelta::seconds(2)));
        jobs.insert("b".to_string(), JobRecord::new(now - TimeDelta::seconds(1)));

        prune(&mut jobs, &limits(1, 3600), now);

        assert_eq!(jobs.len(), 1);
        assert!(jobs.contains_key("b"));
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let now = Utc::now();
        let mut jobs = HashMap::new();
        jobs.insert(
            "done".to_string(),
            finished(JobRecord::new(now - TimeDelta::days(365))),
        );

        let stats = prune(&mut jobs, &limits(10, u64::MAX), now);
        assert_eq!(stats.total(), 0);
    }
}
