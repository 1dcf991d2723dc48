use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::reports::ReportKind;

/// Progress of one sub-report, rendered as plain text on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum ReportStatus {
    /// Returned for ids the registry does not know; never stored
    Idle,
    Pending,
    Starting,
    Finished { elapsed: Duration },
    Failed { reason: String },
}

impl ReportStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReportStatus::Finished { .. } | ReportStatus::Failed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ReportStatus::Failed { .. })
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::Idle => f.write_str("idle"),
            ReportStatus::Pending => f.write_str("pending"),
            ReportStatus::Starting => f.write_str("starting"),
            ReportStatus::Finished { elapsed } => {
                write!(f, "finished in {:.2}", elapsed.as_secs_f64())
            }
            ReportStatus::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized report status: {0}")]
pub struct StatusParseError(String);

impl FromStr for ReportStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => return Ok(ReportStatus::Idle),
            "pending" => return Ok(ReportStatus::Pending),
            "starting" => return Ok(ReportStatus::Starting),
            _ => {}
        }

        if let Some(reason) = s.strip_prefix("failed: ") {
            return Ok(ReportStatus::Failed {
                reason: reason.to_string(),
            });
        }

        s.strip_prefix("finished in ")
            .and_then(|secs| secs.parse::<f64>().ok())
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .map(|elapsed| ReportStatus::Finished { elapsed })
            .ok_or_else(|| StatusParseError(s.to_string()))
    }
}

impl Serialize for ReportStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReportStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Status of the three sub-reports of one export request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobState {
    pub accounts: ReportStatus,
    pub yearly: ReportStatus,
    pub fs: ReportStatus,
}

impl JobState {
    /// Answer for unknown ids
    pub fn idle() -> Self {
        Self::uniform(ReportStatus::Idle)
    }

    pub fn pending() -> Self {
        Self::uniform(ReportStatus::Pending)
    }

    fn uniform(status: ReportStatus) -> Self {
        Self {
            accounts: status.clone(),
            yearly: status.clone(),
            fs: status,
        }
    }

    pub fn get(&self, kind: ReportKind) -> &ReportStatus {
        match kind {
            ReportKind::Accounts => &self.accounts,
            ReportKind::Yearly => &self.yearly,
            ReportKind::FinancialStatement => &self.fs,
        }
    }

    pub(crate) fn get_mut(&mut self, kind: ReportKind) -> &mut ReportStatus {
        match kind {
            ReportKind::Accounts => &mut self.accounts,
            ReportKind::Yearly => &mut self.yearly,
            ReportKind::FinancialStatement => &mut self.fs,
        }
    }

    /// All three sub-reports reached a terminal status
    pub fn is_complete(&self) -> bool {
        ReportKind::ALL.iter().all(|&kind| self.get(kind).is_terminal())
    }

    pub fn has_failures(&self) -> bool {
        ReportKind::ALL.iter().any(|&kind| self.get(kind).is_failed())
    }
}

/// Registry entry: state plus bookkeeping for retention
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: JobState::pending(),
            created_at: now,
            updated_at: now,
        }
    }
}
