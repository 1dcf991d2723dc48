use super::models::Config;
use crate::reports::ReportKind;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Artifact name for '{report}' is empty")]
    EmptyArtifactName { report: String },

    #[error("Artifact name '{name}' must be a plain file name")]
    PathLikeArtifactName { name: String },

    #[error("Artifact name '{name}' is used by more than one report")]
    DuplicateArtifactName { name: String },

    #[error("{field} must be positive")]
    ZeroLimit { field: &'static str },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_artifacts(config)?;
    validate_limits(config)?;
    Ok(())
}

fn validate_artifacts(config: &Config) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();

    for kind in ReportKind::ALL {
        let name = config.output.file_name(kind);

        if name.trim().is_empty() {
            return Err(ValidationError::EmptyArtifactName {
                report: kind.to_string(),
            });
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ValidationError::PathLikeArtifactName {
                name: name.to_string(),
            });
        }
        if !seen.insert(name) {
            return Err(ValidationError::DuplicateArtifactName {
                name: name.to_string(),
            });
        }
    }

    Ok(())
}

fn validate_limits(config: &Config) -> Result<(), ValidationError> {
    let checks = [
        ("ledger.max_file_bytes", config.ledger.max_file_bytes.as_u64() == 0),
        ("retention.max_jobs", config.retention.max_jobs == 0),
        ("retention.job_ttl_secs", config.retention.job_ttl_secs == 0),
        ("retention.cache_max_files", config.retention.cache_max_files == 0),
    ];

    match checks.into_iter().find(|(_, is_zero)| *is_zero) {
        Some((field, _)) => Err(ValidationError::ZeroLimit { field }),
        None => Ok(()),
    }
}
