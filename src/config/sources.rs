use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

pub const CONFIG_ENV_VAR: &str = "REPORTBOX_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/reportbox.toml";
const ENV_PREFIX: &str = "REPORTBOX";
const ENV_SEPARATOR: &str = "__";

/// Config file path: `REPORTBOX_CONFIG` if set, otherwise the default.
pub fn config_path() -> PathBuf {
    env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // a missing .env is normal
    let _ = dotenvy::dotenv();
    load_from_sources(config_path())
}

/// Load from a specific file plus the environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!(path = %config_path.display(), "Loading configuration");
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            path = %config_path.display(),
            "Configuration file not found, using defaults and environment overrides"
        );
    }

    // REPORTBOX__OUTPUT__DIR -> output.dir
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.output.accounts_file, "accounts.csv");
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(
            &config_path,
            r#"
[server]
bind_addr = "127.0.0.1:9000"

[ledger]
input_dir = "/srv/ledgers"
max_file_bytes = "10MB"

[output]
dir = "/srv/reports"
namespace_by_request = false
fs_file = "statement.csv"

[retention]
max_jobs = 50
job_ttl_secs = 600
cache_max_files = 8
"#,
        )
        .unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.ledger.input_dir, PathBuf::from("/srv/ledgers"));
        assert_eq!(config.ledger.max_file_bytes.as_u64(), 10 * 1024 * 1024);
        assert_eq!(config.output.dir, PathBuf::from("/srv/reports"));
        assert!(!config.output.namespace_by_request);
        assert_eq!(config.output.fs_file, "statement.csv");
        assert_eq!(config.output.yearly_file, "yearly.csv");
        assert_eq!(config.retention.max_jobs, 50);
        assert_eq!(config.retention.job_ttl_secs, 600);
        assert_eq!(config.retention.cache_max_files, 8);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "[retention\nmax_jobs = ").unwrap();

        assert!(load_from_sources(config_path).is_err());
    }

    // Env overrides are not exercised here: mutating the process
    // environment is unsafe under the parallel test runner.
}
