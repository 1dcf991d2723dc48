use crate::humanize::ByteSize;
use crate::reports::ReportKind;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080)
}

/// Where ledger files are read from
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    /// Files above this size are rejected before download
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: ByteSize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("tmp")
}

fn default_max_file_bytes() -> ByteSize {
    ByteSize::mib(64)
}

/// Where report artifacts are written
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Write under `<request id>/` instead of overwriting fixed names
    #[serde(default = "default_true")]
    pub namespace_by_request: bool,
    #[serde(default = "default_accounts_file")]
    pub accounts_file: String,
    #[serde(default = "default_yearly_file")]
    pub yearly_file: String,
    #[serde(default = "default_fs_file")]
    pub fs_file: String,
}

impl OutputConfig {
    pub fn file_name(&self, kind: ReportKind) -> &str {
        match kind {
            ReportKind::Accounts => &self.accounts_file,
            ReportKind::Yearly => &self.yearly_file,
            ReportKind::FinancialStatement => &self.fs_file,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            namespace_by_request: default_true(),
            accounts_file: default_accounts_file(),
            yearly_file: default_yearly_file(),
            fs_file: default_fs_file(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_true() -> bool {
    true
}

fn default_accounts_file() -> String {
    "accounts.csv".to_string()
}

fn default_yearly_file() -> String {
    "yearly.csv".to_string()
}

fn default_fs_file() -> String {
    "fs.csv".to_string()
}

/// Bounds on in-memory state
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,
    #[serde(default = "default_job_ttl_secs")]
    pub job_ttl_secs: u64,
    #[serde(default = "default_cache_max_files")]
    pub cache_max_files: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_jobs: default_max_jobs(),
            job_ttl_secs: default_job_ttl_secs(),
            cache_max_files: default_cache_max_files(),
        }
    }
}

fn default_max_jobs() -> usize {
    10_000
}

fn default_job_ttl_secs() -> u64 {
    86_400
}

fn default_cache_max_files() -> usize {
    1024
}
