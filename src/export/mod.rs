//! Export orchestration
//!
//! One export request runs the three reports as independent tokio tasks over
//! the same ledger location. They share the [`ParseCache`], so every ledger
//! file is read once per process no matter how many reports scan it. Each
//! task drives its own field of the request's [`JobState`] from `pending`
//! through `starting` to `finished in <secs>` or `failed: <reason>`.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::cache::ParseCache;
use crate::config::{Config, OutputConfig};
use crate::jobs::{JobRegistry, JobState, ReportStatus, RetentionLimits};
use crate::ledger::{LedgerError, LedgerSource, ParsedFile, StoredLedger};
use crate::observability::Metrics;
use crate::reports::{ReportKind, render};
use crate::storage::{StorageClient, StorageError};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// Maps a request and report to the artifact key it is written under
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    output: OutputConfig,
}

impl ArtifactLayout {
    pub fn from_config(output: &OutputConfig) -> Self {
        Self {
            output: output.clone(),
        }
    }

    /// `<request id>/<file>` when namespaced, the bare file name otherwise
    pub fn key(&self, request_id: &str, kind: ReportKind) -> String {
        let file = self.output.file_name(kind);

        if self.output.namespace_by_request {
            format!("{request_id}/{file}")
        } else {
            file.to_string()
        }
    }
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self::from_config(&OutputConfig::default())
    }
}

/// Final state of a request once every report has settled
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    pub request_id: String,
    #[serde(flatten)]
    pub state: JobState,
}

impl ExportSummary {
    pub fn has_failures(&self) -> bool {
        self.state.has_failures()
    }
}

#[derive(Clone, bon::Builder)]
pub struct ReportExporter {
    source: Arc<dyn LedgerSource>,
    cache: Arc<ParseCache>,
    artifacts: StorageClient,
    #[builder(default)]
    registry: Arc<JobRegistry>,
    #[builder(default)]
    layout: ArtifactLayout,
    #[builder(default)]
    metrics: Arc<Metrics>,
}

impl ReportExporter {
    /// Wire an exporter to the configured input and output directories
    pub fn from_config(config: &Config, metrics: Arc<Metrics>) -> Result<Self> {
        let input = StorageClient::local_existing(&config.ledger.input_dir)?;
        let artifacts = StorageClient::local(&config.output.dir)?;

        let cache = ParseCache::new(config.retention.cache_max_files, Arc::clone(&metrics));
        let registry = JobRegistry::new(RetentionLimits::from(&config.retention));

        Ok(Self::builder()
            .source(Arc::new(StoredLedger::new(input, config.ledger.max_file_bytes)))
            .cache(Arc::new(cache))
            .artifacts(artifacts)
            .registry(Arc::new(registry))
            .layout(ArtifactLayout::from_config(&config.output))
            .metrics(metrics)
            .build())
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    pub fn cache(&self) -> &Arc<ParseCache> {
        &self.cache
    }

    /// Number of ledger files visible in the input location
    pub async fn probe_input(&self) -> crate::ledger::Result<usize> {
        let names = self.source.list_files().await?;
        Ok(names
            .iter()
            .filter(|name| ReportKind::ALL.iter().any(|kind| kind.includes(name)))
            .count())
    }

    /// Register a request and run it in the background
    pub async fn start(&self) -> String {
        let request_id = self.registry.create().await;
        self.metrics.export_started();
        info!(request_id = %request_id, "Export requested");

        let exporter = self.clone();
        let id = request_id.clone();
        tokio::spawn(async move {
            exporter.run(&id).await;
        });

        request_id
    }

    /// Register a request and wait for it to settle
    pub async fn export_now(&self) -> ExportSummary {
        let request_id = self.registry.create().await;
        self.metrics.export_started();
        info!(request_id = %request_id, "Export started");
        self.run(&request_id).await
    }

    /// Run all reports of a registered request concurrently
    pub async fn run(&self, request_id: &str) -> ExportSummary {
        let tasks: Vec<_> = ReportKind::ALL
            .into_iter()
            .map(|kind| {
                let exporter = self.clone();
                let id = request_id.to_string();
                (kind, tokio::spawn(async move { exporter.run_report(&id, kind).await }))
            })
            .collect();

        for (kind, task) in tasks {
            if let Err(e) = task.await {
                error!(request_id, report = %kind, error = %e, "Report task aborted");
                self.metrics.report_failed();
                self.registry
                    .set_status(
                        request_id,
                        kind,
                        ReportStatus::Failed {
                            reason: format!("report task aborted: {e}"),
                        },
                    )
                    .await;
            }
        }

        ExportSummary {
            request_id: request_id.to_string(),
            state: self.registry.state(request_id).await,
        }
    }

    pub async fn state(&self, request_id: &str) -> JobState {
        self.registry.state(request_id).await
    }

    async fn run_report(&self, request_id: &str, kind: ReportKind) {
        self.registry
            .set_status(request_id, kind, ReportStatus::Starting)
            .await;
        let started = Instant::now();

        let status = match self.generate(request_id, kind).await {
            Ok(key) => {
                let elapsed = started.elapsed();
                self.metrics.report_finished();
                info!(
                    request_id,
                    report = %kind,
                    artifact = %key,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "Report finished"
                );
                ReportStatus::Finished { elapsed }
            }
            Err(e) => {
                self.metrics.report_failed();
                error!(request_id, report = %kind, error = %e, "Report failed");
                ReportStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        self.registry.set_status(request_id, kind, status).await;
    }

    /// Scan, compute and write one report; returns the artifact key
    async fn generate(&self, request_id: &str, kind: ReportKind) -> Result<String> {
        let files = self.scan(kind).await?;
        let body = render(&kind.compute(&files));

        let key = self.layout.key(request_id, kind);
        self.artifacts.upload(&key, Bytes::from(body)).await?;
        Ok(key)
    }

    async fn scan(&self, kind: ReportKind) -> Result<Vec<Arc<ParsedFile>>> {
        let names = self.source.list_files().await?;

        let mut files = Vec::new();
        for name in names.iter().filter(|name| kind.includes(name)) {
            files.push(self.cache.get_parsed_lines(self.source.as_ref(), name).await?);
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::ByteSize;
    use async_trait::async_trait;

    async fn ledger_with(files: &[(&str, &str)]) -> StorageClient {
        let storage = StorageClient::in_memory("ledger");
        for (name, content) in files {
            storage
                .upload(name, Bytes::from(content.to_string()))
                .await
                .unwrap();
        }
        storage
    }

    fn exporter(input: StorageClient, artifacts: StorageClient, layout: ArtifactLayout) -> ReportExporter {
        let metrics = Arc::new(Metrics::new());
        ReportExporter::builder()
            .source(Arc::new(StoredLedger::new(input, ByteSize::mib(1))))
            .cache(Arc::new(ParseCache::new(16, Arc::clone(&metrics))))
            .artifacts(artifacts)
            .layout(layout)
            .metrics(metrics)
            .build()
    }

    async fn artifact(storage: &StorageClient, key: &str) -> String {
        String::from_utf8(storage.download(key).await.unwrap().to_vec()).unwrap()
    }

    #[test]
    fn test_layout_keys() {
        let layout = ArtifactLayout::default();
        assert_eq!(layout.key("abc", ReportKind::Accounts), "abc/accounts.csv");
        assert_eq!(layout.key("abc", ReportKind::FinancialStatement), "abc/fs.csv");

        let legacy = ArtifactLayout::from_config(&OutputConfig {
            namespace_by_request: false,
            ..OutputConfig::default()
        });
        assert_eq!(legacy.key("abc", ReportKind::Yearly), "yearly.csv");

        let renamed = ArtifactLayout::from_config(&OutputConfig {
            accounts_file: "balances.csv".to_string(),
            ..OutputConfig::default()
        });
        assert_eq!(renamed.key("abc", ReportKind::Accounts), "abc/balances.csv");
    }

    #[tokio::test]
    async fn test_probe_input_counts_ledger_files() {
        let input = ledger_with(&[
            ("a.csv", "2023-01-01,Cash,,100,0"),
            ("fs.csv", "2023-01-01,Cash,,1,0"),
            ("notes.txt", "not a ledger"),
            ("B.CSV", "2023-01-01,Cash,,1,0"),
        ])
        .await;
        let exporter = exporter(input, StorageClient::in_memory("out"), ArtifactLayout::default());

        assert_eq!(exporter.probe_input().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_export_writes_all_reports() {
        let input = ledger_with(&[("a.csv", "2023-01-01,Cash,,100,0")]).await;
        let out = StorageClient::in_memory("out");
        let exporter = exporter(input, out.clone(), ArtifactLayout::default());

        let summary = exporter.export_now().await;

        assert!(summary.state.is_complete());
        assert!(!summary.has_failures());
        assert!(summary.state.accounts.to_string().starts_with("finished in "));

        let id = &summary.request_id;
        assert_eq!(
            artifact(&out, &format!("{id}/accounts.csv")).await,
            "Account,Balance\nCash,100.00"
        );
        assert_eq!(
            artifact(&out, &format!("{id}/yearly.csv")).await,
            "Financial Year,Cash Balance\n2023,100.00"
        );
        assert!(
            artifact(&out, &format!("{id}/fs.csv"))
                .await
                .starts_with("Basic Financial Statement\n")
        );
    }

    #[tokio::test]
    async fn test_each_file_read_once_per_export() {
        let input = ledger_with(&[
            ("a.csv", "2023-01-01,Cash,,100,0"),
            ("b.csv", "2023-02-01,Cash,,0,40"),
            ("notes.txt", "not a ledger"),
        ])
        .await;
        let exporter = exporter(input, StorageClient::in_memory("out"), ArtifactLayout::default());

        exporter.export_now().await;

        let metrics = exporter.metrics().snapshot();
        assert_eq!(metrics.cache_misses, 2);
        assert_eq!(metrics.cache_hits, 4);
        assert_eq!(metrics.reports_finished, 3);
    }

    #[tokio::test]
    async fn test_previous_outputs_are_skipped_by_their_reports() {
        let input = ledger_with(&[
            ("a.csv", "2023-01-01,Cash,,100,0"),
            ("yearly.csv", "2020-01-01,Cash,,5,0"),
        ])
        .await;
        let out = StorageClient::in_memory("out");
        let exporter = exporter(input, out.clone(), ArtifactLayout::default());

        let id = exporter.export_now().await.request_id;

        assert_eq!(
            artifact(&out, &format!("{id}/yearly.csv")).await,
            "Financial Year,Cash Balance\n2023,100.00"
        );
        assert_eq!(
            artifact(&out, &format!("{id}/accounts.csv")).await,
            "Account,Balance\nCash,105.00"
        );
    }

    #[tokio::test]
    async fn test_legacy_layout_overwrites() {
        let input = ledger_with(&[("a.csv", "2023-01-01,Cash,,100,0")]).await;
        let out = StorageClient::in_memory("out");
        let layout = ArtifactLayout::from_config(&OutputConfig {
            namespace_by_request: false,
            ..OutputConfig::default()
        });
        let exporter = exporter(input, out.clone(), layout);

        exporter.export_now().await;
        exporter.export_now().await;

        let mut names: Vec<_> = out.list().await.unwrap().into_iter().map(|e| e.name).collect();
        names.sort();
        assert_eq!(names, vec!["accounts.csv", "fs.csv", "yearly.csv"]);
    }

    struct BrokenSource;

    #[async_trait]
    impl LedgerSource for BrokenSource {
        fn location(&self) -> &str {
            "memory://broken"
        }

        async fn list_files(&self) -> crate::ledger::Result<Vec<String>> {
            Ok(vec!["gone.csv".to_string()])
        }

        async fn read_file(&self, name: &str) -> crate::ledger::Result<String> {
            Err(LedgerError::NotFound(name.to_string()))
        }
    }

    #[tokio::test]
    async fn test_read_failure_is_reported() {
        let metrics = Arc::new(Metrics::new());
        let exporter = ReportExporter::builder()
            .source(Arc::new(BrokenSource))
            .cache(Arc::new(ParseCache::new(4, Arc::clone(&metrics))))
            .artifacts(StorageClient::in_memory("out"))
            .metrics(Arc::clone(&metrics))
            .build();

        let summary = exporter.export_now().await;

        assert!(summary.has_failures());
        for kind in ReportKind::ALL {
            assert_eq!(
                summary.state.get(kind).to_string(),
                "failed: Ledger file not found: gone.csv"
            );
        }
        assert_eq!(metrics.snapshot().reports_failed, 3);
    }

    #[tokio::test]
    async fn test_start_returns_before_completion() {
        let input = ledger_with(&[("a.csv", "2023-01-01,Cash,,100,0")]).await;
        let exporter = exporter(input, StorageClient::in_memory("out"), ArtifactLayout::default());

        let id = exporter.start().await;
        let state = exporter.state(&id).await;
        for kind in ReportKind::ALL {
            assert_ne!(state.get(kind), &ReportStatus::Idle);
        }

        for _ in 0..200 {
            if exporter.state(&id).await.is_complete() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert!(exporter.state(&id).await.is_complete());
    }

    #[tokio::test]
    async fn test_summary_json_is_flat() {
        let exporter = exporter(
            ledger_with(&[]).await,
            StorageClient::in_memory("out"),
            ArtifactLayout::default(),
        );
        let summary = exporter.export_now().await;
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["request_id"], summary.request_id.as_str());
        assert!(value["fs"].as_str().unwrap().starts_with("finished in "));
    }
}
