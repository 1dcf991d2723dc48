use std::sync::Arc;

use crate::config::Config;
use crate::export::ReportExporter;
use crate::observability::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub exporter: ReportExporter,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Shares the exporter's metrics so HTTP and export counters agree
    pub fn new(config: Config, exporter: ReportExporter) -> Self {
        let metrics = Arc::clone(exporter.metrics());
        Self {
            config: Arc::new(config),
            exporter,
            metrics,
        }
    }
}
