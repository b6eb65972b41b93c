use crate::core::{Pipeline, Table};
use crate::domain::model::ProcessingSummary;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// What one run produced. `output_path` is `None` when the processed table
/// failed validation and nothing was written.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub output_path: Option<String>,
    pub table: Table,
    pub summary: ProcessingSummary,
    pub errors: Vec<String>,
    pub status: bool,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        tracing::info!("🚀 Starting ETL process...");

        tracing::debug!("Extracting data...");
        let raw_data = self.pipeline.extract().await?;
        tracing::info!("📥 Extracted {} raw row(s)", raw_data.len());
        self.monitor.log_phase("extract", raw_data.len());

        tracing::debug!("Transforming data...");
        let result = self.pipeline.transform(raw_data).await?;
        tracing::info!("🔄 Transformed {} row(s)", result.table.len());
        self.monitor.log_phase("transform", result.table.len());

        let table = result.table.clone();
        let summary = result.summary.clone();
        let errors = result.report.errors.clone();
        let status = result.status;

        let output_path = if status {
            tracing::debug!("Loading data...");
            let path = self.pipeline.load(result).await?;
            tracing::info!("📁 Output saved to: {}", path);
            self.monitor.log_phase("load", table.len());
            Some(path)
        } else {
            tracing::warn!("⚠️ Processed table is not valid, no output written");
            None
        };

        for error in &errors {
            tracing::warn!("{}", error);
        }
        self.monitor.log_final_stats();

        Ok(RunOutcome {
            output_path,
            table,
            summary,
            errors,
            status,
        })
    }
}
