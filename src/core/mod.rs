pub mod etl;
pub mod pipeline;

pub use crate::domain::model::{Table, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;

use crate::adapters::storage::LocalStorage;
use crate::domain::schema::KnowledgeBase;
use etl::{EtlEngine, RunOutcome};
use pipeline::ExcelPipeline;
use std::sync::Arc;

/// Runs the whole pipeline for one file on the local disk.
pub async fn pipeline_run<C: ConfigProvider>(
    config: C,
    knowledge: Arc<KnowledgeBase>,
    file_path: &str,
    monitor: bool,
) -> Result<RunOutcome> {
    let storage = LocalStorage::new(String::new());
    let pipeline = ExcelPipeline::new(storage, config, knowledge, file_path);
    EtlEngine::new_with_monitoring(pipeline, monitor).run().await
}
