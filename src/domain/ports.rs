use crate::config::ColumnsConfig;
use crate::domain::model::{Table, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn bundle_outputs(&self) -> bool;
    fn missing_threshold(&self) -> f64;
    fn grade_threshold(&self) -> f64;
    fn header_match_threshold(&self) -> f64;
    fn fuzzy_grade_matching(&self) -> bool;
    fn interim_directory(&self) -> Option<&str>;
    /// extension -> MIME type
    fn accepted_extensions(&self) -> &BTreeMap<String, String>;
    fn columns(&self) -> &ColumnsConfig;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Reads the input into a header-less raw table.
    async fn extract(&self) -> Result<Table>;
    async fn transform(&self, data: Table) -> Result<TransformResult>;
    /// Writes the outputs and returns the primary output path.
    async fn load(&self, result: TransformResult) -> Result<String>;
}
