use crate::adapters::{export, spreadsheet};
use crate::config::{AUTO_COLUMN, SAME_COLUMN};
use crate::core::{ConfigProvider, Pipeline, Storage, Table, TransformResult};
use crate::domain::model::RunReport;
use crate::domain::schema::KnowledgeBase;
use crate::transform::cleaning::{drop_rows_with_missing_values, standardize_missing_values};
use crate::transform::header::identify_header_name;
use crate::transform::{
    validate_output, CoatingTreatmentExtractor, ExtractorRunner, GradeExtractor,
};
use crate::utils::error::{EtlError, Result};
use crate::utils::{fs, logger};
use std::path::Path;
use std::sync::Arc;

/// Processes one supplier spreadsheet: read, extract material attributes,
/// write the highlighted result.
pub struct ExcelPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    knowledge: Arc<KnowledgeBase>,
    input_path: String,
}

impl<S: Storage, C: ConfigProvider> ExcelPipeline<S, C> {
    pub fn new(storage: S, config: C, knowledge: Arc<KnowledgeBase>, input_path: impl Into<String>) -> Self {
        Self {
            storage,
            config,
            knowledge,
            input_path: input_path.into(),
        }
    }

    pub fn input_path(&self) -> &str {
        &self.input_path
    }

    fn file_name(&self) -> String {
        Path::new(&self.input_path)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.input_path.clone())
    }

    fn file_stem(&self) -> String {
        Path::new(&self.input_path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string())
    }

    /// `<output_path>/<stem>_updated.<ext>`
    pub fn output_file(&self, extension: &str) -> String {
        let name = format!("{}_updated.{}", self.file_stem(), extension);
        Path::new(self.config.output_path())
            .join(name)
            .to_string_lossy()
            .to_string()
    }

    /// Grade and dimension columns for this table. `auto` runs column
    /// detection, `same` reuses the grade column for dimensions.
    fn resolve_columns(&self, table: &Table, report: &mut RunReport) -> (Option<String>, Option<String>) {
        let columns = self.config.columns();

        let grades = match columns.grades.as_deref() {
            Some(AUTO_COLUMN) => {
                identify_header_name(
                    table,
                    &self.knowledge.grades,
                    self.config.header_match_threshold(),
                    report,
                )
                .column
            }
            Some(column) => Some(column.to_string()),
            None => None,
        };

        let dimensions = match columns.dimensions.as_deref() {
            Some(SAME_COLUMN) | Some(AUTO_COLUMN) => grades.clone(),
            Some(column) => Some(column.to_string()),
            None => None,
        };

        tracing::info!(
            "Selected columns - grades: {:?}, dimensions: {:?}",
            grades,
            dimensions
        );
        (grades, dimensions)
    }

    fn render(&self, extension: &str, result: &TransformResult) -> Result<Vec<u8>> {
        match extension {
            "xlsx" => export::to_xlsx(&result.table),
            "csv" => export::to_csv(&result.table),
            "json" => export::to_json(&result.table, &result.summary, &result.report),
            other => Err(EtlError::InvalidConfigValueError {
                field: "load.output_formats".to_string(),
                value: other.to_string(),
                reason: "Unsupported output format".to_string(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ExcelPipeline<S, C> {
    async fn extract(&self) -> Result<Table> {
        if let Some(interim) = self.config.interim_directory() {
            fs::delete_all_files(Path::new(interim))?;
        }
        logger::route_file_logs(&self.file_name())?;
        tracing::info!("Starting processing for file: {}", self.input_path);

        tracing::info!("<< Step 1: Loading Excel file >>");
        let content = self.storage.read_file(&self.input_path).await?;
        // 副檔名與實際內容都要符合
        let extension =
            spreadsheet::check_format(&self.input_path, &content, self.config.accepted_extensions())?;
        let rows = spreadsheet::read_raw_table(&content, &extension)?;

        Ok(Table::new(Vec::new(), rows))
    }

    async fn transform(&self, data: Table) -> Result<TransformResult> {
        let mut report = RunReport::new();

        tracing::info!("<< Step 2: Dropping rows with excessive missing values >>");
        let mut table = drop_rows_with_missing_values(data.rows, self.config.missing_threshold())?;

        tracing::info!("<< Step 3: Standardizing missing values >>");
        standardize_missing_values(&mut table);

        tracing::info!("<< Step 4: Extracting grade, coating, treatment and dimensions >>");
        let (grade_column, dimension_column) = self.resolve_columns(&table, &mut report);
        let runner = ExtractorRunner::new(
            grade_column,
            dimension_column,
            GradeExtractor::new(self.knowledge.grades.clone())
                .with_fuzzy_matching(self.config.fuzzy_grade_matching()),
            CoatingTreatmentExtractor::new(self.knowledge.coatings.clone()),
            self.config.grade_threshold(),
        )?;
        runner.run_extractor(&mut table, &mut report)?;

        let (status, summary) = validate_output(&table, &mut report);
        if status {
            tracing::info!("File {} processed successfully.", self.input_path);
        }

        Ok(TransformResult {
            table,
            summary,
            report,
            status,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let mut written = Vec::new();
        for extension in self.config.output_formats() {
            let data = self.render(extension, &result)?;
            let path = self.output_file(extension);
            tracing::debug!("Writing {} ({} bytes)", path, data.len());
            self.storage.write_file(&path, &data).await?;
            written.push((path, data));
        }

        // 打包所有輸出檔案
        if self.config.bundle_outputs() {
            let entries: Vec<(String, Vec<u8>)> = written
                .iter()
                .map(|(path, data)| {
                    let name = Path::new(path)
                        .file_name()
                        .map(|name| name.to_string_lossy().to_string())
                        .unwrap_or_else(|| path.clone());
                    (name, data.clone())
                })
                .collect();
            let zip_path = self.output_file("zip");
            self.storage
                .write_file(&zip_path, &export::bundle(&entries)?)
                .await?;
            tracing::info!("📦 Bundled {} file(s) into {}", entries.len(), zip_path);
        }

        // 第一個格式為主要輸出
        written
            .into_iter()
            .next()
            .map(|(path, _)| path)
            .ok_or_else(|| EtlError::MissingConfigError {
                field: "load.output_formats".to_string(),
            })
    }
}
