use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::rolling::{DEFAULT_MAX_BACKUPS, DEFAULT_MAX_BYTES};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const OUTPUT_FORMATS: [&str; 3] = ["xlsx", "csv", "json"];
pub const LOG_FORMATS: [&str; 2] = ["compact", "json"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub pipeline: PipelineConfig,
    pub input: InputConfig,
    pub schema: SchemaConfig,
    pub columns: ColumnsConfig,
    pub transform: TransformConfig,
    pub load: LoadConfig,
    pub logging: LoggingConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub name: String,
    pub supplier: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "EMW SLExA ETL".to_string(),
            supplier: "EMW".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub directory: String,
    pub interim_directory: Option<String>,
    /// extension -> MIME type
    pub valid_file_extensions: BTreeMap<String, String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        let valid_file_extensions = [
            (
                "xlsx",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ),
            ("xls", "application/vnd.ms-excel"),
            ("csv", "text/csv"),
        ]
        .into_iter()
        .map(|(ext, mime)| (ext.to_string(), mime.to_string()))
        .collect();

        Self {
            directory: "inputs".to_string(),
            interim_directory: None,
            valid_file_extensions,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub grades_path: String,
    pub coatings_path: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            grades_path: "config/schemas/grades.json".to_string(),
            coatings_path: "config/schemas/coatings.json".to_string(),
        }
    }
}

pub const AUTO_COLUMN: &str = "auto";
pub const SAME_COLUMN: &str = "same";
pub const NO_COLUMN: &str = "none";

/// Column selection. `None` means the user did not pick a column, `"auto"`
/// detects the grade column and `"same"` reuses the grade column for
/// dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    pub grades: Option<String>,
    pub dimensions: Option<String>,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            grades: Some(AUTO_COLUMN.to_string()),
            dimensions: Some(SAME_COLUMN.to_string()),
        }
    }
}

impl ColumnsConfig {
    /// Maps a user supplied column name, treating `"none"` and blanks as
    /// "not selected".
    pub fn parse_selection(value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NO_COLUMN) {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub missing_threshold: f64,
    pub grade_threshold: f64,
    pub header_match_threshold: f64,
    pub fuzzy_grade_matching: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            missing_threshold: 0.7,
            grade_threshold: 0.2,
            header_match_threshold: 0.1,
            fuzzy_grade_matching: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub bundle: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: "outputs".to_string(),
            output_formats: vec!["xlsx".to_string()],
            bundle: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: String,
    pub max_file_bytes: u64,
    pub max_backups: usize,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            max_file_bytes: DEFAULT_MAX_BYTES,
            max_backups: DEFAULT_MAX_BACKUPS,
            format: "compact".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "dashboard_stats.json".to_string(),
        }
    }
}

impl EtlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${INPUT_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        // 驗證輸入設定
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validation::validate_path("input.directory", &self.input.directory)?;
        if let Some(interim) = &self.input.interim_directory {
            validation::validate_path("input.interim_directory", interim)?;
        }
        if self.input.valid_file_extensions.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "input.valid_file_extensions".to_string(),
            });
        }

        // 驗證知識庫路徑
        validation::validate_path("schema.grades_path", &self.schema.grades_path)?;
        validation::validate_path("schema.coatings_path", &self.schema.coatings_path)?;

        // 驗證門檻值 (0..=1)
        validation::validate_range(
            "transform.missing_threshold",
            self.transform.missing_threshold,
            0.0,
            1.0,
        )?;
        validation::validate_range(
            "transform.grade_threshold",
            self.transform.grade_threshold,
            0.0,
            1.0,
        )?;
        validation::validate_range(
            "transform.header_match_threshold",
            self.transform.header_match_threshold,
            0.0,
            1.0,
        )?;

        // 驗證輸出格式
        validation::validate_path("load.output_path", &self.load.output_path)?;
        if self.load.output_formats.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "load.output_formats".to_string(),
            });
        }
        validation::validate_one_of("load.output_formats", &self.load.output_formats, &OUTPUT_FORMATS)?;

        // 驗證日誌設定
        validation::validate_path("logging.directory", &self.logging.directory)?;
        validation::validate_positive_number("logging.max_backups", self.logging.max_backups, 1)?;
        validation::validate_one_of(
            "logging.format",
            std::slice::from_ref(&self.logging.format),
            &LOG_FORMATS,
        )?;

        if self.history.enabled {
            validation::validate_path("history.path", &self.history.path)?;
        }

        Ok(())
    }
}

impl ConfigProvider for EtlConfig {
    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.load.output_formats
    }

    fn bundle_outputs(&self) -> bool {
        self.load.bundle
    }

    fn missing_threshold(&self) -> f64 {
        self.transform.missing_threshold
    }

    fn grade_threshold(&self) -> f64 {
        self.transform.grade_threshold
    }

    fn header_match_threshold(&self) -> f64 {
        self.transform.header_match_threshold
    }

    fn fuzzy_grade_matching(&self) -> bool {
        self.transform.fuzzy_grade_matching
    }

    fn interim_directory(&self) -> Option<&str> {
        self.input.interim_directory.as_deref()
    }

    fn accepted_extensions(&self) -> &BTreeMap<String, String> {
        &self.input.valid_file_extensions
    }

    fn columns(&self) -> &ColumnsConfig {
        &self.columns
    }
}

impl Validate for EtlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = EtlConfig::from_toml_str("").unwrap();

        assert_eq!(config.transform.missing_threshold, 0.7);
        assert_eq!(config.logging.max_file_bytes, 10_485_760);
        assert_eq!(config.logging.max_backups, 20);
        assert_eq!(config.load.output_formats, vec!["xlsx".to_string()]);
        assert!(config.input.valid_file_extensions.contains_key("xlsx"));
        assert_eq!(config.columns.grades.as_deref(), Some(AUTO_COLUMN));
        assert_eq!(config.columns.dimensions.as_deref(), Some(SAME_COLUMN));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[pipeline]
name = "emw-test"
supplier = "emw"

[columns]
grades = "Materialkurztext"
dimensions = "Materialkurztext"

[transform]
missing_threshold = 0.5

[load]
output_path = "./test-output"
output_formats = ["xlsx", "csv"]
bundle = true
"#;

        let config = EtlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.pipeline.name, "emw-test");
        assert_eq!(config.columns.grades.as_deref(), Some("Materialkurztext"));
        assert_eq!(config.missing_threshold(), 0.5);
        assert_eq!(config.grade_threshold(), 0.2);
        assert!(config.bundle_outputs());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("EMW_TEST_OUTPUT_DIR", "/data/out");

        let toml_content = r#"
[load]
output_path = "${EMW_TEST_OUTPUT_DIR}"
"#;

        let config = EtlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.load.output_path, "/data/out");

        std::env::remove_var("EMW_TEST_OUTPUT_DIR");
    }

    #[test]
    fn test_config_validation_rejects_bad_values() {
        let config = EtlConfig::from_toml_str("[load]\noutput_formats = [\"pdf\"]\n").unwrap();
        assert!(config.validate().is_err());

        let config = EtlConfig::from_toml_str("[transform]\nmissing_threshold = 1.5\n").unwrap();
        assert!(config.validate().is_err());

        let config = EtlConfig::from_toml_str("[logging]\nmax_backups = 0\n").unwrap();
        assert!(config.validate().is_err());

        let mut config = EtlConfig::default();
        config.columns.grades = ColumnsConfig::parse_selection("None");
        assert!(config.columns.grades.is_none());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[pipeline]\nname = \"file-test\"\n")
            .unwrap();

        let config = EtlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.pipeline.name, "file-test");
        assert_eq!(config.pipeline.supplier, "EMW");
    }
}
