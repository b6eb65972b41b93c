use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// One coating family, e.g. `+Z` with coatings `100`, `140` and the surface
/// treatments allowed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoatingRule {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub prefix_coating: String,
    #[serde(default)]
    pub coating: Vec<String>,
    #[serde(default)]
    pub treatment: Vec<String>,
}

/// Reference data the extractors match against.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    pub grades: Vec<String>,
    pub coatings: Vec<CoatingRule>,
}

impl KnowledgeBase {
    pub fn new(grades: Vec<String>, coatings: Vec<CoatingRule>) -> Self {
        Self { grades, coatings }
    }

    /// 從 JSON 檔案載入鋼種與鍍層資料
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(grades_path: P, coatings_path: Q) -> Result<Self> {
        let grade_entries = read_schema_array(grades_path.as_ref())?;
        let grades = load_schema_list(&grade_entries, "base_grade");

        let coating_entries = read_schema_array(coatings_path.as_ref())?;
        let coatings = coating_entries
            .into_iter()
            .map(serde_json::from_value::<CoatingRule>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| EtlError::SchemaError {
                message: format!(
                    "Invalid coating rule in {}: {}",
                    coatings_path.as_ref().display(),
                    e
                ),
            })?;

        tracing::info!(
            "📚 Knowledge base loaded: {} grades, {} coating rules",
            grades.len(),
            coatings.len()
        );

        Ok(Self { grades, coatings })
    }
}

fn read_schema_array(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path).map_err(|e| EtlError::SchemaError {
        message: format!("Schema file not found: {} ({})", path.display(), e),
    })?;
    parse_schema_array(&content).map_err(|e| match e {
        EtlError::SchemaError { message } => EtlError::SchemaError {
            message: format!("{}: {}", path.display(), message),
        },
        other => other,
    })
}

/// Parses a schema document, which must be a JSON array.
pub fn parse_schema_array(content: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Value>(content)? {
        Value::Array(entries) => Ok(entries),
        _ => Err(EtlError::SchemaError {
            message: "The schema must be a list of definitions.".to_string(),
        }),
    }
}

/// String values stored under `key`; entries without it are skipped.
pub fn load_schema_list(entries: &[Value], key: &str) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| entry.get(key))
        .filter_map(|value| value.as_str().map(str::to_string))
        .collect()
}
