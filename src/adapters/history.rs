use crate::domain::model::{Table, GRADE_COLUMN, THICKNESS_COLUMN, WIDTH_COLUMN};
use crate::utils::error::Result;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Tracked columns and the labels their frequencies are reported under.
pub const TRACKED_COLUMNS: [(&str, &str); 3] = [
    (GRADE_COLUMN, "Grade"),
    (THICKNESS_COLUMN, "Thickness (mm)"),
    (WIDTH_COLUMN, "Width (mm)"),
];

pub type Frequencies = BTreeMap<String, usize>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub filename: String,
    pub supplier: String,
    pub upload_date: String,
    pub rows_processed: usize,
    pub value_frequencies: BTreeMap<String, Frequencies>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryDocument {
    #[serde(default)]
    processed_files: Vec<ProcessRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_files: usize,
    pub total_rows: usize,
    pub unique_suppliers: usize,
    pub frequencies: BTreeMap<String, Frequencies>,
    pub history: Vec<ProcessRecord>,
}

/// Processing history kept in a JSON file.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a record for a processed table. Failed runs are not recorded.
    pub fn save_process_results(
        &self,
        filename: &str,
        supplier: &str,
        table: &Table,
        success: bool,
    ) -> Result<()> {
        if !success {
            return Ok(());
        }

        let value_frequencies = TRACKED_COLUMNS
            .iter()
            .map(|(column, _)| (column.to_string(), frequencies(table, column)))
            .collect();
        let record = ProcessRecord {
            filename: filename.to_string(),
            supplier: capitalize(supplier),
            upload_date: Local::now().to_rfc3339(),
            rows_processed: table.len(),
            value_frequencies,
        };

        // 讀取既有紀錄後追加
        let mut document = self.load()?;
        document.processed_files.push(record);
        self.store(&document)?;

        tracing::info!("📊 Saved processing results of {} to history", filename);
        Ok(())
    }

    pub fn get_dashboard_stats(&self) -> Result<DashboardStats> {
        let records = self.load()?.processed_files;
        if records.is_empty() {
            return Ok(DashboardStats::default());
        }

        let mut merged: BTreeMap<String, Frequencies> = TRACKED_COLUMNS
            .iter()
            .map(|(_, label)| (label.to_string(), Frequencies::new()))
            .collect();
        for record in &records {
            for (column, label) in TRACKED_COLUMNS {
                let Some(counts) = record.value_frequencies.get(column) else {
                    continue;
                };
                let target = merged.entry(label.to_string()).or_default();
                for (value, count) in counts {
                    *target.entry(value.clone()).or_insert(0) += count;
                }
            }
        }

        // 供應商名稱已在儲存時統一大小寫
        let suppliers: BTreeSet<&str> = records.iter().map(|r| r.supplier.as_str()).collect();
        Ok(DashboardStats {
            total_files: records.len(),
            total_rows: records.iter().map(|r| r.rows_processed).sum(),
            unique_suppliers: suppliers.len(),
            frequencies: merged,
            history: records,
        })
    }

    pub fn reset_database(&self) -> Result<()> {
        self.store(&HistoryDocument::default())?;
        tracing::info!("🗑️ History at {} was reset", self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<HistoryDocument> {
        if !self.path.exists() {
            return Ok(HistoryDocument::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HistoryDocument::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn store(&self, document: &HistoryDocument) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(document)?)?;
        Ok(())
    }
}

/// Value counts of a column, missing cells excluded.
fn frequencies(table: &Table, column: &str) -> Frequencies {
    let mut counts = Frequencies::new();
    for value in table.column_values(column).unwrap_or_default().into_iter().flatten() {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    counts
}

/// First character upper case, the rest lower case.
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
