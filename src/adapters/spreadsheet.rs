use crate::utils::error::{EtlError, Result};
use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Header-less sheet content; `None` marks an empty cell.
pub type RawRows = Vec<Vec<Option<String>>>;

const OLE_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const XLSX_REQUIRED_PARTS: [&str; 2] = ["[Content_Types].xml", "xl/workbook.xml"];

/// Lowercased extension of `path`, if any.
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Checks that a file's extension is accepted and that its content really is
/// of that type. Returns the extension.
pub fn check_format(
    file_name: &str,
    content: &[u8],
    accepted: &BTreeMap<String, String>,
) -> Result<String> {
    let unsupported = |reason: String| EtlError::UnsupportedFileType {
        path: file_name.to_string(),
        reason,
    };

    let extension = file_extension(Path::new(file_name))
        .ok_or_else(|| unsupported("file has no extension".to_string()))?;
    if !accepted.contains_key(&extension) {
        let known: Vec<&str> = accepted.keys().map(String::as_str).collect();
        return Err(unsupported(format!(
            "extension '{}' is not accepted (allowed: {})",
            extension,
            known.join(", ")
        )));
    }

    // 檢查檔案內容是否符合副檔名
    let content_ok = match extension.as_str() {
        "xlsx" | "xlsm" => is_xlsx_package(content),
        "xls" => content.starts_with(&OLE_SIGNATURE),
        "csv" => !content.is_empty() && std::str::from_utf8(content).is_ok(),
        _ => true,
    };
    if !content_ok {
        return Err(unsupported(format!(
            "content does not match the '{}' format",
            extension
        )));
    }

    Ok(extension)
}

fn is_xlsx_package(content: &[u8]) -> bool {
    match zip::ZipArchive::new(Cursor::new(content)) {
        Ok(archive) => XLSX_REQUIRED_PARTS
            .iter()
            .all(|part| archive.file_names().any(|name| name == *part)),
        Err(_) => false,
    }
}

pub fn is_valid_format(path: &Path, accepted: &BTreeMap<String, String>) -> bool {
    let file_name = path.to_string_lossy();
    match fs::read(path) {
        Ok(content) => match check_format(&file_name, &content, accepted) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("File {} is not a valid file type: {}", file_name, e);
                false
            }
        },
        Err(e) => {
            tracing::warn!("Could not read {}: {}", file_name, e);
            false
        }
    }
}

/// Regular files in `dir` that pass [`is_valid_format`], sorted by name.
pub fn generate_path_list(dir: &Path, accepted: &BTreeMap<String, String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_valid_format(&path, accepted) {
            paths.push(path);
        }
    }
    paths.sort();

    tracing::info!("📂 Found {} valid file(s) in {}", paths.len(), dir.display());
    Ok(paths)
}

/// Reads the first worksheet (or the CSV document) without a header row.
pub fn read_raw_table(content: &[u8], extension: &str) -> Result<RawRows> {
    let rows = match extension {
        "csv" => read_csv_rows(content)?,
        _ => read_workbook_rows(content)?,
    };

    tracing::info!(
        "Raw table created successfully with the shape: ({}, {})",
        rows.len(),
        rows.iter().map(Vec::len).max().unwrap_or(0)
    );
    Ok(rows)
}

fn read_workbook_rows(content: &[u8]) -> Result<RawRows> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(content.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| EtlError::ProcessingError {
            message: "The workbook has no worksheet".to_string(),
        })??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_text).collect())
        .collect())
}

fn read_csv_rows(content: &[u8]) -> Result<RawRows> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(sniff_delimiter(content))
        .from_reader(content);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    let field = field.trim();
                    (!field.is_empty()).then(|| field.to_string())
                })
                .collect(),
        );
    }
    Ok(rows)
}

/// `;` when the first line has more semicolons than commas, as in German exports.
fn sniff_delimiter(content: &[u8]) -> u8 {
    let first_line = content.split(|b| *b == b'\n').next().unwrap_or_default();
    let count = |needle: u8| first_line.iter().filter(|b| **b == needle).count();
    if count(b';') > count(b',') {
        b';'
    } else {
        b','
    }
}

pub fn cell_to_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(value) => Some(value.clone()),
        Data::Float(value) => format_number(*value),
        Data::Int(value) => Some(value.to_string()),
        Data::Bool(value) => Some(if *value { "True" } else { "False" }.to_string()),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        other => Some(other.to_string()),
    }
}

/// Renders a number the way it is shown in the sheet: integral values without
/// a fractional part. NaN and infinities count as missing.
pub fn format_number(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        Some(format!("{}", value as i64))
    } else {
        Some(format!("{}", value))
    }
}
