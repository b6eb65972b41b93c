use crate::adapters::spreadsheet::format_number;
use crate::domain::model::{
    ProcessingSummary, RunReport, Table, COATING_COLUMN, GENERATED_SUFFIX, GRADE_COLUMN,
    HIGHLIGHT_COLUMN, LENGTH_COLUMN, RED_HIGHLIGHT_COLUMN, THICKNESS_COLUMN, TREATMENT_COLUMN,
    WIDTH_COLUMN,
};
use crate::utils::error::{EtlError, Result};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet};
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const SHEET_NAME: &str = "Sheet1";
pub const YELLOW: u32 = 0xFFFF00;
pub const RED: u32 = 0xFF9999;

/// Extracted columns, in the order they follow the original columns.
pub const EXTRACTED_COLUMNS: [&str; 6] = [
    THICKNESS_COLUMN,
    WIDTH_COLUMN,
    LENGTH_COLUMN,
    GRADE_COLUMN,
    COATING_COLUMN,
    TREATMENT_COLUMN,
];

const INVALID_VALUES: [&str; 5] = ["nan", "inf", "-inf", "none", "null"];

/// Worksheet limits of the xlsx format.
pub const MAX_XLSX_ROWS: usize = 1_048_576;
pub const MAX_XLSX_COLUMNS: usize = 16_384;

/// Original columns first, then the extracted ones, then other generated columns.
pub fn order_columns(table: &Table) -> Table {
    let mut order: Vec<&str> = table
        .columns
        .iter()
        .map(String::as_str)
        .filter(|name| !name.ends_with(GENERATED_SUFFIX))
        .collect();
    order.extend(EXTRACTED_COLUMNS.iter().filter(|name| table.has_column(name)));
    order.extend(
        table
            .columns
            .iter()
            .map(String::as_str)
            .filter(|name| name.ends_with(GENERATED_SUFFIX) && !EXTRACTED_COLUMNS.contains(name)),
    );

    let indices: Vec<usize> = order
        .iter()
        .filter_map(|name| table.column_index(name))
        .collect();

    Table::new(
        indices.iter().map(|i| table.columns[*i].clone()).collect(),
        table
            .rows
            .iter()
            .map(|row| indices.iter().map(|i| row.get(*i).cloned().flatten()).collect())
            .collect(),
    )
}

/// Blanks out textual NaN/inf/null markers and drops columns left without values.
pub fn sanitize(table: &Table) -> Table {
    let mut cleaned = table.clone();
    for cell in cleaned.rows.iter_mut().flatten() {
        let invalid = cell
            .as_deref()
            .is_some_and(|value| INVALID_VALUES.contains(&value.trim().to_lowercase().as_str()));
        if invalid {
            *cell = None;
        }
    }

    let empty: Vec<String> = cleaned
        .columns
        .iter()
        .enumerate()
        .filter(|(index, _)| cleaned.rows.iter().all(|row| row.get(*index).cloned().flatten().is_none()))
        .map(|(_, name)| name.clone())
        .collect();
    for column in &empty {
        cleaned.remove_column(column);
    }
    cleaned
}

/// The table as it is written to disk.
pub fn prepare(table: &Table) -> Table {
    order_columns(&sanitize(table))
}

/// Writes the workbook with a bold header. Rows flagged for review are filled
/// yellow, rows without a grade red; red takes precedence.
pub fn to_xlsx(table: &Table) -> Result<Vec<u8>> {
    // 標記欄位會在 prepare 之後被移除，先讀出來
    let yellow_rows: Vec<bool> = (0..table.len())
        .map(|row| table.is_flagged(row, HIGHLIGHT_COLUMN))
        .collect();
    let red_rows: Vec<bool> = (0..table.len())
        .map(|row| table.is_flagged(row, RED_HIGHLIGHT_COLUMN))
        .collect();
    let table = prepare(table);
    if table.columns.len() > MAX_XLSX_COLUMNS || table.len() + 1 > MAX_XLSX_ROWS {
        return Err(EtlError::ProcessingError {
            message: format!(
                "Table with {} row(s) and {} column(s) does not fit into an xlsx sheet ({} x {})",
                table.len(),
                table.columns.len(),
                MAX_XLSX_ROWS,
                MAX_XLSX_COLUMNS
            ),
        });
    }

    let header_format = Format::new().set_bold();
    let yellow_format = Format::new()
        .set_background_color(Color::RGB(YELLOW))
        .set_border(FormatBorder::Thin);
    let red_format = Format::new()
        .set_background_color(Color::RGB(RED))
        .set_border(FormatBorder::Thin);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, column_number(col)?, name, &header_format)?;
    }

    for (index, row) in table.rows.iter().enumerate() {
        let excel_row = u32::try_from(index + 1).map_err(|_| EtlError::ProcessingError {
            message: format!("Row {} is out of range for xlsx", index + 1),
        })?;
        // 紅色優先於黃色
        let format = if red_rows[index] {
            Some(&red_format)
        } else if yellow_rows[index] {
            Some(&yellow_format)
        } else {
            None
        };

        for (col, cell) in row.iter().enumerate() {
            write_cell(worksheet, excel_row, column_number(col)?, cell.as_deref(), format)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn column_number(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| EtlError::ProcessingError {
        message: format!("Column {} is out of range for xlsx", col),
    })
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<&str>,
    format: Option<&Format>,
) -> Result<()> {
    match (value, format) {
        (Some(value), Some(format)) => match as_number(value) {
            Some(number) => {
                worksheet.write_number_with_format(row, col, number, format)?;
            }
            None => {
                worksheet.write_string_with_format(row, col, value, format)?;
            }
        },
        (Some(value), None) => match as_number(value) {
            Some(number) => {
                worksheet.write_number(row, col, number)?;
            }
            None => {
                worksheet.write_string(row, col, value)?;
            }
        },
        (None, Some(format)) => {
            worksheet.write_blank(row, col, format)?;
        }
        (None, None) => {}
    }
    Ok(())
}

/// Cells that were numbers in the input go back out as numbers.
fn as_number(value: &str) -> Option<f64> {
    let number = value.parse::<f64>().ok()?;
    (format_number(number).as_deref() == Some(value)).then_some(number)
}

pub fn to_csv(table: &Table) -> Result<Vec<u8>> {
    let table = prepare(table);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or_default()))?;
    }
    writer.into_inner().map_err(|e| e.into_error().into())
}

#[derive(Debug, Serialize)]
struct JsonDocument<'a> {
    summary: &'a ProcessingSummary,
    errors: &'a [String],
    rows: Vec<Map<String, Value>>,
}

pub fn to_json(table: &Table, summary: &ProcessingSummary, report: &RunReport) -> Result<Vec<u8>> {
    let table = prepare(table);
    let rows: Vec<Map<String, Value>> = table
        .rows
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .zip(row)
                .map(|(column, cell)| {
                    let value = cell.clone().map(Value::String).unwrap_or(Value::Null);
                    (column.clone(), value)
                })
                .collect::<Map<String, Value>>()
        })
        .collect();

    let document = JsonDocument {
        summary,
        errors: &report.errors,
        rows,
    };
    Ok(serde_json::to_vec_pretty(&document)?)
}

/// Zips already rendered output files.
pub fn bundle(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(data)?;
    }
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FALSE_FLAG, REMAINDER_COLUMN, TRUE_FLAG};
    use calamine::{open_workbook_auto_from_rs, Data, Reader};
    use std::io::{Cursor, Read};

    fn processed() -> Table {
        let cell = |v: &str| Some(v.to_string());
        Table::new(
            vec![
                "Materialkurztext".to_string(),
                GRADE_COLUMN.to_string(),
                HIGHLIGHT_COLUMN.to_string(),
                RED_HIGHLIGHT_COLUMN.to_string(),
                THICKNESS_COLUMN.to_string(),
                "Menge".to_string(),
                REMAINDER_COLUMN.to_string(),
                "Leer".to_string(),
            ],
            vec![
                vec![cell("DX51D+Z100MB 0,75x1250"), cell("DX51D+Z"), cell(FALSE_FLAG), cell(FALSE_FLAG), cell("0,75"), cell("5"), cell(""), None],
                vec![cell("DX51D+Z100 MA Bondal"), cell("DX51D+Z"), cell(TRUE_FLAG), cell(FALSE_FLAG), None, cell("nan"), cell("bondal"), None],
                vec![cell("Kupfer 1,0x200"), None, cell(FALSE_FLAG), cell(TRUE_FLAG), cell("1,0"), cell("2.5"), None, cell("NULL")],
            ],
        )
    }

    #[test]
    fn test_order_and_sanitize() {
        let table = prepare(&processed());

        assert_eq!(
            table.columns,
            vec![
                "Materialkurztext",
                "Menge",
                THICKNESS_COLUMN,
                GRADE_COLUMN,
                HIGHLIGHT_COLUMN,
                RED_HIGHLIGHT_COLUMN,
                REMAINDER_COLUMN,
            ]
        );
        assert_eq!(table.get(1, "Menge"), None);
    }

    #[test]
    fn test_to_xlsx_highlights_rows() {
        let bytes = to_xlsx(&processed()).unwrap();

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.clone())).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(range.get((0, 0)), Some(&Data::String("Materialkurztext".to_string())));
        assert_eq!(range.get((1, 1)), Some(&Data::Float(5.0)));
        assert_eq!(range.get((1, 2)), Some(&Data::String("0,75".to_string())));

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut styles = String::new();
        archive
            .by_name("xl/styles.xml")
            .unwrap()
            .read_to_string(&mut styles)
            .unwrap();
        assert!(styles.contains("FFFFFF00"));
        assert!(styles.contains("FFFF9999"));
    }

    #[test]
    fn test_to_xlsx_rejects_tables_wider_than_a_sheet() {
        let columns: Vec<String> = (0..=MAX_XLSX_COLUMNS).map(|i| format!("c{}", i)).collect();
        let row = vec![Some("1".to_string()); columns.len()];
        let table = Table::new(columns, vec![row]);

        let err = to_xlsx(&table).unwrap_err();
        assert!(matches!(err, EtlError::ProcessingError { .. }));
        assert!(column_number(usize::from(u16::MAX) + 1).is_err());
        assert_eq!(column_number(3).unwrap(), 3);
    }

    #[test]
    fn test_to_csv() {
        let csv = String::from_utf8(to_csv(&processed()).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Materialkurztext,Menge,Dicke_,Güte_,Highlight_Row_,Red_Highlight_Row_,Unmatched_Remainder_")
        );
        assert_eq!(lines.next(), Some("\"DX51D+Z100MB 0,75x1250\",5,\"0,75\",DX51D+Z,False,False,"));
    }

    #[test]
    fn test_to_json() {
        let summary = ProcessingSummary {
            rows_processed: 3,
            yellow_rows: 1,
            red_rows: 1,
            highlighted_percent: 200.0 / 3.0,
        };
        let report = RunReport {
            errors: vec!["Hinweis".to_string()],
        };
        let value: Value = serde_json::from_slice(&to_json(&processed(), &summary, &report).unwrap()).unwrap();

        assert_eq!(value["summary"]["red_rows"], 1);
        assert_eq!(value["errors"][0], "Hinweis");
        assert_eq!(value["rows"][2]["Güte_"], Value::Null);
        assert_eq!(value["rows"][1]["Unmatched_Remainder_"], "bondal");
    }

    #[test]
    fn test_bundle() {
        let bytes = bundle(&[
            ("a_updated.csv".to_string(), b"a\n".to_vec()),
            ("a_updated.json".to_string(), b"{}".to_vec()),
        ])
        .unwrap();

        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
    }
}
