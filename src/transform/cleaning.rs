use crate::domain::model::{Table, GENERATED_SUFFIX};
use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;

/// Textual spellings of a missing value.
pub const MISSING_MARKERS: [&str; 5] = ["nan", "NaN", "N/A", "", "None"];

/// Drops sparse rows from a header-less sheet and promotes the first
/// remaining row to the header.
///
/// A row is kept only when it has more than `floor(ncols * (1 - threshold))`
/// non-missing cells. Afterwards columns without any data and rows without
/// any data are removed.
pub fn drop_rows_with_missing_values(raw: Vec<Vec<Option<String>>>, threshold: f64) -> Result<Table> {
    let ncols = raw.iter().map(Vec::len).max().unwrap_or(0);
    let min_non_missing = (ncols as f64 * (1.0 - threshold)).floor() as usize;

    let mut kept: Vec<Vec<Option<String>>> = raw
        .into_iter()
        .filter(|row| row.iter().filter(|cell| cell.is_some()).count() > min_non_missing)
        .map(|mut row| {
            row.resize(ncols, None);
            row
        })
        .collect();

    tracing::debug!(
        "Kept {} row(s) with more than {} value(s) out of {} column(s)",
        kept.len(),
        min_non_missing,
        ncols
    );

    if kept.is_empty() {
        return Err(EtlError::ProcessingError {
            message: "No rows left after dropping rows with missing values".to_string(),
        });
    }

    let header = kept.remove(0);
    let mut table = Table::new(header_names(header), kept);

    let empty_columns: Vec<String> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(index, _)| table.rows.iter().all(|row| row[*index].is_none()))
        .map(|(_, name)| name.clone())
        .collect();
    for column in &empty_columns {
        table.remove_column(column);
    }

    table.rows.retain(|row| row.iter().any(Option::is_some));

    if table.is_empty() {
        return Err(EtlError::ProcessingError {
            message: "The sheet has a header but no data rows".to_string(),
        });
    }

    tracing::info!(
        "Table has {} row(s) and {} column(s) after cleaning",
        table.len(),
        table.columns.len()
    );
    Ok(table)
}

/// Header labels from the first row. Missing labels become `Unnamed: <i>`,
/// a trailing `_` is trimmed (that suffix marks generated columns) and
/// repeated labels get `_1`, `_2`, ... appended.
fn header_names(header: Vec<Option<String>>) -> Vec<String> {
    let mut seen = HashSet::new();
    header
        .into_iter()
        .enumerate()
        .map(|(index, cell)| {
            let label = cell.as_deref().map(str::trim).unwrap_or_default();
            let trimmed = label.trim_end_matches(GENERATED_SUFFIX).trim_end();
            if trimmed.len() != label.len() && !trimmed.is_empty() {
                tracing::warn!("Input column '{}' renamed to '{}'", label, trimmed);
            }
            let base = if trimmed.is_empty() {
                format!("Unnamed: {}", index)
            } else {
                trimmed.to_string()
            };
            let mut name = base.clone();
            let mut suffix = 1;
            while !seen.insert(name.clone()) {
                name = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            name
        })
        .collect()
}

/// Turns textual missing markers into missing cells.
pub fn standardize_missing_values(table: &mut Table) {
    let mut replaced = 0;
    for cell in table.rows.iter_mut().flatten() {
        if cell
            .as_deref()
            .is_some_and(|value| MISSING_MARKERS.contains(&value))
        {
            *cell = None;
            replaced += 1;
        }
    }
    tracing::debug!("Standardized {} missing value(s)", replaced);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::THICKNESS_COLUMN;

    fn row(cells: &[Option<&str>]) -> Vec<Option<String>> {
        cells.iter().map(|c| c.map(str::to_string)).collect()
    }

    #[test]
    fn test_drops_sparse_rows_and_promotes_header() {
        // 4 columns, threshold 0.7 -> rows need more than 1 value
        let raw = vec![
            row(&[Some("Angebot 4711"), None, None, None]),
            row(&[None, None, None, None]),
            row(&[Some("Pos"), Some("Materialkurztext"), Some("Menge"), None]),
            row(&[Some("1"), Some("DX51D+Z100 1,5x1250"), Some("5"), None]),
            row(&[Some("2"), Some("CR4 2,0x1000"), None, None]),
        ];

        let table = drop_rows_with_missing_values(raw, 0.7).unwrap();

        assert_eq!(table.columns, vec!["Pos", "Materialkurztext", "Menge"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1, "Materialkurztext"), Some("CR4 2,0x1000"));
        assert_eq!(table.get(1, "Menge"), None);
    }

    #[test]
    fn test_unnamed_and_duplicate_headers() {
        let raw = vec![
            row(&[Some("Text"), None, Some("Text")]),
            row(&[Some("a"), Some("b"), Some("c")]),
        ];

        let table = drop_rows_with_missing_values(raw, 0.7).unwrap();
        assert_eq!(table.columns, vec!["Text", "Unnamed: 1", "Text_1"]);
    }

    #[test]
    fn test_input_headers_never_end_with_generated_suffix() {
        let raw = vec![
            row(&[Some("Artikel_"), Some("Dicke_"), Some("Dicke"), Some("___")]),
            row(&[Some("4711"), Some("1,5"), Some("2,0"), Some("x")]),
        ];

        let mut table = drop_rows_with_missing_values(raw, 0.7).unwrap();
        assert_eq!(table.columns, vec!["Artikel", "Dicke", "Dicke_1", "Unnamed: 3"]);

        // 生成欄位不會覆蓋輸入資料
        table.add_column(THICKNESS_COLUMN, None);
        assert_eq!(table.get(0, "Dicke"), Some("1,5"));
        assert_eq!(table.get(0, THICKNESS_COLUMN), None);
    }

    #[test]
    fn test_empty_sheet_is_an_error() {
        let raw = vec![row(&[Some("only"), None, None, None])];
        let err = drop_rows_with_missing_values(raw, 0.7).unwrap_err();
        assert!(matches!(err, EtlError::ProcessingError { .. }));

        assert!(drop_rows_with_missing_values(Vec::new(), 0.7).is_err());
    }

    #[test]
    fn test_standardize_missing_values() {
        let mut table = Table::new(
            vec!["a".to_string(), "b".to_string()],
            vec![row(&[Some("nan"), Some("N/A")]), row(&[Some("None"), Some("DX51D")])],
        );

        standardize_missing_values(&mut table);

        assert_eq!(table.rows[0], vec![None, None]);
        assert_eq!(table.get(1, "b"), Some("DX51D"));
        assert_eq!(table.get(1, "a"), None);
    }
}
