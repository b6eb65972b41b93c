use serde::{Deserialize, Serialize};

pub const THICKNESS_COLUMN: &str = "Dicke_";
pub const WIDTH_COLUMN: &str = "Breit_";
pub const LENGTH_COLUMN: &str = "Länge_";
pub const GRADE_COLUMN: &str = "Güte_";
pub const COATING_COLUMN: &str = "Auflage_";
pub const TREATMENT_COLUMN: &str = "Oberfläche_";
pub const THICKNESS_TOLERANCE_COLUMN: &str = "Dickentoleranz_";
pub const WIDTH_TOLERANCE_COLUMN: &str = "Breitentoleranz_";
pub const LENGTH_TOLERANCE_COLUMN: &str = "Längentoleranz_";
pub const REMAINDER_COLUMN: &str = "Unmatched_Remainder_";
pub const HIGHLIGHT_COLUMN: &str = "Highlight_Row_";
pub const RED_HIGHLIGHT_COLUMN: &str = "Red_Highlight_Row_";

/// Columns generated by the pipeline end with this marker.
pub const GENERATED_SUFFIX: char = '_';

pub const TRUE_FLAG: &str = "True";
pub const FALSE_FLAG: &str = "False";

/// A sheet of text cells. `None` marks a missing cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of one column, in row order.
    pub fn column_values(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).and_then(|cell| cell.as_deref()))
                .collect(),
        )
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)?.as_deref()
    }

    /// Sets a cell; unknown columns and rows are ignored.
    pub fn set(&mut self, row: usize, column: &str, value: Option<String>) {
        if let Some(index) = self.column_index(column) {
            if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(index)) {
                *cell = value;
            }
        }
    }

    /// Appends a column filled with `fill`. Existing columns are reset to `fill`.
    /// Rows are padded or cut to the header width first.
    pub fn add_column(&mut self, name: &str, fill: Option<&str>) {
        let index = match self.column_index(name) {
            Some(index) => index,
            None => {
                self.columns.push(name.to_string());
                self.columns.len() - 1
            }
        };
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, None);
            row[index] = fill.map(str::to_string);
        }
    }

    pub fn remove_column(&mut self, name: &str) {
        if let Some(index) = self.column_index(name) {
            self.columns.remove(index);
            for row in &mut self.rows {
                if index < row.len() {
                    row.remove(index);
                }
            }
        }
    }

    pub fn is_flagged(&self, row: usize, column: &str) -> bool {
        self.get(row, column) == Some(TRUE_FLAG)
    }
}

/// Messages collected during a run and shown to the user afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub errors: Vec<String>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub rows_processed: usize,
    pub yellow_rows: usize,
    pub red_rows: usize,
    pub highlighted_percent: f64,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub table: Table,
    pub summary: ProcessingSummary,
    pub report: RunReport,
    pub status: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec!["Material".to_string(), "Menge".to_string()],
            vec![
                vec![Some("DX51D+Z100".to_string()), Some("5".to_string())],
                vec![None, Some("7".to_string())],
            ],
        )
    }

    #[test]
    fn test_column_access() {
        let table = sample();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_index("Menge"), Some(1));
        assert_eq!(table.get(0, "Material"), Some("DX51D+Z100"));
        assert_eq!(table.get(1, "Material"), None);
        assert_eq!(
            table.column_values("Menge").unwrap(),
            vec![Some("5"), Some("7")]
        );
        assert!(table.column_values("Fehlt").is_none());
    }

    #[test]
    fn test_add_and_set_column() {
        let mut table = sample();
        table.add_column(HIGHLIGHT_COLUMN, Some(FALSE_FLAG));
        table.set(1, HIGHLIGHT_COLUMN, Some(TRUE_FLAG.to_string()));

        assert!(!table.is_flagged(0, HIGHLIGHT_COLUMN));
        assert!(table.is_flagged(1, HIGHLIGHT_COLUMN));

        table.add_column(HIGHLIGHT_COLUMN, Some(FALSE_FLAG));
        assert_eq!(table.columns.len(), 3);
        assert!(!table.is_flagged(1, HIGHLIGHT_COLUMN));

        table.remove_column("Menge");
        assert_eq!(table.columns, vec!["Material", HIGHLIGHT_COLUMN]);
        assert_eq!(table.rows[0].len(), 2);
    }

    #[test]
    fn test_add_column_on_ragged_rows() {
        let mut table = Table::new(
            vec!["Material".to_string(), "Menge".to_string()],
            vec![
                vec![Some("CR4".to_string())],
                vec![Some("DC01".to_string()), Some("3".to_string()), Some("x".to_string())],
                Vec::new(),
            ],
        );

        table.add_column("Menge", Some("1"));
        table.add_column(GRADE_COLUMN, None);

        assert!(table.rows.iter().all(|row| row.len() == 3));
        assert_eq!(table.get(0, "Menge"), Some("1"));
        assert_eq!(table.get(1, GRADE_COLUMN), None);
        assert_eq!(table.get(2, "Material"), None);
    }
}
