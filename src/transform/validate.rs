use crate::domain::model::{ProcessingSummary, RunReport, Table, HIGHLIGHT_COLUMN, RED_HIGHLIGHT_COLUMN};

pub const EMPTY_OUTPUT: &str = "Die verarbeitete Tabelle ist leer.";

/// Checks the processed table and counts the rows flagged for review.
pub fn validate_output(table: &Table, report: &mut RunReport) -> (bool, ProcessingSummary) {
    let rows_processed = table.len();
    if rows_processed == 0 {
        tracing::warn!("{}", EMPTY_OUTPUT);
        report.push(EMPTY_OUTPUT);
        return (false, ProcessingSummary::default());
    }

    let yellow_rows = (0..rows_processed)
        .filter(|row| table.is_flagged(*row, HIGHLIGHT_COLUMN))
        .count();
    let red_rows = (0..rows_processed)
        .filter(|row| table.is_flagged(*row, RED_HIGHLIGHT_COLUMN))
        .count();
    let highlighted_percent = (yellow_rows + red_rows) as f64 / rows_processed as f64 * 100.0;

    tracing::info!(
        "✅ {} row(s) processed, {} yellow, {} red ({:.1}% highlighted)",
        rows_processed,
        yellow_rows,
        red_rows,
        highlighted_percent
    );

    (
        true,
        ProcessingSummary {
            rows_processed,
            yellow_rows,
            red_rows,
            highlighted_percent,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FALSE_FLAG, TRUE_FLAG};

    #[test]
    fn test_counts_highlighted_rows() {
        let flag = |v: &str| Some(v.to_string());
        let table = Table::new(
            vec![HIGHLIGHT_COLUMN.to_string(), RED_HIGHLIGHT_COLUMN.to_string()],
            vec![
                vec![flag(TRUE_FLAG), flag(FALSE_FLAG)],
                vec![flag(FALSE_FLAG), flag(TRUE_FLAG)],
                vec![flag(FALSE_FLAG), flag(FALSE_FLAG)],
                vec![flag(FALSE_FLAG), flag(FALSE_FLAG)],
            ],
        );
        let mut report = RunReport::new();

        let (status, summary) = validate_output(&table, &mut report);

        assert!(status);
        assert_eq!(summary.rows_processed, 4);
        assert_eq!(summary.yellow_rows, 1);
        assert_eq!(summary.red_rows, 1);
        assert_eq!(summary.highlighted_percent, 50.0);
        assert!(report.is_empty());
    }

    #[test]
    fn test_empty_table_fails() {
        let mut report = RunReport::new();
        let (status, summary) = validate_output(&Table::default(), &mut report);

        assert!(!status);
        assert_eq!(summary, ProcessingSummary::default());
        assert_eq!(report.errors, vec![EMPTY_OUTPUT.to_string()]);
    }
}
