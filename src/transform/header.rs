use crate::domain::model::{RunReport, Table};

fn compact_lower(value: &str) -> String {
    value.replace(' ', "").to_lowercase()
}

/// How much of `cell` is taken up by `base_grade`. Exact matches are halved
/// and tiny ratios (a grade inside a long text) are damped.
pub fn calculate_match_ratio(base_grade: &str, cell: &str) -> f64 {
    let base_grade = compact_lower(base_grade);
    let cell = compact_lower(cell);

    let cell_len = cell.chars().count();
    if cell_len == 0 {
        return 0.0;
    }

    let ratio = base_grade.chars().count() as f64 / cell_len as f64;
    let ratio = if ratio == 1.0 {
        ratio * 0.5
    } else if ratio < 0.2 {
        ratio * 0.7
    } else {
        ratio
    };
    ratio.max(0.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMatch {
    pub column: Option<String>,
    pub score: f64,
}

impl HeaderMatch {
    pub fn found(&self) -> bool {
        self.column.is_some()
    }
}

/// Finds the column that most looks like a grade description column.
pub fn identify_header_name(
    table: &Table,
    base_grades: &[String],
    threshold: f64,
    report: &mut RunReport,
) -> HeaderMatch {
    let grades: Vec<String> = base_grades
        .iter()
        .map(|grade| compact_lower(grade))
        .filter(|grade| grade.chars().count() > 3)
        .collect();

    let mut best_column = None;
    let mut max_score = 0.0;

    for (index, column) in table.columns.iter().enumerate() {
        let mut scored_cells = 0usize;
        let mut total_ratio = 0.0;

        for cell in table.rows.iter().filter_map(|row| row.get(index).and_then(|cell| cell.as_deref())) {
            let cell = compact_lower(cell);
            if let Some(grade) = grades.iter().find(|grade| cell.contains(grade.as_str())) {
                scored_cells += 1;
                total_ratio += calculate_match_ratio(grade, &cell);
            }
        }

        if scored_cells > 0 {
            let score = total_ratio / scored_cells as f64;
            tracing::debug!("Column '{}' scored {:.3}", column, score);
            if score > max_score {
                max_score = score;
                best_column = Some(column.clone());
            }
        }
    }

    if max_score < threshold {
        let message = format!(
            "Could not find a proper column. Maximum score {:.2} did not meet the threshold of {}.",
            max_score, threshold
        );
        tracing::error!("{}", message);
        report.push(message);
        return HeaderMatch {
            column: None,
            score: max_score,
        };
    }

    tracing::info!(
        "🔎 Identified grade column '{}' (score {:.3})",
        best_column.as_deref().unwrap_or_default(),
        max_score
    );
    HeaderMatch {
        column: best_column,
        score: max_score,
    }
}
