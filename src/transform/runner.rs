use crate::domain::model::{
    RunReport, Table, COATING_COLUMN, FALSE_FLAG, GRADE_COLUMN, HIGHLIGHT_COLUMN,
    RED_HIGHLIGHT_COLUMN, REMAINDER_COLUMN, TREATMENT_COLUMN, TRUE_FLAG,
};
use crate::transform::coating::CoatingTreatmentExtractor;
use crate::transform::dimension::DimensionExtractor;
use crate::transform::grade::GradeExtractor;
use crate::transform::text::{is_numeric, normalize};
use crate::transform::compile_regex;
use crate::utils::error::{EtlError, Result};
use regex::Regex;

pub const GRADE_COLUMNS_SKIPPED: &str = "Die Spalten „Güte“, „Auflage“ und „Oberfläche“ werden nicht aktualisiert. Bitte wählen Sie den korrekten Spaltennamen";
pub const DIMENSION_COLUMNS_SKIPPED: &str =
    "Die Spalten Dimension werden nicht aktualisiert. Bitte wählen Sie den korrekten Spaltennamen";

/// Remainders containing one of these are always worth a look.
const MEANINGFUL_PATTERNS: [&str; 11] = [
    "bondal",
    "hsa",
    "dh",
    "cr",
    "dc",
    "bg",
    "phsultraform",
    "ultraform",
    "ymagine",
    "scalur",
    "ungehärtet",
];

/// Runs grade, coating/treatment and dimension extraction over a table and
/// flags rows for review.
pub struct ExtractorRunner {
    grade_column: Option<String>,
    grade_extractor: GradeExtractor,
    grade_threshold: f64,
    coating_extractor: CoatingTreatmentExtractor,
    dimension_extractor: Option<DimensionExtractor>,
    dimension_cleanup: Vec<(Regex, &'static str)>,
}

impl ExtractorRunner {
    pub fn new(
        grade_column: Option<String>,
        dimension_column: Option<String>,
        grade_extractor: GradeExtractor,
        coating_extractor: CoatingTreatmentExtractor,
        grade_threshold: f64,
    ) -> Result<Self> {
        let dimension_extractor = dimension_column.map(DimensionExtractor::new).transpose()?;
        let dimension_cleanup = vec![
            (compile_regex(r"(?i)\b\d+[,\.]\d+x\d+(?:x\d+)?\b")?, ""),
            (compile_regex(r"\b\d+[,\.]\d+\b|\b\d{2,4}\b")?, ""),
            (compile_regex(r"(?i)\bx\b")?, ""),
            (compile_regex(r"\s+")?, " "),
        ];

        Ok(Self {
            grade_column,
            grade_extractor,
            grade_threshold,
            coating_extractor,
            dimension_extractor,
            dimension_cleanup,
        })
    }

    /// Drops leftover dimension text (`3,0x271`, `419`, a lone `x`).
    pub fn remove_dimension_patterns(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }
        let mut cleaned = text.to_string();
        for (pattern, replacement) in &self.dimension_cleanup {
            cleaned = pattern.replace_all(&cleaned, *replacement).into_owned();
        }
        cleaned.trim().to_string()
    }

    pub fn run_extractor(&self, table: &mut Table, report: &mut RunReport) -> Result<()> {
        let selected = [
            self.grade_column.as_deref(),
            self.dimension_extractor.as_ref().map(DimensionExtractor::column),
        ];
        for column in selected.into_iter().flatten() {
            if !table.has_column(column) {
                tracing::error!("Column '{}' not found in table.", column);
                return Err(EtlError::ColumnNotFound {
                    column: column.to_string(),
                });
            }
        }

        table.add_column(REMAINDER_COLUMN, None);
        table.add_column(HIGHLIGHT_COLUMN, Some(FALSE_FLAG));
        table.add_column(RED_HIGHLIGHT_COLUMN, Some(FALSE_FLAG));

        match &self.grade_column {
            Some(column) => self.extract_grades(table, column),
            None => {
                tracing::error!("{}", GRADE_COLUMNS_SKIPPED);
                report.push(GRADE_COLUMNS_SKIPPED);
            }
        }

        match &self.dimension_extractor {
            Some(extractor) => extractor.extract_dimensions(table)?,
            None => {
                tracing::error!("{}", DIMENSION_COLUMNS_SKIPPED);
                report.push(DIMENSION_COLUMNS_SKIPPED);
            }
        }

        Ok(())
    }

    fn extract_grades(&self, table: &mut Table, column: &str) {
        table.add_column(GRADE_COLUMN, None);
        table.add_column(COATING_COLUMN, None);
        table.add_column(TREATMENT_COLUMN, None);

        for row in 0..table.len() {
            let candidate = match table.get(row, column) {
                Some(value) if !value.trim().is_empty() && !is_numeric(value) => value.to_string(),
                _ => {
                    tracing::warn!("Row {}: Candidate is empty or invalid.", row);
                    continue;
                }
            };

            let (best_grade, matched) = self
                .grade_extractor
                .extract_grade(&candidate, self.grade_threshold);
            let Some(best_grade) = best_grade.filter(|_| matched) else {
                table.set(row, RED_HIGHLIGHT_COLUMN, Some(TRUE_FLAG.to_string()));
                tracing::info!("Row {}: No grade found - flagged for red highlighting", row);
                continue;
            };

            let potential = potential_coating_text(&candidate, &best_grade);
            let found = self
                .coating_extractor
                .extract_coating_treatment(&potential, Some(best_grade.as_str()));
            let remainder = self.remove_dimension_patterns(&found.remainder);

            table.set(row, GRADE_COLUMN, found.grade);
            table.set(row, COATING_COLUMN, found.coating);
            table.set(row, TREATMENT_COLUMN, found.treatment);

            if is_meaningful_remainder(&remainder) {
                table.set(row, HIGHLIGHT_COLUMN, Some(TRUE_FLAG.to_string()));
                tracing::info!(
                    "Row {}: Unmatched remainder '{}' - flagged for highlighting",
                    row,
                    remainder
                );
            }
            table.set(row, REMAINDER_COLUMN, Some(remainder));
        }
    }
}

/// The normalized candidate with the grade cut out. Letters in front of the
/// grade (other than the `x` of a dimension) are dropped.
fn potential_coating_text(candidate: &str, grade: &str) -> String {
    let keep = |c: &char| *c == 'x' || !c.is_alphabetic();
    let normalized = normalize(candidate);
    let normalized_grade = normalize(grade);

    match normalized.find(normalized_grade.as_str()) {
        Some(index) => {
            let before: String = normalized[..index].chars().filter(keep).collect();
            let after = &normalized[index + normalized_grade.len()..];
            format!("{} {}", before, after)
        }
        None => normalized.chars().filter(keep).collect(),
    }
}

pub fn is_meaningful_remainder(remainder: &str) -> bool {
    let lower = remainder.trim().to_lowercase();
    if lower.is_empty() {
        return false;
    }
    let length = lower.chars().count();
    MEANINGFUL_PATTERNS.iter().any(|pattern| lower.contains(pattern))
        || length > 5
        || (length >= 2 && lower.chars().all(char::is_alphabetic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{THICKNESS_COLUMN, WIDTH_COLUMN};
    use crate::domain::schema::CoatingRule;

    fn runner(grade: Option<&str>, dimension: Option<&str>) -> ExtractorRunner {
        let grades = ["DX51D", "CR4", "CR210LA", "S350GD"]
            .iter()
            .map(|g| g.to_string())
            .collect();
        let treatments: Vec<String> = ["MA", "MB", "MC", "MAO", "MBO", "MCO", "UO", "U", "AM"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        let rules = vec![
            CoatingRule {
                symbol: "+".to_string(),
                prefix_coating: "Z".to_string(),
                coating: vec!["100".to_string(), "140".to_string(), "275".to_string()],
                treatment: treatments,
            },
            CoatingRule {
                symbol: "+".to_string(),
                prefix_coating: "GI".to_string(),
                coating: vec!["40/40".to_string()],
                treatment: vec!["U".to_string(), "UO".to_string()],
            },
        ];

        ExtractorRunner::new(
            grade.map(str::to_string),
            dimension.map(str::to_string),
            GradeExtractor::new(grades),
            CoatingTreatmentExtractor::new(rules),
            0.2,
        )
        .unwrap()
    }

    fn table(descriptions: &[Option<&str>]) -> Table {
        Table::new(
            vec!["Materialkurztext".to_string()],
            descriptions
                .iter()
                .map(|d| vec![d.map(str::to_string)])
                .collect(),
        )
    }

    #[test]
    fn test_full_match_without_highlight() {
        let mut t = table(&[Some("C 1,3x945 CR4 Z100MB")]);
        let mut report = RunReport::new();
        runner(Some("Materialkurztext"), Some("Materialkurztext"))
            .run_extractor(&mut t, &mut report)
            .unwrap();

        assert_eq!(t.get(0, GRADE_COLUMN), Some("CR4+Z"));
        assert_eq!(t.get(0, COATING_COLUMN), Some("100"));
        assert_eq!(t.get(0, TREATMENT_COLUMN), Some("MBO"));
        assert_eq!(t.get(0, REMAINDER_COLUMN), Some(""));
        assert_eq!(t.get(0, THICKNESS_COLUMN), Some("1,3"));
        assert_eq!(t.get(0, WIDTH_COLUMN), Some("945,0"));
        assert!(!t.is_flagged(0, HIGHLIGHT_COLUMN));
        assert!(!t.is_flagged(0, RED_HIGHLIGHT_COLUMN));
        assert!(report.is_empty());
    }

    #[test]
    fn test_highlighting() {
        let mut t = table(&[
            Some("DX51D+Z100 MA Bondal"),
            Some("Kupfer 1,0x200"),
            Some("C 1,7x380 CR210LA Z100MB/GI40/40"),
            None,
            Some("1250"),
        ]);
        let mut report = RunReport::new();
        runner(Some("Materialkurztext"), None)
            .run_extractor(&mut t, &mut report)
            .unwrap();

        assert_eq!(t.get(0, GRADE_COLUMN), Some("DX51D+Z"));
        assert_eq!(t.get(0, TREATMENT_COLUMN), Some("MA"));
        assert_eq!(t.get(0, REMAINDER_COLUMN), Some("bondal"));
        assert!(t.is_flagged(0, HIGHLIGHT_COLUMN));

        assert!(t.is_flagged(1, RED_HIGHLIGHT_COLUMN));
        assert_eq!(t.get(1, GRADE_COLUMN), None);

        assert_eq!(t.get(2, GRADE_COLUMN), Some("CR210LA+Z"));
        assert_eq!(t.get(2, COATING_COLUMN), Some("100"));
        assert_eq!(t.get(2, TREATMENT_COLUMN), Some("MBO"));
        assert!(t.get(2, REMAINDER_COLUMN).is_some_and(|rest| rest.contains("gi40")));
        assert!(t.is_flagged(2, HIGHLIGHT_COLUMN));

        for row in [3, 4] {
            assert!(!t.is_flagged(row, HIGHLIGHT_COLUMN));
            assert!(!t.is_flagged(row, RED_HIGHLIGHT_COLUMN));
        }

        assert_eq!(report.errors, vec![DIMENSION_COLUMNS_SKIPPED.to_string()]);
    }

    #[test]
    fn test_without_grade_column() {
        let mut t = table(&[Some("DX51D 1,5x1000")]);
        let mut report = RunReport::new();
        runner(None, Some("Materialkurztext"))
            .run_extractor(&mut t, &mut report)
            .unwrap();

        assert!(!t.has_column(GRADE_COLUMN));
        assert!(t.has_column(HIGHLIGHT_COLUMN));
        assert_eq!(t.get(0, THICKNESS_COLUMN), Some("1,5"));
        assert_eq!(report.errors, vec![GRADE_COLUMNS_SKIPPED.to_string()]);
    }

    #[test]
    fn test_unknown_column() {
        let mut t = table(&[Some("DX51D")]);
        let err = runner(Some("Beschreibung"), None)
            .run_extractor(&mut t, &mut RunReport::new())
            .unwrap_err();
        assert!(matches!(err, EtlError::ColumnNotFound { column } if column == "Beschreibung"));
    }

    #[test]
    fn test_remove_dimension_patterns() {
        let r = runner(None, None);
        assert_eq!(r.remove_dimension_patterns("3,0x271 bondal"), "bondal");
        assert_eq!(r.remove_dimension_patterns("1,5x1056x419"), "");
        assert_eq!(r.remove_dimension_patterns("x 419 hsa"), "hsa");
        assert_eq!(r.remove_dimension_patterns("  "), "  ");
    }

    #[test]
    fn test_is_meaningful_remainder() {
        assert!(is_meaningful_remainder("bondal"));
        assert!(is_meaningful_remainder("dc"));
        assert!(is_meaningful_remainder("z100mb/"));
        assert!(is_meaningful_remainder("ab"));
        assert!(!is_meaningful_remainder("a"));
        assert!(!is_meaningful_remainder("1/2"));
        assert!(!is_meaningful_remainder(""));
    }
}
