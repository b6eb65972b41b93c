use crate::domain::model::{
    Table, LENGTH_COLUMN, LENGTH_TOLERANCE_COLUMN, THICKNESS_COLUMN, THICKNESS_TOLERANCE_COLUMN,
    WIDTH_COLUMN, WIDTH_TOLERANCE_COLUMN,
};
use crate::transform::compile_regex;
use crate::utils::error::{EtlError, Result};
use regex::Regex;

/// Thickness, width and length of one row, or their tolerances. Thickness is
/// always the smaller of the first two values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measures {
    pub thickness: Option<String>,
    pub width: Option<String>,
    pub length: Option<String>,
}

impl Measures {
    pub fn is_empty(&self) -> bool {
        self.thickness.is_none() && self.width.is_none() && self.length.is_none()
    }
}

/// Reads `a x b [x c]` dimensions and their tolerances from descriptions.
#[derive(Debug, Clone)]
pub struct DimensionExtractor {
    column: String,
    strip_tolerances: Vec<Regex>,
    dimension: Regex,
    tolerance_patterns: Vec<Regex>,
    dimension_tolerance: Regex,
}

const TOLERANCE_GROUP_FIRST: &str = r"(\([^)]+\)|\+[^x\s]*|-[^x\s]*|\+/-[^x\s]*|±[^x\s]*)";
const TOLERANCE_GROUP: &str = r"(\([^)]+\)|\+[^\s]*|-[^\s]*|\+/-[^\s]*|±[^\s]*)";

impl DimensionExtractor {
    pub fn new(column: impl Into<String>) -> Result<Self> {
        let strip_tolerances = vec![
            compile_regex(r"(\+/-|[+-]\d*[.,]?\d*\s*[+,\-./]?)\s*\d*[.,]?\d*")?,
            compile_regex(r"\+[\d\.]+/-[\d\.]+")?,
            compile_regex(r"\(.*?\)")?,
        ];
        let dimension = compile_regex(
            r"(\d+[.,]?\d*)\s*(?:[a-zA-Z\s]*?)?\s*[xX\*]\s*(\d+[.,]?\d*)(?:\s*[xX\*]\s*(\d+[.,]?\d*))?",
        )?;
        let tolerance_patterns = vec![
            compile_regex(r"\(([+\-0-9/.,\s]+)\)")?,
            compile_regex(r"(\+/-\s*[\d.,]+)")?,
            compile_regex(r"(\+[\d.,]+/-[\d.,]+)")?,
            compile_regex(r"([+-][\d.,]+)")?,
        ];
        let dimension_tolerance = compile_regex(&format!(
            r"(\d+[.,]?\d*)\s*{first}?\s*(?:[a-zA-Z\s]*?)?\s*[xX\*]\s*(\d+[.,]?\d*)\s*{rest}?(?:\s*[xX\*]\s*(\d+[.,]?\d*)\s*{rest})?",
            first = TOLERANCE_GROUP_FIRST,
            rest = TOLERANCE_GROUP,
        ))?;

        Ok(Self {
            column: column.into(),
            strip_tolerances,
            dimension,
            tolerance_patterns,
            dimension_tolerance,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Dimensions with a decimal comma, e.g. `1,5` and `1250,0`.
    pub fn parse_dimensions(&self, description: &str) -> Measures {
        let mut text = if description.contains('.') && description.contains(',') {
            description.replace('.', "")
        } else {
            description.to_string()
        };
        text = text.replace("mm", "").replace('±', "+/-").replace(',', ".");

        for pattern in &self.strip_tolerances {
            text = pattern.replace_all(&text, "").into_owned();
        }

        let Some(caps) = self.dimension.captures(&text) else {
            return Measures::default();
        };
        let value = |index: usize| -> Option<f64> {
            caps.get(index)
                .and_then(|m| m.as_str().trim().parse::<f64>().ok())
                .filter(|v| *v != 0.0)
        };

        let (Some(first), Some(second)) = (value(1), value(2)) else {
            return Measures::default();
        };
        let third = value(3);
        let (thickness, width) = if first < second {
            (first, second)
        } else {
            (second, first)
        };

        tracing::info!(
            "Candidate dimension '{}' split into ({}, {}, {:?})",
            text.trim(),
            thickness,
            width,
            third
        );

        Measures {
            thickness: Some(decimal_comma(thickness)),
            width: Some(decimal_comma(width)),
            length: third.map(decimal_comma),
        }
    }

    /// Tolerances attached to each dimension, ordered like the dimensions.
    /// Falls back to tolerances found anywhere, in order of appearance.
    pub fn extract_tolerances(&self, description: &str) -> Measures {
        let normalized = description.replace('±', "+/-").replace("mm", "");

        let mut found = Vec::new();
        let mut remaining = normalized.clone();
        for pattern in &self.tolerance_patterns {
            let matches: Vec<String> = pattern
                .captures_iter(&remaining)
                .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
                .collect();
            for matched in matches {
                if !matched.trim().is_empty() {
                    found.push(matched.trim().to_string());
                    remaining = remaining.replacen(&matched, "", 1);
                }
            }
        }

        let mut tolerances = Measures::default();
        if let Some(caps) = self.dimension_tolerance.captures(&normalized) {
            let number = |index: usize| -> Option<f64> {
                caps.get(index)
                    .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
                    .filter(|v| *v != 0.0)
            };
            let tolerance = |index: usize| caps.get(index).and_then(|m| clean_tolerance(m.as_str()));

            let (first, second, third) = (tolerance(2), tolerance(4), tolerance(6));
            tolerances = match (number(1), number(3)) {
                (Some(a), Some(b)) if a >= b => Measures {
                    thickness: second,
                    width: first,
                    length: third,
                },
                _ => Measures {
                    thickness: first,
                    width: second,
                    length: third,
                },
            };
        }

        if tolerances.is_empty() && !found.is_empty() {
            let mut cleaned = found.iter().map(|t| clean_tolerance(t));
            tolerances = Measures {
                thickness: cleaned.next().flatten(),
                width: cleaned.next().flatten(),
                length: cleaned.next().flatten(),
            };
        }

        tolerances
    }

    /// Adds `Dicke_`, `Breit_` and `Länge_`, plus the tolerance columns when
    /// any row carries a tolerance.
    pub fn extract_dimensions(&self, table: &mut Table) -> Result<()> {
        let values = table
            .column_values(&self.column)
            .ok_or_else(|| EtlError::ColumnNotFound {
                column: self.column.clone(),
            })?
            .into_iter()
            .map(|cell| cell.unwrap_or_default().to_string())
            .collect::<Vec<_>>();

        let dimensions: Vec<Measures> = values.iter().map(|v| self.parse_dimensions(v)).collect();
        let tolerances: Vec<Measures> = values.iter().map(|v| self.extract_tolerances(v)).collect();

        for column in [THICKNESS_COLUMN, WIDTH_COLUMN, LENGTH_COLUMN] {
            table.add_column(column, None);
        }
        for (row, measures) in dimensions.into_iter().enumerate() {
            table.set(row, THICKNESS_COLUMN, measures.thickness);
            table.set(row, WIDTH_COLUMN, measures.width);
            table.set(row, LENGTH_COLUMN, measures.length);
        }

        if tolerances.iter().any(|t| !t.is_empty()) {
            for column in [THICKNESS_TOLERANCE_COLUMN, WIDTH_TOLERANCE_COLUMN, LENGTH_TOLERANCE_COLUMN] {
                table.add_column(column, None);
            }
            for (row, measures) in tolerances.into_iter().enumerate() {
                table.set(row, THICKNESS_TOLERANCE_COLUMN, measures.thickness);
                table.set(row, WIDTH_TOLERANCE_COLUMN, measures.width);
                table.set(row, LENGTH_TOLERANCE_COLUMN, measures.length);
            }
            tracing::info!(
                "Dimensions and tolerances extracted successfully for column '{}'. Tolerance columns added.",
                self.column
            );
        } else {
            tracing::info!(
                "Dimensions extracted successfully for column '{}'. No tolerances found - tolerance columns not added.",
                self.column
            );
        }

        Ok(())
    }
}

fn decimal_comma(value: f64) -> String {
    format!("{:?}", value).replace('.', ",")
}

fn clean_tolerance(raw: &str) -> Option<String> {
    let cleaned = raw
        .trim()
        .trim_matches(|c| c == '(' || c == ')')
        .replace('±', "+/-")
        .replace("mm", "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}
