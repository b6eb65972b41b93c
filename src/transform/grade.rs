use crate::transform::text::{longest_common_substring, normalize};
use std::collections::HashSet;

const SEPARATORS: [&str; 6] = [" ", "-", ";", "+", "x", "X"];

/// Finds the steel grade named in a material description.
#[derive(Debug, Clone)]
pub struct GradeExtractor {
    grades: Vec<String>,
    normalized_grades: Vec<String>,
    fuzzy: bool,
}

impl GradeExtractor {
    pub fn new(grades: Vec<String>) -> Self {
        let normalized_grades = grades.iter().map(|grade| normalize(grade)).collect();
        Self {
            grades,
            normalized_grades,
            fuzzy: false,
        }
    }

    /// Enables the longest-common-substring fallback.
    pub fn with_fuzzy_matching(mut self, enabled: bool) -> Self {
        self.fuzzy = enabled;
        self
    }

    /// Returns the best grade and whether one was found. `threshold` only
    /// applies to the fuzzy fallback.
    pub fn extract_grade(&self, description: &str, threshold: f64) -> (Option<String>, bool) {
        for token in tokenize(description) {
            let token = token.to_lowercase();
            if let Some(grade) = self.grades.iter().find(|grade| grade.to_lowercase() == token) {
                return (Some(grade.clone()), true);
            }
        }

        let normalized_input = normalize(description);

        let mut best: Option<&String> = None;
        let mut best_length = 0;
        for (grade, normalized) in self.grades.iter().zip(&self.normalized_grades) {
            let length = normalized.chars().count();
            if length > best_length && !normalized.is_empty() && normalized_input.contains(normalized.as_str()) {
                best_length = length;
                best = Some(grade);
            }
        }
        if let Some(grade) = best {
            return (Some(grade.clone()), true);
        }

        if self.fuzzy {
            for (grade, normalized) in self.grades.iter().zip(&self.normalized_grades) {
                let grade_length = normalized.chars().count();
                if grade_length == 0 {
                    continue;
                }
                let (length, _) = longest_common_substring(&normalized_input, normalized);
                let ratio = length as f64 / grade_length as f64;
                if length > best_length && ratio >= threshold {
                    best_length = length;
                    best = Some(grade);
                }
            }
            if let Some(grade) = best {
                tracing::debug!("Fuzzy grade match '{}' for '{}'", grade, description);
                return (Some(grade.clone()), true);
            }
        }

        (None, false)
    }
}

/// Splits on each separator in turn, keeping every intermediate piece, then
/// adds the whole description. Order is preserved, duplicates dropped.
pub fn tokenize(description: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = description.to_string();

    for separator in SEPARATORS {
        let pieces: Vec<String> = current
            .split(separator)
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect();
        current = pieces.join(" ");
        words.extend(pieces);
    }
    words.push(description.to_string());

    let mut seen = HashSet::new();
    words.retain(|word| seen.insert(word.clone()));
    words
}
