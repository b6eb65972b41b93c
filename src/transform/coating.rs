use crate::domain::schema::CoatingRule;
use crate::transform::text::normalize_keep_hyphen;

/// Short treatment codes and their full form.
pub const TREATMENT_CONVERSION: [(&str, &str); 3] = [("U", "UO"), ("MB", "MBO"), ("AM", "MAO")];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoatingMatch {
    /// Grade with the coating family appended, e.g. `DX51D+Z`.
    pub grade: Option<String>,
    pub coating: Option<String>,
    pub treatment: Option<String>,
    /// Text left over after removing coating and treatment.
    pub remainder: String,
}

#[derive(Debug, Clone)]
pub struct CoatingTreatmentExtractor {
    rules: Vec<CoatingRule>,
}

impl CoatingTreatmentExtractor {
    pub fn new(rules: Vec<CoatingRule>) -> Self {
        Self { rules }
    }

    /// Coating spellings of a rule paired with the coating value they stand for.
    fn permutations(rule: &CoatingRule) -> Vec<(String, String)> {
        match (rule.prefix_coating.is_empty(), rule.coating.is_empty()) {
            (false, false) => rule
                .coating
                .iter()
                .map(|coating| (format!("{}{}", rule.prefix_coating, coating), coating.clone()))
                .collect(),
            (true, false) => rule.coating.iter().map(|c| (c.clone(), c.clone())).collect(),
            (false, true) => vec![(rule.prefix_coating.clone(), rule.prefix_coating.clone())],
            (true, true) => Vec::new(),
        }
    }

    /// Pulls coating and surface treatment out of `potential`, the lowercased
    /// description with the grade already cut out.
    ///
    /// The spelling that starts first in the text wins; at the same position the
    /// longer one, then the earlier rule. A second coating such as the `gi40/40`
    /// in `z100mb/gi40/40` stays in the remainder so the row is flagged.
    pub fn extract_coating_treatment(&self, potential: &str, best_grade: Option<&str>) -> CoatingMatch {
        // (position, rule, coating value, normalized spelling)
        let mut best: Option<(usize, &CoatingRule, String, String)> = None;
        for rule in &self.rules {
            for (permutation, coating) in Self::permutations(rule) {
                let normalized = normalize_keep_hyphen(&permutation);
                if normalized.is_empty() {
                    continue;
                }
                let Some(position) = potential.find(normalized.as_str()) else {
                    continue;
                };
                let better = best.as_ref().map_or(true, |(current_position, _, _, current)| {
                    position < *current_position
                        || (position == *current_position && normalized.len() > current.len())
                });
                if better {
                    best = Some((position, rule, coating, normalized));
                }
            }
        }

        let (grade, coating, remainder, treatments) = match &best {
            Some((_, rule, coating, normalized)) => {
                let remainder = potential.replace(normalized.as_str(), "").trim().to_string();
                tracing::info!("Coating '{}' found in candidate '{}'.", coating, potential);
                (
                    best_grade.map(|g| format!("{}{}{}", g, rule.symbol, rule.prefix_coating)),
                    Some(coating.clone()),
                    remainder,
                    rule.treatment.as_slice(),
                )
            }
            None => {
                tracing::warn!("Could not find any coating in candidate '{}'.", potential);
                (
                    best_grade.map(str::to_string),
                    None,
                    potential.trim().to_string(),
                    self.rules.last().map(|rule| rule.treatment.as_slice()).unwrap_or_default(),
                )
            }
        };

        let (treatment, remainder) = match find_treatment(&remainder, treatments) {
            Some((treatment, normalized)) => {
                tracing::info!("Treatment '{}' found in candidate '{}'.", treatment, remainder);
                let rest = remainder.replacen(normalized.as_str(), "", 1).trim().to_string();
                (Some(treatment), rest)
            }
            None => {
                tracing::warn!("Could not find any treatment in candidate '{}'.", remainder);
                (None, remainder)
            }
        };

        CoatingMatch {
            grade,
            coating,
            treatment,
            remainder,
        }
    }
}

/// Longest treatment contained in `potential`, converted to its full form,
/// together with the spelling that matched.
fn find_treatment(potential: &str, treatments: &[String]) -> Option<(String, String)> {
    let mut best: Option<(&String, String)> = None;
    for treatment in treatments {
        let normalized = normalize_keep_hyphen(treatment);
        if normalized.is_empty() || !potential.contains(normalized.as_str()) {
            continue;
        }
        if best
            .as_ref()
            .map_or(true, |(_, current)| normalized.chars().count() > current.chars().count())
        {
            best = Some((treatment, normalized));
        }
    }

    best.map(|(treatment, normalized)| (convert_treatment(treatment), normalized))
}

pub fn convert_treatment(treatment: &str) -> String {
    TREATMENT_CONVERSION
        .iter()
        .find(|(short, _)| short.eq_ignore_ascii_case(treatment))
        .map(|(short, full)| {
            tracing::info!("Treatment '{}' converted to '{}'.", short, full);
            full.to_string()
        })
        .unwrap_or_else(|| treatment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(symbol: &str, prefix: &str, coatings: &[&str], treatments: &[&str]) -> CoatingRule {
        CoatingRule {
            symbol: symbol.to_string(),
            prefix_coating: prefix.to_string(),
            coating: coatings.iter().map(|c| c.to_string()).collect(),
            treatment: treatments.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn extractor() -> CoatingTreatmentExtractor {
        let treatments = ["MA", "MB", "MC", "MAO", "MBO", "MCO", "UO", "U", "AM"];
        CoatingTreatmentExtractor::new(vec![
            rule("+", "Z", &["100", "140", "275"], &treatments),
            rule("+", "GI", &["40/40", "50/50"], &["U", "UO"]),
            rule("+", "ZE", &["25/25", "50/50"], &treatments),
        ])
    }

    #[test]
    fn test_coating_and_short_treatment() {
        let found = extractor().extract_coating_treatment("1,3x945 z100mb", Some("CR4"));

        assert_eq!(found.grade.as_deref(), Some("CR4+Z"));
        assert_eq!(found.coating.as_deref(), Some("100"));
        assert_eq!(found.treatment.as_deref(), Some("MBO"));
        assert_eq!(found.remainder, "1,3x945");
    }

    #[test]
    fn test_first_coating_in_text_wins_and_conflict_stays() {
        // Z100MB comes first, the GI coating is left for review
        let found = extractor().extract_coating_treatment("c 1,7x380  z100mb/gi40/40", Some("CR210LA"));

        assert_eq!(found.grade.as_deref(), Some("CR210LA+Z"));
        assert_eq!(found.coating.as_deref(), Some("100"));
        assert_eq!(found.treatment.as_deref(), Some("MBO"));
        assert!(found.remainder.contains("gi40/40"));
    }

    #[test]
    fn test_longer_spelling_wins_at_same_position() {
        let extractor = CoatingTreatmentExtractor::new(vec![
            rule("+", "Z", &["10"], &[]),
            rule("+", "Z", &["100"], &["MA"]),
        ]);
        let found = extractor.extract_coating_treatment(" z100ma", Some("DX51D"));

        assert_eq!(found.coating.as_deref(), Some("100"));
        assert_eq!(found.treatment.as_deref(), Some("MA"));
        assert_eq!(found.remainder, "");
    }

    #[test]
    fn test_unmatched_text_stays_in_remainder() {
        let found = extractor().extract_coating_treatment(" z100mabondal", Some("DX51D"));

        assert_eq!(found.grade.as_deref(), Some("DX51D+Z"));
        assert_eq!(found.treatment.as_deref(), Some("MA"));
        assert_eq!(found.remainder, "bondal");
    }

    #[test]
    fn test_no_coating_uses_last_rule_treatments() {
        let found = extractor().extract_coating_treatment(" am", Some("DC01"));

        assert_eq!(found.grade.as_deref(), Some("DC01"));
        assert_eq!(found.coating, None);
        assert_eq!(found.treatment.as_deref(), Some("MAO"));
        assert_eq!(found.remainder, "");
    }

    #[test]
    fn test_convert_treatment() {
        assert_eq!(convert_treatment("u"), "UO");
        assert_eq!(convert_treatment("MBO"), "MBO");
    }
}
