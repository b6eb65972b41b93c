// Transformation steps: cleaning, column detection and the extractors.

pub mod cleaning;
pub mod coating;
pub mod dimension;
pub mod grade;
pub mod header;
pub mod runner;
pub mod text;
pub mod validate;

pub use coating::{CoatingMatch, CoatingTreatmentExtractor};
pub use dimension::{DimensionExtractor, Measures};
pub use grade::GradeExtractor;
pub use runner::ExtractorRunner;
pub use validate::validate_output;

use crate::utils::error::{EtlError, Result};
use regex::Regex;

pub(crate) fn compile_regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| EtlError::ProcessingError {
        message: format!("Invalid pattern '{}': {}", pattern, e),
    })
}
