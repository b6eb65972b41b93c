use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Spreadsheet read error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("Excel write error: {0}")]
    XlsxError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Schema error: {message}")]
    SchemaError { message: String },

    #[error("Unsupported file '{path}': {reason}")]
    UnsupportedFileType { path: String, reason: String },

    #[error("Column '{column}' not found in table")]
    ColumnNotFound { column: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Logging setup error: {message}")]
    LoggingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Processing,
    Output,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::SchemaError { .. } => ErrorCategory::Configuration,
            EtlError::UnsupportedFileType { .. }
            | EtlError::SpreadsheetError(_)
            | EtlError::CsvError(_)
            | EtlError::ColumnNotFound { .. } => ErrorCategory::Input,
            EtlError::ProcessingError { .. } | EtlError::ValidationError { .. } => {
                ErrorCategory::Processing
            }
            EtlError::XlsxError(_) | EtlError::ZipError(_) | EtlError::SerializationError(_) => {
                ErrorCategory::Output
            }
            EtlError::IoError(_) | EtlError::LoggingError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Output => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::UnsupportedFileType { .. } => {
                "Upload an .xlsx, .xls or .csv file; check input.valid_file_extensions"
            }
            EtlError::ColumnNotFound { .. } => {
                "Pick an existing column with --grades/--dimensions or use --grades auto"
            }
            EtlError::SchemaError { .. } => {
                "Check schema.grades_path and schema.coatings_path point to JSON arrays"
            }
            EtlError::SpreadsheetError(_) | EtlError::CsvError(_) => {
                "Open the file in a spreadsheet application and save it again"
            }
            EtlError::ProcessingError { .. } | EtlError::ValidationError { .. } => {
                "Check that the sheet has a header row and material descriptions"
            }
            EtlError::XlsxError(_) | EtlError::ZipError(_) | EtlError::SerializationError(_) => {
                "Check free disk space and permissions of load.output_path"
            }
            EtlError::IoError(_) => "Check that the path exists and is readable/writable",
            EtlError::LoggingError { .. } => "Check permissions of logging.directory",
            _ => "Review the configuration file",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::UnsupportedFileType { path, .. } => {
                format!("Die Datei '{}' ist keine gültige Excel-Datei.", path)
            }
            EtlError::ColumnNotFound { column } => {
                format!("Spalte '{}' wurde in der Tabelle nicht gefunden.", column)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_and_severity() {
        let err = EtlError::ColumnNotFound {
            column: "Materialkurztext".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::Medium);

        let err = EtlError::IoError(std::io::Error::other("disk"));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_user_friendly_message() {
        let err = EtlError::ColumnNotFound {
            column: "Güte".to_string(),
        };
        assert!(err.user_friendly_message().contains("Güte"));
    }
}
