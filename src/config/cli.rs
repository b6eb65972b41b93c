use crate::config::{ColumnsConfig, EtlConfig, SAME_COLUMN};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "emw-convertor")]
#[command(about = "Extracts grade, coating, treatment and dimensions from material spreadsheets")]
pub struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, default_value = "etl-config.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the ETL pipeline on one or more spreadsheets
    Process(ProcessArgs),
    /// Show aggregated statistics of processed files
    Stats,
    /// Delete the processing history
    ResetStats,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ProcessArgs {
    /// Input files; the configured input directory is scanned when empty
    pub files: Vec<String>,

    /// Column holding grades ("auto" to detect, "none" to skip)
    #[arg(long)]
    pub grades: Option<String>,

    /// Column holding dimensions ("same" for the grade column, "none" to skip)
    #[arg(long)]
    pub dimensions: Option<String>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<String>,

    /// Output formats (xlsx, csv, json)
    #[arg(long = "format", value_delimiter = ',')]
    pub formats: Vec<String>,

    /// Also write a zip bundle of all outputs
    #[arg(long)]
    pub bundle: bool,

    /// Log CPU and memory usage per phase
    #[arg(long)]
    pub monitor: bool,

    /// Show what would be processed without executing
    #[arg(long)]
    pub dry_run: bool,
}

impl ProcessArgs {
    /// Applies command line overrides on top of the TOML configuration.
    pub fn apply_to(&self, config: &mut EtlConfig) {
        if let Some(grades) = &self.grades {
            config.columns.grades = ColumnsConfig::parse_selection(grades);
            if self.dimensions.is_none() {
                config.columns.dimensions = Some(SAME_COLUMN.to_string());
            }
        }
        if let Some(dimensions) = &self.dimensions {
            config.columns.dimensions = ColumnsConfig::parse_selection(dimensions);
        }
        if let Some(output) = &self.output {
            config.load.output_path = output.clone();
        }
        if !self.formats.is_empty() {
            config.load.output_formats = self
                .formats
                .iter()
                .map(|format| format.trim().to_ascii_lowercase())
                .collect();
        }
        if self.bundle {
            config.load.bundle = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process_command() {
        let cli = Cli::parse_from([
            "emw-convertor",
            "process",
            "inputs/Anfrage.xlsx",
            "--grades",
            "Materialkurztext",
            "--format",
            "xlsx,csv",
            "--bundle",
        ]);

        let Command::Process(args) = cli.command else {
            panic!("expected process command");
        };
        assert_eq!(args.files, vec!["inputs/Anfrage.xlsx".to_string()]);
        assert_eq!(args.formats, vec!["xlsx".to_string(), "csv".to_string()]);
        assert_eq!(cli.config, "etl-config.toml");
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let mut config = EtlConfig::default();
        config.columns.dimensions = Some("Abmessung".to_string());

        let args = ProcessArgs {
            grades: Some("Materialkurztext".to_string()),
            output: Some("/tmp/out".to_string()),
            formats: vec!["CSV".to_string()],
            ..Default::default()
        };
        args.apply_to(&mut config);

        assert_eq!(config.columns.grades.as_deref(), Some("Materialkurztext"));
        assert_eq!(config.columns.dimensions.as_deref(), Some(SAME_COLUMN));
        assert_eq!(config.load.output_path, "/tmp/out");
        assert_eq!(config.load.output_formats, vec!["csv".to_string()]);
    }

    #[test]
    fn test_none_deselects_column() {
        let mut config = EtlConfig::default();
        let args = ProcessArgs {
            grades: Some("Materialkurztext".to_string()),
            dimensions: Some("None".to_string()),
            ..Default::default()
        };
        args.apply_to(&mut config);

        assert!(config.columns.dimensions.is_none());
    }

    #[test]
    fn test_stats_command() {
        let cli = Cli::parse_from(["emw-convertor", "-v", "stats"]);
        assert!(matches!(cli.command, Command::Stats));
        assert!(cli.verbose);
    }
}
