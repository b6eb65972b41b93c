#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

pub use toml_config::{
    ColumnsConfig, EtlConfig, HistoryConfig, InputConfig, LoadConfig, LoggingConfig,
    PipelineConfig, SchemaConfig, TransformConfig, AUTO_COLUMN, NO_COLUMN, SAME_COLUMN,
};
