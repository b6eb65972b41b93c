pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod transform;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{Cli, Command, ProcessArgs};
pub use config::EtlConfig;

pub use adapters::{HistoryStore, LocalStorage};
pub use core::{etl::EtlEngine, etl::RunOutcome, pipeline::ExcelPipeline, pipeline_run};
pub use domain::schema::KnowledgeBase;
pub use utils::error::{EtlError, Result};
