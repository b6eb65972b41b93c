use crate::config::LoggingConfig;
use crate::utils::error::{EtlError, Result};
use crate::utils::rolling::RollingSink;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt::{self, format, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOGGER_NAME: &str = "<EMW SLExA ETL>";

const CRATE_TARGET: &str = "emw_convertor";

static LOG_HANDLE: OnceLock<LogHandle> = OnceLock::new();

/// `asctime - name - levelname - message`, one record per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternFormat;

impl<S, N> FormatEvent<S, N> for PatternFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f");
        write!(
            writer,
            "{} - {} - {} - ",
            timestamp,
            LOGGER_NAME,
            level_name(event.metadata().level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

pub fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        Level::DEBUG | Level::TRACE => "DEBUG",
    }
}

/// `<dir>/<stem>.info.log` and `<dir>/<stem>.error.log`, where the stem is
/// the file name up to its first dot.
pub fn log_file_paths(log_dir: &Path, file_name: &str) -> (PathBuf, PathBuf) {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file_name);
    let stem = base.split('.').next().unwrap_or(base);
    (
        log_dir.join(format!("{}.info.log", stem)),
        log_dir.join(format!("{}.error.log", stem)),
    )
}

/// File sinks of the installed subscriber.
#[derive(Debug)]
pub struct LogHandle {
    info: RollingSink,
    error: RollingSink,
    directory: PathBuf,
    max_file_bytes: u64,
    max_backups: usize,
}

impl LogHandle {
    fn new(config: &LoggingConfig) -> Self {
        Self {
            info: RollingSink::new(),
            error: RollingSink::new(),
            directory: PathBuf::from(&config.directory),
            max_file_bytes: config.max_file_bytes,
            max_backups: config.max_backups,
        }
    }

    pub fn route(&self, file_name: &str) -> Result<(PathBuf, PathBuf)> {
        let (info_path, error_path) = log_file_paths(&self.directory, file_name);
        self.info
            .attach(&info_path, self.max_file_bytes, self.max_backups)
            .map_err(|e| EtlError::LoggingError {
                message: format!("cannot open {}: {}", info_path.display(), e),
            })?;
        self.error
            .attach(&error_path, self.max_file_bytes, self.max_backups)
            .map_err(|e| EtlError::LoggingError {
                message: format!("cannot open {}: {}", error_path.display(), e),
            })?;
        Ok((info_path, error_path))
    }

    /// Flushes and closes both files.
    pub fn detach(&self) {
        self.info.detach();
        self.error.detach();
    }

    /// INFO and above go to the info file, WARN and above to the error file.
    fn file_layers<S>(&self) -> impl Layer<S> + Send + Sync
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let info_file = fmt::layer()
            .with_ansi(false)
            .event_format(PatternFormat)
            .with_writer(self.info.clone())
            .with_filter(Targets::new().with_target(CRATE_TARGET, LevelFilter::INFO));
        let error_file = fmt::layer()
            .with_ansi(false)
            .event_format(PatternFormat)
            .with_writer(self.error.clone())
            .with_filter(Targets::new().with_target(CRATE_TARGET, LevelFilter::WARN));

        info_file.and_then(error_file)
    }
}

fn console_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("emw_convertor=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("emw_convertor=info"))
    }
}

pub fn init_cli_logger(config: &LoggingConfig, verbose: bool) -> Result<&'static LogHandle> {
    let handle = LogHandle::new(config);
    let json = config.format == "json";

    let console_compact = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_filter(console_filter(verbose))
    });
    let console_json = json.then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .json()
            .with_filter(console_filter(verbose))
    });

    tracing_subscriber::registry()
        .with(console_compact)
        .with(console_json)
        .with(handle.file_layers())
        .try_init()
        .map_err(|e| EtlError::LoggingError {
            message: e.to_string(),
        })?;

    LOG_HANDLE.set(handle).map_err(|_| EtlError::LoggingError {
        message: "logger already initialized".to_string(),
    })?;

    LOG_HANDLE.get().ok_or_else(|| EtlError::LoggingError {
        message: "logger handle missing after initialization".to_string(),
    })
}

/// Points the info/error log files at the given input file. A no-op when no
/// logger was installed (library use, tests).
pub fn route_file_logs(file_name: &str) -> Result<()> {
    if let Some(handle) = LOG_HANDLE.get() {
        let (info_path, error_path) = handle.route(file_name)?;
        tracing::debug!(
            "Log files: {} / {}",
            info_path.display(),
            error_path.display()
        );
    }
    Ok(())
}

/// Writes out buffered file records. Call before the process exits.
pub fn flush_file_logs() {
    if let Some(handle) = LOG_HANDLE.get() {
        handle.detach();
    }
}
