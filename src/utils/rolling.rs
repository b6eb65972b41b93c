//! Size-rotated log files behind a switchable `MakeWriter`.
//!
//! `name.log` rolls over to `name.log.1`, `name.log.2`, ... once it has grown
//! past the size threshold. At most `max_backups` numbered files are kept.

use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::writer::EitherWriter;
use tracing_subscriber::fmt::MakeWriter;

pub const DEFAULT_MAX_BYTES: u64 = 10_485_760;
pub const DEFAULT_MAX_BACKUPS: usize = 20;

/// Opens (or continues) a log file that rotates by size.
pub fn rotating_file(
    path: &Path,
    max_bytes: u64,
    max_backups: usize,
) -> io::Result<FileRotate<AppendCount>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    Ok(FileRotate::new(
        path,
        AppendCount::new(max_backups),
        ContentLimit::BytesSurpassed(usize::try_from(max_bytes).unwrap_or(usize::MAX)),
        Compression::None,
        #[cfg(unix)]
        None,
    ))
}

struct Attached {
    path: PathBuf,
    writer: NonBlocking,
    // 丟棄時會把緩衝中的紀錄寫入檔案
    _guard: WorkerGuard,
}

/// A shared, re-targetable file sink for a `tracing_subscriber` fmt layer.
///
/// Until a file is attached every record is discarded.
#[derive(Clone, Default)]
pub struct RollingSink {
    inner: Arc<Mutex<Option<Attached>>>,
}

impl RollingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Attached>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Points the sink at `path`. Records buffered for the previous file are
    /// flushed first.
    pub fn attach(&self, path: impl Into<PathBuf>, max_bytes: u64, max_backups: usize) -> io::Result<()> {
        let path = path.into();
        let file = rotating_file(&path, max_bytes, max_backups)?;
        let (writer, guard) = tracing_appender::non_blocking(file);

        let previous = self.lock().replace(Attached {
            path,
            writer,
            _guard: guard,
        });
        drop(previous);
        Ok(())
    }

    /// Flushes and closes the current file.
    pub fn detach(&self) {
        let previous = self.lock().take();
        drop(previous);
    }

    pub fn current_path(&self) -> Option<PathBuf> {
        self.lock().as_ref().map(|attached| attached.path.clone())
    }
}

impl fmt::Debug for RollingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RollingSink")
            .field("path", &self.current_path())
            .finish()
    }
}

impl<'a> MakeWriter<'a> for RollingSink {
    type Writer = EitherWriter<NonBlocking, io::Sink>;

    fn make_writer(&'a self) -> Self::Writer {
        match self.lock().as_ref() {
            Some(attached) => EitherWriter::A(attached.writer.clone()),
            None => EitherWriter::B(io::sink()),
        }
    }
}
