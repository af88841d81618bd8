//! Structured logging with severity levels, XID correlation, and record
//! truncation.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use svcbus_core::LoggingConfig;
//!
//! // Stderr only, no guard needed.
//! LoggingConfig::stderr_minimal().init()?;
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! File-based output buffers writes off the hot path, so the returned guard
//! must be held for the life of the program — dropping it early can lose
//! pending log lines.

use std::io;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Where log records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    /// Discard all records.
    None,
    /// Write to stderr only (the default — stdout is reserved for the wire
    /// protocol on STDIO-style transports).
    #[default]
    Stderr,
    /// Write to a rotating file only.
    File,
    /// Write to stderr and a rotating file.
    Both,
}

/// Configuration for the process-wide logging subsystem.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Minimum severity to emit, as an `EnvFilter` directive
    /// (`"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`).
    pub level: String,
    /// Where records go.
    pub output: LogOutput,
    /// Directory for file output; required when `output` writes to a file.
    pub directory: Option<PathBuf>,
    /// Maximum length, in bytes, of a single rendered record. Matches
    /// [`crate::BootstrapConfig::log_length`]'s default of 1536.
    pub max_record_len: usize,
    /// Emit JSON-structured records instead of the human-readable format.
    pub structured: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: LogOutput::Stderr,
            directory: None,
            max_record_len: 1536,
            structured: false,
        }
    }
}

impl LoggingConfig {
    /// Errors only, stderr, no guard needed. Appropriate for a worker
    /// process whose stdout/stderr are already captured by a supervisor.
    #[must_use]
    pub fn stderr_minimal() -> Self {
        Self {
            level: "error".to_string(),
            output: LogOutput::Stderr,
            ..Self::default()
        }
    }

    /// Info level, stderr only.
    #[must_use]
    pub fn stderr_debug() -> Self {
        Self {
            level: "debug".to_string(),
            output: LogOutput::Stderr,
            ..Self::default()
        }
    }

    /// File-only logging rooted at `dir`. Returns a guard that must be held.
    #[must_use]
    pub fn file(dir: impl Into<PathBuf>) -> Self {
        Self {
            level: "info".to_string(),
            output: LogOutput::File,
            directory: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Stderr and file, appropriate for a long-running service. Returns a
    /// guard that must be held.
    #[must_use]
    pub fn production(dir: impl Into<PathBuf>) -> Self {
        Self {
            level: "info".to_string(),
            output: LogOutput::Both,
            directory: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Initializes the global `tracing` subscriber from this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if file output is configured without a directory, if
    /// the directory cannot be created, or if a subscriber is already
    /// installed.
    pub fn init(&self) -> io::Result<Option<LoggingGuard>> {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        let max_len = self.max_record_len;

        match self.output {
            LogOutput::None => Ok(None),
            LogOutput::Stderr => {
                self.init_with_writer(filter, Truncate::new(io::stderr, max_len))?;
                Ok(None)
            }
            LogOutput::File => {
                let dir = self.require_directory()?;
                std::fs::create_dir_all(dir)?;
                let appender = tracing_appender::rolling::never(dir, "svcbus");
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                self.init_with_writer(filter, Truncate::new(non_blocking, max_len))?;
                Ok(Some(LoggingGuard {
                    _file_guard: guard,
                    _stderr_guard: None,
                }))
            }
            LogOutput::Both => {
                let dir = self.require_directory()?;
                std::fs::create_dir_all(dir)?;
                let appender = tracing_appender::rolling::never(dir, "svcbus");
                let (file_nb, file_guard) = tracing_appender::non_blocking(appender);
                let (stderr_nb, stderr_guard) = tracing_appender::non_blocking(io::stderr());
                let combined = file_nb.and(stderr_nb);
                self.init_with_writer(filter, Truncate::new(combined, max_len))?;
                Ok(Some(LoggingGuard {
                    _file_guard: file_guard,
                    _stderr_guard: Some(stderr_guard),
                }))
            }
        }
    }

    fn require_directory(&self) -> io::Result<&std::path::Path> {
        self.directory.as_deref().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "file-based logging requires LoggingConfig::directory",
            )
        })
    }

    fn init_with_writer<W>(&self, filter: EnvFilter, writer: W) -> io::Result<()>
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::registry().with(filter);
        if self.structured {
            subscriber
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .try_init()
                .map_err(io::Error::other)
        } else {
            subscriber
                .with(tracing_subscriber::fmt::layer().with_writer(writer))
                .try_init()
                .map_err(io::Error::other)
        }
    }
}

/// Guard that flushes buffered file logs on drop. Must be held for the
/// duration of the program when file output is enabled.
#[derive(Debug)]
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    _stderr_guard: Option<WorkerGuard>,
}

/// Wraps a [`MakeWriter`] so every rendered record is truncated to
/// `max_len` bytes (default 1536), a configurable maximum length.
#[derive(Clone)]
struct Truncate<W> {
    inner: W,
    max_len: usize,
}

impl<W> Truncate<W> {
    fn new(inner: W, max_len: usize) -> Self {
        Self { inner, max_len }
    }
}

impl<'a, W> MakeWriter<'a> for Truncate<W>
where
    W: MakeWriter<'a>,
{
    type Writer = TruncateWriter<W::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        TruncateWriter {
            inner: self.inner.make_writer(),
            max_len: self.max_len,
        }
    }
}

struct TruncateWriter<W> {
    inner: W,
    max_len: usize,
}

impl<W: io::Write> io::Write for TruncateWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let capped = &buf[..buf.len().min(self.max_len)];
        self.inner.write_all(capped)?;
        // Report the full length so the formatter layer doesn't treat this
        // as a short write and retry.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_carry_expected_defaults() {
        let cfg = LoggingConfig::stderr_minimal();
        assert_eq!(cfg.level, "error");
        assert_eq!(cfg.output, LogOutput::Stderr);
        assert!(cfg.directory.is_none());

        let cfg = LoggingConfig::file("/tmp/svcbus-test-logs");
        assert_eq!(cfg.output, LogOutput::File);
        assert!(cfg.directory.is_some());

        let cfg = LoggingConfig::production("/tmp/svcbus-test-logs");
        assert_eq!(cfg.output, LogOutput::Both);
    }

    #[test]
    fn file_output_without_directory_errors() {
        let cfg = LoggingConfig {
            output: LogOutput::File,
            directory: None,
            ..LoggingConfig::default()
        };
        assert!(cfg.init().is_err());
    }

    #[test]
    fn truncate_writer_caps_long_records() {
        let mut buf = Vec::new();
        let mut writer = TruncateWriter {
            inner: &mut buf,
            max_len: 8,
        };
        use std::io::Write as _;
        writer.write_all(b"0123456789").unwrap();
        assert_eq!(buf.len(), 8);
    }
}
