//! Structured logging
//!
//! Sets up the global `tracing` subscriber from [`LoggingConfig`]: JSON or
//! text output, stdout or a size-rotated log file, level filter overridable
//! through `RUST_LOG`.

use crate::core::config::LoggingConfig;
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Keeps the background log writer alive; drop it only at shutdown
pub struct Logger {
    _guard: WorkerGuard,
}

impl Logger {
    /// Install the global subscriber described by `config`
    pub fn init(config: &LoggingConfig) -> Result<Self> {
        let level = parse_log_level(&config.level)?;

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

        let (writer, guard) = build_writer(config)?;
        let fmt_layer = build_layer(&config.format, writer)?;

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .context("Failed to initialize tracing subscriber")?;

        tracing::info!(
            level = %config.level,
            format = %config.format,
            output = %config.output,
            "Logging system initialized"
        );

        Ok(Logger { _guard: guard })
    }
}

fn build_writer(config: &LoggingConfig) -> Result<(NonBlocking, WorkerGuard)> {
    match config.output.as_str() {
        "stdout" => Ok(tracing_appender::non_blocking(io::stdout())),
        "file" => {
            let log_file = config
                .log_file
                .as_ref()
                .context("log_file must be specified when output is 'file'")?;

            if let Some(parent) = log_file.parent() {
                std::fs::create_dir_all(parent).context("Failed to create log directory")?;
            }

            let appender =
                RollingFileAppender::for_path(log_file, config.max_file_size, config.max_backups)?;
            Ok(tracing_appender::non_blocking(appender))
        }
        other => anyhow::bail!("Invalid output configuration: {}", other),
    }
}

fn build_layer(
    format: &str,
    writer: NonBlocking,
) -> Result<Box<dyn Layer<tracing_subscriber::layer::Layered<EnvFilter, Registry>> + Send + Sync>> {
    let layer = match format {
        "json" => fmt::layer()
            .json()
            .with_writer(writer)
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        "text" => fmt::layer()
            .with_writer(writer)
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        other => anyhow::bail!("Invalid format configuration: {}", other),
    };
    Ok(layer)
}

/// Parse log level string to tracing Level
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {}", level),
    }
}

/// File writer that rotates `board.log` → `board.log.1` → … once a size cap is hit
pub struct RollingFileAppender {
    directory: PathBuf,
    filename: String,
    max_file_size: usize,
    max_backups: usize,
    state: Mutex<AppenderState>,
}

#[derive(Default)]
struct AppenderState {
    file: Option<File>,
    size: usize,
}

impl RollingFileAppender {
    pub fn new(directory: PathBuf, filename: String, max_file_size: usize, max_backups: usize) -> Self {
        Self {
            directory,
            filename,
            max_file_size,
            max_backups,
            state: Mutex::new(AppenderState::default()),
        }
    }

    /// Split a log file path into directory and file name
    pub fn for_path(log_file: &Path, max_file_size: usize, max_backups: usize) -> Result<Self> {
        let directory = log_file
            .parent()
            .context("Log file must have a parent directory")?;
        let filename = log_file
            .file_name()
            .context("Log file must have a filename")?
            .to_str()
            .context("Log filename must be valid UTF-8")?;

        Ok(Self::new(
            directory.to_path_buf(),
            filename.to_string(),
            max_file_size,
            max_backups,
        ))
    }

    fn current_path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.directory.join(format!("{}.{}", self.filename, index))
    }

    /// Shift every backup up by one and move the live file to `.1`
    ///
    /// With no backups kept the live file is truncated in place.
    fn rotate(&self, state: &mut AppenderState) -> io::Result<()> {
        state.file = None;

        if self.max_backups == 0 {
            File::create(self.current_path())?;
            state.size = 0;
            return Ok(());
        }

        for i in (1..self.max_backups).rev() {
            let from = self.backup_path(i);
            if from.exists() {
                std::fs::rename(&from, self.backup_path(i + 1))?;
            }
        }

        let current = self.current_path();
        if current.exists() {
            std::fs::rename(&current, self.backup_path(1))?;
        }

        state.size = 0;
        Ok(())
    }

    fn open(&self, state: &mut AppenderState) -> io::Result<()> {
        if state.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.current_path())?;
            state.size = file.metadata()?.len() as usize;
            state.file = Some(file);
        }
        Ok(())
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, AppenderState>> {
        self.state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log appender lock poisoned"))
    }
}

impl Write for RollingFileAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.lock()?;
        self.open(&mut state)?;

        if state.size > 0 && state.size + buf.len() > self.max_file_size {
            self.rotate(&mut state)?;
            self.open(&mut state)?;
        }

        let written = match state.file.as_mut() {
            Some(file) => file.write(buf)?,
            None => return Err(io::Error::new(io::ErrorKind::NotFound, "log file not open")),
        };
        state.size += written;

        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.lock()?;
        match state.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert!(matches!(parse_log_level("debug"), Ok(Level::DEBUG)));
        assert!(matches!(parse_log_level("INFO"), Ok(Level::INFO)));
        assert!(matches!(parse_log_level("warn"), Ok(Level::WARN)));
        assert!(matches!(parse_log_level("error"), Ok(Level::ERROR)));
        assert!(parse_log_level("verbose").is_err());
    }

    #[test]
    fn test_rolling_appender_paths() {
        let appender = RollingFileAppender::for_path(Path::new("/tmp/logs/board.log"), 1024, 5).unwrap();

        assert_eq!(appender.current_path(), PathBuf::from("/tmp/logs/board.log"));
        assert_eq!(appender.backup_path(1), PathBuf::from("/tmp/logs/board.log.1"));
        assert_eq!(appender.backup_path(2), PathBuf::from("/tmp/logs/board.log.2"));
    }

    #[test]
    fn test_rolling_appender_rotates_on_size() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut appender =
            RollingFileAppender::new(dir.path().to_path_buf(), "board.log".to_string(), 16, 2);

        appender.write_all(b"0123456789").unwrap();
        appender.write_all(b"abcdefghij").unwrap();
        appender.flush().unwrap();

        let current = std::fs::read_to_string(dir.path().join("board.log")).unwrap();
        let backup = std::fs::read_to_string(dir.path().join("board.log.1")).unwrap();
        assert_eq!(current, "abcdefghij");
        assert_eq!(backup, "0123456789");
    }

    #[test]
    fn test_rolling_appender_without_backups_truncates() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut appender =
            RollingFileAppender::new(dir.path().to_path_buf(), "board.log".to_string(), 16, 0);

        appender.write_all(b"0123456789").unwrap();
        appender.write_all(b"abcdefghij").unwrap();
        appender.flush().unwrap();

        let current = std::fs::read_to_string(dir.path().join("board.log")).unwrap();
        assert_eq!(current, "abcdefghij");
        assert!(!dir.path().join("board.log.1").exists());
    }
}
