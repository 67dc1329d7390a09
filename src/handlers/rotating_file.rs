//! Daily rotating file handler
//!
//! Writes to `<stem>-<YYYY-MM-DD><ext>` next to the configured base path,
//! using the date of each record in the logger's timezone. When the date
//! changes the handler switches files, optionally gzips the previous one and
//! removes dated files beyond the retention limit.

use super::stream::{file_mode, FileSink};
use crate::core::error::{LoggerError, Result};
use crate::core::handler::{impl_handler_state, FormattableHandler, Handler, HandlerState, ProcessableHandler};
use crate::core::log_record::LogRecord;
use crate::core::severity::Severity;
use crate::resolver::arguments::ArgumentCursor;
use crate::resolver::parameters::{ParamDefault, ParamType, Parameter};
use crate::resolver::registry::FromArguments;
use chrono::NaiveDate;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";
const COMPRESSED_SUFFIX: &str = ".gz";

pub struct RotatingFileHandler {
    state: HandlerState,
    base_path: PathBuf,
    /// Dated files to keep, 0 keeps everything
    max_files: usize,
    compress: bool,
    sink: FileSink,
    current_date: Option<NaiveDate>,
}

impl RotatingFileHandler {
    pub fn new(base_path: impl Into<PathBuf>, max_files: usize, level: Severity, bubble: bool) -> Self {
        let base_path = base_path.into();
        Self {
            state: HandlerState::new(level, bubble),
            sink: FileSink::new(base_path.clone()),
            base_path,
            max_files,
            compress: false,
            current_date: None,
        }
    }

    #[must_use]
    pub fn with_permission(mut self, mode: Option<u32>) -> Self {
        self.sink.set_permission(mode);
        self
    }

    #[must_use]
    pub fn with_locking(mut self, enabled: bool) -> Self {
        self.sink.set_locking(enabled);
        self
    }

    /// Gzip the previous day's file when switching to a new date
    #[must_use]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Path of the file records dated `date` are written to
    pub fn dated_path(&self, date: NaiveDate) -> PathBuf {
        let (stem, extension) = self.name_parts();
        let name = format!("{}-{}{}", stem, date.format(DATE_FORMAT), extension);
        self.base_path.with_file_name(name)
    }

    /// File stem and extension (with leading dot, possibly empty)
    fn name_parts(&self) -> (String, String) {
        let stem = self
            .base_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("log")
            .to_string();
        let extension = self
            .base_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        (stem, extension)
    }

    /// Date encoded in a file name produced by [`dated_path`](Self::dated_path)
    fn parse_dated_name(&self, file_name: &str) -> Option<NaiveDate> {
        let (stem, extension) = self.name_parts();
        let name = file_name.strip_suffix(COMPRESSED_SUFFIX).unwrap_or(file_name);
        let date = name
            .strip_prefix(&stem)?
            .strip_prefix('-')?
            .strip_suffix(extension.as_str())?;
        NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
    }

    fn rotate_to(&mut self, date: NaiveDate) {
        let previous = self.sink.is_open().then(|| self.sink.path().to_path_buf());
        self.sink.set_path(self.dated_path(date));
        self.current_date = Some(date);

        if let Some(previous) = previous {
            if self.compress && previous.exists() {
                if let Err(e) = compress_file(&previous) {
                    tracing::warn!(path = %previous.display(), error = %e, "log file compression failed");
                }
            }
        }

        if let Err(e) = self.prune() {
            tracing::warn!(path = %self.base_path.display(), error = %e, "removing old log files failed");
        }
    }

    /// Remove the oldest dated files so that, counting the current date,
    /// at most `max_files` remain
    fn prune(&self) -> Result<()> {
        if self.max_files == 0 {
            return Ok(());
        }

        let dir = match self.base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::from("."),
        };
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut dated: Vec<(NaiveDate, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let date = self.parse_dated_name(name.to_str()?)?;
                Some((date, entry.path()))
            })
            .collect();

        // newest first; same-day plain and gzipped files count once each
        dated.sort_by(|a, b| b.cmp(a));

        let mut failures = 0usize;
        let mut kept_dates: Vec<NaiveDate> = self.current_date.into_iter().collect();
        for (date, path) in dated {
            if kept_dates.contains(&date) {
                continue;
            }
            if kept_dates.len() < self.max_files {
                kept_dates.push(date);
                continue;
            }
            if let Err(e) = fs::remove_file(&path) {
                failures += 1;
                tracing::warn!(path = %path.display(), error = %e, "failed to remove old log file");
            }
        }

        if failures > 0 {
            return Err(LoggerError::file_rotation(
                self.base_path.display().to_string(),
                format!("{} old log file(s) could not be removed", failures),
            ));
        }
        Ok(())
    }
}

/// Gzip `path` into `path.gz`, removing the original only after the
/// compressed file is complete.
fn compress_file(path: &Path) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggerError::file_rotation(path.display().to_string(), "invalid file name"))?;
    let gz_path = path.with_file_name(format!("{}{}", file_name, COMPRESSED_SUFFIX));
    let temp_path = path.with_file_name(format!("{}{}.tmp", file_name, COMPRESSED_SUFFIX));

    let write_compressed = || -> std::io::Result<()> {
        let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
        let output = BufWriter::with_capacity(64 * 1024, File::create(&temp_path)?);
        let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
        std::io::copy(&mut reader, &mut encoder)?;
        encoder.finish()?.flush()?;
        fs::rename(&temp_path, &gz_path)
    };

    if let Err(e) = write_compressed() {
        let _ = fs::remove_file(&temp_path);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress '{}'", path.display()),
            e,
        ));
    }

    if let Err(e) = fs::remove_file(path) {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "compressed log file but could not remove the original"
        );
    }
    Ok(())
}

impl FromArguments for RotatingFileHandler {
    const PARAMETERS: &'static [Parameter] = &[
        Parameter::new("filename", ParamType::LogFile, ParamDefault::Required),
        Parameter::new("max_files", ParamType::Int, ParamDefault::Int(0)),
        Parameter::new("level", ParamType::Level, ParamDefault::Level(Severity::Debug)),
        Parameter::new("bubble", ParamType::Bool, ParamDefault::Bool(true)),
        Parameter::new("file_permission", ParamType::OptionalInt, ParamDefault::Null),
        Parameter::new("use_locking", ParamType::Bool, ParamDefault::Bool(false)),
        Parameter::new("compress", ParamType::Bool, ParamDefault::Bool(false)),
    ];

    fn from_arguments(args: &mut ArgumentCursor<'_>) -> Result<Self> {
        let filename = args.next_path("filename")?;
        let max_files = args.next_int("max_files")?;
        let max_files = usize::try_from(max_files).map_err(|_| {
            LoggerError::handler("rotating_file", format!("max_files must not be negative: {}", max_files))
        })?;
        let level = args.next_level("level")?;
        let bubble = args.next_bool("bubble")?;
        let permission = file_mode(args.next_opt_int("file_permission")?)?;
        let use_locking = args.next_bool("use_locking")?;
        let compress = args.next_bool("compress")?;

        Ok(Self::new(filename, max_files, level, bubble)
            .with_permission(permission)
            .with_locking(use_locking)
            .with_compression(compress))
    }
}

impl Handler for RotatingFileHandler {
    fn name(&self) -> &str {
        "rotating_file"
    }

    fn is_handling(&self, level: Severity) -> bool {
        self.state.is_handling(level)
    }

    fn handle(&mut self, record: &LogRecord) -> Result<bool> {
        if !self.state.is_handling(record.level) {
            return Ok(false);
        }

        let date = record.datetime.date_naive();
        if self.current_date != Some(date) {
            self.rotate_to(date);
        }

        let (_, formatted) = self.state.prepare(record)?;
        self.sink.write(formatted.as_bytes())?;

        Ok(!self.state.bubble)
    }

    fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }

    fn as_formattable(&mut self) -> Option<&mut dyn FormattableHandler> {
        Some(self)
    }

    fn as_processable(&mut self) -> Option<&mut dyn ProcessableHandler> {
        Some(self)
    }
}

impl_handler_state!(RotatingFileHandler);
