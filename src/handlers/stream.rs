//! Append-only file handler

use crate::core::error::{LoggerError, Result};
use crate::core::handler::{impl_handler_state, FormattableHandler, Handler, HandlerState, ProcessableHandler};
use crate::core::log_record::LogRecord;
use crate::core::severity::Severity;
use crate::resolver::arguments::ArgumentCursor;
use crate::resolver::parameters::{ParamDefault, ParamType, Parameter};
use crate::resolver::registry::FromArguments;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Lazily opened append-mode file shared by the file based handlers.
///
/// Every write goes straight to the file; there is no userspace buffer.
#[derive(Debug)]
pub(crate) struct FileSink {
    path: PathBuf,
    permission: Option<u32>,
    use_locking: bool,
    file: Option<File>,
}

impl FileSink {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            permission: None,
            use_locking: false,
            file: None,
        }
    }

    pub(crate) fn set_permission(&mut self, permission: Option<u32>) {
        self.permission = permission;
    }

    pub(crate) fn set_locking(&mut self, use_locking: bool) {
        self.use_locking = use_locking;
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Close the current file and point the sink at `path`
    pub(crate) fn set_path(&mut self, path: PathBuf) {
        self.close();
        self.path = path;
    }

    pub(crate) fn close(&mut self) {
        self.file = None;
    }

    pub(crate) fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn open(&mut self) -> Result<&mut File> {
        if self.file.is_none() {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| {
                    LoggerError::io_operation(
                        "create log directory",
                        format!("Failed to create directory '{}'", parent.display()),
                        e,
                    )
                })?;
            }

            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .map_err(|e| {
                    LoggerError::io_operation(
                        "open log file",
                        format!("Failed to open '{}'", self.path.display()),
                        e,
                    )
                })?;

            #[cfg(unix)]
            if let Some(mode) = self.permission {
                use std::os::unix::fs::PermissionsExt;
                file.set_permissions(fs::Permissions::from_mode(mode))
                    .map_err(|e| {
                        LoggerError::io_operation(
                            "set log file permissions",
                            format!("Failed to chmod '{}' to {:o}", self.path.display(), mode),
                            e,
                        )
                    })?;
            }

            self.file = Some(file);
        }

        self.file
            .as_mut()
            .ok_or_else(|| LoggerError::handler("file", "log file not open"))
    }

    pub(crate) fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let use_locking = self.use_locking;
        let path = self.path.clone();
        let file = self.open()?;

        if use_locking {
            lock(file, &path)?;
        }
        let written = file.write_all(bytes);
        if use_locking {
            unlock(file);
        }

        written.map_err(|e| {
            LoggerError::io_operation(
                "write log record",
                format!("Failed to write to '{}'", path.display()),
                e,
            )
        })
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

#[cfg(feature = "file")]
fn lock(file: &File, path: &Path) -> Result<()> {
    fs2::FileExt::lock_exclusive(file)
        .map_err(|_| LoggerError::file_lock(path.display().to_string()))
}

#[cfg(feature = "file")]
fn unlock(file: &File) {
    if let Err(e) = fs2::FileExt::unlock(file) {
        tracing::warn!(error = %e, "failed to release log file lock");
    }
}

#[cfg(not(feature = "file"))]
fn lock(_file: &File, path: &Path) -> Result<()> {
    Err(LoggerError::file_lock(format!(
        "{} (file locking requires the `file` feature)",
        path.display()
    )))
}

#[cfg(not(feature = "file"))]
fn unlock(_file: &File) {}

/// Appends formatted records to a single file.
///
/// The file and its parent directories are created on the first write.
pub struct StreamHandler {
    state: HandlerState,
    sink: FileSink,
}

impl StreamHandler {
    pub fn new(path: impl Into<PathBuf>, level: Severity, bubble: bool) -> Self {
        Self {
            state: HandlerState::new(level, bubble),
            sink: FileSink::new(path),
        }
    }

    /// Unix mode applied when the file is opened, e.g. `0o640`
    #[must_use]
    pub fn with_permission(mut self, mode: Option<u32>) -> Self {
        self.sink.set_permission(mode);
        self
    }

    /// Hold an exclusive advisory lock around every write
    #[must_use]
    pub fn with_locking(mut self, enabled: bool) -> Self {
        self.sink.set_locking(enabled);
        self
    }

    pub fn path(&self) -> &Path {
        self.sink.path()
    }
}

/// Parse an optional file mode argument
pub(crate) fn file_mode(mode: Option<i64>) -> Result<Option<u32>> {
    mode.map(|m| {
        u32::try_from(m)
            .ok()
            .filter(|m| *m <= 0o7777)
            .ok_or_else(|| LoggerError::handler("file", format!("invalid file permission: {}", m)))
    })
    .transpose()
}

impl FromArguments for StreamHandler {
    const PARAMETERS: &'static [Parameter] = &[
        Parameter::new("stream", ParamType::LogFile, ParamDefault::Required),
        Parameter::new("level", ParamType::Level, ParamDefault::Level(Severity::Debug)),
        Parameter::new("bubble", ParamType::Bool, ParamDefault::Bool(true)),
        Parameter::new("file_permission", ParamType::OptionalInt, ParamDefault::Null),
        Parameter::new("use_locking", ParamType::Bool, ParamDefault::Bool(false)),
    ];

    fn from_arguments(args: &mut ArgumentCursor<'_>) -> Result<Self> {
        let path = args.next_path("stream")?;
        let level = args.next_level("level")?;
        let bubble = args.next_bool("bubble")?;
        let permission = file_mode(args.next_opt_int("file_permission")?)?;
        let use_locking = args.next_bool("use_locking")?;

        Ok(Self::new(path, level, bubble)
            .with_permission(permission)
            .with_locking(use_locking))
    }
}

impl Handler for StreamHandler {
    fn name(&self) -> &str {
        "stream"
    }

    fn is_handling(&self, level: Severity) -> bool {
        self.state.is_handling(level)
    }

    fn handle(&mut self, record: &LogRecord) -> Result<bool> {
        if !self.state.is_handling(record.level) {
            return Ok(false);
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

impl_handler_state!(StreamHandler);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_context::LogContext;
    use crate::core::log_record::test_record;
    use tempfile::TempDir;

    #[test]
    fn test_creates_parent_directories_lazily() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/error.log");
        let mut handler = StreamHandler::new(&path, Severity::Debug, true);

        assert!(!path.exists());
        handler.handle(&test_record(Severity::Info, "first")).unwrap();
        handler.handle(&test_record(Severity::Info, "second")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("test.INFO: first"));
    }

    #[test]
    fn test_level_threshold_and_bubbling() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("error.log");
        let mut handler = StreamHandler::new(&path, Severity::Error, false);

        assert!(!handler.handle(&test_record(Severity::Warning, "skipped")).unwrap());
        assert!(handler.handle(&test_record(Severity::Error, "kept")).unwrap());

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("skipped"));
        assert!(content.contains("kept"));
    }

    #[test]
    fn test_context_is_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ctx.log");
        let mut handler = StreamHandler::new(&path, Severity::Debug, true);

        let record = test_record(Severity::Error, "failed")
            .with_context(LogContext::new().with_field("key2", "value 2"));
        handler.handle(&record).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains(r#""key2":"value 2""#));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_permission_applied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("private.log");
        let mut handler =
            StreamHandler::new(&path, Severity::Debug, true).with_permission(Some(0o600));
        handler.handle(&test_record(Severity::Info, "secret")).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(feature = "file")]
    #[test]
    fn test_locked_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("locked.log");
        let mut handler = StreamHandler::new(&path, Severity::Debug, true).with_locking(true);

        for i in 0..5 {
            handler
                .handle(&test_record(Severity::Info, &format!("line {}", i)))
                .unwrap();
        }
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 5);
    }

    #[test]
    fn test_file_mode_validation() {
        assert_eq!(file_mode(None).unwrap(), None);
        assert_eq!(file_mode(Some(0o644)).unwrap(), Some(0o644));
        assert!(file_mode(Some(-1)).is_err());
        assert!(file_mode(Some(0o17777)).is_err());
    }
}
