//! Log record structure

use super::log_context::LogContext;
use super::severity::Severity;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// One log call as seen by a single channel's handlers.
///
/// Processors receive the record by value and may rewrite the message,
/// context or extra fields before formatting.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub channel: String,
    pub level: Severity,
    pub message: String,
    pub context: LogContext,
    pub extra: LogContext,
    pub datetime: DateTime<FixedOffset>,
}

impl LogRecord {
    pub fn new(
        channel: impl Into<String>,
        level: Severity,
        message: impl Into<String>,
        datetime: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            channel: channel.into(),
            level,
            message: message.into(),
            context: LogContext::new(),
            extra: LogContext::new(),
            datetime,
        }
    }

    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_extra(mut self, extra: LogContext) -> Self {
        self.extra = extra;
        self
    }
}

#[cfg(test)]
pub(crate) fn test_record(level: Severity, message: &str) -> LogRecord {
    use chrono::TimeZone;
    let datetime = chrono::Utc
        .with_ymd_and_hms(2024, 3, 15, 10, 30, 45)
        .unwrap()
        .fixed_offset();
    LogRecord::new("test", level, message, datetime)
}
