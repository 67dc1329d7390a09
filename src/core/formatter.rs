//! Formatters turning a processed record into its final text
//!
//! - `LineFormatter`: single line, `[datetime] channel.LEVEL: message context extra`
//! - `LinePrettyFormatter`: header line followed by a pretty-printed message
//! - `JsonFormatter`: one JSON object per record, optionally pretty-printed

use super::error::{LoggerError, Result};
use super::log_context::FieldValue;
use super::log_record::LogRecord;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::str::FromStr;

pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> Result<String>;
    fn name(&self) -> &str;
}

pub const DEFAULT_LINE_FORMAT: &str =
    "[%datetime%] %channel%.%level_name%: %message% %context% %extra%\n";
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Context key rendered as a trace block when stack traces are included
pub const EXCEPTION_KEY: &str = "exception";

fn format_datetime(
    formatter: &str,
    datetime: &DateTime<FixedOffset>,
    date_format: &str,
) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", datetime.format(date_format)).map_err(|_| {
        LoggerError::formatter(formatter, format!("Invalid date format '{}'", date_format))
    })?;
    Ok(out)
}

/// Escape control characters so one record stays on one line
fn escape_line_breaks(message: &str) -> String {
    message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Substitute `%token%` placeholders in one pass over the template.
/// Inserted values are never scanned for further tokens.
fn render_template<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('%') {
        output.push_str(&rest[..open]);
        let tail = &rest[open..];
        let token = tail[1..].find('%').map(|close| &tail[1..close + 1]);

        match token.and_then(|token| lookup(token).map(|value| (token, value))) {
            Some((token, value)) => {
                output.push_str(value);
                rest = &tail[token.len() + 2..];
            }
            None => {
                output.push('%');
                rest = &tail[1..];
            }
        }
    }
    output.push_str(rest);
    output
}

/// Configurable single-line formatter
#[derive(Debug, Clone)]
pub struct LineFormatter {
    format: String,
    date_format: String,
    allow_inline_line_breaks: bool,
    ignore_empty_context_and_extra: bool,
    include_stacktraces: bool,
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self {
            format: DEFAULT_LINE_FORMAT.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            allow_inline_line_breaks: false,
            ignore_empty_context_and_extra: true,
            include_stacktraces: false,
        }
    }
}

impl LineFormatter {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    #[must_use]
    pub fn allow_inline_line_breaks(mut self, allow: bool) -> Self {
        self.allow_inline_line_breaks = allow;
        self
    }

    #[must_use]
    pub fn ignore_empty_context_and_extra(mut self, ignore: bool) -> Self {
        self.ignore_empty_context_and_extra = ignore;
        self
    }

    /// Render an `exception` context entry as a trailing trace block.
    /// Stack traces span lines, so this also allows inline line breaks.
    #[must_use]
    pub fn include_stacktraces(mut self, include: bool) -> Self {
        self.include_stacktraces = include;
        if include {
            self.allow_inline_line_breaks = true;
        }
        self
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    fn stringify(&self, value: &str) -> String {
        if self.allow_inline_line_breaks {
            value.to_string()
        } else {
            escape_line_breaks(value)
        }
    }
}

impl Formatter for LineFormatter {
    fn format(&self, record: &LogRecord) -> Result<String> {
        let mut context = record.context.clone();
        let trace = if self.include_stacktraces {
            match context.remove(EXCEPTION_KEY) {
                Some(FieldValue::String(trace)) => Some(trace),
                Some(other) => Some(other.to_string()),
                None => None,
            }
        } else {
            None
        };

        let mut output = self.format.clone();
        if self.ignore_empty_context_and_extra {
            if context.is_empty() {
                output = output.replace(" %context%", "").replace("%context%", "");
            }
            if record.extra.is_empty() {
                output = output.replace(" %extra%", "").replace("%extra%", "");
            }
        }

        let datetime = format_datetime(self.name(), &record.datetime, &self.date_format)?;
        let context_json = serde_json::to_string(&context.to_json_value())?;
        let extra_json = serde_json::to_string(&record.extra.to_json_value())?;

        let mut message = self.stringify(&record.message);
        if let Some(trace) = trace {
            message.push_str("\n[stacktrace]\n");
            message.push_str(&trace);
        }

        let context_text = self.stringify(&context_json);
        let extra_text = self.stringify(&extra_json);
        let output = render_template(&output, |token| match token {
            "datetime" => Some(datetime.as_str()),
            "channel" => Some(record.channel.as_str()),
            "level_name" => Some(record.level.level_name()),
            "message" => Some(message.as_str()),
            "context" => Some(context_text.as_str()),
            "extra" => Some(extra_text.as_str()),
            _ => None,
        });

        Ok(output)
    }

    fn name(&self) -> &str {
        "line"
    }
}

/// Header line followed by the message on its own line.
/// JSON object or array messages are pretty-printed.
#[derive(Debug, Clone)]
pub struct LinePrettyFormatter {
    date_format: String,
}

impl Default for LinePrettyFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

impl LinePrettyFormatter {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
        }
    }

    fn pretty(text: &str) -> String {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => {
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| text.to_string())
            }
            _ => text.to_string(),
        }
    }
}

impl Formatter for LinePrettyFormatter {
    fn format(&self, record: &LogRecord) -> Result<String> {
        let datetime = format_datetime(self.name(), &record.datetime, &self.date_format)?;

        Ok(format!(
            "[{}] {}.{}:\n{}\n",
            datetime,
            record.channel,
            record.level.level_name(),
            Self::pretty(&record.message)
        ))
    }

    fn name(&self) -> &str {
        "line_pretty"
    }
}

/// JSON formatter, one object per record followed by a newline
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    date_format: String,
    pretty: bool,
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

impl JsonFormatter {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
            pretty: false,
        }
    }

    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &LogRecord) -> Result<String> {
        let mut json_obj = serde_json::Map::new();

        json_obj.insert(
            "message".to_string(),
            serde_json::Value::String(record.message.clone()),
        );
        json_obj.insert("context".to_string(), record.context.to_json_value());
        json_obj.insert(
            "level".to_string(),
            serde_json::Value::Number(record.level.value().into()),
        );
        json_obj.insert(
            "level_name".to_string(),
            serde_json::Value::String(record.level.level_name().to_string()),
        );
        json_obj.insert(
            "channel".to_string(),
            serde_json::Value::String(record.channel.clone()),
        );
        json_obj.insert(
            "datetime".to_string(),
            serde_json::Value::String(format_datetime(
                self.name(),
                &record.datetime,
                &self.date_format,
            )?),
        );
        json_obj.insert("extra".to_string(), record.extra.to_json_value());

        let value = serde_json::Value::Object(json_obj);
        let mut output = if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        output.push('\n');
        Ok(output)
    }

    fn name(&self) -> &str {
        if self.pretty {
            "json_pretty"
        } else {
            "json"
        }
    }
}

/// Formatter identifiers accepted in channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatterKind {
    #[default]
    Line,
    LinePretty,
    Json,
    JsonPretty,
}

impl FormatterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatterKind::Line => "line",
            FormatterKind::LinePretty => "line_pretty",
            FormatterKind::Json => "json",
            FormatterKind::JsonPretty => "json_pretty",
        }
    }

    /// Build a fresh formatter using the configured date format
    pub fn instantiate(&self, date_format: &str) -> Box<dyn Formatter> {
        match self {
            FormatterKind::Line => Box::new(LineFormatter::new(date_format).include_stacktraces(true)),
            FormatterKind::LinePretty => Box::new(LinePrettyFormatter::new(date_format)),
            FormatterKind::Json => Box::new(JsonFormatter::new(date_format)),
            FormatterKind::JsonPretty => Box::new(JsonFormatter::new(date_format).pretty(true)),
        }
    }
}

impl fmt::Display for FormatterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FormatterKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "line" => Ok(FormatterKind::Line),
            "line_pretty" => Ok(FormatterKind::LinePretty),
            "json" => Ok(FormatterKind::Json),
            "json_pretty" => Ok(FormatterKind::JsonPretty),
            _ => Err(format!("Unknown formatter: '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_context::LogContext;
    use crate::core::log_record::test_record;
    use crate::core::severity::Severity;

    #[test]
    fn test_line_format_omits_empty_context_and_extra() {
        let formatter = LineFormatter::new("%Y-%m-%d %H:%M:%S");
        let output = formatter.format(&test_record(Severity::Info, "just an info")).unwrap();

        assert_eq!(output, "[2024-03-15 10:30:45] test.INFO: just an info\n");
    }

    #[test]
    fn test_line_format_with_context() {
        let formatter = LineFormatter::new("%Y-%m-%d");
        let record = test_record(Severity::Error, "failed")
            .with_context(LogContext::new().with_field("user_id", 42));
        let output = formatter.format(&record).unwrap();

        assert_eq!(output, "[2024-03-15] test.ERROR: failed {\"user_id\":42}\n");
    }

    #[test]
    fn test_line_format_keeps_empty_context_when_asked() {
        let formatter = LineFormatter::new("%Y").ignore_empty_context_and_extra(false);
        let output = formatter.format(&test_record(Severity::Debug, "x")).unwrap();

        assert_eq!(output, "[2024] test.DEBUG: x {} {}\n");
    }

    #[test]
    fn test_line_format_escapes_line_breaks() {
        let formatter = LineFormatter::default();
        let output = formatter
            .format(&test_record(Severity::Info, "User login\nERROR fake entry"))
            .unwrap();

        assert!(output.contains("User login\\nERROR fake entry"));
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_line_format_stacktrace_block() {
        let formatter = LineFormatter::default().include_stacktraces(true);
        let record = test_record(Severity::Critical, "boom").with_context(
            LogContext::new().with_field(EXCEPTION_KEY, "#0 main.rs:10\n#1 lib.rs:20"),
        );
        let output = formatter.format(&record).unwrap();

        assert!(output.contains("boom\n[stacktrace]\n#0 main.rs:10\n#1 lib.rs:20"));
        assert!(!output.contains("\"exception\""));
    }

    #[test]
    fn test_line_format_leaves_tokens_inside_values() {
        let formatter = LineFormatter::new("%Y-%m-%d");
        let record = test_record(Severity::Info, "hello %channel%").with_context(
            LogContext::new().with_field("note", "%message% at %datetime%"),
        );
        let output = formatter.format(&record).unwrap();

        assert_eq!(
            output,
            "[2024-03-15] test.INFO: hello %channel% {\"note\":\"%message% at %datetime%\"}\n"
        );
    }

    #[test]
    fn test_line_format_keeps_unknown_tokens() {
        let formatter = LineFormatter::new("%Y").with_format("%level_name% 100% %foo% %message%");
        let output = formatter.format(&test_record(Severity::Info, "done")).unwrap();

        assert_eq!(output, "INFO 100% %foo% done");
    }

    #[test]
    fn test_invalid_date_format_is_an_error() {
        let formatter = LineFormatter::new("%Y %!");
        let result = formatter.format(&test_record(Severity::Info, "x"));
        assert!(matches!(result, Err(LoggerError::FormatterError { .. })));
    }

    #[test]
    fn test_line_pretty_format() {
        let formatter = LinePrettyFormatter::new("%Y-%m-%d %H:%M:%S");
        let record = test_record(Severity::Error, r#"{"key1":"value1","key2":"value2"}"#);
        let output = formatter.format(&record).unwrap();

        assert!(output.starts_with("[2024-03-15 10:30:45] test.ERROR:\n{\n"));
        assert!(output.contains("  \"key2\": \"value2\""));
    }

    #[test]
    fn test_line_pretty_format_omits_context() {
        let formatter = LinePrettyFormatter::new("%Y");
        let record = test_record(Severity::Info, "plain")
            .with_context(LogContext::new().with_field("user_id", 42));
        let output = formatter.format(&record).unwrap();

        assert_eq!(output, "[2024] test.INFO:\nplain\n");
    }

    #[test]
    fn test_json_format() {
        let record = test_record(Severity::Warning, "Warning message")
            .with_context(LogContext::new().with_field("request_id", "abc-123"));
        let output = JsonFormatter::default().format(&record).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["message"], "Warning message");
        assert_eq!(parsed["level"], 300);
        assert_eq!(parsed["level_name"], "WARNING");
        assert_eq!(parsed["channel"], "test");
        assert_eq!(parsed["context"]["request_id"], "abc-123");
        assert!(output.ends_with('\n'));
    }

    #[test]
    fn test_formatter_kind_parsing() {
        assert_eq!("line".parse::<FormatterKind>(), Ok(FormatterKind::Line));
        assert_eq!("json-pretty".parse::<FormatterKind>(), Ok(FormatterKind::JsonPretty));
        assert!("rotating_file".parse::<FormatterKind>().is_err());
    }

    #[test]
    fn test_formatter_kind_instantiate() {
        assert_eq!(FormatterKind::Line.instantiate("%Y").name(), "line");
        assert_eq!(FormatterKind::JsonPretty.instantiate("%Y").name(), "json_pretty");
    }
}
