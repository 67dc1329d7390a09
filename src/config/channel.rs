//! Channel configuration types

use crate::core::error::{LoggerError, Result};
use crate::core::formatter::FormatterKind;
use crate::core::processor::ProcessorKind;
use crate::core::severity::Severity;
use crate::core::timezone::Timezone;
use crate::handlers::HandlerKind;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Free-form configuration value, as read from TOML or JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum ParamValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ParamValue>),
}

impl ParamValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Null => "null",
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::String(_) => "string",
            ParamValue::List(_) => "list",
        }
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            ParamValue::Null => serde_json::Value::Null,
            ParamValue::Bool(b) => json!(b),
            ParamValue::Int(i) => json!(i),
            ParamValue::Float(f) => json!(f),
            ParamValue::String(s) => json!(s),
            ParamValue::List(items) => {
                serde_json::Value::Array(items.iter().map(ParamValue::to_json_value).collect())
            }
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => write!(f, "null"),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::String(s) => write!(f, "{}", s),
            ParamValue::List(_) => write!(f, "{}", self.to_json_value()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::String(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::String(s)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        ParamValue::Int(i64::from(i))
    }
}

impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        ParamValue::Float(x)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(items: Vec<T>) -> Self {
        ParamValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Severity> for ParamValue {
    fn from(level: Severity) -> Self {
        ParamValue::String(level.as_str().to_string())
    }
}

/// A channel entry before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawChannel {
    pub handler: Option<String>,
    pub formatter: Option<String>,
    pub processor: Option<String>,
    pub config: BTreeMap<String, ParamValue>,
}

impl RawChannel {
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            handler: Some(handler.into()),
            ..Default::default()
        }
    }

    pub fn with_formatter(mut self, formatter: impl Into<String>) -> Self {
        self.formatter = Some(formatter.into());
        self
    }

    pub fn with_processor(mut self, processor: impl Into<String>) -> Self {
        self.processor = Some(processor.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

/// Caller-supplied channels, merged over the file configuration.
///
/// A channel here replaces a same-named channel from the file entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelOverrides {
    channels: BTreeMap<String, RawChannel>,
}

impl ChannelOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, name: impl Into<String>, channel: RawChannel) -> Self {
        self.insert(name, channel);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, channel: RawChannel) {
        self.channels.insert(name.into(), channel);
    }

    /// Build overrides from dynamic input, e.g. a JSON document.
    ///
    /// The value must be an object mapping channel names to channel objects.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(LoggerError::config(
                "Custom channel configuration does not fulfill required structure",
            ));
        }
        let channels: BTreeMap<String, RawChannel> =
            serde_json::from_value(value).map_err(|e| {
                LoggerError::config(format!(
                    "Custom channel configuration does not fulfill required structure: {}",
                    e
                ))
            })?;
        Ok(Self { channels })
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawChannel)> {
        self.channels.iter()
    }
}

/// A validated channel: every identifier parsed, `level` always present
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelDescriptor {
    pub name: String,
    pub handler: HandlerKind,
    pub formatter: FormatterKind,
    pub processor: ProcessorKind,
    pub level: Severity,
    pub parameters: BTreeMap<String, ParamValue>,
}

impl ChannelDescriptor {
    pub fn parameter(&self, key: &str) -> Option<&ParamValue> {
        self.parameters.get(key)
    }

    /// Whether `key` is configured with a non-null value
    pub fn is_configured(&self, key: &str) -> bool {
        self.parameters.get(key).is_some_and(|v| !v.is_null())
    }
}

/// Fully merged and sanitized logger configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalConfig {
    pub log_file: PathBuf,
    pub log_path: PathBuf,
    pub timezone: Timezone,
    pub date_format: String,
    pub channels: BTreeMap<String, ChannelDescriptor>,
}

impl GlobalConfig {
    pub fn channel(&self, name: &str) -> Option<&ChannelDescriptor> {
        self.channels.get(name)
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.keys().map(String::as_str).collect()
    }

    /// Look up a top-level key as a JSON value.
    ///
    /// Accepts `log_file`, `log_path`, `timezone`, `date_format` and
    /// `channels`, plus their camelCase spellings.
    pub fn value(&self, key: &str) -> Option<serde_json::Value> {
        match key {
            "log_file" | "logFile" => Some(json!(self.log_file.display().to_string())),
            "log_path" | "logPath" => Some(json!(self.log_path.display().to_string())),
            "timezone" => Some(json!(self.timezone.to_string())),
            "date_format" | "dateFormat" => Some(json!(self.date_format)),
            "channels" => serde_json::to_value(&self.channels).ok(),
            _ => None,
        }
    }
}
