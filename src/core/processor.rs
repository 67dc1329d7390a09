//! Processors enrich or rewrite a record before it is formatted

use super::log_context::FieldValue;
use super::log_record::LogRecord;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub trait Processor: Send + Sync {
    fn process(&self, record: LogRecord) -> LogRecord;
    fn name(&self) -> &str;
}

/// Replaces `{key}` placeholders in the message with context values.
///
/// Placeholders without a matching context key are left untouched.
#[derive(Debug, Clone)]
pub struct PsrLogMessageProcessor {
    remove_used_context_fields: bool,
}

impl Default for PsrLogMessageProcessor {
    fn default() -> Self {
        Self {
            remove_used_context_fields: true,
        }
    }
}

impl PsrLogMessageProcessor {
    pub fn new(remove_used_context_fields: bool) -> Self {
        Self {
            remove_used_context_fields,
        }
    }

    fn placeholder_value(value: &FieldValue) -> String {
        match value {
            FieldValue::Null => String::new(),
            FieldValue::List(_) => format!("[array {}]", value.to_json_value()),
            other => other.to_string(),
        }
    }
}

impl Processor for PsrLogMessageProcessor {
    fn process(&self, mut record: LogRecord) -> LogRecord {
        if !record.message.contains('{') {
            return record;
        }

        let mut message = String::with_capacity(record.message.len());
        let mut used = Vec::new();
        let mut rest = record.message.as_str();

        // Single pass over the original text; substituted values are never rescanned
        while let Some(open) = rest.find('{') {
            message.push_str(&rest[..open]);
            let tail = &rest[open..];
            let value = tail[1..]
                .find('}')
                .map(|close| &tail[1..close + 1])
                .and_then(|key| record.context.get(key).map(|value| (key, value)));

            match value {
                Some((key, value)) => {
                    message.push_str(&Self::placeholder_value(value));
                    if !used.iter().any(|k: &String| k == key) {
                        used.push(key.to_string());
                    }
                    rest = &tail[key.len() + 2..];
                }
                None => {
                    message.push('{');
                    rest = &tail[1..];
                }
            }
        }
        message.push_str(rest);
        record.message = message;

        if self.remove_used_context_fields {
            for key in used {
                record.context.remove(&key);
            }
        }

        record
    }

    fn name(&self) -> &str {
        "psr_log_message"
    }
}

/// Adds a per-instance unique identifier to `extra["uid"]`
#[derive(Debug, Clone)]
pub struct UidProcessor {
    uid: String,
}

impl UidProcessor {
    pub const DEFAULT_LENGTH: usize = 7;

    pub fn new(length: usize) -> Self {
        let mut rng = rand::thread_rng();
        let uid = (0..length.clamp(1, 32))
            .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
            .collect();
        Self { uid }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }
}

impl Default for UidProcessor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LENGTH)
    }
}

impl Processor for UidProcessor {
    fn process(&self, mut record: LogRecord) -> LogRecord {
        record.extra.add_field("uid", self.uid.as_str());
        record
    }

    fn name(&self) -> &str {
        "uid"
    }
}

/// Processor identifiers accepted in channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorKind {
    #[default]
    PsrLogMessage,
    Uid,
}

impl ProcessorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorKind::PsrLogMessage => "psr_log_message",
            ProcessorKind::Uid => "uid",
        }
    }

    pub fn instantiate(&self) -> Box<dyn Processor> {
        match self {
            ProcessorKind::PsrLogMessage => Box::new(PsrLogMessageProcessor::default()),
            ProcessorKind::Uid => Box::new(UidProcessor::default()),
        }
    }
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProcessorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "psr_log_message" | "interpolate" => Ok(ProcessorKind::PsrLogMessage),
            "uid" => Ok(ProcessorKind::Uid),
            _ => Err(format!("Unknown processor: '{}'", s)),
        }
    }
}
