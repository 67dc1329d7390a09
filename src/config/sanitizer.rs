//! Channel validation and normalization

use super::channel::{ChannelDescriptor, ParamValue, RawChannel};
use super::environment::Environment;
use crate::core::error::{LoggerError, Result};
use crate::core::formatter::FormatterKind;
use crate::core::processor::ProcessorKind;
use crate::core::severity::Severity;
use crate::handlers::HandlerKind;
use std::collections::BTreeMap;

/// Environment variable naming the fallback severity
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

/// Inputs the sanitizer needs besides the channel itself
pub struct SanitizeContext<'a> {
    pub env: &'a dyn Environment,
}

impl<'a> SanitizeContext<'a> {
    pub fn new(env: &'a dyn Environment) -> Self {
        Self { env }
    }

    /// Severity used when a channel does not configure `level`
    pub fn fallback_level(&self) -> Result<Severity> {
        let name = self
            .env
            .var(LOG_LEVEL_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| Severity::Debug.as_str().to_string());
        name.parse().map_err(|_| {
            LoggerError::config(format!(
                "Environment variable {} names an unknown severity: '{}'",
                LOG_LEVEL_VAR, name
            ))
        })
    }
}

/// Validate a raw channel and turn it into a descriptor.
///
/// Configuration keys are normalized to snake_case (`maxFiles` becomes
/// `max_files`) and `level` is always present in the returned parameters.
pub fn sanitize(name: &str, raw: &RawChannel, ctx: &SanitizeContext<'_>) -> Result<ChannelDescriptor> {
    let handler = validate_handler(raw)?;

    let formatter = match raw.formatter.as_deref() {
        Some(id) => id.parse::<FormatterKind>().map_err(|_| {
            LoggerError::config(format!("Given formatter is not a known formatter: {}", id))
        })?,
        None => FormatterKind::default(),
    };

    let processor = match raw.processor.as_deref() {
        Some(id) => id.parse::<ProcessorKind>().map_err(|_| {
            LoggerError::config(format!("Given processor is not a known processor: {}", id))
        })?,
        None => ProcessorKind::default(),
    };

    let mut parameters: BTreeMap<String, ParamValue> = raw
        .config
        .iter()
        .map(|(k, v)| (snake_case(k), v.clone()))
        .collect();

    let level = match parameters.get("level") {
        None | Some(ParamValue::Null) => ctx.fallback_level()?,
        Some(value) => parse_level(value)?,
    };
    parameters.insert("level".to_string(), ParamValue::from(level));

    Ok(ChannelDescriptor {
        name: name.to_string(),
        handler,
        formatter,
        processor,
        level,
        parameters,
    })
}

fn validate_handler(raw: &RawChannel) -> Result<HandlerKind> {
    let id = raw
        .handler
        .as_deref()
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| LoggerError::config("Channel configuration requires a handler, none given"))?;

    id.parse::<HandlerKind>()
        .map_err(|_| LoggerError::config(format!("Given handler is not a known handler: {}", id)))
}

/// Parse a configured level: a severity name or its numeric value
fn parse_level(value: &ParamValue) -> Result<Severity> {
    let parsed = match value {
        ParamValue::String(name) => name.parse::<Severity>().ok(),
        ParamValue::Int(n) => Severity::ALL
            .iter()
            .copied()
            .find(|s| i64::from(s.value()) == *n),
        _ => None,
    };
    parsed.ok_or_else(|| LoggerError::config(format!("Unknown severity level: '{}'", value)))
}

/// `maxFiles` -> `max_files`; snake_case input is returned unchanged
pub fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_defaults_applied() {
        let env = no_env();
        let descriptor = sanitize("main", &RawChannel::new("rotating_file"), &SanitizeContext::new(&env))
            .unwrap();

        assert_eq!(descriptor.handler, HandlerKind::RotatingFile);
        assert_eq!(descriptor.formatter, FormatterKind::Line);
        assert_eq!(descriptor.processor, ProcessorKind::PsrLogMessage);
        assert_eq!(descriptor.level, Severity::Debug);
        assert_eq!(descriptor.parameter("level"), Some(&ParamValue::from("debug")));
    }

    #[test]
    fn test_missing_level_uses_log_level_env() {
        let env: HashMap<String, String> =
            [("LOG_LEVEL".to_string(), "Warning".to_string())].into_iter().collect();
        let descriptor =
            sanitize("x", &RawChannel::new("null"), &SanitizeContext::new(&env)).unwrap();
        assert_eq!(descriptor.level, Severity::Warning);
    }

    #[test]
    fn test_invalid_log_level_env_is_rejected() {
        let env: HashMap<String, String> =
            [("LOG_LEVEL".to_string(), "verbose".to_string())].into_iter().collect();
        let err = sanitize("x", &RawChannel::new("null"), &SanitizeContext::new(&env)).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_level_parsing() {
        let env = no_env();
        let ctx = SanitizeContext::new(&env);

        let named = RawChannel::new("null").with_param("level", "ERROR");
        assert_eq!(sanitize("x", &named, &ctx).unwrap().level, Severity::Error);

        let numeric = RawChannel::new("null").with_param("level", 250);
        assert_eq!(sanitize("x", &numeric, &ctx).unwrap().level, Severity::Notice);

        let unknown = RawChannel::new("null").with_param("level", "loud");
        assert!(sanitize("x", &unknown, &ctx).unwrap_err().is_config());
    }

    #[test]
    fn test_identifier_validation() {
        let env = no_env();
        let ctx = SanitizeContext::new(&env);

        assert!(sanitize("x", &RawChannel::default(), &ctx).unwrap_err().is_config());
        assert!(sanitize("x", &RawChannel::new("Nonexisting"), &ctx)
            .unwrap_err()
            .is_config());
        assert!(sanitize("x", &RawChannel::new("null").with_formatter("xml"), &ctx)
            .unwrap_err()
            .is_config());
        assert!(sanitize("x", &RawChannel::new("null").with_processor("tags"), &ctx)
            .unwrap_err()
            .is_config());

        let ok = RawChannel::new("stream")
            .with_formatter("json_pretty")
            .with_processor("uid");
        let descriptor = sanitize("x", &ok, &ctx).unwrap();
        assert_eq!(descriptor.formatter, FormatterKind::JsonPretty);
        assert_eq!(descriptor.processor, ProcessorKind::Uid);
    }

    #[test]
    fn test_camel_case_keys_normalized() {
        let env = no_env();
        let raw = RawChannel::new("rotating_file").with_param("maxFiles", 10);
        let descriptor = sanitize("main", &raw, &SanitizeContext::new(&env)).unwrap();
        assert_eq!(descriptor.parameter("max_files"), Some(&ParamValue::Int(10)));
        assert_eq!(snake_case("useShortAttachment"), "use_short_attachment");
        assert_eq!(snake_case("file_permission"), "file_permission");
    }
}
