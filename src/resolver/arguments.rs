//! Mapping channel configuration onto declared handler parameters

use super::parameters::ParamType;
use super::registry::HandlerSpec;
use crate::config::channel::{GlobalConfig, ParamValue};
use crate::core::error::{LoggerError, Result};
use crate::core::severity::Severity;
use crate::handlers::HandlerKind;
use std::path::{Path, PathBuf};

/// Parameters that name the file a handler writes to
pub const LOG_FILE_PARAMETERS: [&str; 2] = ["filename", "stream"];

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: ParamValue,
}

/// Ordered constructor arguments for one channel's handler.
///
/// The order always equals the handler kind's declaration order; handlers
/// consume them positionally through an [`ArgumentCursor`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedArguments {
    handler: Option<HandlerKind>,
    args: Vec<Argument>,
}

impl ResolvedArguments {
    pub fn new(handler: HandlerKind) -> Self {
        Self {
            handler: Some(handler),
            args: Vec::new(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: ParamValue) {
        self.args.push(Argument {
            name: name.into(),
            value,
        });
    }

    pub fn handler(&self) -> Option<HandlerKind> {
        self.handler
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.args.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    pub fn names(&self) -> Vec<&str> {
        self.args.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.args.iter()
    }

    pub fn cursor(&self) -> ArgumentCursor<'_> {
        ArgumentCursor {
            handler: self.handler.map_or("handler", |h| h.as_str()),
            args: &self.args,
            position: 0,
        }
    }
}

/// Positional reader over resolved arguments.
///
/// Every `next_*` call names the parameter it expects; a name, count or type
/// mismatch is an error.
pub struct ArgumentCursor<'a> {
    handler: &'static str,
    args: &'a [Argument],
    position: usize,
}

impl<'a> ArgumentCursor<'a> {
    fn error(&self, message: String) -> LoggerError {
        LoggerError::handler(self.handler, message)
    }

    fn mismatch(&self, name: &str, expected: ParamType, value: &ParamValue) -> LoggerError {
        self.error(format!(
            "argument '{}' must be {}, got {} '{}'",
            name,
            expected.as_str(),
            value.type_name(),
            value
        ))
    }

    fn next(&mut self, name: &str) -> Result<&'a ParamValue> {
        let args: &'a [Argument] = self.args;
        let arg = args.get(self.position).ok_or_else(|| {
            self.error(format!(
                "missing argument '{}' at position {}",
                name, self.position
            ))
        })?;
        if arg.name != name {
            return Err(self.error(format!(
                "expected argument '{}' at position {}, found '{}'",
                name, self.position, arg.name
            )));
        }
        self.position += 1;
        Ok(&arg.value)
    }

    pub fn next_str(&mut self, name: &str) -> Result<String> {
        match self.next(name)? {
            ParamValue::String(s) => Ok(s.clone()),
            ParamValue::Int(i) => Ok(i.to_string()),
            ParamValue::Float(x) => Ok(x.to_string()),
            other => Err(self.mismatch(name, ParamType::Str, other)),
        }
    }

    pub fn next_opt_str(&mut self, name: &str) -> Result<Option<String>> {
        match self.next(name)? {
            ParamValue::Null => Ok(None),
            ParamValue::String(s) => Ok(Some(s.clone())),
            other => Err(self.mismatch(name, ParamType::OptionalStr, other)),
        }
    }

    pub fn next_int(&mut self, name: &str) -> Result<i64> {
        let value = self.next(name)?;
        let parsed = match value {
            ParamValue::Int(i) => Some(*i),
            ParamValue::Float(x) if x.fract() == 0.0 => Some(*x as i64),
            ParamValue::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| self.mismatch(name, ParamType::Int, value))
    }

    pub fn next_opt_int(&mut self, name: &str) -> Result<Option<i64>> {
        let value = self.next(name)?;
        match value {
            ParamValue::Null => Ok(None),
            ParamValue::Int(i) => Ok(Some(*i)),
            ParamValue::String(s) => parse_int(s)
                .map(Some)
                .ok_or_else(|| self.mismatch(name, ParamType::OptionalInt, value)),
            _ => Err(self.mismatch(name, ParamType::OptionalInt, value)),
        }
    }

    pub fn next_bool(&mut self, name: &str) -> Result<bool> {
        let value = self.next(name)?;
        let parsed = match value {
            ParamValue::Bool(b) => Some(*b),
            ParamValue::Int(i) => Some(*i != 0),
            ParamValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(true),
                "false" | "0" | "no" | "off" | "" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed.ok_or_else(|| self.mismatch(name, ParamType::Bool, value))
    }

    pub fn next_level(&mut self, name: &str) -> Result<Severity> {
        let value = self.next(name)?;
        let level = match value {
            ParamValue::String(s) => s.parse().ok(),
            ParamValue::Int(i) => Severity::ALL
                .iter()
                .copied()
                .find(|level| i64::from(level.value()) == *i),
            _ => None,
        };
        level.ok_or_else(|| self.mismatch(name, ParamType::Level, value))
    }

    pub fn next_path(&mut self, name: &str) -> Result<PathBuf> {
        match self.next(name)? {
            ParamValue::String(s) if !s.is_empty() => Ok(PathBuf::from(s)),
            ParamValue::String(_) => Err(self.error(format!("argument '{}' must not be empty", name))),
            other => Err(self.mismatch(name, ParamType::LogFile, other)),
        }
    }

    pub fn next_list(&mut self, name: &str) -> Result<Vec<String>> {
        match self.next(name)? {
            ParamValue::Null => Ok(Vec::new()),
            ParamValue::List(items) => Ok(items.iter().map(ToString::to_string).collect()),
            other => Err(self.mismatch(name, ParamType::List, other)),
        }
    }

    /// Fail if arguments remain unconsumed
    pub fn finish(&self) -> Result<()> {
        match self.args.get(self.position) {
            None => Ok(()),
            Some(extra) => Err(self.error(format!(
                "unexpected argument '{}' at position {}",
                extra.name, self.position
            ))),
        }
    }
}

/// Decimal, or octal with a leading `0`/`0o` (file modes such as `"0644"`)
fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Some(octal) = s.strip_prefix("0o") {
        return i64::from_str_radix(octal, 8).ok();
    }
    if s.len() > 1 && s.starts_with('0') {
        return i64::from_str_radix(&s[1..], 8).ok();
    }
    s.parse().ok()
}

/// Resolve a channel's handler arguments from the configuration.
///
/// Each declared parameter takes the configured value when present and not
/// null, else its default cast to the declared type. Log file parameters are
/// prefixed with `log_path` unless they already contain a path separator, and
/// default to `log_file` when neither `filename` nor `stream` is configured.
pub fn resolve(channel: &str, config: &GlobalConfig) -> Result<ResolvedArguments> {
    let descriptor = config.channel(channel).ok_or_else(|| {
        LoggerError::resolver(
            channel,
            format!("Configuration for channel \"{}\" not found", channel),
        )
    })?;

    let spec = HandlerSpec::for_kind(descriptor.handler);
    let log_file_configured = LOG_FILE_PARAMETERS
        .iter()
        .any(|name| descriptor.is_configured(name));

    let mut arguments = ResolvedArguments::new(descriptor.handler);
    for parameter in spec.parameters {
        let configured = descriptor
            .parameter(parameter.name)
            .filter(|value| !value.is_null());

        let value = if parameter.ty == ParamType::LogFile {
            match configured {
                Some(ParamValue::String(file)) => {
                    ParamValue::String(prefix_log_path(&config.log_path, file))
                }
                Some(other) => {
                    return Err(LoggerError::resolver(
                        channel,
                        format!(
                            "argument '{}' must be a string, got {}",
                            parameter.name,
                            other.type_name()
                        ),
                    ))
                }
                None if !log_file_configured => {
                    ParamValue::String(config.log_file.display().to_string())
                }
                None => parameter.default_value(),
            }
        } else {
            configured
                .cloned()
                .unwrap_or_else(|| parameter.default_value())
        };

        arguments.push(parameter.name, value);
    }

    tracing::trace!(
        channel,
        handler = %descriptor.handler,
        arguments = arguments.len(),
        "channel arguments resolved"
    );

    Ok(arguments)
}

/// `log_path/file`, unless `file` already contains a path separator
pub fn prefix_log_path(log_path: &Path, file: &str) -> String {
    if file.contains('/') || file.contains(std::path::MAIN_SEPARATOR) {
        file.to_string()
    } else {
        log_path.join(file).display().to_string()
    }
}
