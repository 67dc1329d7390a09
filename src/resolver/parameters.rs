//! Declared handler constructor parameters

use crate::config::channel::ParamValue;
use crate::core::severity::Severity;

/// Declared type of a constructor parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Str,
    Int,
    Bool,
    Level,
    /// Log file path; subject to `log_path` prefixing and `log_file` defaulting
    LogFile,
    OptionalStr,
    OptionalInt,
    List,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Str => "string",
            ParamType::Int => "int",
            ParamType::Bool => "bool",
            ParamType::Level => "level",
            ParamType::LogFile => "log file",
            ParamType::OptionalStr => "string or null",
            ParamType::OptionalInt => "int or null",
            ParamType::List => "list",
        }
    }
}

/// Declared default of a constructor parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    /// No default; resolves to the type's zero value when unconfigured
    Required,
    Null,
    Str(&'static str),
    Int(i64),
    Bool(bool),
    Level(Severity),
    EmptyList,
}

impl ParamDefault {
    pub fn to_value(&self) -> ParamValue {
        match self {
            ParamDefault::Required | ParamDefault::Null => ParamValue::Null,
            ParamDefault::Str(s) => ParamValue::from(*s),
            ParamDefault::Int(i) => ParamValue::Int(*i),
            ParamDefault::Bool(b) => ParamValue::Bool(*b),
            ParamDefault::Level(level) => ParamValue::from(*level),
            ParamDefault::EmptyList => ParamValue::List(Vec::new()),
        }
    }
}

/// One constructor parameter: name, type and default, in declaration order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameter {
    pub name: &'static str,
    pub ty: ParamType,
    pub default: ParamDefault,
}

impl Parameter {
    pub const fn new(name: &'static str, ty: ParamType, default: ParamDefault) -> Self {
        Self { name, ty, default }
    }

    pub fn is_required(&self) -> bool {
        matches!(self.default, ParamDefault::Required)
    }

    /// Default value cast to the declared type
    pub fn default_value(&self) -> ParamValue {
        cast(self.default.to_value(), self.ty)
    }
}

/// Cast a value to a scalar type: string, int and bool get zero values for
/// null and loose conversions otherwise; other types pass through.
pub fn cast(value: ParamValue, ty: ParamType) -> ParamValue {
    match ty {
        ParamType::Str | ParamType::LogFile => match value {
            ParamValue::Null => ParamValue::String(String::new()),
            ParamValue::Bool(b) => ParamValue::String(if b { "1".into() } else { String::new() }),
            ParamValue::Int(i) => ParamValue::String(i.to_string()),
            ParamValue::Float(x) => ParamValue::String(x.to_string()),
            other => other,
        },
        ParamType::Int => match value {
            ParamValue::Null => ParamValue::Int(0),
            ParamValue::Bool(b) => ParamValue::Int(i64::from(b)),
            ParamValue::Float(x) => ParamValue::Int(x.trunc() as i64),
            ParamValue::String(s) => ParamValue::Int(s.trim().parse().unwrap_or(0)),
            other => other,
        },
        ParamType::Bool => match value {
            ParamValue::Null => ParamValue::Bool(false),
            ParamValue::Int(i) => ParamValue::Bool(i != 0),
            ParamValue::Float(x) => ParamValue::Bool(x != 0.0),
            ParamValue::String(s) => ParamValue::Bool(!s.is_empty() && s != "0"),
            ParamValue::List(items) => ParamValue::Bool(!items.is_empty()),
            other => other,
        },
        _ => value,
    }
}
