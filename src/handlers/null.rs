//! Handler that swallows records

use crate::core::error::Result;
use crate::core::handler::Handler;
use crate::core::log_record::LogRecord;
use crate::core::severity::Severity;
use crate::resolver::arguments::ArgumentCursor;
use crate::resolver::parameters::{ParamDefault, ParamType, Parameter};
use crate::resolver::registry::FromArguments;

/// Discards every record at or above its level and stops propagation.
///
/// Useful to silence a channel without removing it from the configuration.
#[derive(Debug, Clone, Default)]
pub struct NullHandler {
    level: Severity,
}

impl NullHandler {
    pub fn new(level: Severity) -> Self {
        Self { level }
    }

    pub fn level(&self) -> Severity {
        self.level
    }
}

impl FromArguments for NullHandler {
    const PARAMETERS: &'static [Parameter] = &[Parameter::new(
        "level",
        ParamType::Level,
        ParamDefault::Level(Severity::Debug),
    )];

    fn from_arguments(args: &mut ArgumentCursor<'_>) -> Result<Self> {
        Ok(Self::new(args.next_level("level")?))
    }
}

impl Handler for NullHandler {
    fn name(&self) -> &str {
        "null"
    }

    fn is_handling(&self, level: Severity) -> bool {
        level >= self.level
    }

    fn handle(&mut self, record: &LogRecord) -> Result<bool> {
        Ok(self.is_handling(record.level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_record::test_record;

    #[test]
    fn test_null_handler_stops_propagation() {
        let mut handler = NullHandler::new(Severity::Warning);
        assert!(!handler.handle(&test_record(Severity::Info, "a")).unwrap());
        assert!(handler.handle(&test_record(Severity::Error, "b")).unwrap());
        assert!(handler.as_formattable().is_none());
        assert!(handler.as_processable().is_none());
    }
}
