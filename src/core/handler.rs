//! Handler traits for log output destinations
//!
//! Every handler implements [`Handler`]. Handlers that accept a formatter or
//! processors additionally implement [`FormattableHandler`] /
//! [`ProcessableHandler`] and expose them through the `as_*` accessors, which
//! is how the factory decides what to attach.

use super::error::Result;
use super::formatter::{Formatter, LineFormatter};
use super::log_record::LogRecord;
use super::processor::Processor;
use super::severity::Severity;

pub trait Handler: Send {
    /// Handler kind identifier, e.g. `rotating_file`
    fn name(&self) -> &str;

    /// Whether a record at `level` would be handled
    fn is_handling(&self, level: Severity) -> bool;

    /// Handle a record. Returns `true` when the record must not bubble
    /// to the next handler of the same channel logger.
    fn handle(&mut self, record: &LogRecord) -> Result<bool>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn as_formattable(&mut self) -> Option<&mut dyn FormattableHandler> {
        None
    }

    fn as_processable(&mut self) -> Option<&mut dyn ProcessableHandler> {
        None
    }
}

pub trait FormattableHandler {
    fn set_formatter(&mut self, formatter: Box<dyn Formatter>);
    fn formatter(&self) -> &dyn Formatter;
}

pub trait ProcessableHandler {
    fn push_processor(&mut self, processor: Box<dyn Processor>);
    fn processor_count(&self) -> usize;
}

/// Level, bubbling, formatter and processor state shared by the
/// formattable handlers.
pub struct HandlerState {
    pub level: Severity,
    pub bubble: bool,
    formatter: Box<dyn Formatter>,
    processors: Vec<Box<dyn Processor>>,
}

impl HandlerState {
    pub fn new(level: Severity, bubble: bool) -> Self {
        Self {
            level,
            bubble,
            formatter: Box::new(LineFormatter::default()),
            processors: Vec::new(),
        }
    }

    pub fn is_handling(&self, level: Severity) -> bool {
        level >= self.level
    }

    /// Run the processors (last pushed first) and format the result
    pub fn prepare(&self, record: &LogRecord) -> Result<(LogRecord, String)> {
        let record = self
            .processors
            .iter()
            .rev()
            .fold(record.clone(), |record, processor| processor.process(record));
        let formatted = self.formatter.format(&record)?;
        Ok((record, formatted))
    }

    pub fn set_formatter(&mut self, formatter: Box<dyn Formatter>) {
        self.formatter = formatter;
    }

    pub fn formatter(&self) -> &dyn Formatter {
        self.formatter.as_ref()
    }

    pub fn push_processor(&mut self, processor: Box<dyn Processor>) {
        self.processors.push(processor);
    }

    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }
}

/// Implements `FormattableHandler` and `ProcessableHandler` for a handler
/// that keeps its shared state in a `state: HandlerState` field.
macro_rules! impl_handler_state {
    ($handler:ty) => {
        impl $crate::core::handler::FormattableHandler for $handler {
            fn set_formatter(&mut self, formatter: Box<dyn $crate::core::formatter::Formatter>) {
                self.state.set_formatter(formatter);
            }

            fn formatter(&self) -> &dyn $crate::core::formatter::Formatter {
                self.state.formatter()
            }
        }

        impl $crate::core::handler::ProcessableHandler for $handler {
            fn push_processor(&mut self, processor: Box<dyn $crate::core::processor::Processor>) {
                self.state.push_processor(processor);
            }

            fn processor_count(&self) -> usize {
                self.state.processor_count()
            }
        }
    };
}

pub(crate) use impl_handler_state;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_context::LogContext;
    use crate::core::log_record::test_record;
    use crate::core::processor::PsrLogMessageProcessor;

    #[test]
    fn test_state_level_threshold() {
        let state = HandlerState::new(Severity::Warning, true);
        assert!(!state.is_handling(Severity::Notice));
        assert!(state.is_handling(Severity::Warning));
        assert!(state.is_handling(Severity::Emergency));
    }

    #[test]
    fn test_state_prepare_runs_processors_before_formatting() {
        let mut state = HandlerState::new(Severity::Debug, true);
        state.push_processor(Box::new(PsrLogMessageProcessor::default()));

        let record = test_record(Severity::Info, "hello {name}")
            .with_context(LogContext::new().with_field("name", "world"));
        let (processed, formatted) = state.prepare(&record).unwrap();

        assert_eq!(processed.message, "hello world");
        assert!(formatted.contains("test.INFO: hello world"));
        // the caller's record is untouched
        assert_eq!(record.message, "hello {name}");
    }
}
