//! Named logger dispatching records to its handlers

use super::{
    error::Result, handler::Handler, log_context::LogContext, log_record::LogRecord,
    severity::Severity, timezone::Timezone,
};
use parking_lot::Mutex;

/// One channel: a name, a timezone and a stack of handlers.
///
/// Records are offered to handlers in push order. A handler that handles a
/// record and does not bubble stops the propagation.
pub struct ChannelLogger {
    name: String,
    timezone: Timezone,
    handlers: Vec<Mutex<Box<dyn Handler>>>,
}

impl ChannelLogger {
    #[must_use]
    pub fn new(name: impl Into<String>, timezone: Timezone) -> Self {
        Self {
            name: name.into(),
            timezone,
            handlers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_handler(mut self, handler: Box<dyn Handler>) -> Self {
        self.push_handler(handler);
        self
    }

    pub fn push_handler(&mut self, handler: Box<dyn Handler>) {
        self.handlers.push(Mutex::new(handler));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Names of the attached handlers, in dispatch order
    pub fn handler_names(&self) -> Vec<String> {
        self.handlers
            .iter()
            .map(|h| h.lock().name().to_string())
            .collect()
    }

    pub fn is_handling(&self, level: Severity) -> bool {
        self.handlers.iter().any(|h| h.lock().is_handling(level))
    }

    /// Dispatch a record. Returns `true` if at least one handler saw it.
    ///
    /// The first handler error aborts dispatch and is returned as is.
    pub fn log(&self, level: Severity, message: &str, context: LogContext) -> Result<bool> {
        let record =
            LogRecord::new(&self.name, level, message, self.timezone.now()).with_context(context);

        let mut handled = false;
        for handler in &self.handlers {
            let mut handler = handler.lock();
            if !handler.is_handling(level) {
                continue;
            }
            handled = true;
            if handler.handle(&record)? {
                break;
            }
        }

        Ok(handled)
    }

    pub fn flush(&self) -> Result<()> {
        for handler in &self.handlers {
            handler.lock().flush()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ChannelLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelLogger")
            .field("name", &self.name)
            .field("timezone", &self.timezone)
            .field("handlers", &self.handler_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct RecordingHandler {
        level: Severity,
        bubble: bool,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Handler for RecordingHandler {
        fn name(&self) -> &str {
            "recording"
        }

        fn is_handling(&self, level: Severity) -> bool {
            level >= self.level
        }

        fn handle(&mut self, record: &LogRecord) -> Result<bool> {
            self.seen
                .lock()
                .push(format!("{}:{}", record.channel, record.message));
            Ok(!self.bubble)
        }
    }

    fn recording(level: Severity, bubble: bool) -> (Box<dyn Handler>, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handler = RecordingHandler {
            level,
            bubble,
            seen: Arc::clone(&seen),
        };
        (Box::new(handler), seen)
    }

    #[test]
    fn test_records_below_level_are_suppressed() {
        let (handler, seen) = recording(Severity::Warning, true);
        let logger = ChannelLogger::new("app", Timezone::Utc).with_handler(handler);

        assert!(!logger.log(Severity::Info, "quiet", LogContext::new()).unwrap());
        assert!(logger.log(Severity::Error, "loud", LogContext::new()).unwrap());

        assert_eq!(*seen.lock(), vec!["app:loud".to_string()]);
    }

    #[test]
    fn test_non_bubbling_handler_stops_propagation() {
        let (first, first_seen) = recording(Severity::Debug, false);
        let (second, second_seen) = recording(Severity::Debug, true);
        let logger = ChannelLogger::new("app", Timezone::Utc)
            .with_handler(first)
            .with_handler(second);

        logger.log(Severity::Info, "once", LogContext::new()).unwrap();

        assert_eq!(first_seen.lock().len(), 1);
        assert!(second_seen.lock().is_empty());
    }

    #[test]
    fn test_handler_names() {
        let (handler, _) = recording(Severity::Debug, true);
        let logger = ChannelLogger::new("app", Timezone::Utc).with_handler(handler);
        assert_eq!(logger.name(), "app");
        assert_eq!(logger.handler_names(), vec!["recording".to_string()]);
        assert!(logger.is_handling(Severity::Debug));
    }
}
