//! Core logger types and traits

pub mod channel_logger;
pub mod error;
pub mod formatter;
pub mod handler;
pub mod log_context;
pub mod log_record;
pub mod message;
pub mod processor;
pub mod severity;
pub mod timezone;

pub use channel_logger::ChannelLogger;
pub use error::{LoggerError, Result};
pub use formatter::{
    Formatter, FormatterKind, JsonFormatter, LineFormatter, LinePrettyFormatter,
};
pub use handler::{FormattableHandler, Handler, HandlerState, ProcessableHandler};
pub use log_context::{FieldValue, LogContext};
pub use log_record::LogRecord;
pub use message::Message;
pub use processor::{Processor, ProcessorKind, PsrLogMessageProcessor, UidProcessor};
pub use severity::Severity;
pub use timezone::Timezone;
