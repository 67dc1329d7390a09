//! # Rust Channel Logger
//!
//! A configuration-driven logging facade. Named channels are declared in a
//! TOML file (or supplied at runtime), each naming a handler, a formatter, a
//! processor and a minimum severity. The logger resolves every requested
//! channel into a ready handler once, then broadcasts each log call to all
//! of them.
//!
//! ## Features
//!
//! - **Declarative channels**: handler parameters are mapped from
//!   configuration onto each handler's declared parameter list
//! - **Environment interpolation**: `${VAR}` and `${VAR:-default}` in
//!   configuration files, with `.env` support
//! - **Handlers**: null, stream, daily rotating file, local and UDP syslog,
//!   stderr and Slack webhooks
//! - **Thread Safe**: handlers sit behind mutexes, a `Logger` can be shared
//!
//! ```no_run
//! use rust_channel_logger::prelude::*;
//!
//! let logger = Logger::new(vec!["main", "error"], &ChannelOverrides::new())?;
//! logger.info_with_context("user {name} signed in", LogContext::new().with_field("name", "ada"))?;
//! # Ok::<(), LoggerError>(())
//! ```

pub mod config;
pub mod core;
pub mod handlers;
pub mod logger;
pub mod macros;
pub mod resolver;

pub mod prelude {
    pub use crate::config::{ChannelOverrides, ConfigDefaults, ConfigLoader, RawChannel};
    pub use crate::core::{FieldValue, LogContext, LoggerError, Message, Result, Severity};
    pub use crate::handlers::HandlerKind;
    pub use crate::logger::{ChannelSelection, Logger, LoggerBuilder};
    pub use crate::resolver::ChannelResolver;
}

pub use config::{
    ChannelDescriptor, ChannelOverrides, ConfigDefaults, ConfigLoader, GlobalConfig, ParamValue,
    RawChannel,
};
pub use core::{
    ChannelLogger, FieldValue, Formatter, FormatterKind, Handler, LogContext, LogRecord,
    LoggerError, Message, Processor, ProcessorKind, Result, Severity, Timezone,
};
pub use handlers::HandlerKind;
pub use logger::{ChannelSelection, Logger, LoggerBuilder};
pub use resolver::{ChannelResolver, ResolvedArguments};
