//! Channel resolution: from a configured channel name to a handler
//!
//! - [`arguments`]: ordered constructor arguments for a channel
//! - [`registry`]: declared parameters and constructors per handler kind
//! - [`factory`]: handler construction with formatter and processor
//! - [`channel_resolver`]: the stateful entry point used by the facade

pub mod arguments;
pub mod channel_resolver;
pub mod factory;
pub mod parameters;
pub mod registry;

pub use arguments::{prefix_log_path, resolve, Argument, ArgumentCursor, ResolvedArguments};
pub use channel_resolver::ChannelResolver;
pub use factory::build;
pub use parameters::{ParamDefault, ParamType, Parameter};
pub use registry::{FromArguments, HandlerSpec};
