//! Configuration loading, environment lookup and channel sanitizing

pub mod channel;
pub mod defaults;
pub mod environment;
pub mod loader;
pub mod sanitizer;

pub use channel::{ChannelDescriptor, ChannelOverrides, GlobalConfig, ParamValue, RawChannel};
pub use defaults::ConfigDefaults;
pub use environment::{expand_env, Environment, SystemEnv};
pub use loader::{ConfigLoader, ConfigSource, PACKAGED_CONFIG};
pub use sanitizer::{sanitize, SanitizeContext};
