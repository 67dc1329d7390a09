//! Logger facade dispatching every call to the selected channels

use crate::config::channel::ChannelOverrides;
use crate::config::loader::ConfigLoader;
use crate::core::channel_logger::ChannelLogger;
use crate::core::error::Result;
use crate::core::log_context::LogContext;
use crate::core::message::Message;
use crate::core::severity::Severity;
use crate::core::timezone::Timezone;
use crate::resolver::ChannelResolver;
use std::collections::BTreeMap;

/// Channels requested from a [`Logger`]: none, one, or several
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChannelSelection {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl ChannelSelection {
    /// Requested names in order, duplicates removed
    pub fn names(&self) -> Vec<String> {
        let all: Vec<String> = match self {
            ChannelSelection::None => Vec::new(),
            ChannelSelection::One(name) => vec![name.clone()],
            ChannelSelection::Many(names) => names.clone(),
        };

        let mut names = Vec::with_capacity(all.len());
        for name in all {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

impl From<&str> for ChannelSelection {
    fn from(name: &str) -> Self {
        ChannelSelection::One(name.to_string())
    }
}

impl From<String> for ChannelSelection {
    fn from(name: String) -> Self {
        ChannelSelection::One(name)
    }
}

impl From<Vec<&str>> for ChannelSelection {
    fn from(names: Vec<&str>) -> Self {
        ChannelSelection::Many(names.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for ChannelSelection {
    fn from(names: Vec<String>) -> Self {
        ChannelSelection::Many(names)
    }
}

impl<const N: usize> From<[&str; N]> for ChannelSelection {
    fn from(names: [&str; N]) -> Self {
        ChannelSelection::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<T: Into<ChannelSelection>> From<Option<T>> for ChannelSelection {
    fn from(selection: Option<T>) -> Self {
        selection.map_or(ChannelSelection::None, Into::into)
    }
}

/// Forwards log calls to one channel logger per requested channel.
///
/// Every channel is resolved when the logger is built; a channel that cannot
/// be resolved fails construction.
///
/// ```no_run
/// use rust_channel_logger::{ChannelOverrides, LogContext, Logger};
///
/// let logger = Logger::new(["main", "error"], &ChannelOverrides::new())?;
/// logger.info("service started")?;
/// logger.error_with_context(
///     "payment failed",
///     LogContext::new().with_field("order", 1042),
/// )?;
/// # Ok::<(), rust_channel_logger::LoggerError>(())
/// ```
pub struct Logger {
    loggers: BTreeMap<String, ChannelLogger>,
    context: LogContext,
    timezone: Timezone,
}

impl Logger {
    /// Resolve `channels` against the application configuration merged with
    /// `overrides`
    pub fn new(channels: impl Into<ChannelSelection>, overrides: &ChannelOverrides) -> Result<Self> {
        LoggerBuilder::new()
            .channels(channels)
            .overrides(overrides.clone())
            .build()
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Build channel loggers from an existing resolver
    pub fn from_resolver(
        resolver: &mut ChannelResolver,
        channels: impl Into<ChannelSelection>,
        context: LogContext,
    ) -> Result<Self> {
        let timezone = resolver.configuration().timezone;
        let mut loggers = BTreeMap::new();

        for name in channels.into().names() {
            let handler = resolver.set_channel(&name)?.create_instance()?;
            let logger = ChannelLogger::new(name.as_str(), timezone).with_handler(handler);
            loggers.insert(name, logger);
        }

        tracing::debug!(
            channels = ?loggers.keys().collect::<Vec<_>>(),
            timezone = %timezone,
            "logger created"
        );

        Ok(Self {
            loggers,
            context,
            timezone,
        })
    }

    /// Channel logger for `name`, if it was requested
    pub fn channel(&self, name: &str) -> Option<&ChannelLogger> {
        self.loggers.get(name)
    }

    pub fn channels(&self) -> impl Iterator<Item = &ChannelLogger> {
        self.loggers.values()
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.loggers.keys().map(String::as_str).collect()
    }

    /// Context merged into every call
    pub fn context(&self) -> &LogContext {
        &self.context
    }

    pub fn timezone(&self) -> Timezone {
        self.timezone
    }

    /// Log `message` at `level` on every channel.
    ///
    /// The call context is merged over the base context and falsy values
    /// are dropped before dispatch. The first write error is returned.
    pub fn log(&self, level: Severity, message: impl Into<Message>, context: LogContext) -> Result<()> {
        let message = message.into().encode()?;
        let context = LogContext::merged(&self.context, &context);

        for logger in self.loggers.values() {
            logger.log(level, &message, context.clone())?;
        }
        Ok(())
    }

    pub fn debug(&self, message: impl Into<Message>) -> Result<()> {
        self.log(Severity::Debug, message, LogContext::new())
    }

    pub fn info(&self, message: impl Into<Message>) -> Result<()> {
        self.log(Severity::Info, message, LogContext::new())
    }

    pub fn notice(&self, message: impl Into<Message>) -> Result<()> {
        self.log(Severity::Notice, message, LogContext::new())
    }

    pub fn warning(&self, message: impl Into<Message>) -> Result<()> {
        self.log(Severity::Warning, message, LogContext::new())
    }

    pub fn error(&self, message: impl Into<Message>) -> Result<()> {
        self.log(Severity::Error, message, LogContext::new())
    }

    pub fn critical(&self, message: impl Into<Message>) -> Result<()> {
        self.log(Severity::Critical, message, LogContext::new())
    }

    pub fn alert(&self, message: impl Into<Message>) -> Result<()> {
        self.log(Severity::Alert, message, LogContext::new())
    }

    pub fn emergency(&self, message: impl Into<Message>) -> Result<()> {
        self.log(Severity::Emergency, message, LogContext::new())
    }

    pub fn debug_with_context(&self, message: impl Into<Message>, context: LogContext) -> Result<()> {
        self.log(Severity::Debug, message, context)
    }

    pub fn info_with_context(&self, message: impl Into<Message>, context: LogContext) -> Result<()> {
        self.log(Severity::Info, message, context)
    }

    pub fn notice_with_context(&self, message: impl Into<Message>, context: LogContext) -> Result<()> {
        self.log(Severity::Notice, message, context)
    }

    pub fn warning_with_context(&self, message: impl Into<Message>, context: LogContext) -> Result<()> {
        self.log(Severity::Warning, message, context)
    }

    pub fn error_with_context(&self, message: impl Into<Message>, context: LogContext) -> Result<()> {
        self.log(Severity::Error, message, context)
    }

    pub fn critical_with_context(&self, message: impl Into<Message>, context: LogContext) -> Result<()> {
        self.log(Severity::Critical, message, context)
    }

    pub fn alert_with_context(&self, message: impl Into<Message>, context: LogContext) -> Result<()> {
        self.log(Severity::Alert, message, context)
    }

    pub fn emergency_with_context(&self, message: impl Into<Message>, context: LogContext) -> Result<()> {
        self.log(Severity::Emergency, message, context)
    }

    pub fn flush(&self) -> Result<()> {
        for logger in self.loggers.values() {
            logger.flush()?;
        }
        Ok(())
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "failed to flush logger on drop");
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("channels", &self.channel_names())
            .field("context", &self.context)
            .field("timezone", &self.timezone)
            .finish()
    }
}

/// Builder for [`Logger`]
#[derive(Debug, Default)]
pub struct LoggerBuilder {
    loader: Option<ConfigLoader>,
    overrides: ChannelOverrides,
    channels: ChannelSelection,
    context: LogContext,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom loader instead of `ConfigLoader::new()`
    pub fn loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn overrides(mut self, overrides: ChannelOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn channels(mut self, channels: impl Into<ChannelSelection>) -> Self {
        self.channels = channels.into();
        self
    }

    /// Base context merged into every call
    pub fn context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    pub fn build(self) -> Result<Logger> {
        let loader = self.loader.unwrap_or_default();
        let mut resolver = ChannelResolver::new(loader, &self.overrides)?;
        Logger::from_resolver(&mut resolver, self.channels, self.context)
    }
}
