//! Stateful channel selection and handler creation

use super::arguments::{resolve, ResolvedArguments};
use super::factory::build;
use crate::config::channel::{ChannelOverrides, GlobalConfig, RawChannel};
use crate::config::environment::{Environment, SystemEnv};
use crate::config::loader::ConfigLoader;
use crate::config::sanitizer::{sanitize, SanitizeContext};
use crate::core::error::{LoggerError, Result};
use crate::core::handler::Handler;
use std::sync::Arc;

/// Owns a loaded configuration and turns channel names into handlers.
///
/// ```no_run
/// use rust_channel_logger::config::{ChannelOverrides, ConfigLoader};
/// use rust_channel_logger::resolver::ChannelResolver;
///
/// let mut resolver = ChannelResolver::new(ConfigLoader::new(), &ChannelOverrides::new())?;
/// let handler = resolver.set_channel("main")?.create_instance()?;
/// # Ok::<(), rust_channel_logger::LoggerError>(())
/// ```
pub struct ChannelResolver {
    config: GlobalConfig,
    env: Arc<dyn Environment>,
    channel: Option<String>,
    arguments: ResolvedArguments,
}

impl ChannelResolver {
    /// Load the configuration and create the log directory
    pub fn new(loader: ConfigLoader, overrides: &ChannelOverrides) -> Result<Self> {
        let config = loader.load(overrides)?;
        Self::with_env(config, loader.environment())
    }

    /// Use an already loaded configuration
    pub fn from_config(config: GlobalConfig) -> Result<Self> {
        Self::with_env(config, Arc::new(SystemEnv::current()))
    }

    fn with_env(config: GlobalConfig, env: Arc<dyn Environment>) -> Result<Self> {
        std::fs::create_dir_all(&config.log_path).map_err(|e| {
            LoggerError::io_operation(
                "creating log directory",
                config.log_path.display().to_string(),
                e,
            )
        })?;

        Ok(Self {
            config,
            env,
            channel: None,
            arguments: ResolvedArguments::default(),
        })
    }

    /// Merge extra channels into the current configuration.
    ///
    /// Channels from `overrides` replace same-named ones. The selected
    /// channel is kept, but its arguments must be resolved again.
    pub fn append_config(&mut self, overrides: &ChannelOverrides) -> Result<&mut Self> {
        let ctx = SanitizeContext::new(self.env.as_ref());
        let mut sanitized = Vec::with_capacity(overrides.len());
        for (name, raw) in overrides.iter() {
            validate_override(name, raw)?;
            sanitized.push((name.clone(), sanitize(name, raw, &ctx)?));
        }

        self.config.channels.extend(sanitized);
        self.arguments = ResolvedArguments::default();

        tracing::debug!(
            appended = overrides.len(),
            channels = self.config.channels.len(),
            "logger configuration extended"
        );
        Ok(self)
    }

    /// Select a channel and resolve its handler arguments
    pub fn set_channel(&mut self, name: &str) -> Result<&mut Self> {
        let arguments = resolve(name, &self.config)?;
        self.channel = Some(name.to_string());
        self.arguments = arguments;
        Ok(self)
    }

    /// Build a new handler for the selected channel
    pub fn create_instance(&self) -> Result<Box<dyn Handler>> {
        let channel = self.channel.as_deref().unwrap_or_default();
        build(channel, &self.config, &self.arguments)
    }

    pub fn configuration(&self) -> &GlobalConfig {
        &self.config
    }

    /// A single top-level configuration value, e.g. `log_path`
    pub fn configuration_value(&self, key: &str) -> Result<serde_json::Value> {
        self.config.value(key).ok_or_else(|| {
            LoggerError::resolver(
                self.channel.as_deref().unwrap_or_default(),
                format!("Configuration key \"{}\" not found", key),
            )
        })
    }

    pub fn arguments(&self) -> &ResolvedArguments {
        &self.arguments
    }

    /// Currently selected channel
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }
}

impl std::fmt::Debug for ChannelResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelResolver")
            .field("channel", &self.channel)
            .field("channels", &self.config.channel_names())
            .field("arguments", &self.arguments.names())
            .finish()
    }
}

fn validate_override(name: &str, raw: &RawChannel) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LoggerError::config(
            "Custom channel configuration does not fulfill required structure",
        ));
    }
    if raw.handler.as_deref().map_or(true, |h| h.trim().is_empty()) {
        return Err(LoggerError::config(
            "Channel configuration requires a handler, none given",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::channel::ParamValue;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn loader(dir: &TempDir) -> ConfigLoader {
        ConfigLoader::new()
            .root(dir.path())
            .env(HashMap::<String, String>::new())
    }

    #[test]
    fn test_log_path_is_created_on_construction() {
        let dir = TempDir::new().unwrap();
        let resolver = ChannelResolver::new(loader(&dir), &ChannelOverrides::new()).unwrap();

        let log_path = &resolver.configuration().log_path;
        assert_eq!(log_path, &dir.path().join("storage/logs"));
        assert!(log_path.is_dir());
    }

    #[test]
    fn test_create_instance_requires_a_channel() {
        let dir = TempDir::new().unwrap();
        let resolver = ChannelResolver::new(loader(&dir), &ChannelOverrides::new()).unwrap();

        let err = resolver.create_instance().err().unwrap();
        assert!(err.is_resolver());
    }

    #[test]
    fn test_set_channel_then_create() {
        let dir = TempDir::new().unwrap();
        let mut resolver = ChannelResolver::new(loader(&dir), &ChannelOverrides::new()).unwrap();

        let handler = resolver.set_channel("error").unwrap().create_instance().unwrap();

        assert_eq!(handler.name(), "stream");
        assert_eq!(resolver.channel(), Some("error"));
        let stream = resolver.arguments().get("stream").unwrap();
        assert_eq!(
            stream,
            &ParamValue::from(dir.path().join("storage/logs/error.log").display().to_string())
        );
    }

    #[test]
    fn test_unknown_channel() {
        let dir = TempDir::new().unwrap();
        let mut resolver = ChannelResolver::new(loader(&dir), &ChannelOverrides::new()).unwrap();

        let err = resolver.set_channel("nope").err().unwrap();
        assert!(err.is_resolver());
        assert!(err.to_string().contains("Configuration for channel \"nope\" not found"));
        assert_eq!(resolver.channel(), None);
    }

    #[test]
    fn test_append_config_adds_channels() {
        let dir = TempDir::new().unwrap();
        let mut resolver = ChannelResolver::new(loader(&dir), &ChannelOverrides::new()).unwrap();

        resolver
            .append_config(&ChannelOverrides::new().with_channel(
                "audit",
                RawChannel::new("stream").with_param("stream", "audit.log"),
            ))
            .unwrap();

        assert!(resolver.configuration().channel("audit").is_some());
        assert!(resolver.configuration().channel("main").is_some());
        assert!(resolver.set_channel("audit").is_ok());
    }

    #[test]
    fn test_append_config_rejects_missing_handler() {
        let dir = TempDir::new().unwrap();
        let mut resolver = ChannelResolver::new(loader(&dir), &ChannelOverrides::new()).unwrap();

        let mut raw = RawChannel::default();
        raw.config.insert("level".into(), "info".into());
        let err = resolver
            .append_config(&ChannelOverrides::new().with_channel("broken", raw))
            .err()
            .unwrap();
        assert!(err.is_config());
    }

    #[test]
    fn test_configuration_value() {
        let dir = TempDir::new().unwrap();
        let resolver = ChannelResolver::new(loader(&dir), &ChannelOverrides::new()).unwrap();

        assert_eq!(resolver.configuration_value("timezone").unwrap(), "UTC");
        assert!(resolver.configuration_value("logPath").is_ok());
        assert!(resolver.configuration_value("missing").unwrap_err().is_resolver());
    }
}
