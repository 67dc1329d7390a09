//! Configuration loading and merging

use super::channel::{ChannelOverrides, GlobalConfig, RawChannel};
use super::defaults::ConfigDefaults;
use super::environment::{application_root, expand_env, Environment, SystemEnv};
use super::sanitizer::{sanitize, SanitizeContext};
use crate::core::error::{LoggerError, Result};
use crate::core::timezone::Timezone;
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration shipped with the crate, used when the application has none
pub const PACKAGED_CONFIG: &str = include_str!("../../config/logger.toml");

/// Top-level layout of a configuration file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    #[serde(alias = "logFile")]
    log_file: Option<String>,
    #[serde(alias = "logPath")]
    log_path: Option<String>,
    timezone: Option<String>,
    #[serde(alias = "dateFormat")]
    date_format: Option<String>,
    channels: BTreeMap<String, RawChannel>,
}

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Packaged,
    Empty,
}

/// Reads, merges and validates the logger configuration.
///
/// ```no_run
/// use rust_channel_logger::config::{ChannelOverrides, ConfigLoader};
///
/// let config = ConfigLoader::new()
///     .root("/srv/app")
///     .load(&ChannelOverrides::new())?;
/// # Ok::<(), rust_channel_logger::LoggerError>(())
/// ```
#[derive(Clone)]
pub struct ConfigLoader {
    root: PathBuf,
    env: Option<Arc<dyn Environment>>,
    defaults: ConfigDefaults,
    packaged: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            root: application_root(),
            env: None,
            defaults: ConfigDefaults::default(),
            packaged: true,
        }
    }

    /// Application root; relative paths in the configuration resolve here
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Replace the process environment (and `.env` file) lookup
    pub fn env(mut self, env: impl Environment + 'static) -> Self {
        self.env = Some(Arc::new(env));
        self
    }

    pub fn defaults(mut self, defaults: ConfigDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Whether to fall back to the packaged configuration (default: on)
    pub fn packaged(mut self, enabled: bool) -> Self {
        self.packaged = enabled;
        self
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    pub fn environment(&self) -> Arc<dyn Environment> {
        match &self.env {
            Some(env) => Arc::clone(env),
            None => Arc::new(SystemEnv::new(&self.root)),
        }
    }

    /// Path of the primary configuration file
    pub fn config_path(&self) -> PathBuf {
        self.root
            .join(&self.defaults.config_dir)
            .join(&self.defaults.config_file)
    }

    /// Load the configuration and merge `overrides` over its channels
    pub fn load(&self, overrides: &ChannelOverrides) -> Result<GlobalConfig> {
        let env = self.environment();
        let (source, file) = self.read_source(env.as_ref())?;
        tracing::debug!(source = ?source, "logger configuration source selected");

        let log_path = resolve_against(
            &self.root,
            file.log_path.as_deref().unwrap_or(&self.defaults.log_path),
        );
        let log_file = {
            let configured = file.log_file.as_deref().unwrap_or(&self.defaults.log_file);
            if Path::new(configured).is_file() {
                PathBuf::from(configured)
            } else {
                log_path.join(configured)
            }
        };

        let timezone_name = file.timezone.as_deref().unwrap_or(&self.defaults.timezone);
        let timezone: Timezone = timezone_name.parse().map_err(LoggerError::config)?;

        let date_format = file
            .date_format
            .unwrap_or_else(|| self.defaults.date_format.clone());
        validate_date_format(&date_format)?;

        let mut raw_channels = file.channels;
        merge_overrides(&mut raw_channels, overrides)?;

        let ctx = SanitizeContext::new(env.as_ref());
        let channels = raw_channels
            .iter()
            .map(|(name, raw)| Ok((name.clone(), sanitize(name, raw, &ctx)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        tracing::debug!(
            channels = channels.len(),
            log_path = %log_path.display(),
            "logger configuration loaded"
        );

        Ok(GlobalConfig {
            log_file,
            log_path,
            timezone,
            date_format,
            channels,
        })
    }

    fn read_source(&self, env: &dyn Environment) -> Result<(ConfigSource, ConfigFile)> {
        let primary = self.config_path();
        if primary.is_file() {
            let content = std::fs::read_to_string(&primary).map_err(|e| {
                LoggerError::io_operation(
                    "reading configuration",
                    primary.display().to_string(),
                    e,
                )
            })?;
            let file = parse_config(&content, env)?;
            return Ok((ConfigSource::File(primary), file));
        }

        if self.packaged {
            return Ok((ConfigSource::Packaged, parse_config(PACKAGED_CONFIG, env)?));
        }

        Ok((ConfigSource::Empty, ConfigFile::default()))
    }
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("root", &self.root)
            .field("defaults", &self.defaults)
            .field("packaged", &self.packaged)
            .finish()
    }
}

/// Parse TOML text, expanding `${VAR}` references in every string value
fn parse_config(content: &str, env: &dyn Environment) -> Result<ConfigFile> {
    let table: toml::Table = toml::from_str(content)?;
    let expanded = expand_strings(toml::Value::Table(table), env);
    Ok(expanded.try_into()?)
}

fn expand_strings(value: toml::Value, env: &dyn Environment) -> toml::Value {
    match value {
        toml::Value::String(s) => toml::Value::String(expand_env(&s, env)),
        toml::Value::Array(items) => toml::Value::Array(
            items.into_iter().map(|v| expand_strings(v, env)).collect(),
        ),
        toml::Value::Table(table) => toml::Value::Table(
            table
                .into_iter()
                .map(|(k, v)| (k, expand_strings(v, env)))
                .collect(),
        ),
        other => other,
    }
}

fn merge_overrides(
    channels: &mut BTreeMap<String, RawChannel>,
    overrides: &ChannelOverrides,
) -> Result<()> {
    for (name, raw) in overrides.iter() {
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
        channels.insert(name.clone(), raw.clone());
    }
    Ok(())
}

fn resolve_against(root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Reject strftime strings chrono cannot render
pub fn validate_date_format(format: &str) -> Result<()> {
    if format.is_empty() || StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(LoggerError::config(format!("Invalid date format: '{}'", format)));
    }
    Ok(())
}
