//! Fallback values for the top-level configuration keys

/// Values applied when the configuration source leaves a key unset.
///
/// Handed to [`ConfigLoader`](super::ConfigLoader) as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDefaults {
    /// Directory below the root holding the primary configuration file
    pub config_dir: String,
    pub config_file: String,
    pub log_file: String,
    pub log_path: String,
    pub date_format: String,
    pub timezone: String,
}

impl Default for ConfigDefaults {
    fn default() -> Self {
        Self {
            config_dir: "config".to_string(),
            config_file: "logger.toml".to_string(),
            log_file: "log".to_string(),
            log_path: "storage/logs".to_string(),
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

impl ConfigDefaults {
    pub fn with_log_file(mut self, log_file: impl Into<String>) -> Self {
        self.log_file = log_file.into();
        self
    }

    pub fn with_log_path(mut self, log_path: impl Into<String>) -> Self {
        self.log_path = log_path.into();
        self
    }

    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_config_file(mut self, config_file: impl Into<String>) -> Self {
        self.config_file = config_file.into();
        self
    }
}
