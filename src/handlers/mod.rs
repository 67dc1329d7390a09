//! Handler implementations configured by the channel resolver

pub mod error_log;
pub mod null;
pub mod rotating_file;
pub mod slack_webhook;
pub mod stream;
pub mod syslog;
pub mod syslog_udp;

pub use error_log::ErrorLogHandler;
pub use null::NullHandler;
pub use rotating_file::RotatingFileHandler;
#[cfg(feature = "webhook")]
pub use slack_webhook::SlackWebhookHandler;
pub use stream::StreamHandler;
pub use syslog::Facility;
#[cfg(unix)]
pub use syslog::SyslogHandler;
pub use syslog_udp::{SyslogRfc, SyslogUdpHandler};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Handler kinds a channel can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    Null,
    Stream,
    RotatingFile,
    Syslog,
    SyslogUdp,
    ErrorLog,
    SlackWebhook,
}

impl HandlerKind {
    pub const ALL: [HandlerKind; 7] = [
        HandlerKind::Null,
        HandlerKind::Stream,
        HandlerKind::RotatingFile,
        HandlerKind::Syslog,
        HandlerKind::SyslogUdp,
        HandlerKind::ErrorLog,
        HandlerKind::SlackWebhook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerKind::Null => "null",
            HandlerKind::Stream => "stream",
            HandlerKind::RotatingFile => "rotating_file",
            HandlerKind::Syslog => "syslog",
            HandlerKind::SyslogUdp => "syslog_udp",
            HandlerKind::ErrorLog => "error_log",
            HandlerKind::SlackWebhook => "slack_webhook",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HandlerKind {
    type Err = String;

    /// Accepts `rotating_file`, `rotating-file`, and class-style spellings
    /// such as `RotatingFileHandler` or `Monolog\Handler\RotatingFileHandler`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let short = s.trim().rsplit(['\\', ':']).next().unwrap_or_default();
        let normalized = crate::config::sanitizer::snake_case(short).replace('-', "_");
        let normalized = normalized
            .strip_suffix("_handler")
            .unwrap_or(&normalized);

        HandlerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("Unknown handler: '{}'", s))
    }
}
