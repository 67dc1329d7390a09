//! Logging macros for ergonomic log message formatting.
//!
//! Each macro formats its arguments like `format!` and forwards the result
//! to the matching [`Logger`](crate::Logger) method, returning its
//! `Result<()>`. A `context: <expr>;` prefix attaches a call context.
//!
//! # Examples
//!
//! ```no_run
//! use rust_channel_logger::{info, warning, ChannelOverrides, LogContext, Logger};
//!
//! let logger = Logger::new("main", &ChannelOverrides::new())?;
//!
//! info!(logger, "Server started")?;
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port)?;
//!
//! let ctx = LogContext::new().with_field("attempt", 3);
//! warning!(logger, context: ctx; "Retrying {}", "upload")?;
//! # Ok::<(), rust_channel_logger::LoggerError>(())
//! ```

/// Log a formatted message at the given severity.
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, context: $context:expr; $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+), $context)
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+), $crate::LogContext::new())
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! notice {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Notice, $($arg)+)
    };
}

#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Warning, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Critical, $($arg)+)
    };
}

#[macro_export]
macro_rules! alert {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Alert, $($arg)+)
    };
}

#[macro_export]
macro_rules! emergency {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Emergency, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::config::{ChannelOverrides, ConfigLoader, RawChannel};
    use crate::core::{LogContext, Severity};
    use crate::logger::Logger;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn logger(dir: &TempDir) -> Logger {
        Logger::builder()
            .loader(
                ConfigLoader::new()
                    .root(dir.path())
                    .env(HashMap::<String, String>::new()),
            )
            .overrides(ChannelOverrides::new().with_channel(
                "app",
                RawChannel::new("stream").with_param("stream", "app.log"),
            ))
            .channels("app")
            .build()
            .unwrap()
    }

    fn contents(dir: &TempDir) -> String {
        std::fs::read_to_string(dir.path().join("storage/logs/app.log")).unwrap()
    }

    #[test]
    fn test_log_macro() {
        let dir = TempDir::new().unwrap();
        let logger = logger(&dir);
        log!(logger, Severity::Info, "Test message").unwrap();
        log!(logger, Severity::Info, "Formatted: {}", 42).unwrap();

        let out = contents(&dir);
        assert!(out.contains("app.INFO: Test message"));
        assert!(out.contains("app.INFO: Formatted: 42"));
    }

    #[test]
    fn test_severity_macros() {
        let dir = TempDir::new().unwrap();
        let logger = logger(&dir);
        debug!(logger, "Count: {}", 5).unwrap();
        info!(logger, "Items: {}", 100).unwrap();
        notice!(logger, "Notice message").unwrap();
        warning!(logger, "Retry {} of {}", 1, 3).unwrap();
        error!(logger, "Code: {}", 500).unwrap();
        critical!(logger, "Critical failure: {}", "system").unwrap();
        alert!(logger, "Alert message").unwrap();
        emergency!(logger, "Emergency message").unwrap();

        let out = contents(&dir);
        for expected in [
            "app.DEBUG: Count: 5",
            "app.INFO: Items: 100",
            "app.NOTICE: Notice message",
            "app.WARNING: Retry 1 of 3",
            "app.ERROR: Code: 500",
            "app.CRITICAL: Critical failure: system",
            "app.ALERT: Alert message",
            "app.EMERGENCY: Emergency message",
        ] {
            assert!(out.contains(expected), "missing '{}'", expected);
        }
    }

    #[test]
    fn test_macro_with_context() {
        let dir = TempDir::new().unwrap();
        let logger = logger(&dir);
        let ctx = LogContext::new().with_field("user", "ada");
        info!(logger, context: ctx; "Login by {}", "ada").unwrap();

        assert!(contents(&dir).contains(r#"app.INFO: Login by ada {"user":"ada"}"#));
    }
}
