//! Registry of constructible handler kinds and their declared parameters

use super::arguments::ArgumentCursor;
use super::parameters::Parameter;
use crate::core::error::Result;
use crate::core::handler::Handler;
use crate::handlers::{
    ErrorLogHandler, HandlerKind, NullHandler, RotatingFileHandler, StreamHandler,
    SyslogUdpHandler,
};

/// A handler that can be built from resolved configuration arguments.
///
/// `PARAMETERS` lists the constructor parameters in the exact order
/// `from_arguments` consumes them.
pub trait FromArguments: Sized {
    const PARAMETERS: &'static [Parameter];

    fn from_arguments(args: &mut ArgumentCursor<'_>) -> Result<Self>;
}

/// Declared parameters and constructor of one handler kind
pub struct HandlerSpec {
    pub kind: HandlerKind,
    pub parameters: &'static [Parameter],
    pub construct: fn(&mut ArgumentCursor<'_>) -> Result<Box<dyn Handler>>,
}

impl HandlerSpec {
    pub fn for_kind(kind: HandlerKind) -> &'static HandlerSpec {
        match kind {
            HandlerKind::Null => &NULL,
            HandlerKind::Stream => &STREAM,
            HandlerKind::RotatingFile => &ROTATING_FILE,
            HandlerKind::Syslog => &SYSLOG,
            HandlerKind::SyslogUdp => &SYSLOG_UDP,
            HandlerKind::ErrorLog => &ERROR_LOG,
            HandlerKind::SlackWebhook => &SLACK_WEBHOOK,
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&'static Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

fn construct<H: FromArguments + Handler + 'static>(
    args: &mut ArgumentCursor<'_>,
) -> Result<Box<dyn Handler>> {
    Ok(Box::new(H::from_arguments(args)?))
}

const fn spec<H: FromArguments + Handler + 'static>(kind: HandlerKind) -> HandlerSpec {
    HandlerSpec {
        kind,
        parameters: H::PARAMETERS,
        construct: construct::<H>,
    }
}

static NULL: HandlerSpec = spec::<NullHandler>(HandlerKind::Null);
static STREAM: HandlerSpec = spec::<StreamHandler>(HandlerKind::Stream);
static ROTATING_FILE: HandlerSpec = spec::<RotatingFileHandler>(HandlerKind::RotatingFile);
static SYSLOG_UDP: HandlerSpec = spec::<SyslogUdpHandler>(HandlerKind::SyslogUdp);
static ERROR_LOG: HandlerSpec = spec::<ErrorLogHandler>(HandlerKind::ErrorLog);

#[cfg(unix)]
static SYSLOG: HandlerSpec = spec::<crate::handlers::SyslogHandler>(HandlerKind::Syslog);

#[cfg(not(unix))]
static SYSLOG: HandlerSpec = HandlerSpec {
    kind: HandlerKind::Syslog,
    parameters: crate::handlers::syslog::SYSLOG_PARAMETERS,
    construct: |_| {
        Err(crate::core::error::LoggerError::handler(
            "syslog",
            "local syslog requires a unix domain socket",
        ))
    },
};

#[cfg(feature = "webhook")]
static SLACK_WEBHOOK: HandlerSpec =
    spec::<crate::handlers::SlackWebhookHandler>(HandlerKind::SlackWebhook);

#[cfg(not(feature = "webhook"))]
static SLACK_WEBHOOK: HandlerSpec = HandlerSpec {
    kind: HandlerKind::SlackWebhook,
    parameters: crate::handlers::slack_webhook::SLACK_WEBHOOK_PARAMETERS,
    construct: |_| {
        Err(crate::core::error::LoggerError::handler(
            "slack_webhook",
            "built without the `webhook` feature",
        ))
    },
};
