//! Local syslog handler and syslog facilities

use crate::core::error::{LoggerError, Result};
use crate::core::severity::Severity;
use crate::resolver::parameters::{ParamDefault, ParamType, Parameter};
use std::fmt;
use std::str::FromStr;

/// Syslog facility, RFC 5424 section 6.2.1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facility {
    Kern,
    #[default]
    User,
    Mail,
    Daemon,
    Auth,
    Syslog,
    Lpr,
    News,
    Uucp,
    Cron,
    AuthPriv,
    Ftp,
    Local0,
    Local1,
    Local2,
    Local3,
    Local4,
    Local5,
    Local6,
    Local7,
}

impl Facility {
    pub fn code(&self) -> u8 {
        match self {
            Facility::Kern => 0,
            Facility::User => 1,
            Facility::Mail => 2,
            Facility::Daemon => 3,
            Facility::Auth => 4,
            Facility::Syslog => 5,
            Facility::Lpr => 6,
            Facility::News => 7,
            Facility::Uucp => 8,
            Facility::Cron => 9,
            Facility::AuthPriv => 10,
            Facility::Ftp => 11,
            Facility::Local0 => 16,
            Facility::Local1 => 17,
            Facility::Local2 => 18,
            Facility::Local3 => 19,
            Facility::Local4 => 20,
            Facility::Local5 => 21,
            Facility::Local6 => 22,
            Facility::Local7 => 23,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Facility::Kern => "kern",
            Facility::User => "user",
            Facility::Mail => "mail",
            Facility::Daemon => "daemon",
            Facility::Auth => "auth",
            Facility::Syslog => "syslog",
            Facility::Lpr => "lpr",
            Facility::News => "news",
            Facility::Uucp => "uucp",
            Facility::Cron => "cron",
            Facility::AuthPriv => "authpriv",
            Facility::Ftp => "ftp",
            Facility::Local0 => "local0",
            Facility::Local1 => "local1",
            Facility::Local2 => "local2",
            Facility::Local3 => "local3",
            Facility::Local4 => "local4",
            Facility::Local5 => "local5",
            Facility::Local6 => "local6",
            Facility::Local7 => "local7",
        }
    }

    /// `<PRI>` value: facility * 8 + severity
    pub fn priority(&self, level: Severity) -> u8 {
        self.code() * 8 + level.syslog_code()
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Facility {
    type Err = String;

    /// Accepts `local0` as well as the C constant spelling `LOG_LOCAL0`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let name = lower.strip_prefix("log_").unwrap_or(&lower);
        let facility = match name {
            "kern" => Facility::Kern,
            "user" => Facility::User,
            "mail" => Facility::Mail,
            "daemon" => Facility::Daemon,
            "auth" | "security" => Facility::Auth,
            "syslog" => Facility::Syslog,
            "lpr" => Facility::Lpr,
            "news" => Facility::News,
            "uucp" => Facility::Uucp,
            "cron" => Facility::Cron,
            "authpriv" => Facility::AuthPriv,
            "ftp" => Facility::Ftp,
            "local0" => Facility::Local0,
            "local1" => Facility::Local1,
            "local2" => Facility::Local2,
            "local3" => Facility::Local3,
            "local4" => Facility::Local4,
            "local5" => Facility::Local5,
            "local6" => Facility::Local6,
            "local7" => Facility::Local7,
            _ => return Err(format!("Unknown syslog facility: '{}'", s)),
        };
        Ok(facility)
    }
}

pub(crate) fn parse_facility(handler: &str, name: &str) -> Result<Facility> {
    name.parse().map_err(|e: String| LoggerError::handler(handler, e))
}

/// Declared parameters of the local syslog handler
pub const SYSLOG_PARAMETERS: &[Parameter] = &[
    Parameter::new("ident", ParamType::Str, ParamDefault::Str("")),
    Parameter::new("facility", ParamType::Str, ParamDefault::Str("user")),
    Parameter::new("level", ParamType::Level, ParamDefault::Level(Severity::Debug)),
    Parameter::new("bubble", ParamType::Bool, ParamDefault::Bool(true)),
    Parameter::new("log_pid", ParamType::Bool, ParamDefault::Bool(true)),
    Parameter::new("socket", ParamType::Str, ParamDefault::Str("/dev/log")),
];

/// Program name used when `ident` is empty
pub(crate) fn default_ident() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "rust".to_string())
}

#[cfg(unix)]
pub use self::unix::SyslogHandler;

#[cfg(unix)]
mod unix {
    use super::{default_ident, parse_facility, Facility, SYSLOG_PARAMETERS};
    use crate::core::error::{LoggerError, Result};
    use crate::core::handler::{impl_handler_state, FormattableHandler, Handler, HandlerState, ProcessableHandler};
    use crate::core::log_record::LogRecord;
    use crate::core::severity::Severity;
    use crate::resolver::arguments::ArgumentCursor;
    use crate::resolver::parameters::Parameter;
    use crate::resolver::registry::FromArguments;
    use std::os::unix::net::UnixDatagram;
    use std::path::{Path, PathBuf};

    /// Sends RFC 3164 messages to the local syslog daemon over its unix
    /// datagram socket. The socket is connected on the first record.
    pub struct SyslogHandler {
        state: HandlerState,
        ident: String,
        facility: Facility,
        log_pid: bool,
        socket_path: PathBuf,
        socket: Option<UnixDatagram>,
    }

    impl SyslogHandler {
        pub fn new(ident: impl Into<String>, facility: Facility, level: Severity, bubble: bool) -> Self {
            let ident = ident.into();
            Self {
                state: HandlerState::new(level, bubble),
                ident: if ident.is_empty() { default_ident() } else { ident },
                facility,
                log_pid: true,
                socket_path: PathBuf::from("/dev/log"),
                socket: None,
            }
        }

        #[must_use]
        pub fn with_pid(mut self, log_pid: bool) -> Self {
            self.log_pid = log_pid;
            self
        }

        #[must_use]
        pub fn with_socket(mut self, path: impl Into<PathBuf>) -> Self {
            self.socket_path = path.into();
            self.socket = None;
            self
        }

        pub fn socket_path(&self) -> &Path {
            &self.socket_path
        }

        /// One datagram: `<PRI>Mmm dd hh:mm:ss ident[pid]: message`
        pub fn datagram(&self, record: &LogRecord, message: &str) -> String {
            let tag = if self.log_pid {
                format!("{}[{}]", self.ident, std::process::id())
            } else {
                self.ident.clone()
            };
            format!(
                "<{}>{} {}: {}",
                self.facility.priority(record.level),
                record.datetime.format("%b %e %H:%M:%S"),
                tag,
                message.trim_end_matches('\n')
            )
        }

        fn send(&mut self, payload: &[u8]) -> Result<()> {
            if self.socket.is_none() {
                let socket = UnixDatagram::unbound()?;
                socket.connect(&self.socket_path).map_err(|e| {
                    LoggerError::io_operation(
                        "connect to syslog",
                        format!("Failed to connect to '{}'", self.socket_path.display()),
                        e,
                    )
                })?;
                self.socket = Some(socket);
            }

            let sent = match self.socket.as_ref() {
                Some(socket) => socket.send(payload),
                None => return Err(LoggerError::handler("syslog", "socket not connected")),
            };
            if let Err(e) = sent {
                // reconnect on the next record
                self.socket = None;
                return Err(LoggerError::io_operation(
                    "send to syslog",
                    format!("Failed to write to '{}'", self.socket_path.display()),
                    e,
                ));
            }
            Ok(())
        }
    }

    impl FromArguments for SyslogHandler {
        const PARAMETERS: &'static [Parameter] = SYSLOG_PARAMETERS;

        fn from_arguments(args: &mut ArgumentCursor<'_>) -> Result<Self> {
            let ident = args.next_str("ident")?;
            let facility = parse_facility("syslog", &args.next_str("facility")?)?;
            let level = args.next_level("level")?;
            let bubble = args.next_bool("bubble")?;
            let log_pid = args.next_bool("log_pid")?;
            let socket = args.next_str("socket")?;

            Ok(Self::new(ident, facility, level, bubble)
                .with_pid(log_pid)
                .with_socket(socket))
        }
    }

    impl Handler for SyslogHandler {
        fn name(&self) -> &str {
            "syslog"
        }

        fn is_handling(&self, level: Severity) -> bool {
            self.state.is_handling(level)
        }

        fn handle(&mut self, record: &LogRecord) -> Result<bool> {
            if !self.state.is_handling(record.level) {
                return Ok(false);
            }

            let (_, formatted) = self.state.prepare(record)?;
            let datagram = self.datagram(record, &formatted);
            self.send(datagram.as_bytes())?;

            Ok(!self.state.bubble)
        }

        fn as_formattable(&mut self) -> Option<&mut dyn FormattableHandler> {
            Some(self)
        }

        fn as_processable(&mut self) -> Option<&mut dyn ProcessableHandler> {
            Some(self)
        }
    }

    impl_handler_state!(SyslogHandler);

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::core::log_record::test_record;
        use tempfile::TempDir;

        #[test]
        fn test_datagram_layout() {
            let handler = SyslogHandler::new("billing", Facility::Local0, Severity::Debug, true)
                .with_pid(false);
            let datagram = handler.datagram(&test_record(Severity::Error, "x"), "test.ERROR: x\n");
            // local0 (16) * 8 + error (3)
            assert_eq!(datagram, "<131>Mar 15 10:30:45 billing: test.ERROR: x");
        }

        #[test]
        fn test_sends_to_unix_socket() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("log.sock");
            let server = UnixDatagram::bind(&path).unwrap();

            let mut handler = SyslogHandler::new("app", Facility::User, Severity::Debug, true)
                .with_socket(&path);
            handler.handle(&test_record(Severity::Warning, "disk low")).unwrap();

            let mut buf = [0u8; 1024];
            let n = server.recv(&mut buf).unwrap();
            let received = String::from_utf8_lossy(&buf[..n]);
            assert!(received.starts_with("<12>"));
            assert!(received.contains(&format!("app[{}]", std::process::id())));
            assert!(received.contains("disk low"));
        }

        #[test]
        fn test_missing_socket_is_an_error() {
            let dir = TempDir::new().unwrap();
            let mut handler = SyslogHandler::new("app", Facility::User, Severity::Debug, true)
                .with_socket(dir.path().join("absent.sock"));
            assert!(handler.handle(&test_record(Severity::Info, "lost")).is_err());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facility_parsing() {
        assert_eq!("local3".parse::<Facility>(), Ok(Facility::Local3));
        assert_eq!("LOG_USER".parse::<Facility>(), Ok(Facility::User));
        assert!("printer".parse::<Facility>().is_err());
    }

    #[test]
    fn test_priority() {
        assert_eq!(Facility::User.priority(Severity::Debug), 15);
        assert_eq!(Facility::Kern.priority(Severity::Emergency), 0);
        assert_eq!(Facility::Local7.priority(Severity::Notice), 189);
    }
}
