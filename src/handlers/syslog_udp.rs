//! Remote syslog over UDP

use super::syslog::{default_ident, parse_facility, Facility};
use crate::core::error::{LoggerError, Result};
use crate::core::handler::{impl_handler_state, FormattableHandler, Handler, HandlerState, ProcessableHandler};
use crate::core::log_record::LogRecord;
use crate::core::severity::Severity;
use crate::resolver::arguments::ArgumentCursor;
use crate::resolver::parameters::{ParamDefault, ParamType, Parameter};
use crate::resolver::registry::FromArguments;
use chrono::SecondsFormat;
use std::fmt;
use std::net::UdpSocket;
use std::str::FromStr;

/// Largest payload sent in one datagram
const MAX_DATAGRAM: usize = 65023;

/// Syslog message format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyslogRfc {
    Rfc3164,
    #[default]
    Rfc5424,
}

impl fmt::Display for SyslogRfc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyslogRfc::Rfc3164 => write!(f, "3164"),
            SyslogRfc::Rfc5424 => write!(f, "5424"),
        }
    }
}

impl FromStr for SyslogRfc {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().trim_start_matches("rfc") {
            "3164" => Ok(SyslogRfc::Rfc3164),
            "5424" => Ok(SyslogRfc::Rfc5424),
            _ => Err(format!("Unknown syslog RFC: '{}'", s)),
        }
    }
}

/// Sends each line of a formatted record as a separate syslog datagram.
///
/// The local socket is bound on the first record.
pub struct SyslogUdpHandler {
    state: HandlerState,
    host: String,
    port: u16,
    facility: Facility,
    ident: String,
    rfc: SyslogRfc,
    hostname: String,
    socket: Option<UdpSocket>,
}

impl SyslogUdpHandler {
    /// # Errors
    ///
    /// Returns an error if `host` is empty
    pub fn new(host: impl Into<String>, port: u16, facility: Facility, level: Severity, bubble: bool) -> Result<Self> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(LoggerError::handler("syslog_udp", "host is required"));
        }

        Ok(Self {
            state: HandlerState::new(level, bubble),
            host,
            port,
            facility,
            ident: default_ident(),
            rfc: SyslogRfc::default(),
            hostname: local_hostname(),
            socket: None,
        })
    }

    #[must_use]
    pub fn with_ident(mut self, ident: impl Into<String>) -> Self {
        let ident = ident.into();
        if !ident.is_empty() {
            self.ident = ident;
        }
        self
    }

    #[must_use]
    pub fn with_rfc(mut self, rfc: SyslogRfc) -> Self {
        self.rfc = rfc;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Syslog header preceding each line of the message
    pub fn header(&self, record: &LogRecord) -> String {
        let priority = self.facility.priority(record.level);
        let pid = std::process::id();
        match self.rfc {
            SyslogRfc::Rfc3164 => format!(
                "<{}>{} {} {}[{}]: ",
                priority,
                record.datetime.format("%b %e %H:%M:%S"),
                self.hostname,
                self.ident,
                pid
            ),
            SyslogRfc::Rfc5424 => format!(
                "<{}>1 {} {} {} {} - - ",
                priority,
                record.datetime.to_rfc3339_opts(SecondsFormat::Micros, false),
                self.hostname,
                self.ident,
                pid
            ),
        }
    }

    /// Datagrams for one record: one per non-empty line, truncated to fit
    pub fn datagrams(&self, record: &LogRecord, formatted: &str) -> Vec<String> {
        let header = self.header(record);
        formatted
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let mut datagram = format!("{}{}", header, line);
                truncate_at_char_boundary(&mut datagram, MAX_DATAGRAM);
                datagram
            })
            .collect()
    }

    fn socket(&mut self) -> Result<&UdpSocket> {
        if self.socket.is_none() {
            let socket = UdpSocket::bind(("0.0.0.0", 0)).map_err(|e| {
                LoggerError::io_operation("bind syslog socket", "Failed to bind UDP socket", e)
            })?;
            self.socket = Some(socket);
        }
        self.socket
            .as_ref()
            .ok_or_else(|| LoggerError::handler("syslog_udp", "socket not bound"))
    }
}

fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "-".to_string())
}

fn truncate_at_char_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}

impl FromArguments for SyslogUdpHandler {
    const PARAMETERS: &'static [Parameter] = &[
        Parameter::new("host", ParamType::Str, ParamDefault::Required),
        Parameter::new("port", ParamType::Int, ParamDefault::Int(514)),
        Parameter::new("facility", ParamType::Str, ParamDefault::Str("user")),
        Parameter::new("level", ParamType::Level, ParamDefault::Level(Severity::Debug)),
        Parameter::new("bubble", ParamType::Bool, ParamDefault::Bool(true)),
        Parameter::new("ident", ParamType::Str, ParamDefault::Str("")),
        Parameter::new("rfc", ParamType::Str, ParamDefault::Str("5424")),
    ];

    fn from_arguments(args: &mut ArgumentCursor<'_>) -> Result<Self> {
        let host = args.next_str("host")?;
        let port = args.next_int("port")?;
        let port = u16::try_from(port)
            .map_err(|_| LoggerError::handler("syslog_udp", format!("invalid port: {}", port)))?;
        let facility = parse_facility("syslog_udp", &args.next_str("facility")?)?;
        let level = args.next_level("level")?;
        let bubble = args.next_bool("bubble")?;
        let ident = args.next_str("ident")?;
        let rfc = args
            .next_str("rfc")?
            .parse::<SyslogRfc>()
            .map_err(|e| LoggerError::handler("syslog_udp", e))?;

        Ok(Self::new(host, port, facility, level, bubble)?
            .with_ident(ident)
            .with_rfc(rfc))
    }
}

impl Handler for SyslogUdpHandler {
    fn name(&self) -> &str {
        "syslog_udp"
    }

    fn is_handling(&self, level: Severity) -> bool {
        self.state.is_handling(level)
    }

    fn handle(&mut self, record: &LogRecord) -> Result<bool> {
        if !self.state.is_handling(record.level) {
            return Ok(false);
        }

        let (_, formatted) = self.state.prepare(record)?;
        let datagrams = self.datagrams(record, &formatted);
        let address = self.address();
        let socket = self.socket()?;
        for datagram in datagrams {
            socket.send_to(datagram.as_bytes(), address.as_str()).map_err(|e| {
                LoggerError::io_operation(
                    "send to syslog",
                    format!("Failed to send datagram to {}", address),
                    e,
                )
            })?;
        }

        Ok(!self.state.bubble)
    }

    fn as_formattable(&mut self) -> Option<&mut dyn FormattableHandler> {
        Some(self)
    }

    fn as_processable(&mut self) -> Option<&mut dyn ProcessableHandler> {
        Some(self)
    }
}

impl_handler_state!(SyslogUdpHandler);
