//! Standard error handler

use crate::core::error::Result;
use crate::core::handler::{impl_handler_state, FormattableHandler, Handler, HandlerState, ProcessableHandler};
use crate::core::log_record::LogRecord;
use crate::core::severity::Severity;
use crate::resolver::arguments::ArgumentCursor;
use crate::resolver::parameters::{ParamDefault, ParamType, Parameter};
use crate::resolver::registry::FromArguments;
use std::io::Write;

/// Writes formatted records to the process error stream.
///
/// With `expand_newlines` every line of a record is written separately,
/// which keeps multi-line records readable in line-oriented collectors.
pub struct ErrorLogHandler {
    state: HandlerState,
    expand_newlines: bool,
    colors: bool,
    writer: Box<dyn Write + Send>,
}

impl ErrorLogHandler {
    pub fn new(level: Severity, bubble: bool) -> Self {
        Self {
            state: HandlerState::new(level, bubble),
            expand_newlines: false,
            colors: true,
            writer: Box::new(std::io::stderr()),
        }
    }

    #[must_use]
    pub fn with_expand_newlines(mut self, expand: bool) -> Self {
        self.expand_newlines = expand;
        self
    }

    #[must_use]
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Write somewhere other than stderr
    #[must_use]
    pub fn with_writer(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.writer = writer;
        self
    }

    fn paint(&self, level: Severity, line: &str) -> String {
        #[cfg(feature = "console")]
        if self.colors {
            use colored::Colorize;
            return line.color(level.color_code()).to_string();
        }

        #[cfg(not(feature = "console"))]
        let _ = level;

        line.to_string()
    }

    fn write_line(&mut self, level: Severity, line: &str) -> Result<()> {
        let painted = self.paint(level, line);
        writeln!(self.writer, "{}", painted)?;
        Ok(())
    }
}

impl FromArguments for ErrorLogHandler {
    const PARAMETERS: &'static [Parameter] = &[
        Parameter::new("level", ParamType::Level, ParamDefault::Level(Severity::Debug)),
        Parameter::new("bubble", ParamType::Bool, ParamDefault::Bool(true)),
        Parameter::new("expand_newlines", ParamType::Bool, ParamDefault::Bool(false)),
        Parameter::new("colors", ParamType::Bool, ParamDefault::Bool(true)),
    ];

    fn from_arguments(args: &mut ArgumentCursor<'_>) -> Result<Self> {
        let level = args.next_level("level")?;
        let bubble = args.next_bool("bubble")?;
        let expand_newlines = args.next_bool("expand_newlines")?;
        let colors = args.next_bool("colors")?;

        Ok(Self::new(level, bubble)
            .with_expand_newlines(expand_newlines)
            .with_colors(colors))
    }
}

impl Handler for ErrorLogHandler {
    fn name(&self) -> &str {
        "error_log"
    }

    fn is_handling(&self, level: Severity) -> bool {
        self.state.is_handling(level)
    }

    fn handle(&mut self, record: &LogRecord) -> Result<bool> {
        if !self.state.is_handling(record.level) {
            return Ok(false);
        }

        let (_, formatted) = self.state.prepare(record)?;
        let formatted = formatted.trim_end_matches('\n');

        if self.expand_newlines {
            for line in formatted.lines() {
                self.write_line(record.level, line)?;
            }
        } else {
            self.write_line(record.level, formatted)?;
        }

        Ok(!self.state.bubble)
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn as_formattable(&mut self) -> Option<&mut dyn FormattableHandler> {
        Some(self)
    }

    fn as_processable(&mut self) -> Option<&mut dyn ProcessableHandler> {
        Some(self)
    }
}

impl_handler_state!(ErrorLogHandler);
