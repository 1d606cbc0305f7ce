//! Output sinks for console text.
//!
//! The console engine never touches a terminal, socket, or formatter
//! directly. Everything it prints goes through a [`ConsoleSink`], which the
//! transport (local stdin/stdout, a remote socket, a test buffer) provides.

use std::io::{self, Write};

/// Line terminator used by console transports.
pub const NEWLINE: &str = "\r\n";

/// Destination for console output.
pub trait ConsoleSink {
    /// Write raw text with no terminator.
    fn write(&mut self, text: &str);

    /// Write a single line of text.
    fn write_line(&mut self, line: &str) {
        self.write(line);
        self.write(NEWLINE);
    }

    /// Write the response of a completed command.
    fn write_response(&mut self, text: &str) {
        self.write(text);
    }

    /// Write one error line for a rejected command.
    fn write_error(&mut self, line: &str) {
        self.write_line(line);
    }
}

/// In-memory sink that keeps regular output and error lines apart.
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
    /// Everything written through `write`, `write_line`, and `write_response`.
    pub output: String,
    /// One entry per `write_error` call.
    pub errors: Vec<String>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output split into lines (terminators removed).
    pub fn lines(&self) -> Vec<&str> {
        self.output.lines().map(|l| l.trim_end_matches('\r')).collect()
    }

    /// Drop everything captured so far.
    pub fn clear(&mut self) {
        self.output.clear();
        self.errors.clear();
    }
}

impl ConsoleSink for BufferSink {
    fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn write_error(&mut self, line: &str) {
        self.errors.push(line.to_string());
    }
}

/// Sink for a local terminal session.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl ConsoleSink for StdoutSink {
    fn write(&mut self, text: &str) {
        let mut out = io::stdout().lock();
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            log::warn!("stdout write failed: {e}");
        }
    }

    fn write_line(&mut self, line: &str) {
        self.write(line);
        self.write("\n");
    }

    fn write_error(&mut self, line: &str) {
        let mut err = io::stderr().lock();
        if let Err(e) = writeln!(err, "{line}") {
            log::warn!("stderr write failed: {e}");
        }
    }
}
