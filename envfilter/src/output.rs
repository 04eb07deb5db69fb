// envfilter/src/output.rs
//! Formatting of user-facing status messages.
//!
//! Messages go to stderr, colored only when the stream is a terminal.

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warn,
    Error,
}

impl MessageKind {
    fn prefix(self) -> &'static str {
        match self {
            MessageKind::Info => "info",
            MessageKind::Success => "ok",
            MessageKind::Warn => "warning",
            MessageKind::Error => "error",
        }
    }
}

/// Writes a single prefixed message line.
pub fn print_message<W: Write>(writer: &mut W, kind: MessageKind, msg: &str, supports_color: bool) -> io::Result<()> {
    let prefix = kind.prefix();
    if supports_color {
        match kind {
            MessageKind::Info => writeln!(writer, "{}: {}", prefix.cyan(), msg),
            MessageKind::Success => writeln!(writer, "{}: {}", prefix.green().bold(), msg),
            MessageKind::Warn => writeln!(writer, "{}: {}", prefix.yellow().bold(), msg),
            MessageKind::Error => writeln!(writer, "{}: {}", prefix.red().bold(), msg),
        }
    } else {
        writeln!(writer, "{}: {}", prefix, msg)
    }
}

fn to_stderr(kind: MessageKind, msg: &str) {
    let mut stderr = io::stderr();
    let supports_color = stderr.is_terminal();
    let _ = print_message(&mut stderr, kind, msg, supports_color);
}

/// Helper for printing info messages to stderr.
pub fn info_msg(msg: impl AsRef<str>) {
    to_stderr(MessageKind::Info, msg.as_ref());
}

/// Helper for printing success messages to stderr.
pub fn success_msg(msg: impl AsRef<str>) {
    to_stderr(MessageKind::Success, msg.as_ref());
}

/// Helper for printing warning messages to stderr.
pub fn warn_msg(msg: impl AsRef<str>) {
    to_stderr(MessageKind::Warn, msg.as_ref());
}

/// Helper for printing error messages to stderr.
pub fn error_msg(msg: impl AsRef<str>) {
    to_stderr(MessageKind::Error, msg.as_ref());
}
