// envfilter-core/src/diagnostics.rs
//! Diagnostic sinks.
//!
//! Rules and the env2file wrapper report every decision and mutation as one
//! plain line of text, addressed to whoever reads the build log. These lines are
//! distinct from the `log` facade output, which is aimed at developers.

use log::{info, warn};
use std::io::Write;

/// An append-only stream of human-readable diagnostic lines.
pub trait DiagnosticSink {
    fn println(&mut self, line: &str);
}

impl DiagnosticSink for Vec<String> {
    fn println(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Collects lines in memory.
#[derive(Debug, Default, Clone)]
pub struct BufferedSink {
    lines: Vec<String>,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl DiagnosticSink for BufferedSink {
    fn println(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Writes each line to an `io::Write`, e.g. stderr or a build log file.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    inner: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> DiagnosticSink for WriterSink<W> {
    fn println(&mut self, line: &str) {
        // A broken log stream must never change the outcome of a rule.
        if let Err(e) = writeln!(self.inner, "{}", line) {
            warn!("Failed to write diagnostic line: {}", e);
        }
    }
}

/// Forwards lines to the `log` facade at info level.
///
/// Used when no host sink is reachable, e.g. teardown during unwinding.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn println(&mut self, line: &str) {
        info!(target: "envfilter_core::diagnostics", "{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_sink_terminates_each_line() {
        let mut sink = WriterSink::new(Vec::new());
        sink.println("first");
        sink.println("second");
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "first\nsecond\n");
    }

    #[test]
    fn buffered_sink_contains_matches_substrings() {
        let mut sink = BufferedSink::new();
        sink.println("Wrote VAL to /ws@tmp/VAL.txt");
        assert!(sink.contains("VAL.txt"));
        assert!(!sink.contains("OTHER"));
    }
}
