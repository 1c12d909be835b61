//! Output targets for the polling log

use crate::Result;
use std::io::Write;

/// Kind of line handed to a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// CSV column header, written once per run
    Header,
    /// One emitted sample
    Record,
    /// Human-oriented status line (long sleep, outage)
    Notice,
}

/// Line-oriented output target
pub trait OutputSink {
    /// Write one line
    fn emit(&mut self, kind: LineKind, line: &str) -> Result<()>;
}

/// Sink writing the CSV log to one writer and notices to another
#[derive(Debug)]
pub struct WriterSink<O, N> {
    out: O,
    notices: N,
}

impl<O: Write, N: Write> WriterSink<O, N> {
    pub fn new(out: O, notices: N) -> Self {
        Self { out, notices }
    }

    /// Recover the underlying writers
    pub fn into_inner(self) -> (O, N) {
        (self.out, self.notices)
    }
}

impl WriterSink<std::io::Stdout, std::io::Stderr> {
    /// CSV on stdout, notices on stderr
    pub fn stdio() -> Self {
        Self::new(std::io::stdout(), std::io::stderr())
    }
}

impl<O: Write, N: Write> OutputSink for WriterSink<O, N> {
    fn emit(&mut self, kind: LineKind, line: &str) -> Result<()> {
        let writer: &mut dyn Write = match kind {
            LineKind::Header | LineKind::Record => &mut self.out,
            LineKind::Notice => &mut self.notices,
        };
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }
}

/// Sink that keeps every line in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub lines: Vec<(LineKind, String)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines of one kind, in emission order
    pub fn of_kind(&self, kind: LineKind) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, line)| line.as_str())
            .collect()
    }

    /// Emitted sample lines
    pub fn records(&self) -> Vec<&str> {
        self.of_kind(LineKind::Record)
    }

    /// Emitted notices
    pub fn notices(&self) -> Vec<&str> {
        self.of_kind(LineKind::Notice)
    }
}

impl OutputSink for MemorySink {
    fn emit(&mut self, kind: LineKind, line: &str) -> Result<()> {
        self.lines.push((kind, line.to_string()));
        Ok(())
    }
}
