// Console sink - where protocol lines and diagnostics go

use std::io::{self, Write};

use tracing::{error, info};

/// Line-based output used by the reporter.
///
/// `log` carries the service message stream. `info` and `error` are the
/// diagnostic channels and never carry protocol lines. `stdout`/`stderr`
/// pass run-level output through unchanged.
pub trait Console {
    fn log(&mut self, line: &str);
    fn info(&mut self, text: &str);
    fn error(&mut self, text: &str);
    fn stdout(&mut self, chunk: &str);
    fn stderr(&mut self, chunk: &str);
}

/// Process stdio console: protocol to stdout, diagnostics through tracing
#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn log(&mut self, line: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", line);
        let _ = stdout.flush();
    }

    fn info(&mut self, text: &str) {
        info!("{}", text);
    }

    fn error(&mut self, text: &str) {
        error!("{}", text);
    }

    fn stdout(&mut self, chunk: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(chunk.as_bytes());
        let _ = stdout.flush();
    }

    fn stderr(&mut self, chunk: &str) {
        let mut stderr = io::stderr().lock();
        let _ = stderr.write_all(chunk.as_bytes());
        let _ = stderr.flush();
    }
}

/// One call recorded by [`MemoryConsole`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Log(String),
    Info(String),
    Error(String),
    Stdout(String),
    Stderr(String),
}

/// Console that records everything, for inspecting reporter output
#[derive(Debug, Default)]
pub struct MemoryConsole {
    lines: Vec<ConsoleLine>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[ConsoleLine] {
        &self.lines
    }

    /// Protocol lines only, in order
    pub fn logged(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                ConsoleLine::Log(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl Console for MemoryConsole {
    fn log(&mut self, line: &str) {
        self.lines.push(ConsoleLine::Log(line.to_string()));
    }

    fn info(&mut self, text: &str) {
        self.lines.push(ConsoleLine::Info(text.to_string()));
    }

    fn error(&mut self, text: &str) {
        self.lines.push(ConsoleLine::Error(text.to_string()));
    }

    fn stdout(&mut self, chunk: &str) {
        self.lines.push(ConsoleLine::Stdout(chunk.to_string()));
    }

    fn stderr(&mut self, chunk: &str) {
        self.lines.push(ConsoleLine::Stderr(chunk.to_string()));
    }
}
