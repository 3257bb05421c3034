// Append-only diagnostics log shared by one evaluation pass

use std::fmt;

/// Severity of a console entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Display prefix convention for console/UI rendering.
    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Debug => "[-]",
            LogLevel::Info => "[i]",
            LogLevel::Warning => "[*]",
            LogLevel::Error => "[!]",
        }
    }
}

/// Chronological diagnostics log. Entries are only ever appended during a
/// pass; `clear` runs once at the start of each pass.
#[derive(Debug, Clone, Default)]
pub struct ConsoleLog {
    entries: Vec<(LogLevel, String)>,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Debug, message.into());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warning, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message.into());
    }

    fn push(&mut self, level: LogLevel, message: String) {
        self.entries
            .push((level, format!("{} {}", level.prefix(), message)));
    }

    pub fn entries(&self) -> &[(LogLevel, String)] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries with the given level.
    pub fn count(&self, level: LogLevel) -> usize {
        self.entries.iter().filter(|(l, _)| *l == level).count()
    }
}

impl fmt::Display for ConsoleLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (_, message) in &self.entries {
            writeln!(f, "{}", message)?;
        }
        Ok(())
    }
}
