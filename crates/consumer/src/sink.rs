//! Console output with severity colouring.

use std::io::Write;
use std::sync::Mutex;

use chrono::Local;

/// Severity tag of a console line; each maps to a foreground colour.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Severity {
    /// Plain progress message, default colour.
    General,
    Info,
    Success,
    Warning,
    Error,
    /// Output from message handlers, so it stands out from the host's own lines.
    Highlight,
}

impl Severity {
    /// ANSI SGR foreground colour code (`None` = terminal default).
    pub fn ansi_code(self) -> Option<u8> {
        match self {
            Severity::General => None,
            Severity::Info => Some(36),
            Severity::Success => Some(32),
            Severity::Warning => Some(33),
            Severity::Error => Some(31),
            Severity::Highlight => Some(35),
        }
    }

    /// Prefix written before the message.
    pub fn label(self) -> &'static str {
        match self {
            Severity::General | Severity::Info => "Info",
            Severity::Success => "Success",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Highlight => "Message Service Consumer",
        }
    }
}

/// Destination for formatted console lines.
pub trait ConsoleSink: Send + Sync {
    fn write(&self, severity: Severity, message: &str);
}

/// Writes timestamped, colour-coded lines to stdout.
#[derive(Debug, Default)]
pub struct AnsiConsole {
    // Serialises writers so colour codes from different threads never interleave.
    lock: Mutex<()>,
}

impl AnsiConsole {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConsoleSink for AnsiConsole {
    fn write(&self, severity: Severity, message: &str) {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let line = format_line(severity, message);
        let mut out = std::io::stdout().lock();

        let result = match severity.ansi_code() {
            Some(code) => writeln!(out, "\x1b[{code}m{line}\x1b[0m"),
            None => writeln!(out, "{line}"),
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "console write failed");
        }
    }
}

/// Records lines in memory (tests, embedding).
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(Severity, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Severity, String)> {
        self.lines.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Messages only, in write order.
    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|(_, m)| m).collect()
    }
}

impl ConsoleSink for MemorySink {
    fn write(&self, severity: Severity, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((severity, message.to_string()));
    }
}

/// `<local time>: <label>: <message>`
pub fn format_line(severity: Severity, message: &str) -> String {
    format!(
        "{}: {}: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        severity.label(),
        message
    )
}
