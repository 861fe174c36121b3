//! Engine diagnostics
//!
//! Every runtime service reports declines and terminal failures through an
//! injected sink rather than logging to ambient globals. The engine shell
//! installs a console sink; tests install a capturing sink and assert on it.

use std::cell::RefCell;
use std::fmt;

/// How serious a diagnostic message is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Routine chain traffic (backend declines, fallbacks taken)
    Info,
    /// Something recoverable went wrong (a backend failed mid-attempt)
    Warning,
    /// A terminal failure surfaced to the caller
    Error,
}

impl Severity {
    /// Short label used when formatting messages
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warn",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Sink for diagnostic messages from the runtime services
///
/// Implementations must tolerate being called from inside resolver and bus
/// internals; they should not call back into either service.
pub trait DiagnosticSink {
    fn log(&self, severity: Severity, message: &str);
}

/// Console sink: info/warnings to stdout, errors to stderr
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticSink for ConsoleSink {
    fn log(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info | Severity::Warning => {
                println!("[{}] {}", severity.label(), message)
            }
            Severity::Error => eprintln!("[{}] {}", severity.label(), message),
        }
    }
}

/// Capturing sink for tests and in-engine diagnostic overlays
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: RefCell<Vec<(Severity, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Snapshot of everything logged so far
    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries.borrow().clone()
    }

    /// Number of entries at or above the given severity
    pub fn count_at_least(&self, severity: Severity) -> usize {
        let rank = |s: Severity| match s {
            Severity::Info => 0,
            Severity::Warning => 1,
            Severity::Error => 2,
        };
        self.entries
            .borrow()
            .iter()
            .filter(|(s, _)| rank(*s) >= rank(severity))
            .count()
    }

    /// Check whether any entry contains the given fragment
    pub fn contains(&self, fragment: &str) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|(_, m)| m.contains(fragment))
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn log(&self, severity: Severity, message: &str) {
        self.entries
            .borrow_mut()
            .push((severity, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::Info.label(), "info");
        assert_eq!(Severity::Warning.label(), "warn");
        assert_eq!(Severity::Error.label(), "error");
    }

    #[test]
    fn test_memory_sink_captures() {
        let sink = MemorySink::new();
        sink.log(Severity::Info, "backend declined 'a.dat'");
        sink.log(Severity::Error, "no backend for 'b.dat'");

        assert_eq!(sink.entries().len(), 2);
        assert!(sink.contains("a.dat"));
        assert!(sink.contains("b.dat"));
        assert_eq!(sink.count_at_least(Severity::Warning), 1);
        assert_eq!(sink.count_at_least(Severity::Info), 2);

        sink.clear();
        assert!(sink.entries().is_empty());
    }
}
