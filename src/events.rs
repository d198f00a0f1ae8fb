//! Resolution event sink
//!
//! The planner and solver never print or log on their own; they report
//! through a sink handed in by the caller. The CLI passes a console sink,
//! tests pass a recording sink, embedders can pass whatever they need.

use std::sync::Mutex;

/// Receiver for resolution notices
pub trait EventSink: Send + Sync {
    /// User-facing progress notice ("Preparing to upgrade ...")
    fn notice(&self, message: &str);

    /// Diagnostic detail, shown only in verbose mode
    fn debug(&self, message: &str);
}

/// Sink that writes notices to stderr
pub struct ConsoleEvents {
    verbose: bool,
    quiet: bool,
}

impl ConsoleEvents {
    /// Create a console sink honoring the CLI verbosity flags
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }
}

impl EventSink for ConsoleEvents {
    fn notice(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }

    fn debug(&self, message: &str) {
        if self.verbose && !self.quiet {
            eprintln!("{}", message);
        }
    }
}

/// Sink that discards everything
pub struct NullEvents;

impl EventSink for NullEvents {
    fn notice(&self, _message: &str) {}

    fn debug(&self, _message: &str) {}
}

/// Sink that captures notices for assertions
#[derive(Default)]
pub struct RecordingEvents {
    entries: Mutex<Vec<String>>,
}

impl RecordingEvents {
    /// Create an empty recording sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured notice and debug lines, in arrival order
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// True if any captured line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.entries().iter().any(|e| e.contains(needle))
    }
}

impl EventSink for RecordingEvents {
    fn notice(&self, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(message.to_string());
        }
    }

    fn debug(&self, message: &str) {
        self.notice(message);
    }
}
