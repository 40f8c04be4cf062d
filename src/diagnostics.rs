use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub kind: DiagnosticKind,
}

/// Collects the non-fatal problems an analysis run runs into.
///
/// Built once by the caller and handed (behind an `Arc`) to each component,
/// so tests can inspect exactly what a single loader or client reported.
/// Every entry is also emitted as a `tracing` event.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Mutex<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.add(message, DiagnosticKind::Info);
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.add(message, DiagnosticKind::Warning);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{}", message);
        self.add(message, DiagnosticKind::Error);
    }

    /// Snapshot of everything recorded so far, oldest first.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries
            .lock()
            .map(|entries| entries.iter().filter(|d| d.kind == kind).count())
            .unwrap_or(0)
    }

    fn add(&self, message: String, kind: DiagnosticKind) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(Diagnostic { message, kind });
        }
    }
}
