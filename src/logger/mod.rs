//! Transition journal: JSONL append-only file or in-memory capture.

use std::sync::Arc;

use parking_lot::Mutex;

pub mod jsonl;

use jsonl::LogEntry;

/// Sink for orchestrator transition entries.
pub trait Journal {
    /// Append one entry. Must not fail the caller.
    fn record(&mut self, entry: &LogEntry);

    fn flush(&mut self) {}
}

/// In-memory journal. Clones share the same buffer, so a caller can keep one
/// handle and pass another to the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct MemoryJournal {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemoryJournal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Journal for MemoryJournal {
    fn record(&mut self, entry: &LogEntry) {
        self.entries.lock().push(entry.clone());
    }
}
