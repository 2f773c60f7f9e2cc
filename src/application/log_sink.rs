use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Append-only log buffer shared between the download worker and the UI.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl LogSink {
    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, line: impl Into<String>) {
        self.lock().push(line.into());
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn lines(&self) -> Vec<String> {
        self.lock().clone()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
