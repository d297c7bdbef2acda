use std::sync::Mutex;

use crate::{ProgressError, ProgressRecord, ProgressStore};

/// In-memory progress store for tests.
///
/// Records every `save` so tests can assert checkpoint ordering.
#[derive(Default)]
pub struct MemoryProgressStore {
    current: Mutex<Option<ProgressRecord>>,
    saves: Mutex<Vec<ProgressRecord>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with an existing record (resume scenarios).
    pub fn with_record(record: ProgressRecord) -> Self {
        Self {
            current: Mutex::new(Some(record)),
            saves: Mutex::new(Vec::new()),
        }
    }

    /// Every record passed to `save`, in call order.
    pub fn saves(&self) -> Vec<ProgressRecord> {
        self.saves.lock().unwrap().clone()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self) -> Result<Option<ProgressRecord>, ProgressError> {
        Ok(self.current.lock().unwrap().clone())
    }

    fn save(&self, record: &ProgressRecord) -> Result<(), ProgressError> {
        record.validate()?;
        *self.current.lock().unwrap() = Some(record.clone());
        self.saves.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ProgressError> {
        *self.current.lock().unwrap() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_save_history() {
        let store = MemoryProgressStore::new();
        assert!(store.load().unwrap().is_none());

        let mut record = ProgressRecord::new("v.mp4", 3, "vid-1".into());
        store.save(&record).unwrap();
        record.last_uploaded_chunk = Some(0);
        store.save(&record).unwrap();

        assert_eq!(store.saves().len(), 2);
        assert_eq!(store.load().unwrap().unwrap().last_uploaded_chunk, Some(0));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // History survives clear for post-run assertions.
        assert_eq!(store.saves().len(), 2);
    }
}
