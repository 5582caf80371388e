use std::sync::{Arc, Mutex, MutexGuard};

use super::snapshot::{Document, ElevatorSnapshot};
use super::{Store, StoreError};

#[derive(Default)]
struct Inner {
    document: Document,
    failing: bool,
    saves: usize,
}

/// In-memory store. Clones share the same document, so a caller can keep a
/// handle after giving the store away. `set_failing(true)` makes every save
/// fail without touching the document.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn with_document(document: Document) -> MemoryStore {
        let store = MemoryStore::default();
        store.lock().document = document;
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Number of successful saves so far.
    pub fn saves(&self) -> usize {
        self.lock().saves
    }

    pub fn snapshot(&self, name: &str) -> Option<ElevatorSnapshot> {
        self.lock().document.get(name).cloned()
    }

    pub fn document(&self) -> Document {
        self.lock().document.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Store for MemoryStore {
    fn load(&mut self) -> Result<Vec<ElevatorSnapshot>, StoreError> {
        Ok(self.lock().document.elevators.clone())
    }

    fn save(&mut self, name: &str, snapshot: Option<&ElevatorSnapshot>) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.failing {
            return Err(StoreError::Io("simulated write failure".to_string()));
        }
        inner.document.apply(name, snapshot);
        inner.saves += 1;
        Ok(())
    }
}
