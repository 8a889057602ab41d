use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{decode, encode, PersistedState, StateStore};
use crate::error::{ParleyError, Result};

/// In-process store holding the encoded record.
///
/// Records go through the same encoding as [`super::JsonFileStore`], so a
/// session backed by this store exercises the full round trip. Writes can be
/// made to fail on demand.
#[derive(Default)]
pub struct MemoryStore {
    record: Mutex<Option<String>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: &PersistedState) -> Result<Self> {
        let store = Self::new();
        *store.record_guard() = Some(encode(state)?);
        Ok(store)
    }

    /// Make subsequent writes fail with a persistence error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn raw(&self) -> Option<String> {
        self.record_guard().clone()
    }

    pub fn set_raw(&self, contents: impl Into<String>) {
        *self.record_guard() = Some(contents.into());
    }

    fn record_guard(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.record.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> PersistedState {
        match self.record_guard().as_deref() {
            None => PersistedState::default(),
            Some(contents) => decode(contents).unwrap_or_else(|e| {
                tracing::warn!("Discarding unreadable in-memory chat state: {}", e);
                PersistedState::default()
            }),
        }
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ParleyError::persistence("storage is unavailable"));
        }
        let contents = encode(state)?;
        *self.record_guard() = Some(contents);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_loads_default() {
        assert!(MemoryStore::new().load().is_empty());
    }

    #[test]
    fn test_failing_writes_keep_previous_record() {
        let store = MemoryStore::new();
        store.save(&PersistedState::default()).unwrap();
        let before = store.raw();

        store.set_fail_writes(true);
        assert!(store.save(&PersistedState::default()).is_err());
        assert_eq!(store.raw(), before);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_corrupt_record_loads_default() {
        let store = MemoryStore::new();
        store.set_raw("][");
        assert!(store.load().is_empty());
    }
}
