use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::error::MirrorError;
use super::{MirrorPort, SCREENING_COLLECTION};
use crate::models::{ScreeningRecord, SessionKind, SessionRecord};

/// In-process mirror. Collections round-trip through JSON so the same
/// serialization rules apply as on disk.
#[derive(Default)]
pub struct MemoryMirror {
    collections: Mutex<HashMap<String, Value>>,
    reject_writes: AtomicBool,
    rejected_collection: Mutex<Option<String>>,
    writes: AtomicUsize,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following save fail until switched back.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Make saves to one named collection fail, leaving the others writable.
    pub fn reject_collection(&self, name: Option<&str>) {
        if let Ok(mut slot) = self.rejected_collection.lock() {
            *slot = name.map(str::to_string);
        }
    }

    /// Number of successful saves so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Value>>, MirrorError> {
        self.collections
            .lock()
            .map_err(|_| MirrorError::WriteRejected("memory mirror lock poisoned".to_string()))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>, MirrorError> {
        match self.lock()?.get(name) {
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(|e| MirrorError::json(name, e))
            }
            None => Ok(Vec::new()),
        }
    }

    fn save<T: Serialize>(&self, name: &str, records: &[T]) -> Result<(), MirrorError> {
        let rejected = self
            .rejected_collection
            .lock()
            .map(|slot| slot.as_deref() == Some(name))
            .unwrap_or(false);
        if rejected || self.reject_writes.load(Ordering::SeqCst) {
            return Err(MirrorError::WriteRejected(name.to_string()));
        }
        let value = serde_json::to_value(records).map_err(|e| MirrorError::json(name, e))?;
        self.lock()?.insert(name.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl MirrorPort for MemoryMirror {
    fn load_screenings(&self) -> Result<Vec<ScreeningRecord>, MirrorError> {
        self.load(SCREENING_COLLECTION)
    }

    fn save_screenings(&self, records: &[ScreeningRecord]) -> Result<(), MirrorError> {
        self.save(SCREENING_COLLECTION, records)
    }

    fn load_sessions(&self, kind: SessionKind) -> Result<Vec<SessionRecord>, MirrorError> {
        self.load(kind.collection_name())
    }

    fn save_sessions(&self, kind: SessionKind, records: &[SessionRecord]) -> Result<(), MirrorError> {
        self.save(kind.collection_name(), records)
    }
}
