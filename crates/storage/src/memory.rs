//! In-memory identity storage backend.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::{CoreId, CoreIdStorage, StorageError, StorageResult};

/// Process-local identity store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<String, CoreId>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.records.read().len()
    }
}

impl CoreIdStorage for MemoryStorage {
    fn get_core_id(&self, id: &str) -> StorageResult<CoreId> {
        self.records
            .read()
            .get(id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn create_core_id(&self, core_id: &CoreId) -> StorageResult<()> {
        let mut records = self.records.write();
        if records.contains_key(&core_id.id) {
            return Err(StorageError::AlreadyExists(core_id.id.clone()));
        }
        records.insert(core_id.id.clone(), core_id.clone());
        Ok(())
    }

    fn verify(&self, id: &str) -> StorageResult<()> {
        self.records
            .write()
            .get_mut(id)
            .map(CoreId::mark_verified)
            .ok_or(StorageError::NotFound)
    }
}
