//! redb-based identity storage backend.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use crate::{CoreId, CoreIdStorage, StorageError, StorageResult};

/// Table definition for identities.
/// Key: checksummed address string
/// Value: JSON-encoded [`CoreId`]
const CORE_IDS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("core_ids");

/// redb-based identity store.
///
/// Each operation runs in its own transaction, so concurrent handlers never
/// observe a half-written record.
pub struct RedbStorage {
    db: Database,
}

impl RedbStorage {
    /// Open or create a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let db = Database::create(path)?;

        // Ensure the table exists so readers never hit a missing table
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CORE_IDS_TABLE)?;
        }
        write_txn.commit()?;

        debug!("Opened redb identity store");
        Ok(Self { db })
    }

    fn read(&self, id: &str) -> StorageResult<Option<CoreId>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CORE_IDS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }
}

impl CoreIdStorage for RedbStorage {
    fn get_core_id(&self, id: &str) -> StorageResult<CoreId> {
        self.read(id)?.ok_or(StorageError::NotFound)
    }

    fn create_core_id(&self, core_id: &CoreId) -> StorageResult<()> {
        let encoded = serde_json::to_vec(core_id)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CORE_IDS_TABLE)?;
            if table.get(core_id.id.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(core_id.id.clone()));
            }
            table.insert(core_id.id.as_str(), encoded.as_slice())?;
        }
        write_txn.commit()?;

        debug!(id = %core_id.id, "Created core id");
        Ok(())
    }

    fn verify(&self, id: &str) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CORE_IDS_TABLE)?;
            let existing = table.get(id)?.map(|value| value.value().to_vec());
            let Some(existing) = existing else {
                return Err(StorageError::NotFound);
            };

            let mut core_id: CoreId = serde_json::from_slice(&existing)?;
            core_id.mark_verified();
            let encoded = serde_json::to_vec(&core_id)?;
            table.insert(id, encoded.as_slice())?;
        }
        write_txn.commit()?;

        debug!(id, "Verified core id");
        Ok(())
    }
}

impl From<redb::DatabaseError> for StorageError {
    fn from(err: redb::DatabaseError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<redb::TransactionError> for StorageError {
    fn from(err: redb::TransactionError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<redb::TableError> for StorageError {
    fn from(err: redb::TableError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<redb::StorageError> for StorageError {
    fn from(err: redb::StorageError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<redb::CommitError> for StorageError {
    fn from(err: redb::CommitError) -> Self {
        Self::Database(err.to_string())
    }
}
