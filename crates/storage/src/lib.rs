//! Identity persistence for the faucet.
//!
//! An identity ([`CoreId`]) is created unverified when its owner first asks for
//! an authorized payout, and flipped to verified once the KYC provider calls
//! back with the requested data.
//!
//! Two backends are provided:
//! - [`RedbStorage`]: persistent, backed by an embedded redb database
//! - [`MemoryStorage`]: process-local, used in tests and throwaway deployments

mod memory;
mod redb_store;

pub use memory::MemoryStorage;
pub use redb_store::RedbStorage;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    /// Record not found.
    #[error("record not found")]
    NotFound,

    /// Record already exists.
    #[error("record already exists: {0}")]
    AlreadyExists(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A known identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreId {
    /// Checksummed address of the identity
    pub id: String,
    /// Whether the KYC provider delivered every requested field
    #[serde(default)]
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CoreId {
    /// New unverified identity stamped with the current time.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark as verified and bump `updated_at`.
    pub fn mark_verified(&mut self) {
        self.verified = true;
        self.updated_at = Utc::now();
    }
}

/// Storage for identities.
pub trait CoreIdStorage: Send + Sync {
    /// Look up an identity, returning [`StorageError::NotFound`] if absent.
    fn get_core_id(&self, id: &str) -> StorageResult<CoreId>;

    /// Insert a new identity, returning [`StorageError::AlreadyExists`] if present.
    fn create_core_id(&self, core_id: &CoreId) -> StorageResult<()>;

    /// Mark an existing identity as verified.
    fn verify(&self, id: &str) -> StorageResult<()>;
}

/// Everything the faucet persists.
pub trait Storage: CoreIdStorage {}

impl<T: CoreIdStorage> Storage for T {}
