//! Storage abstraction over pluggable persistence backends.
//!
//! Both backends satisfy identical semantics: `new`/`delete` stage changes,
//! `save` commits them durably, `get` with a missing id yields `None` rather
//! than an error. The backend is chosen once at startup and injected into
//! handlers as `Arc<dyn Storage>`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use models::record::Record;
use models::schema::EntityKind;

use crate::errors::ServiceError;

pub mod db_store;
pub mod file_store;

pub use db_store::DbStore;
pub use file_store::FileStore;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Every persisted record, keyed by composite key `"<Kind>.<id>"`,
    /// optionally filtered to one kind. Order is unspecified.
    async fn all(
        &self,
        kind: Option<EntityKind>,
    ) -> Result<HashMap<String, Record>, ServiceError>;

    /// The record of the given kind and id, or `None` when absent.
    async fn get(&self, kind: EntityKind, id: Uuid) -> Result<Option<Record>, ServiceError>;

    /// Register (or overwrite) a transient record; does not persist by itself.
    async fn new(&self, record: Record) -> Result<(), ServiceError>;

    /// Durably commit all staged registrations and deletions.
    async fn save(&self) -> Result<(), ServiceError>;

    /// Stage removal of a record; takes effect at the next `save`.
    async fn delete(&self, record: &Record) -> Result<(), ServiceError>;

    /// Number of persisted records, optionally filtered by kind.
    async fn count(&self, kind: Option<EntityKind>) -> Result<u64, ServiceError>;
}

/// Build the backend selected in the configuration.
pub async fn from_config(cfg: &configs::AppConfig) -> anyhow::Result<Arc<dyn Storage>> {
    match cfg.storage.backend {
        configs::StorageBackend::File => {
            let store = FileStore::new(&cfg.storage.file_path).await?;
            Ok(store as Arc<dyn Storage>)
        }
        configs::StorageBackend::Database => {
            let db = models::db::connect_with_config(&cfg.database).await?;
            Ok(DbStore::new(db) as Arc<dyn Storage>)
        }
    }
}
