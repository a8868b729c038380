use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio::{fs, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

use models::record::{storage_key, Record};
use models::schema::EntityKind;

use crate::errors::ServiceError;
use crate::storage::Storage;

/// JSON snapshot-backed store.
///
/// The full object map is loaded into memory at construction; `save` rewrites
/// the whole snapshot. There is no concurrent-writer protection: two
/// processes saving to the same file race last-writer-wins.
#[derive(Clone)]
pub struct FileStore {
    inner: Arc<RwLock<HashMap<String, Record>>>,
    file_path: PathBuf,
}

impl FileStore {
    /// Initialize from a snapshot path. Creates the file with an empty map if
    /// missing; an unreadable snapshot starts empty rather than failing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let map: HashMap<String, Record> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(_) => {
                let empty: HashMap<String, Record> = HashMap::new();
                fs::write(
                    &file_path,
                    serde_json::to_vec(&empty).map_err(|e| ServiceError::Db(e.to_string()))?,
                )
                .await
                .map_err(|e| ServiceError::Db(e.to_string()))?;
                empty
            }
        };

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path }))
    }
}

#[async_trait]
impl Storage for FileStore {
    async fn all(
        &self,
        kind: Option<EntityKind>,
    ) -> Result<HashMap<String, Record>, ServiceError> {
        let map = self.inner.read().await;
        Ok(map
            .iter()
            .filter(|(_, rec)| kind.map_or(true, |k| rec.kind == k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn get(&self, kind: EntityKind, id: Uuid) -> Result<Option<Record>, ServiceError> {
        let map = self.inner.read().await;
        Ok(map.get(&storage_key(kind, id)).cloned())
    }

    async fn new(&self, record: Record) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        map.insert(record.storage_key(), record);
        Ok(())
    }

    async fn save(&self) -> Result<(), ServiceError> {
        let map = self.inner.read().await;
        let data = serde_json::to_vec(&*map).map_err(|e| ServiceError::Db(e.to_string()))?;
        fs::write(&self.file_path, data)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        debug!(objects = map.len(), path = %self.file_path.display(), "snapshot written");
        Ok(())
    }

    async fn delete(&self, record: &Record) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        map.remove(&record.storage_key());
        Ok(())
    }

    async fn count(&self, kind: Option<EntityKind>) -> Result<u64, ServiceError> {
        let map = self.inner.read().await;
        Ok(map.values().filter(|rec| kind.map_or(true, |k| rec.kind == k)).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state_record(name: &str) -> Record {
        let mut attrs = serde_json::Map::new();
        attrs.insert("name".into(), json!(name));
        Record::create(EntityKind::State, attrs)
    }

    fn temp_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("file_store_{}.json", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn crud_persists_across_reload() -> Result<(), anyhow::Error> {
        let tmp = temp_path();
        let store = FileStore::new(&tmp).await?;

        // initially empty
        assert_eq!(store.count(None).await?, 0);

        let rec = state_record("California");
        store.new(rec.clone()).await?;
        store.save().await?;

        let found = store.get(EntityKind::State, rec.id).await?.unwrap();
        assert_eq!(found.attr_str("name"), Some("California"));

        // reload from disk and check persistence
        let reloaded = FileStore::new(&tmp).await?;
        assert_eq!(reloaded.count(Some(EntityKind::State)).await?, 1);
        let found = reloaded.get(EntityKind::State, rec.id).await?.unwrap();
        assert_eq!(found.id, rec.id);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn new_is_visible_but_not_durable_until_save() -> Result<(), anyhow::Error> {
        let tmp = temp_path();
        let store = FileStore::new(&tmp).await?;

        let rec = state_record("Nevada");
        store.new(rec.clone()).await?;
        assert!(store.get(EntityKind::State, rec.id).await?.is_some());

        // nothing saved yet: a reload sees the empty snapshot
        let reloaded = FileStore::new(&tmp).await?;
        assert!(reloaded.get(EntityKind::State, rec.id).await?.is_none());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn delete_takes_effect_on_save() -> Result<(), anyhow::Error> {
        let tmp = temp_path();
        let store = FileStore::new(&tmp).await?;

        let rec = state_record("Oregon");
        store.new(rec.clone()).await?;
        store.save().await?;

        store.delete(&rec).await?;
        store.save().await?;
        assert!(store.get(EntityKind::State, rec.id).await?.is_none());

        let reloaded = FileStore::new(&tmp).await?;
        assert_eq!(reloaded.count(None).await?, 0);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn all_filters_by_kind_with_composite_keys() -> Result<(), anyhow::Error> {
        let tmp = temp_path();
        let store = FileStore::new(&tmp).await?;

        let s = state_record("Utah");
        let mut attrs = serde_json::Map::new();
        attrs.insert("name".into(), json!("Wifi"));
        let a = Record::create(EntityKind::Amenity, attrs);
        store.new(s.clone()).await?;
        store.new(a.clone()).await?;

        let everything = store.all(None).await?;
        assert_eq!(everything.len(), 2);
        assert!(everything.contains_key(&format!("State.{}", s.id)));
        assert!(everything.contains_key(&format!("Amenity.{}", a.id)));

        let states = store.all(Some(EntityKind::State)).await?;
        assert_eq!(states.len(), 1);
        assert_eq!(store.count(Some(EntityKind::Amenity)).await?, 1);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_snapshot_starts_empty() -> Result<(), anyhow::Error> {
        let tmp = temp_path();
        tokio::fs::write(&tmp, b"not json at all").await?;
        let store = FileStore::new(&tmp).await?;
        assert_eq!(store.count(None).await?, 0);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
