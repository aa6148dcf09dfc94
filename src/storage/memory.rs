//! In-Memory Storage Implementations
//!
//! Provides in-memory storage for testing and development.
//! Data is lost when the service restarts.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::traits::{ConfigurationStore, StorageError, StorageResult, TreeRecordStore};
use crate::types::{
    NewTreeConfiguration, TreeConfiguration, TreeConfigurationPatch, TreeRecord, TreeStatus,
};
use crate::validation::validate_configuration;

/// Clear the default flag on every record except `keep_id`
pub(crate) fn demote_others(configs: &mut [TreeConfiguration], keep_id: &str) {
    for config in configs.iter_mut() {
        if config.id != keep_id && config.is_default {
            config.is_default = false;
            config.touch();
        }
    }
}

/// In-memory configuration store
///
/// All records live behind one `RwLock`, so a single write guard covers the
/// demote-all/promote-one sequence.
#[derive(Clone, Default)]
pub struct MemoryConfigurationStore {
    /// Records in insertion order
    records: Arc<RwLock<Vec<TreeConfiguration>>>,
}

impl MemoryConfigurationStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigurationStore for MemoryConfigurationStore {
    async fn create(&self, new: NewTreeConfiguration) -> StorageResult<TreeConfiguration> {
        let config = TreeConfiguration::from_new(new);
        let mut records = self.records.write().await;

        if config.is_default {
            demote_others(&mut records, &config.id);
        }
        records.push(config.clone());

        Ok(config)
    }

    async fn list(&self) -> StorageResult<Vec<TreeConfiguration>> {
        let records = self.records.read().await;
        Ok(records.clone())
    }

    async fn get(&self, id: &str) -> StorageResult<Option<TreeConfiguration>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|c| c.id == id).cloned())
    }

    async fn get_default(&self) -> StorageResult<Option<TreeConfiguration>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|c| c.is_default).cloned())
    }

    async fn update(
        &self,
        id: &str,
        patch: TreeConfigurationPatch,
    ) -> StorageResult<TreeConfiguration> {
        let mut records = self.records.write().await;

        let index = records
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        let mut merged = records[index].clone();
        merged.apply(&patch);
        validate_configuration(&merged)?;

        if patch.promotes_default() {
            demote_others(&mut records, id);
        }
        records[index] = merged.clone();

        Ok(merged)
    }

    async fn delete(&self, id: &str) -> StorageResult<()> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|c| c.id != id);

        if records.len() == before {
            return Err(StorageError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn set_default(&self, id: &str) -> StorageResult<TreeConfiguration> {
        let mut records = self.records.write().await;

        let index = records
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        demote_others(&mut records, id);
        let target = &mut records[index];
        target.is_default = true;
        target.touch();

        Ok(target.clone())
    }
}

/// In-memory tree record store
#[derive(Clone, Default)]
pub struct MemoryTreeRecordStore {
    records: Arc<RwLock<Vec<TreeRecord>>>,
}

impl MemoryTreeRecordStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TreeRecordStore for MemoryTreeRecordStore {
    async fn insert(&self, record: &TreeRecord) -> StorageResult<()> {
        let mut records = self.records.write().await;

        if records.iter().any(|r| r.id == record.id) {
            return Err(StorageError::Duplicate(format!("ID: {}", record.id)));
        }
        if records.iter().any(|r| r.tree_address == record.tree_address) {
            return Err(StorageError::Duplicate(format!(
                "tree address: {}",
                record.tree_address
            )));
        }

        records.push(record.clone());
        Ok(())
    }

    async fn list(&self) -> StorageResult<Vec<TreeRecord>> {
        let records = self.records.read().await;
        Ok(records.clone())
    }

    async fn get(&self, id: &str) -> StorageResult<Option<TreeRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn update_status(
        &self,
        id: &str,
        status: TreeStatus,
        transaction_signature: Option<String>,
    ) -> StorageResult<TreeRecord> {
        let mut records = self.records.write().await;

        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        record.status = status;
        if transaction_signature.is_some() {
            record.transaction_signature = transaction_signature;
        }

        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> StorageResult<()> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);

        if records.len() == before {
            return Err(StorageError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Network, TreeParameters, ValidatedParameters};

    fn new_config(name: &str) -> NewTreeConfiguration {
        NewTreeConfiguration::new(name, TreeParameters::new(3, 14, 64, Network::Devnet))
    }

    async fn default_ids(store: &MemoryConfigurationStore) -> Vec<String> {
        store
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.is_default)
            .map(|c| c.id)
            .collect()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryConfigurationStore::new();
        let created = store.create(new_config("a")).await.unwrap();

        let retrieved = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(retrieved, created);
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_preserves_creation_order() {
        let store = MemoryConfigurationStore::new();
        store.create(new_config("first")).await.unwrap();
        store.create(new_config("second")).await.unwrap();

        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_create_default_demotes_existing() {
        let store = MemoryConfigurationStore::new();
        let a = store.create(new_config("a").as_default()).await.unwrap();
        let b = store.create(new_config("b").as_default()).await.unwrap();

        assert_eq!(default_ids(&store).await, vec![b.id.clone()]);
        assert!(!store.get(&a.id).await.unwrap().unwrap().is_default);
    }

    #[tokio::test]
    async fn test_set_default_switches() {
        let store = MemoryConfigurationStore::new();
        let a = store.create(new_config("a").as_default()).await.unwrap();
        let b = store.create(new_config("b")).await.unwrap();

        let promoted = store.set_default(&b.id).await.unwrap();
        assert!(promoted.is_default);
        assert_eq!(default_ids(&store).await, vec![b.id]);
        assert!(!store.get(&a.id).await.unwrap().unwrap().is_default);
    }

    #[tokio::test]
    async fn test_set_default_unknown_keeps_previous() {
        let store = MemoryConfigurationStore::new();
        let a = store.create(new_config("a").as_default()).await.unwrap();

        let result = store.set_default("missing").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert_eq!(default_ids(&store).await, vec![a.id]);
    }

    #[tokio::test]
    async fn test_update_promoting_default() {
        let store = MemoryConfigurationStore::new();
        let a = store.create(new_config("a").as_default()).await.unwrap();
        let b = store.create(new_config("b")).await.unwrap();

        let patch = TreeConfigurationPatch {
            is_default: Some(true),
            name: Some("b2".to_string()),
            ..Default::default()
        };
        let updated = store.update(&b.id, patch).await.unwrap();

        assert_eq!(updated.name, "b2");
        assert_eq!(default_ids(&store).await, vec![b.id]);
        assert!(!store.get(&a.id).await.unwrap().unwrap().is_default);
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_merge() {
        let store = MemoryConfigurationStore::new();
        let a = store.create(new_config("a").as_default()).await.unwrap();
        let b = store.create(new_config("b")).await.unwrap();

        // canopy 15 exceeds the stored maxDepth of 14
        let patch = TreeConfigurationPatch {
            canopy_depth: Some(15),
            is_default: Some(true),
            ..Default::default()
        };
        let result = store.update(&b.id, patch).await;
        assert!(matches!(result, Err(StorageError::Validation(_))));

        let stored = store.get(&b.id).await.unwrap().unwrap();
        assert_eq!(stored, b);
        assert_eq!(default_ids(&store).await, vec![a.id]);
    }

    #[tokio::test]
    async fn test_concurrent_updates_keep_canopy_within_depth() {
        let store = MemoryConfigurationStore::new();
        let created = store
            .create(NewTreeConfiguration::new(
                "shared",
                TreeParameters::new(5, 20, 64, Network::Devnet),
            ))
            .await
            .unwrap();

        let lower_depth = TreeConfigurationPatch {
            max_depth: Some(8),
            ..Default::default()
        };
        let raise_canopy = TreeConfigurationPatch {
            canopy_depth: Some(15),
            ..Default::default()
        };

        let (first, second) = tokio::join!(
            store.update(&created.id, lower_depth),
            store.update(&created.id, raise_canopy)
        );
        assert!(first.is_ok() ^ second.is_ok());

        let stored = store.get(&created.id).await.unwrap().unwrap();
        assert!(stored.canopy_depth <= stored.max_depth);
    }

    #[tokio::test]
    async fn test_update_missing() {
        let store = MemoryConfigurationStore::new();
        let result = store.update("missing", TreeConfigurationPatch::default()).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_default_does_not_promote() {
        let store = MemoryConfigurationStore::new();
        let a = store.create(new_config("a").as_default()).await.unwrap();
        store.create(new_config("b")).await.unwrap();

        store.delete(&a.id).await.unwrap();

        assert!(default_ids(&store).await.is_empty());
        assert!(store.get_default().await.unwrap().is_none());
        assert!(matches!(store.delete(&a.id).await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_set_default_leaves_one() {
        let store = MemoryConfigurationStore::new();
        let mut ids = Vec::new();
        for i in 0..16 {
            ids.push(store.create(new_config(&format!("c{}", i))).await.unwrap().id);
        }

        let mut handles = Vec::new();
        for id in ids.clone() {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.set_default(&id).await }));
        }
        let reader = {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..64 {
                    let defaults = store
                        .list()
                        .await
                        .unwrap()
                        .iter()
                        .filter(|c| c.is_default)
                        .count();
                    assert!(defaults <= 1);
                    tokio::task::yield_now().await;
                }
            })
        };

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        reader.await.unwrap();

        assert_eq!(default_ids(&store).await.len(), 1);
    }

    #[tokio::test]
    async fn test_tree_records() {
        let store = MemoryTreeRecordStore::new();
        let params = ValidatedParameters::new_unchecked(0, 14, 64, Network::Devnet);
        let record = TreeRecord::new("Tree111".to_string(), &params);

        store.insert(&record).await.unwrap();

        let mut duplicate = TreeRecord::new("Tree111".to_string(), &params);
        duplicate.id = "other".to_string();
        assert!(matches!(
            store.insert(&duplicate).await,
            Err(StorageError::Duplicate(_))
        ));

        let updated = store
            .update_status(&record.id, TreeStatus::Submitted, Some("sig".to_string()))
            .await
            .unwrap();
        assert_eq!(updated.status, TreeStatus::Submitted);
        assert_eq!(updated.transaction_signature.as_deref(), Some("sig"));

        let confirmed = store
            .update_status(&record.id, TreeStatus::Confirmed, None)
            .await
            .unwrap();
        assert_eq!(confirmed.transaction_signature.as_deref(), Some("sig"));

        store.delete(&record.id).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }
}
