//! JSON File Storage
//!
//! Keyed local persistence for configuration presets: the whole set lives in
//! one JSON document. Every operation is a single critical section
//! (load, mutate, write and fsync a temp file, rename over the original,
//! fsync the directory), so the demote/promote pair is never observable
//! half-applied, even after a crash.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::memory::demote_others;
use super::traits::{ConfigurationStore, StorageError, StorageResult};
use crate::types::{NewTreeConfiguration, TreeConfiguration, TreeConfigurationPatch};
use crate::validation::validate_configuration;

/// Configuration store backed by a single JSON file
pub struct FileConfigurationStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileConfigurationStore {
    /// Open (or lazily create) a store at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StorageResult<Vec<TreeConfiguration>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| StorageError::InvalidData(e.to_string()))
    }

    async fn save(&self, configs: &[TreeConfiguration]) -> StorageResult<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);
        if let Some(parent) = &parent {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(configs)
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;

        // The rename itself is only durable once the directory entry is flushed
        let dir = parent.unwrap_or_else(|| PathBuf::from("."));
        if let Ok(dir) = tokio::fs::File::open(&dir).await {
            let _ = dir.sync_all().await;
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigurationStore for FileConfigurationStore {
    async fn create(&self, new: NewTreeConfiguration) -> StorageResult<TreeConfiguration> {
        let _guard = self.lock.lock().await;
        let mut configs = self.load().await?;

        let config = TreeConfiguration::from_new(new);
        if config.is_default {
            demote_others(&mut configs, &config.id);
        }
        configs.push(config.clone());

        self.save(&configs).await?;
        Ok(config)
    }

    async fn list(&self) -> StorageResult<Vec<TreeConfiguration>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn get(&self, id: &str) -> StorageResult<Option<TreeConfiguration>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_iter().find(|c| c.id == id))
    }

    async fn get_default(&self) -> StorageResult<Option<TreeConfiguration>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_iter().find(|c| c.is_default))
    }

    async fn update(
        &self,
        id: &str,
        patch: TreeConfigurationPatch,
    ) -> StorageResult<TreeConfiguration> {
        let _guard = self.lock.lock().await;
        let mut configs = self.load().await?;

        let index = configs
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        let mut merged = configs[index].clone();
        merged.apply(&patch);
        validate_configuration(&merged)?;

        if patch.promotes_default() {
            demote_others(&mut configs, id);
        }
        configs[index] = merged.clone();

        self.save(&configs).await?;
        Ok(merged)
    }

    async fn delete(&self, id: &str) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        let mut configs = self.load().await?;

        let before = configs.len();
        configs.retain(|c| c.id != id);
        if configs.len() == before {
            return Err(StorageError::NotFound(id.to_string()));
        }

        self.save(&configs).await
    }

    async fn set_default(&self, id: &str) -> StorageResult<TreeConfiguration> {
        let _guard = self.lock.lock().await;
        let mut configs = self.load().await?;

        // Nothing is written unless the target exists
        let index = configs
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        demote_others(&mut configs, id);
        configs[index].is_default = true;
        configs[index].touch();
        let promoted = configs[index].clone();

        self.save(&configs).await?;
        Ok(promoted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Network, TreeParameters};
    use std::sync::Arc;

    fn new_config(name: &str) -> NewTreeConfiguration {
        NewTreeConfiguration::new(name, TreeParameters::new(0, 10, 32, Network::Devnet))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigurationStore::new(dir.path().join("configs.json"));

        assert!(store.list().await.unwrap().is_empty());
        assert!(store.get_default().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("configs.json");

        let created = FileConfigurationStore::new(&path)
            .create(new_config("kept").as_default())
            .await
            .unwrap();

        let reopened = FileConfigurationStore::new(&path);
        assert_eq!(reopened.get(&created.id).await.unwrap().unwrap(), created);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_set_default_switches() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigurationStore::new(dir.path().join("configs.json"));

        let a = store.create(new_config("a").as_default()).await.unwrap();
        let b = store.create(new_config("b")).await.unwrap();
        store.set_default(&b.id).await.unwrap();

        let configs = store.list().await.unwrap();
        let defaults: Vec<&str> = configs
            .iter()
            .filter(|c| c.is_default)
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(defaults, vec![b.id.as_str()]);
        assert!(!store.get(&a.id).await.unwrap().unwrap().is_default);
    }

    #[tokio::test]
    async fn test_set_default_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigurationStore::new(dir.path().join("configs.json"));
        let a = store.create(new_config("a").as_default()).await.unwrap();

        assert!(matches!(
            store.set_default("missing").await,
            Err(StorageError::NotFound(_))
        ));
        assert_eq!(store.get_default().await.unwrap().unwrap().id, a.id);
    }

    #[tokio::test]
    async fn test_delete_default_does_not_promote() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigurationStore::new(dir.path().join("configs.json"));
        let a = store.create(new_config("a").as_default()).await.unwrap();
        store.create(new_config("b")).await.unwrap();

        store.delete(&a.id).await.unwrap();

        assert!(store.get_default().await.unwrap().is_none());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configs.json");
        let store = FileConfigurationStore::new(&path);
        let created = store.create(new_config("a")).await.unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let patch = TreeConfigurationPatch {
            canopy_depth: Some(11),
            ..Default::default()
        };
        assert!(matches!(
            store.update(&created.id, patch).await,
            Err(StorageError::Validation(_))
        ));

        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_keep_canopy_within_depth() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileConfigurationStore::new(dir.path().join("configs.json")));
        let created = store
            .create(NewTreeConfiguration::new(
                "shared",
                TreeParameters::new(5, 20, 64, Network::Devnet),
            ))
            .await
            .unwrap();

        let patches = [
            TreeConfigurationPatch {
                max_depth: Some(8),
                ..Default::default()
            },
            TreeConfigurationPatch {
                canopy_depth: Some(15),
                ..Default::default()
            },
        ];
        let mut handles = Vec::new();
        for patch in patches {
            let store = store.clone();
            let id = created.id.clone();
            handles.push(tokio::spawn(async move { store.update(&id, patch).await }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }
        assert_eq!(succeeded, 1);

        let stored = store.get(&created.id).await.unwrap().unwrap();
        assert!(stored.canopy_depth <= stored.max_depth);
    }

    #[tokio::test]
    async fn test_corrupt_file_reports_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configs.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileConfigurationStore::new(&path);
        assert!(matches!(
            store.list().await,
            Err(StorageError::InvalidData(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_set_default_leaves_one() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileConfigurationStore::new(dir.path().join("configs.json")));

        let mut ids = Vec::new();
        for i in 0..8 {
            ids.push(store.create(new_config(&format!("c{}", i))).await.unwrap().id);
        }

        let mut handles = Vec::new();
        for id in ids {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.set_default(&id).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let defaults = store
            .list()
            .await
            .unwrap()
            .iter()
            .filter(|c| c.is_default)
            .count();
        assert_eq!(defaults, 1);
    }
}
