//! SQLite Persistent Storage
//!
//! Provides durable storage for configuration presets and tree records that
//! survives service restarts. Uses connection pooling via r2d2 for concurrent
//! access.
//!
//! Default promotion runs inside one `IMMEDIATE` transaction, and a partial
//! unique index on `is_default` rejects any state with two defaults.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, types::Type, OptionalExtension, Transaction, TransactionBehavior};
use std::path::Path;

use super::traits::{ConfigurationStore, StorageError, StorageResult, TreeRecordStore};
use crate::types::{
    Network, NewTreeConfiguration, TreeConfiguration, TreeConfigurationPatch, TreeRecord,
    TreeStatus,
};
use crate::validation::validate_configuration;

fn db_err(e: rusqlite::Error) -> StorageError {
    StorageError::Database(e.to_string())
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn conversion_err(
    e: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, e.into())
}

fn parse_ts(row: &rusqlite::Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(conversion_err)
}

/// SQLite-backed configuration and tree record store with connection pooling
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    /// Create a new store with the given database path
    ///
    /// Creates the database file and runs migrations if needed.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations()?;

        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StorageError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations()?;

        Ok(store)
    }

    /// Get a connection from the pool
    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StorageError> {
        self.pool
            .get()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tree_configurations (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                canopy_depth INTEGER NOT NULL,
                max_depth INTEGER NOT NULL,
                max_buffer_size INTEGER NOT NULL,
                network TEXT NOT NULL,
                is_default INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_tree_configurations_single_default
                ON tree_configurations(is_default) WHERE is_default = 1;
            CREATE INDEX IF NOT EXISTS idx_tree_configurations_created_at
                ON tree_configurations(created_at);

            CREATE TABLE IF NOT EXISTS merkle_trees (
                id TEXT PRIMARY KEY,
                tree_address TEXT NOT NULL UNIQUE,
                network TEXT NOT NULL,
                canopy_depth INTEGER NOT NULL,
                max_depth INTEGER NOT NULL,
                max_buffer_size INTEGER NOT NULL,
                transaction_signature TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_merkle_trees_created_at ON merkle_trees(created_at);
            "#,
        )
        .map_err(db_err)?;

        Ok(())
    }

    /// Convert a database row to TreeConfiguration
    fn row_to_config(row: &rusqlite::Row) -> rusqlite::Result<TreeConfiguration> {
        let network: String = row.get("network")?;

        Ok(TreeConfiguration {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            canopy_depth: row.get("canopy_depth")?,
            max_depth: row.get("max_depth")?,
            max_buffer_size: row.get("max_buffer_size")?,
            network: network.parse::<Network>().map_err(conversion_err)?,
            is_default: row.get("is_default")?,
            created_at: parse_ts(row, "created_at")?,
            updated_at: parse_ts(row, "updated_at")?,
        })
    }

    /// Convert a database row to TreeRecord
    fn row_to_tree(row: &rusqlite::Row) -> rusqlite::Result<TreeRecord> {
        let network: String = row.get("network")?;
        let status: String = row.get("status")?;

        Ok(TreeRecord {
            id: row.get("id")?,
            tree_address: row.get("tree_address")?,
            network: network.parse::<Network>().map_err(conversion_err)?,
            canopy_depth: row.get("canopy_depth")?,
            max_depth: row.get("max_depth")?,
            max_buffer_size: row.get("max_buffer_size")?,
            transaction_signature: row.get("transaction_signature")?,
            status: status.parse::<TreeStatus>().map_err(conversion_err)?,
            created_at: parse_ts(row, "created_at")?,
        })
    }

    fn config_in_tx(tx: &Transaction, id: &str) -> Result<Option<TreeConfiguration>, StorageError> {
        tx.query_row(
            "SELECT * FROM tree_configurations WHERE id = ?1",
            params![id],
            |row| Self::row_to_config(row),
        )
        .optional()
        .map_err(db_err)
    }

    /// Clear every default flag except the one on `keep_id`
    fn demote_others(tx: &Transaction, keep_id: &str, now: &DateTime<Utc>) -> Result<(), StorageError> {
        tx.execute(
            "UPDATE tree_configurations SET is_default = 0, updated_at = ?1 WHERE is_default = 1 AND id != ?2",
            params![format_ts(now), keep_id],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn write_config(tx: &Transaction, config: &TreeConfiguration) -> Result<usize, StorageError> {
        tx.execute(
            r#"
            UPDATE tree_configurations SET
                name = ?2,
                description = ?3,
                canopy_depth = ?4,
                max_depth = ?5,
                max_buffer_size = ?6,
                network = ?7,
                is_default = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
            params![
                config.id,
                config.name,
                config.description,
                config.canopy_depth,
                config.max_depth,
                config.max_buffer_size,
                config.network.as_str(),
                config.is_default,
                format_ts(&config.updated_at),
            ],
        )
        .map_err(db_err)
    }

    // Synchronous helper methods for the trait implementations

    fn create_config_sync(&self, new: NewTreeConfiguration) -> Result<TreeConfiguration, StorageError> {
        let config = TreeConfiguration::from_new(new);
        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;

        if config.is_default {
            Self::demote_others(&tx, &config.id, &config.updated_at)?;
        }

        tx.execute(
            r#"
            INSERT INTO tree_configurations (
                id, name, description, canopy_depth, max_depth, max_buffer_size,
                network, is_default, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                config.id,
                config.name,
                config.description,
                config.canopy_depth,
                config.max_depth,
                config.max_buffer_size,
                config.network.as_str(),
                config.is_default,
                format_ts(&config.created_at),
                format_ts(&config.updated_at),
            ],
        )
        .map_err(|e| {
            if let rusqlite::Error::SqliteFailure(ref err, _) = e {
                if err.extended_code == 1555 {
                    return StorageError::Duplicate(config.id.clone());
                }
            }
            db_err(e)
        })?;

        tx.commit().map_err(db_err)?;
        Ok(config)
    }

    fn list_configs_sync(&self) -> Result<Vec<TreeConfiguration>, StorageError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT * FROM tree_configurations ORDER BY created_at ASC, rowid ASC")
            .map_err(db_err)?;

        let records = stmt
            .query_map([], |row| Self::row_to_config(row))
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        Ok(records)
    }

    fn get_config_sync(&self, id: &str) -> Result<Option<TreeConfiguration>, StorageError> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT * FROM tree_configurations WHERE id = ?1",
            params![id],
            |row| Self::row_to_config(row),
        )
        .optional()
        .map_err(db_err)
    }

    fn get_default_sync(&self) -> Result<Option<TreeConfiguration>, StorageError> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT * FROM tree_configurations WHERE is_default = 1",
            [],
            |row| Self::row_to_config(row),
        )
        .optional()
        .map_err(db_err)
    }

    fn update_config_sync(
        &self,
        id: &str,
        patch: &TreeConfigurationPatch,
    ) -> Result<TreeConfiguration, StorageError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;

        let mut config =
            Self::config_in_tx(&tx, id)?.ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        config.apply(patch);
        // Checked against the row read inside this transaction
        validate_configuration(&config)?;

        if patch.promotes_default() {
            Self::demote_others(&tx, id, &config.updated_at)?;
        }
        Self::write_config(&tx, &config)?;

        tx.commit().map_err(db_err)?;
        Ok(config)
    }

    fn delete_config_sync(&self, id: &str) -> Result<(), StorageError> {
        let conn = self.conn()?;

        let rows_affected = conn
            .execute("DELETE FROM tree_configurations WHERE id = ?1", params![id])
            .map_err(db_err)?;

        if rows_affected == 0 {
            return Err(StorageError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn set_default_sync(&self, id: &str) -> Result<TreeConfiguration, StorageError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;

        // Dropping the transaction on NotFound rolls back; nothing was written yet
        let mut config =
            Self::config_in_tx(&tx, id)?.ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        config.is_default = true;
        config.touch();

        Self::demote_others(&tx, id, &config.updated_at)?;
        Self::write_config(&tx, &config)?;

        tx.commit().map_err(db_err)?;
        Ok(config)
    }

    fn insert_tree_sync(&self, record: &TreeRecord) -> Result<(), StorageError> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO merkle_trees (
                id, tree_address, network, canopy_depth, max_depth, max_buffer_size,
                transaction_signature, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id,
                record.tree_address,
                record.network.as_str(),
                record.canopy_depth,
                record.max_depth,
                record.max_buffer_size,
                record.transaction_signature,
                record.status.to_string(),
                format_ts(&record.created_at),
            ],
        )
        .map_err(|e| {
            if let rusqlite::Error::SqliteFailure(ref err, _) = e {
                if err.extended_code == 1555 || err.extended_code == 2067 {
                    return StorageError::Duplicate(record.tree_address.clone());
                }
            }
            db_err(e)
        })?;

        Ok(())
    }

    fn list_trees_sync(&self) -> Result<Vec<TreeRecord>, StorageError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT * FROM merkle_trees ORDER BY created_at ASC, rowid ASC")
            .map_err(db_err)?;

        let records = stmt
            .query_map([], |row| Self::row_to_tree(row))
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        Ok(records)
    }

    fn get_tree_sync(&self, id: &str) -> Result<Option<TreeRecord>, StorageError> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT * FROM merkle_trees WHERE id = ?1",
            params![id],
            |row| Self::row_to_tree(row),
        )
        .optional()
        .map_err(db_err)
    }

    fn update_tree_status_sync(
        &self,
        id: &str,
        status: TreeStatus,
        transaction_signature: Option<&str>,
    ) -> Result<TreeRecord, StorageError> {
        let conn = self.conn()?;

        let rows_affected = conn
            .execute(
                r#"
            UPDATE merkle_trees SET
                status = ?2,
                transaction_signature = COALESCE(?3, transaction_signature)
            WHERE id = ?1
            "#,
                params![id, status.to_string(), transaction_signature],
            )
            .map_err(db_err)?;

        if rows_affected == 0 {
            return Err(StorageError::NotFound(id.to_string()));
        }

        self.get_tree_sync(id)?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    fn delete_tree_sync(&self, id: &str) -> Result<(), StorageError> {
        let conn = self.conn()?;

        let rows_affected = conn
            .execute("DELETE FROM merkle_trees WHERE id = ?1", params![id])
            .map_err(db_err)?;

        if rows_affected == 0 {
            return Err(StorageError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigurationStore for SqliteStore {
    async fn create(&self, new: NewTreeConfiguration) -> StorageResult<TreeConfiguration> {
        self.create_config_sync(new)
    }

    async fn list(&self) -> StorageResult<Vec<TreeConfiguration>> {
        self.list_configs_sync()
    }

    async fn get(&self, id: &str) -> StorageResult<Option<TreeConfiguration>> {
        self.get_config_sync(id)
    }

    async fn get_default(&self) -> StorageResult<Option<TreeConfiguration>> {
        self.get_default_sync()
    }

    async fn update(
        &self,
        id: &str,
        patch: TreeConfigurationPatch,
    ) -> StorageResult<TreeConfiguration> {
        self.update_config_sync(id, &patch)
    }

    async fn delete(&self, id: &str) -> StorageResult<()> {
        self.delete_config_sync(id)
    }

    async fn set_default(&self, id: &str) -> StorageResult<TreeConfiguration> {
        self.set_default_sync(id)
    }
}

#[async_trait]
impl TreeRecordStore for SqliteStore {
    async fn insert(&self, record: &TreeRecord) -> StorageResult<()> {
        self.insert_tree_sync(record)
    }

    async fn list(&self) -> StorageResult<Vec<TreeRecord>> {
        self.list_trees_sync()
    }

    async fn get(&self, id: &str) -> StorageResult<Option<TreeRecord>> {
        self.get_tree_sync(id)
    }

    async fn update_status(
        &self,
        id: &str,
        status: TreeStatus,
        transaction_signature: Option<String>,
    ) -> StorageResult<TreeRecord> {
        self.update_tree_status_sync(id, status, transaction_signature.as_deref())
    }

    async fn delete(&self, id: &str) -> StorageResult<()> {
        self.delete_tree_sync(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TreeParameters, ValidatedParameters};
    use std::sync::Arc;

    fn new_config(name: &str) -> NewTreeConfiguration {
        NewTreeConfiguration::new(name, TreeParameters::new(3, 14, 64, Network::MainnetBeta))
    }

    async fn default_count(store: &SqliteStore) -> usize {
        ConfigurationStore::list(store)
            .await
            .unwrap()
            .iter()
            .filter(|c| c.is_default)
            .count()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = SqliteStore::in_memory().unwrap();
        let created = store
            .create(new_config("a").with_description("first preset"))
            .await
            .unwrap();

        let retrieved = ConfigurationStore::get(&store, &created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(retrieved, created);
        assert_eq!(retrieved.network, Network::MainnetBeta);
    }

    #[tokio::test]
    async fn test_list_order() {
        let store = SqliteStore::in_memory().unwrap();
        store.create(new_config("first")).await.unwrap();
        store.create(new_config("second")).await.unwrap();

        let names: Vec<String> = ConfigurationStore::list(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_create_default_demotes_existing() {
        let store = SqliteStore::in_memory().unwrap();
        let a = store.create(new_config("a").as_default()).await.unwrap();
        let b = store.create(new_config("b").as_default()).await.unwrap();

        assert_eq!(default_count(&store).await, 1);
        assert_eq!(store.get_default().await.unwrap().unwrap().id, b.id);
        let a = ConfigurationStore::get(&store, &a.id).await.unwrap().unwrap();
        assert!(!a.is_default);
        assert!(a.updated_at >= a.created_at);
    }

    #[tokio::test]
    async fn test_set_default_switches() {
        let store = SqliteStore::in_memory().unwrap();
        store.create(new_config("a").as_default()).await.unwrap();
        let b = store.create(new_config("b")).await.unwrap();

        let promoted = store.set_default(&b.id).await.unwrap();

        assert!(promoted.is_default);
        assert_eq!(default_count(&store).await, 1);
        assert_eq!(store.get_default().await.unwrap().unwrap().id, b.id);
    }

    #[tokio::test]
    async fn test_set_default_unknown_rolls_back() {
        let store = SqliteStore::in_memory().unwrap();
        let a = store.create(new_config("a").as_default()).await.unwrap();

        let result = store.set_default("missing").await;

        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert_eq!(store.get_default().await.unwrap().unwrap().id, a.id);
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let store = SqliteStore::in_memory().unwrap();
        let a = store.create(new_config("a").as_default()).await.unwrap();
        let b = store.create(new_config("b")).await.unwrap();

        let patch = TreeConfigurationPatch {
            max_depth: Some(20),
            is_default: Some(true),
            ..Default::default()
        };
        let updated = store.update(&b.id, patch).await.unwrap();

        assert_eq!(updated.max_depth, 20);
        assert_eq!(updated.canopy_depth, 3);
        assert_eq!(store.get_default().await.unwrap().unwrap().id, b.id);
        assert!(!ConfigurationStore::get(&store, &a.id).await.unwrap().unwrap().is_default);
    }

    #[tokio::test]
    async fn test_update_invalid_merge_rolls_back() {
        let store = SqliteStore::in_memory().unwrap();
        let a = store.create(new_config("a").as_default()).await.unwrap();
        let b = store.create(new_config("b")).await.unwrap();

        let patch = TreeConfigurationPatch {
            max_depth: Some(2),
            is_default: Some(true),
            ..Default::default()
        };
        let result = store.update(&b.id, patch).await;
        assert!(matches!(result, Err(StorageError::Validation(_))));

        let stored = ConfigurationStore::get(&store, &b.id).await.unwrap().unwrap();
        assert_eq!(stored, b);
        assert_eq!(store.get_default().await.unwrap().unwrap().id, a.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_keep_canopy_within_depth() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::new(dir.path().join("configs.db")).unwrap());
        let created = store
            .create(NewTreeConfiguration::new(
                "shared",
                TreeParameters::new(5, 20, 64, Network::Devnet),
            ))
            .await
            .unwrap();

        let lower_depth = {
            let store = store.clone();
            let id = created.id.clone();
            tokio::spawn(async move {
                let patch = TreeConfigurationPatch {
                    max_depth: Some(8),
                    ..Default::default()
                };
                store.update(&id, patch).await
            })
        };
        let raise_canopy = {
            let store = store.clone();
            let id = created.id.clone();
            tokio::spawn(async move {
                let patch = TreeConfigurationPatch {
                    canopy_depth: Some(15),
                    ..Default::default()
                };
                store.update(&id, patch).await
            })
        };

        let first = lower_depth.await.unwrap();
        let second = raise_canopy.await.unwrap();
        assert!(first.is_ok() ^ second.is_ok());

        let stored = ConfigurationStore::get(store.as_ref(), &created.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.canopy_depth <= stored.max_depth);
    }

    #[tokio::test]
    async fn test_update_clearing_default() {
        let store = SqliteStore::in_memory().unwrap();
        let a = store.create(new_config("a").as_default()).await.unwrap();

        let patch = TreeConfigurationPatch {
            is_default: Some(false),
            ..Default::default()
        };
        store.update(&a.id, patch).await.unwrap();

        assert!(store.get_default().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_default_does_not_promote() {
        let store = SqliteStore::in_memory().unwrap();
        let a = store.create(new_config("a").as_default()).await.unwrap();
        store.create(new_config("b")).await.unwrap();

        ConfigurationStore::delete(&store, &a.id).await.unwrap();

        assert_eq!(default_count(&store).await, 0);
        assert!(matches!(
            ConfigurationStore::delete(&store, &a.id).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unique_index_rejects_second_default() {
        let store = SqliteStore::in_memory().unwrap();
        store.create(new_config("a").as_default()).await.unwrap();
        let b = store.create(new_config("b")).await.unwrap();

        let conn = store.conn().unwrap();
        let result = conn.execute(
            "UPDATE tree_configurations SET is_default = 1 WHERE id = ?1",
            params![b.id],
        );
        assert!(result.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_set_default_leaves_one() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::new(dir.path().join("configs.db")).unwrap());

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

        assert_eq!(default_count(&store).await, 1);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("soltree.db");

        let id = {
            let store = SqliteStore::new(&path).unwrap();
            store.create(new_config("kept").as_default()).await.unwrap().id
        };

        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(store.get_default().await.unwrap().unwrap().id, id);
    }

    #[tokio::test]
    async fn test_tree_records() {
        let store = SqliteStore::in_memory().unwrap();
        let params = ValidatedParameters::new_unchecked(2, 14, 64, Network::Devnet);
        let record = TreeRecord::new("Tree111".to_string(), &params);

        store.insert(&record).await.unwrap();
        assert_eq!(
            TreeRecordStore::get(&store, &record.id).await.unwrap().unwrap(),
            record
        );

        let mut duplicate = TreeRecord::new("Tree111".to_string(), &params);
        duplicate.id = "other".to_string();
        assert!(matches!(
            store.insert(&duplicate).await,
            Err(StorageError::Duplicate(_))
        ));

        let submitted = store
            .update_status(&record.id, TreeStatus::Submitted, Some("sig".to_string()))
            .await
            .unwrap();
        assert_eq!(submitted.transaction_signature.as_deref(), Some("sig"));

        let confirmed = store
            .update_status(&record.id, TreeStatus::Confirmed, None)
            .await
            .unwrap();
        assert_eq!(confirmed.status, TreeStatus::Confirmed);
        assert_eq!(confirmed.transaction_signature.as_deref(), Some("sig"));

        assert_eq!(TreeRecordStore::list(&store).await.unwrap().len(), 1);
        TreeRecordStore::delete(&store, &record.id).await.unwrap();
        assert!(matches!(
            store.update_status(&record.id, TreeStatus::Failed, None).await,
            Err(StorageError::NotFound(_))
        ));
    }
}
