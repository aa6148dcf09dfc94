//! Configuration Preset Service
//!
//! Validates new presets before they reach a store, and maps store failures
//! (including a merged update the store rejected) onto [`ServiceError`].
//! Failures are logged and returned; nothing is retried here.

use std::sync::Arc;

use super::ServiceError;
use crate::common::logging::{log_configuration_event, log_validation_failure};
use crate::storage::{ConfigurationStore, StorageError};
use crate::types::{NewTreeConfiguration, TreeConfiguration, TreeConfigurationPatch};
use crate::validation::validate_new_configuration;

/// Preset management on top of any [`ConfigurationStore`]
#[derive(Clone)]
pub struct ConfigurationService {
    store: Arc<dyn ConfigurationStore>,
}

impl ConfigurationService {
    pub fn new(store: Arc<dyn ConfigurationStore>) -> Self {
        Self { store }
    }

    /// Validate and persist a new preset
    pub async fn create(
        &self,
        new: NewTreeConfiguration,
    ) -> Result<TreeConfiguration, ServiceError> {
        if let Err(e) = validate_new_configuration(&new) {
            log_validation_failure("configuration create rejected", &e);
            return Err(e.into());
        }

        match self.store.create(new).await {
            Ok(config) => {
                log_configuration_event("configuration_created", &config.id, config.is_default, None);
                Ok(config)
            }
            Err(e) => {
                log_configuration_event("configuration_create_failed", "-", false, Some(&e.to_string()));
                Err(e.into())
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<TreeConfiguration>, ServiceError> {
        Ok(self.store.list().await?)
    }

    /// Fetch one preset; unknown ids are `NotFound`
    pub async fn get(&self, id: &str) -> Result<TreeConfiguration, ServiceError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    /// The current default, or `None` when no preset is flagged
    pub async fn get_default(&self) -> Result<Option<TreeConfiguration>, ServiceError> {
        Ok(self.store.get_default().await?)
    }

    /// Merge a patch into an existing preset
    ///
    /// The store validates the merged record under the same lock or
    /// transaction as the write, so a patch that only lowers `maxDepth` fails
    /// when it drops below the canopy depth stored at that moment.
    pub async fn update(
        &self,
        id: &str,
        patch: TreeConfigurationPatch,
    ) -> Result<TreeConfiguration, ServiceError> {
        match self.store.update(id, patch).await {
            Ok(config) => {
                log_configuration_event("configuration_updated", &config.id, config.is_default, None);
                Ok(config)
            }
            Err(StorageError::Validation(e)) => {
                log_validation_failure("configuration update rejected", &e);
                Err(e.into())
            }
            Err(e) => {
                log_configuration_event("configuration_update_failed", id, false, Some(&e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Delete a preset; deleting the default leaves no default
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        match self.store.delete(id).await {
            Ok(()) => {
                log_configuration_event("configuration_deleted", id, false, None);
                Ok(())
            }
            Err(e) => {
                log_configuration_event("configuration_delete_failed", id, false, Some(&e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Make `id` the single default preset
    pub async fn set_default(&self, id: &str) -> Result<TreeConfiguration, ServiceError> {
        match self.store.set_default(id).await {
            Ok(config) => {
                log_configuration_event("default_configuration_set", &config.id, true, None);
                Ok(config)
            }
            Err(e) => {
                log_configuration_event("default_configuration_failed", id, false, Some(&e.to_string()));
                Err(e.into())
            }
        }
    }
}
