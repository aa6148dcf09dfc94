//! Tree Configuration Types
//!
//! Named, persisted parameter presets. At most one configuration in a store
//! carries `is_default = true`; stores enforce that across the whole set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::params::{Network, TreeParameters};

/// Maximum length of a configuration name (characters)
pub const MAX_NAME_LEN: usize = 100;
/// Maximum length of a configuration description (characters)
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// A persisted configuration preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeConfiguration {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub canopy_depth: i64,
    pub max_depth: i64,
    pub max_buffer_size: i64,
    pub network: Network,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TreeConfiguration {
    /// Build a fresh record from a create payload
    pub fn from_new(new: NewTreeConfiguration) -> Self {
        let now = Utc::now();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name,
            description: new.description,
            canopy_depth: new.canopy_depth,
            max_depth: new.max_depth,
            max_buffer_size: new.max_buffer_size,
            network: new.network,
            is_default: new.is_default.unwrap_or(false),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn parameters(&self) -> TreeParameters {
        TreeParameters::new(
            self.canopy_depth,
            self.max_depth,
            self.max_buffer_size,
            self.network,
        )
    }

    /// Apply a partial update in place and bump `updated_at`
    ///
    /// The default flag is applied too; callers holding the whole set are
    /// responsible for demoting siblings when it becomes `true`.
    pub fn apply(&mut self, patch: &TreeConfigurationPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(canopy_depth) = patch.canopy_depth {
            self.canopy_depth = canopy_depth;
        }
        if let Some(max_depth) = patch.max_depth {
            self.max_depth = max_depth;
        }
        if let Some(max_buffer_size) = patch.max_buffer_size {
            self.max_buffer_size = max_buffer_size;
        }
        if let Some(network) = patch.network {
            self.network = network;
        }
        if let Some(is_default) = patch.is_default {
            self.is_default = is_default;
        }
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Create payload for a configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTreeConfiguration {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub canopy_depth: i64,
    pub max_depth: i64,
    pub max_buffer_size: i64,
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub is_default: Option<bool>,
}

impl NewTreeConfiguration {
    pub fn new(name: impl Into<String>, params: TreeParameters) -> Self {
        Self {
            name: name.into(),
            description: None,
            canopy_depth: params.canopy_depth,
            max_depth: params.max_depth,
            max_buffer_size: params.max_buffer_size,
            network: params.network,
            is_default: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = Some(true);
        self
    }

    pub fn parameters(&self) -> TreeParameters {
        TreeParameters::new(
            self.canopy_depth,
            self.max_depth,
            self.max_buffer_size,
            self.network,
        )
    }
}

/// Partial update payload; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeConfigurationPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub canopy_depth: Option<i64>,
    #[serde(default)]
    pub max_depth: Option<i64>,
    #[serde(default)]
    pub max_buffer_size: Option<i64>,
    #[serde(default)]
    pub network: Option<Network>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

impl TreeConfigurationPatch {
    /// True when the patch promotes its target to default
    pub fn promotes_default(&self) -> bool {
        self.is_default == Some(true)
    }
}
