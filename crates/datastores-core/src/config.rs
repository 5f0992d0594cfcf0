//! Reconciler configuration.
//!
//! Every field has a default, so an empty TOML document yields
//! [`ReconcilerConfig::default`]. Naming helpers live here because the
//! produced strings are a contract with the packaging backend.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{DatastoresError, Result};

pub const DEFAULT_GROUP_PREFIX: &str = "[DataCollections-Group] ";
pub const DEFAULT_OWNER_PREFIX: &str = "DataCollection";
pub const DEFAULT_BUNDLED_PREFIX: &str = "BundledAsset";
pub const DEFAULT_DEPENDENCY_PREFIX: &str = "Dependency";
pub const DEFAULT_GROUP_TEMPLATE: &str = "Packed Assets";
pub const DEFAULT_MAX_WALK_DEPTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Literal prefix marking a group as managed by the reconciler
    pub group_prefix: String,
    pub owner_prefix: String,
    /// Address prefix and kind label for directly bundled assets
    pub bundled_prefix: String,
    /// Address prefix and kind label for transitive dependencies
    pub dependency_prefix: String,
    /// Packaging template that must exist before anything is applied
    pub group_template: String,
    /// Dependencies strictly smaller than this (bytes) are inlined
    pub minimum_content_size: u64,
    pub max_walk_depth: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            group_prefix: DEFAULT_GROUP_PREFIX.to_string(),
            owner_prefix: DEFAULT_OWNER_PREFIX.to_string(),
            bundled_prefix: DEFAULT_BUNDLED_PREFIX.to_string(),
            dependency_prefix: DEFAULT_DEPENDENCY_PREFIX.to_string(),
            group_template: DEFAULT_GROUP_TEMPLATE.to_string(),
            minimum_content_size: 0,
            max_walk_depth: DEFAULT_MAX_WALK_DEPTH,
        }
    }
}

impl ReconcilerConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// `Config` if the document does not parse or fails [`Self::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ReconcilerConfig =
            toml::from_str(text).map_err(|e| DatastoresError::Config {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// `Config` when a prefix is blank or the walk depth is zero.
    pub fn validate(&self) -> Result<()> {
        let prefixes = [
            ("group_prefix", &self.group_prefix),
            ("owner_prefix", &self.owner_prefix),
            ("bundled_prefix", &self.bundled_prefix),
            ("dependency_prefix", &self.dependency_prefix),
        ];
        for (field, value) in prefixes {
            if value.trim().is_empty() {
                return Err(DatastoresError::Config {
                    reason: format!("{field} must not be blank"),
                });
            }
        }
        if self.bundled_prefix == self.dependency_prefix {
            return Err(DatastoresError::Config {
                reason: "bundled_prefix and dependency_prefix must differ".to_string(),
            });
        }
        if self.max_walk_depth == 0 {
            return Err(DatastoresError::Config {
                reason: "max_walk_depth must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// `collection_id` is a [`crate::StableId`] or its memoized display form
    pub fn group_name(&self, collection_id: impl fmt::Display, display_name: &str) -> String {
        format!("{}[{}] {}", self.group_prefix, collection_id, display_name)
    }

    pub fn is_managed_group(&self, name: &str) -> bool {
        name.starts_with(&self.group_prefix)
    }

    pub fn owner_address(&self, collection_id: impl fmt::Display) -> String {
        format!("{}/{}", self.owner_prefix, collection_id)
    }

    pub fn bundled_address(&self, content_id: &str) -> String {
        format!("{}/{}", self.bundled_prefix, content_id)
    }

    pub fn dependency_address(&self, content_id: &str) -> String {
        format!("{}/{}", self.dependency_prefix, content_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stable_id::StableId;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = ReconcilerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ReconcilerConfig::default());
        assert_eq!(config.group_template, "Packed Assets");
        assert_eq!(config.minimum_content_size, 0);
    }

    #[test]
    fn test_partial_override() {
        let config = ReconcilerConfig::from_toml_str(
            "minimum_content_size = 10000\ngroup_template = \"Custom\"\n",
        )
        .unwrap();
        assert_eq!(config.minimum_content_size, 10000);
        assert_eq!(config.group_template, "Custom");
        assert_eq!(config.group_prefix, DEFAULT_GROUP_PREFIX);
    }

    #[test]
    fn test_rejects_colliding_prefixes() {
        let err = ReconcilerConfig::from_toml_str(
            "bundled_prefix = \"Asset\"\ndependency_prefix = \"Asset\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, DatastoresError::Config { .. }));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = ReconcilerConfig::from_toml_str("max_walk_depth = \"deep\"").unwrap_err();
        assert!(matches!(err, DatastoresError::Config { .. }));
    }

    #[test]
    fn test_naming_conventions() {
        let config = ReconcilerConfig::default();
        let id = StableId::new(0);
        let encoded = id.encode();

        assert_eq!(
            config.group_name(id, "Weapons"),
            format!("[DataCollections-Group] [ID-{encoded}] Weapons")
        );
        assert!(config.is_managed_group(&config.group_name(id, "Weapons")));
        assert!(!config.is_managed_group("Default Local Group"));
        assert_eq!(config.owner_address(id), format!("DataCollection/ID-{encoded}"));
        assert_eq!(config.bundled_address("abc"), "BundledAsset/abc");
        assert_eq!(config.dependency_address("abc"), "Dependency/abc");
    }
}
