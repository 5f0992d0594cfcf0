//! Element kind registry.
//!
//! Hosts register the element kinds they offer explicitly at startup, keyed
//! by a declared tag. The registry builds payloads for a tag; the core
//! algorithms never consult it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{DatastoresError, Result};
use crate::model::{ElementPayload, LogicalKind};

/// Tag of the built-in folder kind
pub const FOLDER_TAG: &str = "folder";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementKindDef {
    /// Stable key, e.g. `"weapon"`
    pub tag: String,
    pub display_name: String,
    /// Menu path used to list kinds, e.g. `"Items/Weapon"`
    pub create_path: String,
    /// Whether collections of this kind are packaged for runtime use
    #[serde(default)]
    pub runtime_supported: bool,
}

impl ElementKindDef {
    pub fn new(
        tag: impl Into<String>,
        display_name: impl Into<String>,
        create_path: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            display_name: display_name.into(),
            create_path: create_path.into(),
            runtime_supported: false,
        }
    }

    pub fn runtime_supported(mut self) -> Self {
        self.runtime_supported = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindRegistry {
    kinds: BTreeMap<String, ElementKindDef>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in folder kind
    pub fn with_builtin_kinds() -> Self {
        let mut registry = Self::new();
        registry
            .kinds
            .insert(FOLDER_TAG.to_string(), ElementKindDef::new(FOLDER_TAG, "Folder", "Folder"));
        registry
    }

    /// # Errors
    ///
    /// `Config` if the tag is blank or already registered.
    pub fn register(&mut self, def: ElementKindDef) -> Result<()> {
        if def.tag.trim().is_empty() {
            return Err(DatastoresError::Config {
                reason: "element kind tag must not be blank".to_string(),
            });
        }
        if self.kinds.contains_key(&def.tag) {
            return Err(DatastoresError::Config {
                reason: format!("element kind '{}' is already registered", def.tag),
            });
        }
        tracing::debug!(tag = %def.tag, "element kind registered");
        self.kinds.insert(def.tag.clone(), def);
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Option<&ElementKindDef> {
        self.kinds.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.kinds.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Kinds sorted by create path, then tag
    pub fn list(&self) -> Vec<&ElementKindDef> {
        let mut defs: Vec<&ElementKindDef> = self.kinds.values().collect();
        defs.sort_by(|a, b| {
            a.create_path
                .cmp(&b.create_path)
                .then_with(|| a.tag.cmp(&b.tag))
        });
        defs
    }

    /// Resolve a tag to a fresh payload of that kind.
    ///
    /// # Errors
    ///
    /// `Config` for unknown tags.
    pub fn payload_for(&self, tag: &str) -> Result<ElementPayload> {
        if tag == FOLDER_TAG && self.contains(FOLDER_TAG) {
            return Ok(ElementPayload::folder());
        }
        let def = self.get(tag).ok_or_else(|| DatastoresError::Config {
            reason: format!("unknown element kind '{tag}'"),
        })?;
        Ok(ElementPayload::new(LogicalKind::item(def.tag.clone())))
    }

    pub fn clear(&mut self) {
        self.kinds.clear();
    }
}
