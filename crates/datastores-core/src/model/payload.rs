use serde::{Deserialize, Serialize};

/// Logical kind of an element, resolved once when the payload is built.
///
/// Consumers match on this tag instead of probing the payload's concrete type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogicalKind {
    /// The hidden sentinel at the top of every store
    Root,
    /// Organizational node with no bundled content of its own
    Folder,
    /// Authored content of a registered element type
    Item { type_name: String },
}

impl LogicalKind {
    pub fn item(type_name: impl Into<String>) -> Self {
        LogicalKind::Item {
            type_name: type_name.into(),
        }
    }

    /// Kind tag as used by the kind registry
    pub fn tag(&self) -> &str {
        match self {
            LogicalKind::Root => "root",
            LogicalKind::Folder => "folder",
            LogicalKind::Item { type_name } => type_name,
        }
    }
}

/// A direct asset reference an element wants bundled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleAssetConfig {
    pub content_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl BundleAssetConfig {
    pub fn new(content_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            labels: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }
}

/// Content carried by an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementPayload {
    #[serde(flatten)]
    pub kind: LogicalKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bundle_assets: Vec<BundleAssetConfig>,
}

impl ElementPayload {
    pub fn new(kind: LogicalKind) -> Self {
        Self {
            kind,
            description: String::new(),
            bundle_assets: Vec::new(),
        }
    }

    pub fn folder() -> Self {
        Self::new(LogicalKind::Folder)
    }

    pub fn item(type_name: impl Into<String>) -> Self {
        Self::new(LogicalKind::item(type_name))
    }

    pub(crate) fn root() -> Self {
        Self::new(LogicalKind::Root)
    }

    pub fn with_asset(mut self, asset: BundleAssetConfig) -> Self {
        self.bundle_assets.push(asset);
        self
    }

    /// Bundle assets with a non-empty content id
    pub fn assets_to_bundle(&self) -> impl Iterator<Item = &BundleAssetConfig> {
        self.bundle_assets
            .iter()
            .filter(|a| !a.content_id.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(LogicalKind::Folder.tag(), "folder");
        assert_eq!(LogicalKind::item("Weapon").tag(), "Weapon");
    }

    #[test]
    fn test_assets_to_bundle_skips_empty_ids() {
        let payload = ElementPayload::item("Weapon")
            .with_asset(BundleAssetConfig::new("guid-a"))
            .with_asset(BundleAssetConfig::new(""))
            .with_asset(BundleAssetConfig::new("  "));
        let ids: Vec<_> = payload
            .assets_to_bundle()
            .map(|a| a.content_id.as_str())
            .collect();
        assert_eq!(ids, vec!["guid-a"]);
    }

    #[test]
    fn test_payload_serde_flattens_kind() {
        let payload = ElementPayload::item("Weapon");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "item");
        assert_eq!(json["type_name"], "Weapon");
        let back: ElementPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }
}
