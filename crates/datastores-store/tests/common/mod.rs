use datastores_core::model::BundleAssetConfig;
use datastores_core::stable_id::SequenceEntropy;
use datastores_core::{Collection, ElementPayload, IdAllocator, StableId};

/// Deterministic allocator handing out 1, 2, 3, ...
#[allow(dead_code)]
pub fn seq_allocator() -> IdAllocator {
    IdAllocator::new(Box::new(SequenceEntropy::new(1..=100_000)))
}

/// A packaged weapons collection: a folder holding a sword that bundles
/// `sword-mesh`
#[allow(dead_code)]
pub fn weapons_collection(ids: &mut IdAllocator) -> Collection {
    let mut weapons = Collection::create(ids, "Weapons", "WeaponCollection")
        .unwrap()
        .with_content_id("weapons-db")
        .with_runtime_supported(true);
    let blades = weapons
        .add_element(ids, "Blades", ElementPayload::folder(), StableId::INVALID)
        .unwrap();
    weapons
        .add_element(
            ids,
            "Sword",
            ElementPayload::item("Weapon")
                .with_asset(BundleAssetConfig::new("sword-mesh").with_label("melee")),
            blades,
        )
        .unwrap();
    weapons
}

#[allow(dead_code)]
pub const MANIFEST: &str = r#"
schema_version: 1
content:
  sword-mesh:
    size: 2048
    dependencies: [steel-tex]
  steel-tex:
    size: 4096
"#;
