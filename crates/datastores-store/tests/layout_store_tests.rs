#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::fs;

use common::{seq_allocator, weapons_collection, MANIFEST};
use datastores_core::bundle::{LayoutReader, PersistedEntry};
use datastores_core::{BundleReconciler, ReconcilerConfig};
use datastores_store::{FsLayoutStore, ManifestGraph};
use tempfile::TempDir;

#[test]
fn test_reconcile_through_file_store_persists_and_converges() {
    let dir = TempDir::new().unwrap();
    let manifest_path = dir.path().join("manifest.yaml");
    let layout_path = dir.path().join("layout.json");
    fs::write(&manifest_path, MANIFEST).unwrap();

    let config = ReconcilerConfig::default();
    let reconciler = BundleReconciler::new(config.clone());
    let mut ids = seq_allocator();
    let weapons = weapons_collection(&mut ids);
    let graph = ManifestGraph::load(&manifest_path).unwrap();

    let desired = reconciler.compute_desired_state(std::slice::from_ref(&weapons), &graph);
    assert_eq!(desired.member_count(), 3);

    let mut store = FsLayoutStore::open(&layout_path, &config.group_template).unwrap();
    let (report, residual) = reconciler.reconcile(&desired, &mut store).unwrap();
    assert!(report.is_complete());
    assert!(residual.is_converged());
    assert!(store.is_dirty());
    store.save().unwrap();

    let reopened = FsLayoutStore::open(&layout_path, &config.group_template).unwrap();
    assert_eq!(reopened.layout(), store.layout());
    assert!(reconciler.diff(&desired, &reopened).is_converged());

    let steel = reopened.find_asset_entry("steel-tex").unwrap();
    assert_eq!(steel.address, config.dependency_address("steel-tex"));
    assert_eq!(steel.group, config.group_name(weapons.id, "Weapons"));
}

#[test]
fn test_existing_layout_file_is_loaded_verbatim() {
    let dir = TempDir::new().unwrap();
    let layout_path = dir.path().join("layout.json");
    fs::write(
        &layout_path,
        r#"{
  "templates": ["Packed Assets"],
  "groups": { "Default Local Group": { "template": "Packed Assets" } },
  "entries": {
    "logo": { "content_id": "logo", "address": "ui/logo", "group": "Default Local Group" }
  }
}"#,
    )
    .unwrap();

    let store = FsLayoutStore::open(&layout_path, "Ignored When File Exists").unwrap();
    assert!(store.has_template("Packed Assets"));
    assert!(!store.has_template("Ignored When File Exists"));
    assert_eq!(
        store.find_asset_entry("logo"),
        Some(PersistedEntry::new("logo", "ui/logo", "Default Local Group"))
    );
}

#[test]
fn test_malformed_layout_file_is_serialization_error() {
    let dir = TempDir::new().unwrap();
    let layout_path = dir.path().join("layout.json");
    fs::write(&layout_path, "[1, 2, 3]").unwrap();

    let err = FsLayoutStore::open(&layout_path, "Packed Assets").unwrap_err();
    assert_eq!(err.code(), "ERR_SERIALIZATION");
    assert_eq!(err.op(), Some("load_layout"));
}
