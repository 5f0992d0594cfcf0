#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::collections::BTreeSet;

use common::{packaged_collection, seq_allocator};
use datastores_core::bundle::{
    render_plan_summary, ActionOp, DesiredAsset, DesiredGroup, InMemoryLayout, LayoutReader,
    PersistedEntry,
};
use datastores_core::config::DEFAULT_GROUP_TEMPLATE;
use datastores_core::deps::InMemoryGraph;
use datastores_core::model::BundleAssetConfig;
use datastores_core::{
    BundleReconciler, DatastoresError, DesiredState, ElementPayload, ReconcileAction,
    ReconcilerConfig, StableId,
};

const G: &str = "[DataCollections-Group] G";
const G1: &str = "[DataCollections-Group] G1";
const G2: &str = "[DataCollections-Group] G2";

fn labels(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn single_group(name: &str, content_id: &str, address: &str, tags: &[&str]) -> DesiredState {
    let mut group = DesiredGroup::new(name, None);
    group.members.push(DesiredAsset {
        content_id: content_id.to_string(),
        address: address.to_string(),
        labels: labels(tags),
    });
    DesiredState {
        groups: vec![group],
        issues: Vec::new(),
    }
}

#[test]
fn test_absent_asset_in_existing_group_is_added() {
    let reconciler = BundleReconciler::default();
    let desired = single_group(G, "x", "n1", &["G"]);
    let actual = InMemoryLayout::new().with_group(G);

    let plan = reconciler.diff(&desired, &actual);
    assert_eq!(
        plan.actions,
        vec![ReconcileAction::AddAsset {
            content_id: "x".to_string(),
            address: "n1".to_string(),
            group: G.to_string(),
            labels: labels(&["G"]),
        }]
    );
}

#[test]
fn test_group_change_is_move_not_rename() {
    let reconciler = BundleReconciler::default();
    let mut desired = single_group(G2, "y", "old", &["a"]);
    desired.groups.insert(0, DesiredGroup::new(G1, None));
    let actual = InMemoryLayout::new()
        .with_group(G2)
        .with_entry(PersistedEntry::new("y", "old", G1).with_labels(["a"]));

    let plan = reconciler.diff(&desired, &actual);
    assert_eq!(
        plan.actions,
        vec![ReconcileAction::MoveAsset {
            content_id: "y".to_string(),
            address: "old".to_string(),
            from_group: G1.to_string(),
            group: G2.to_string(),
            labels: labels(&["a"]),
        }]
    );
}

#[test]
fn test_address_change_wins_over_group_change() {
    let reconciler = BundleReconciler::default();
    let desired = single_group(G2, "y", "new", &["a"]);
    let actual = InMemoryLayout::new()
        .with_group(G2)
        .with_group(G1)
        .with_entry(PersistedEntry::new("y", "old", G1).with_labels(["a"]));

    let plan = reconciler.diff(&desired, &actual);
    let ops: Vec<ActionOp> = plan.actions.iter().map(|a| a.op()).collect();
    // G1 is managed and no longer desired
    assert_eq!(ops, vec![ActionOp::Remove, ActionOp::Rename]);
    assert!(matches!(
        &plan.actions[1],
        ReconcileAction::RenameAsset { from_address, .. } if from_address == "old"
    ));
}

#[test]
fn test_unmanaged_groups_are_left_alone() {
    let reconciler = BundleReconciler::default();
    let desired = DesiredState::default();
    let actual = InMemoryLayout::new()
        .with_entry(PersistedEntry::new("keep", "keep", "Default Local Group"))
        .with_group(G);

    let plan = reconciler.diff(&desired, &actual);
    assert_eq!(
        plan.actions,
        vec![ReconcileAction::RemoveGroup {
            group: G.to_string()
        }]
    );
}

#[test]
fn test_full_pipeline_converges() {
    let mut ids = seq_allocator();
    let config = ReconcilerConfig::default();
    let reconciler = BundleReconciler::new(config.clone());

    let mut weapons = packaged_collection(&mut ids, "Weapons", "WeaponCollection", "weapons-db");
    let folder = weapons
        .add_element(&mut ids, "Blades", ElementPayload::folder(), StableId::INVALID)
        .unwrap();
    let sword = weapons
        .add_element(
            &mut ids,
            "Sword",
            ElementPayload::item("Weapon")
                .with_asset(BundleAssetConfig::new("sword-mesh").with_label("melee")),
            folder,
        )
        .unwrap();

    let mut armor = packaged_collection(&mut ids, "Armor", "ArmorCollection", "armor-db");
    let shield = armor
        .add_element(
            &mut ids,
            "Shield",
            ElementPayload::item("Armor").with_asset(BundleAssetConfig::new("shield-mesh")),
            StableId::INVALID,
        )
        .unwrap();

    let graph = InMemoryGraph::new()
        .with_content("sword-mesh", 100, &["steel-tex"])
        .with_content("shield-mesh", 100, &["steel-tex"])
        .with_content("steel-tex", 100, &[]);

    let desired = reconciler.compute_desired_state(&[weapons.clone(), armor.clone()], &graph);
    assert!(desired.issues.is_empty());
    assert_eq!(desired.groups.len(), 2);
    assert_eq!(desired.member_count(), 5);

    // Shared dependency lands in the first group and names both referrers
    let weapons_group = desired
        .group(&config.group_name(weapons.id, "Weapons"))
        .unwrap();
    let steel = weapons_group.member("steel-tex").unwrap();
    assert_eq!(steel.address, config.dependency_address("steel-tex"));
    assert!(steel.labels.contains(&sword.to_string()));
    assert!(steel.labels.contains(&shield.to_string()));
    let armor_group = desired.group(&config.group_name(armor.id, "Armor")).unwrap();
    assert!(armor_group.member("steel-tex").is_none());

    let stale = config.group_name(StableId::new(99_999), "Gone");
    let mut layout = InMemoryLayout::new()
        .with_template(DEFAULT_GROUP_TEMPLATE)
        .with_entry(PersistedEntry::new("sword-mesh", "Sword", &stale))
        .with_entry(PersistedEntry::new("orphan", "orphan", &stale));

    let (report, residual) = reconciler.reconcile(&desired, &mut layout).unwrap();
    assert!(report.is_complete());
    assert!(residual.is_converged());
    assert_eq!(layout.group_count(), 2);
    assert_eq!(layout.entry_count(), 5);
    assert!(layout.find_asset_entry("orphan").is_none());

    let sword_entry = layout.find_asset_entry("sword-mesh").unwrap();
    assert_eq!(sword_entry.group, config.group_name(weapons.id, "Weapons"));
    assert_eq!(sword_entry.address, config.bundled_address("sword-mesh"));
    assert!(sword_entry.labels.contains("melee"));
}

#[test]
fn test_missing_template_applies_nothing() {
    let reconciler = BundleReconciler::default();
    let desired = single_group(G, "x", "n1", &[]);
    let mut layout = InMemoryLayout::new();
    let before = layout.clone();

    let plan = reconciler.diff(&desired, &layout);
    let err = reconciler.apply(&plan, &mut layout).unwrap_err();
    assert!(matches!(err, DatastoresError::ReconcileConflict { .. }));
    assert_eq!(layout, before);
}

#[test]
fn test_desired_state_digest_is_stable_across_runs() {
    let mut ids = seq_allocator();
    let mut collection = packaged_collection(&mut ids, "Weapons", "WeaponCollection", "db");
    collection
        .add_element(
            &mut ids,
            "Sword",
            ElementPayload::item("Weapon").with_asset(BundleAssetConfig::new("sword-mesh")),
            StableId::INVALID,
        )
        .unwrap();
    let graph = InMemoryGraph::new().with_content("sword-mesh", 10, &[]);
    let reconciler = BundleReconciler::default();

    let first = reconciler.compute_desired_state(std::slice::from_ref(&collection), &graph);
    let second = reconciler.compute_desired_state(std::slice::from_ref(&collection), &graph);
    assert_eq!(first, second);
    assert_eq!(first.digest(), second.digest());
}

#[test]
fn test_summary_lists_every_action() {
    let reconciler = BundleReconciler::default();
    let desired = single_group(G, "x", "n1", &["G"]);
    let plan = reconciler.diff(&desired, &InMemoryLayout::new());

    let summary = render_plan_summary(&plan);
    assert!(summary.starts_with("## Bundle Reconcile Plan"));
    assert!(summary.contains("**Actions**: 2 (add 2,"));
    assert!(summary.contains(&format!("Create group `{G}`")));
    assert!(summary.contains("Add asset `n1`"));
}
