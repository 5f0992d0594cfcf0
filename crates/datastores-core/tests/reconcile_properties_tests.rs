#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeSet;

use datastores_core::bundle::{
    DesiredAsset, DesiredGroup, InMemoryLayout, LayoutReader, PersistedEntry,
};
use datastores_core::config::DEFAULT_GROUP_TEMPLATE;
use datastores_core::{BundleReconciler, DesiredState, ReconcilerConfig};
use proptest::prelude::*;

const CONTENT_COUNT: usize = 12;
const GROUP_COUNT: usize = 4;
const LABEL_POOL: [&str; 3] = ["a", "b", "c"];

fn managed(index: usize) -> String {
    format!("{}g{index}", ReconcilerConfig::default().group_prefix)
}

fn label_set(mask: u8) -> BTreeSet<String> {
    LABEL_POOL
        .iter()
        .enumerate()
        .filter(|(bit, _)| mask & (1 << bit) != 0)
        .map(|(_, l)| l.to_string())
        .collect()
}

/// Each content id goes to one desired group (or none)
fn desired_strategy() -> impl Strategy<Value = DesiredState> {
    prop::collection::vec(
        (prop::option::of(0..GROUP_COUNT), 0u8..8, any::<bool>()),
        CONTENT_COUNT,
    )
    .prop_map(|slots| {
        let mut groups: Vec<DesiredGroup> = (0..GROUP_COUNT)
            .map(|g| DesiredGroup::new(managed(g), None))
            .collect();
        for (index, (group, mask, alt_address)) in slots.into_iter().enumerate() {
            let Some(group) = group else { continue };
            let address = if alt_address {
                format!("alt/{index}")
            } else {
                format!("asset/{index}")
            };
            groups[group].members.push(DesiredAsset {
                content_id: format!("c{index}"),
                address,
                labels: label_set(mask),
            });
        }
        groups.retain(|g| !g.members.is_empty());
        DesiredState {
            groups,
            issues: Vec::new(),
        }
    })
}

/// Persisted entries spread over managed groups (some never desired) and one
/// unmanaged group
fn actual_strategy() -> impl Strategy<Value = InMemoryLayout> {
    prop::collection::vec(
        prop::option::of((0..GROUP_COUNT + 3, 0u8..8, any::<bool>())),
        CONTENT_COUNT,
    )
    .prop_map(|slots| {
        let mut layout = InMemoryLayout::new().with_template(DEFAULT_GROUP_TEMPLATE);
        for (index, slot) in slots.into_iter().enumerate() {
            let Some((group, mask, alt_address)) = slot else { continue };
            let group = if group == GROUP_COUNT + 2 {
                "Default Local Group".to_string()
            } else {
                managed(group)
            };
            let address = if alt_address {
                format!("alt/{index}")
            } else {
                format!("asset/{index}")
            };
            layout = layout.with_entry(
                PersistedEntry::new(format!("c{index}"), address, group)
                    .with_labels(label_set(mask)),
            );
        }
        layout
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_apply_then_diff_is_converged(
        desired in desired_strategy(),
        actual in actual_strategy(),
    ) {
        let reconciler = BundleReconciler::default();
        let mut layout = actual;

        let plan = reconciler.diff(&desired, &layout);
        let report = reconciler.apply(&plan, &mut layout).unwrap();
        prop_assert!(report.is_complete());

        let residual = reconciler.diff(&desired, &layout);
        prop_assert!(residual.is_converged(), "residual: {:?}", residual.actions);

        for group in &desired.groups {
            for member in &group.members {
                let entry = layout.find_asset_entry(&member.content_id).unwrap();
                prop_assert_eq!(&entry.group, &group.name);
                prop_assert_eq!(&entry.address, &member.address);
                prop_assert_eq!(&entry.labels, &member.labels);
            }
        }
    }

    #[test]
    fn prop_diff_is_pure_and_deterministic(
        desired in desired_strategy(),
        actual in actual_strategy(),
    ) {
        let reconciler = BundleReconciler::default();
        let before = actual.clone();

        let first = reconciler.diff(&desired, &actual);
        let second = reconciler.diff(&desired, &actual);
        prop_assert_eq!(first, second);
        prop_assert_eq!(actual, before);
    }

    #[test]
    fn prop_one_action_per_desired_asset(
        desired in desired_strategy(),
        actual in actual_strategy(),
    ) {
        let plan = BundleReconciler::default().diff(&desired, &actual);
        for content_id in desired.content_ids() {
            prop_assert!(plan.actions_for(content_id).len() <= 1);
        }
    }

    #[test]
    fn prop_unmanaged_entries_survive(
        desired in desired_strategy(),
        actual in actual_strategy(),
    ) {
        let reconciler = BundleReconciler::default();
        let wanted: BTreeSet<String> =
            desired.content_ids().into_iter().map(str::to_string).collect();
        let untouched: Vec<PersistedEntry> = actual
            .group_entries("Default Local Group")
            .into_iter()
            .filter(|e| !wanted.contains(&e.content_id))
            .collect();

        let mut layout = actual;
        let plan = reconciler.diff(&desired, &layout);
        reconciler.apply(&plan, &mut layout).unwrap();

        for entry in untouched {
            prop_assert_eq!(layout.find_asset_entry(&entry.content_id), Some(entry));
        }
    }
}
