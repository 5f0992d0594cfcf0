use std::collections::BTreeSet;

use super::model::{DesiredAsset, DesiredGroup, DesiredState};
use crate::config::ReconcilerConfig;
use crate::deps::{AssetOrigin, ContentRef, DependencyCollector, DependencyGraph};
use crate::errors::DatastoresError;
use crate::model::Collection;
use crate::stable_id::{display_form, IdAllocator, StableId};

/// Compute the desired layout: one group per runtime-supported collection.
///
/// Each group holds the collection's owner asset, then every asset its
/// elements declare (elements visited depth-first in tree order), each
/// followed by its transitive dependencies. An asset shared between
/// collections lands in the group that reached it first and carries the ids
/// of every element that references it. Labels are finalized once the whole
/// pass has run, so later references are reflected on earlier members.
///
/// With `ids`, id text in names, addresses and labels comes from the
/// allocator's memo; the result is identical either way.
pub fn compute_desired_state(
    collections: &[Collection],
    graph: &dyn DependencyGraph,
    config: &ReconcilerConfig,
    ids: Option<&IdAllocator>,
) -> DesiredState {
    let mut collector = DependencyCollector::new(graph, config);
    if let Some(ids) = ids {
        collector = collector.with_ids(ids);
    }
    let mut names = BTreeSet::new();
    let mut pending: Vec<(String, StableId, Vec<ContentRef>)> = Vec::new();
    let mut issues = Vec::new();

    for collection in collections.iter().filter(|c| c.runtime_supported) {
        let name = config.group_name(
            display_form(ids, collection.id),
            &collection.display_name,
        );
        if !names.insert(name.clone()) {
            tracing::warn!(group = %name, "duplicate desired group; collection skipped");
            issues.push(DatastoresError::ReconcileConflict {
                name,
                reason: "another collection already maps to this group".to_string(),
            });
            continue;
        }

        let mut refs = collector.collect_owner_asset(collection);
        for id in collection.element_ids_preorder() {
            if let Ok(element) = collection.get_element(id) {
                refs.extend(collector.collect_bundle_assets(collection.id, element));
            }
        }
        pending.push((name, collection.id, refs));
    }

    let groups = pending
        .into_iter()
        .map(|(name, owner_id, refs)| {
            let members = refs
                .into_iter()
                .map(|r| {
                    let labels = collector
                        .labels_for(&r.content_id)
                        .cloned()
                        .unwrap_or(r.labels);
                    DesiredAsset {
                        address: address_for(config, ids, owner_id, r.origin, &r.content_id),
                        content_id: r.content_id,
                        labels,
                    }
                })
                .collect();
            DesiredGroup {
                name,
                owner_id: Some(owner_id),
                members,
            }
        })
        .collect();

    issues.extend(collector.into_issues());
    DesiredState { groups, issues }
}

fn address_for(
    config: &ReconcilerConfig,
    ids: Option<&IdAllocator>,
    owner_id: StableId,
    origin: AssetOrigin,
    content_id: &str,
) -> String {
    match origin {
        AssetOrigin::Owner => config.owner_address(display_form(ids, owner_id)),
        AssetOrigin::Bundled => config.bundled_address(content_id),
        AssetOrigin::Dependency => config.dependency_address(content_id),
    }
}
