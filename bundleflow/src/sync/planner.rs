//! Sync planning: decide which bundles must be fetched.
//!
//! Planning is a pure function of the remote catalog and a snapshot of local
//! state. The decision order is fixed:
//!
//! 1. No local dependency manifest → fetch every bundle (cold start)
//! 2. Persisted version differs from the catalog version → fetch every bundle
//! 3. Otherwise → fetch bundles that are missing locally or whose
//!    recomputed hash differs from the catalog hash
//!
//! Rule 2 deliberately bypasses hash comparison: a version bump re-fetches
//! byte-identical bundles too.

use std::fmt;

use crate::catalog::Catalog;
use crate::local::LocalSyncState;

/// Why a plan contains what it contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanReason {
    /// No dependency manifest was available locally.
    ColdStart,
    /// The persisted version does not match the catalog.
    VersionChanged { local: u32, remote: u32 },
    /// Some bundles are missing or differ by hash.
    ContentDiff,
    /// Everything matches.
    UpToDate,
}

impl fmt::Display for PlanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanReason::ColdStart => write!(f, "no local manifest, fetching everything"),
            PlanReason::VersionChanged { local, remote } => write!(
                f,
                "local version {} differs from catalog version {}",
                local, remote
            ),
            PlanReason::ContentDiff => write!(f, "local bundles differ from catalog"),
            PlanReason::UpToDate => write!(f, "local bundles match catalog"),
        }
    }
}

/// Ordered list of bundle names to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    /// Catalog version the plan targets.
    pub version: u32,
    /// Bundle names in catalog order.
    pub bundles: Vec<String>,
    /// Which planning rule produced the plan.
    pub reason: PlanReason,
}

impl SyncPlan {
    /// Whether nothing needs fetching.
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Number of bundles to fetch.
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    /// Iterate bundle names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.bundles.iter().map(String::as_str)
    }
}

/// Compute the sync plan for `catalog` given local `state`.
///
/// When rule 3 applies but `state.cached_bundle_hashes` is `None`, the local
/// directory is treated as empty.
pub fn plan(catalog: &Catalog, state: &LocalSyncState) -> SyncPlan {
    let everything = || catalog.bundle_names().map(str::to_string).collect();

    if !state.manifest_available {
        return SyncPlan {
            version: catalog.version,
            bundles: everything(),
            reason: PlanReason::ColdStart,
        };
    }

    if state.persisted_version != catalog.version {
        return SyncPlan {
            version: catalog.version,
            bundles: everything(),
            reason: PlanReason::VersionChanged {
                local: state.persisted_version,
                remote: catalog.version,
            },
        };
    }

    let bundles: Vec<String> = catalog
        .entries()
        .filter(|entry| {
            let local_hash = state
                .cached_bundle_hashes
                .as_ref()
                .and_then(|hashes| hashes.get(&entry.name));
            local_hash != Some(&entry.content_hash)
        })
        .map(|entry| entry.name.clone())
        .collect();

    let reason = if bundles.is_empty() {
        PlanReason::UpToDate
    } else {
        PlanReason::ContentDiff
    };

    SyncPlan {
        version: catalog.version,
        bundles,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BundleEntry;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn catalog() -> Catalog {
        Catalog::new(1)
            .with_bundle(BundleEntry::new("a.bundle", "A", "h1", 1).with_asset("x"))
            .with_bundle(BundleEntry::new("b.bundle", "B", "h2", 1))
            .with_bundle(BundleEntry::new("c.bundle", "C", "h3", 1))
    }

    fn synced(version: u32, hashes: &[(&str, &str)]) -> LocalSyncState {
        LocalSyncState {
            manifest_available: true,
            persisted_version: version,
            cached_bundle_hashes: Some(
                hashes
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        }
    }

    #[test]
    fn test_cold_start_fetches_everything() {
        let plan = plan(&catalog(), &LocalSyncState::cold());

        assert_eq!(plan.bundles, vec!["a.bundle", "b.bundle", "c.bundle"]);
        assert_eq!(plan.reason, PlanReason::ColdStart);
    }

    #[test]
    fn test_missing_manifest_ignores_matching_hashes() {
        let mut state = synced(1, &[("a.bundle", "h1"), ("b.bundle", "h2"), ("c.bundle", "h3")]);
        state.manifest_available = false;

        assert_eq!(plan(&catalog(), &state).len(), 3);
    }

    #[test]
    fn test_version_change_fetches_everything() {
        let state = synced(0, &[("a.bundle", "h1"), ("b.bundle", "h2"), ("c.bundle", "h3")]);
        let plan = plan(&catalog(), &state);

        assert_eq!(plan.len(), 3);
        assert_eq!(plan.reason, PlanReason::VersionChanged { local: 0, remote: 1 });
    }

    #[test]
    fn test_matching_version_diffs_by_hash() {
        let state = synced(1, &[("a.bundle", "h1"), ("b.bundle", "stale")]);
        let plan = plan(&catalog(), &state);

        assert_eq!(plan.bundles, vec!["b.bundle", "c.bundle"]);
        assert_eq!(plan.reason, PlanReason::ContentDiff);
    }

    #[test]
    fn test_everything_matches() {
        let state = synced(1, &[("a.bundle", "h1"), ("b.bundle", "h2"), ("c.bundle", "h3")]);
        let plan = plan(&catalog(), &state);

        assert!(plan.is_empty());
        assert_eq!(plan.reason, PlanReason::UpToDate);
        assert_eq!(plan.version, 1);
    }

    #[test]
    fn test_uppercase_catalog_hash_matches_local_digest() {
        let catalog = Catalog::parse(
            r#"{"version":1,"bundles":{"a.bundle":{"name":"a.bundle","hash":"ABCDEF"}}}"#,
        )
        .unwrap();
        let state = synced(1, &[("a.bundle", "abcdef")]);

        assert!(plan(&catalog, &state).is_empty());
    }

    #[test]
    fn test_unhashed_state_treated_as_empty() {
        let state = LocalSyncState {
            manifest_available: true,
            persisted_version: 1,
            cached_bundle_hashes: None,
        };

        assert_eq!(plan(&catalog(), &state).len(), 3);
    }

    #[test]
    fn test_plan_is_idempotent() {
        let state = synced(1, &[("a.bundle", "h1")]);
        assert_eq!(plan(&catalog(), &state), plan(&catalog(), &state));
    }

    fn arb_catalog() -> impl Strategy<Value = Catalog> {
        (1u32..5, prop::collection::vec(("[a-e]", "[0-3]"), 0..8)).prop_map(|(version, entries)| {
            let mut catalog = Catalog::new(version);
            for (name, hash) in entries {
                catalog.insert(BundleEntry::new(format!("{}.bundle", name), "", hash, 0));
            }
            catalog
        })
    }

    proptest! {
        #[test]
        fn prop_version_mismatch_plans_every_bundle(
            catalog in arb_catalog(),
            local_version in 5u32..10,
        ) {
            let hashes: HashMap<String, String> = catalog
                .entries()
                .map(|e| (e.name.clone(), e.content_hash.clone()))
                .collect();
            let state = LocalSyncState {
                manifest_available: true,
                persisted_version: local_version,
                cached_bundle_hashes: Some(hashes),
            };

            let plan = plan(&catalog, &state);
            let expected: Vec<String> = catalog.bundle_names().map(str::to_string).collect();
            prop_assert_eq!(plan.bundles, expected);
        }

        #[test]
        fn prop_matching_version_plans_exactly_the_mismatches(
            catalog in arb_catalog(),
            local in prop::collection::hash_map("[a-e]\\.bundle", "[0-3]", 0..5),
        ) {
            let state = LocalSyncState {
                manifest_available: true,
                persisted_version: catalog.version,
                cached_bundle_hashes: Some(local.clone()),
            };

            let plan = plan(&catalog, &state);
            for entry in catalog.entries() {
                let stale = local.get(&entry.name) != Some(&entry.content_hash);
                prop_assert_eq!(plan.bundles.contains(&entry.name), stale);
            }
        }
    }
}
