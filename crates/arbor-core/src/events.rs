//! Watch-event state machine.
//!
//! Filesystem events arrive as one ordered stream of tagged variants and
//! are applied synchronously to the route table and build cache, so no
//! interleaving can reorder `add`/`change`/`unlink` for a path:
//!
//! - `Added` registers a route for files under the routing root. Nothing is
//!   built yet, so the cache is untouched.
//! - `Removed` drops the route and evicts the cache entry keyed by the
//!   file.
//! - `Changed` evicts the entry keyed by the file or, failing that, the
//!   entry that lists the file as a dependency. Routes are keyed by file
//!   identity, not content, so the table never changes; the next request
//!   rebuilds.

use crate::cache::BuildCache;
use crate::routes::{derive_route, Route, RouteTable};
use std::path::{Path, PathBuf};

/// A filesystem event, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Added(PathBuf),
    Changed(PathBuf),
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Added(p) | WatchEvent::Changed(p) | WatchEvent::Removed(p) => p,
        }
    }
}

/// What applying one event did, for logging and reload fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// A route was registered (or re-registered) for the added file.
    RouteAdded(Route),
    /// The file's route and/or cache entry were dropped.
    RouteRemoved {
        route: Option<Route>,
        cache_evicted: bool,
    },
    /// A cache entry was evicted; `key` names the owning source file,
    /// which is not necessarily the changed file.
    Evicted(PathBuf),
    /// Nothing cared about this path.
    NoEffect,
}

/// Apply one watch event to the route table and build cache.
pub fn apply_event(
    table: &mut RouteTable,
    cache: &mut BuildCache,
    root: &Path,
    event: &WatchEvent,
) -> EventOutcome {
    match event {
        WatchEvent::Added(path) => {
            if !path.starts_with(root) {
                return EventOutcome::NoEffect;
            }
            let route = derive_route(root, path);
            tracing::info!(url = %route.url, file = %route.relative_path, "route added");
            table.insert(route.clone());
            EventOutcome::RouteAdded(route)
        }
        WatchEvent::Removed(path) => {
            let route = table.remove_by_source(path);
            let cache_evicted = cache.delete(path).is_some();
            if route.is_none() && !cache_evicted {
                return EventOutcome::NoEffect;
            }
            tracing::info!(file = %path.display(), "file removed");
            EventOutcome::RouteRemoved {
                route,
                cache_evicted,
            }
        }
        WatchEvent::Changed(path) => {
            if cache.get(path).is_some() {
                cache.delete(path);
                tracing::info!(file = %path.display(), "cache entry evicted");
                return EventOutcome::Evicted(path.clone());
            }
            let owner = cache.find_by_dependency(path).map(|e| e.key.clone());
            match owner {
                Some(key) => {
                    cache.delete(&key);
                    tracing::info!(
                        dependency = %path.display(),
                        entry = %key.display(),
                        "cache entry evicted via dependency"
                    );
                    EventOutcome::Evicted(key)
                }
                None => EventOutcome::NoEffect,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ArtifactSet, CacheEntry};

    fn artifacts() -> ArtifactSet {
        ArtifactSet {
            ssr: "Index-ssr-aaaaaaaaaaaa.json".into(),
            dom: "Index-dom-bbbbbbbbbbbb.js".into(),
            iife: "Index-iife-cccccccccccc.js".into(),
        }
    }

    fn entry(key: &str, deps: &[&str]) -> CacheEntry {
        CacheEntry::new(
            PathBuf::from(key),
            artifacts(),
            deps.iter().map(PathBuf::from),
            key.trim_start_matches('/'),
        )
    }

    #[test]
    fn add_registers_a_route_without_touching_the_cache() {
        let mut table = RouteTable::new();
        let mut cache = BuildCache::new();
        let root = Path::new("/root/pages");

        let outcome = apply_event(
            &mut table,
            &mut cache,
            root,
            &WatchEvent::Added(PathBuf::from("/root/pages/Index.svelte")),
        );

        match outcome {
            EventOutcome::RouteAdded(route) => {
                assert_eq!(route.url, "/");
                assert_eq!(route.source_file, PathBuf::from("/root/pages/Index.svelte"));
            }
            other => panic!("expected RouteAdded, got {other:?}"),
        }
        assert_eq!(table.len(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn add_outside_the_root_is_ignored() {
        let mut table = RouteTable::new();
        let mut cache = BuildCache::new();

        let outcome = apply_event(
            &mut table,
            &mut cache,
            Path::new("/root/pages"),
            &WatchEvent::Added(PathBuf::from("/root/components/NavBar.svelte")),
        );

        assert_eq!(outcome, EventOutcome::NoEffect);
        assert!(table.is_empty());
    }

    #[test]
    fn unlink_drops_route_and_cache_entry() {
        let mut table = RouteTable::new();
        let mut cache = BuildCache::new();
        let root = Path::new("/root/pages");
        let file = PathBuf::from("/root/pages/About.svelte");

        apply_event(&mut table, &mut cache, root, &WatchEvent::Added(file.clone()));
        cache.set(entry("/root/pages/About.svelte", &[]));

        let outcome = apply_event(&mut table, &mut cache, root, &WatchEvent::Removed(file.clone()));
        match outcome {
            EventOutcome::RouteRemoved {
                route,
                cache_evicted,
            } => {
                assert_eq!(route.map(|r| r.url), Some("/about".to_string()));
                assert!(cache_evicted);
            }
            other => panic!("expected RouteRemoved, got {other:?}"),
        }
        assert!(table.is_empty());
        assert!(cache.get(&file).is_none());
    }

    #[test]
    fn change_on_a_cache_key_evicts_that_entry() {
        let mut table = RouteTable::new();
        let mut cache = BuildCache::new();
        cache.set(entry("/root/pages/Index.svelte", &[]));

        let outcome = apply_event(
            &mut table,
            &mut cache,
            Path::new("/root/pages"),
            &WatchEvent::Changed(PathBuf::from("/root/pages/Index.svelte")),
        );

        assert_eq!(
            outcome,
            EventOutcome::Evicted(PathBuf::from("/root/pages/Index.svelte"))
        );
        assert!(cache.is_empty());
        // the route table is untouched by change events
        assert!(table.is_empty());
    }

    #[test]
    fn change_on_a_dependency_evicts_the_owning_entry() {
        let mut table = RouteTable::new();
        let mut cache = BuildCache::new();
        cache.set(entry(
            "/root/pages/Index.svelte",
            &["/root/components/A.svelte", "/root/components/B.svelte"],
        ));

        let outcome = apply_event(
            &mut table,
            &mut cache,
            Path::new("/root/pages"),
            &WatchEvent::Changed(PathBuf::from("/root/components/B.svelte")),
        );

        assert_eq!(
            outcome,
            EventOutcome::Evicted(PathBuf::from("/root/pages/Index.svelte"))
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn change_on_an_unrelated_file_has_no_effect() {
        let mut table = RouteTable::new();
        let mut cache = BuildCache::new();
        cache.set(entry(
            "/root/pages/Index.svelte",
            &["/root/components/A.svelte", "/root/components/B.svelte"],
        ));

        let outcome = apply_event(
            &mut table,
            &mut cache,
            Path::new("/root/pages"),
            &WatchEvent::Changed(PathBuf::from("/root/components/C.svelte")),
        );

        assert_eq!(outcome, EventOutcome::NoEffect);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn events_for_one_path_apply_in_emission_order() {
        let mut table = RouteTable::new();
        let mut cache = BuildCache::new();
        let root = Path::new("/root/pages");
        let file = PathBuf::from("/root/pages/Index.svelte");

        apply_event(&mut table, &mut cache, root, &WatchEvent::Added(file.clone()));
        cache.set(entry("/root/pages/Index.svelte", &[]));
        apply_event(&mut table, &mut cache, root, &WatchEvent::Changed(file.clone()));
        apply_event(&mut table, &mut cache, root, &WatchEvent::Removed(file.clone()));

        assert!(table.is_empty());
        assert!(cache.is_empty());
    }
}
