//! End-to-end engine behavior: routes registered from watch events, builds
//! coordinated across concurrent requesters, and cache eviction driving
//! rebuilds.

use arbor_core::{
    apply_event, derive_route, ArtifactStore, BuildCache, BuildCoordinator, Bundler, CompileMode,
    CompileOptions, CompileOutput, Compiler, EventOutcome, RouteTable, WatchEvent,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Compiler double: counts invocations, optionally fails, and holds each
/// invocation open long enough for concurrent requesters to pile up.
struct SlowCompiler {
    calls: AtomicUsize,
    delay: Duration,
    fail: bool,
}

impl SlowCompiler {
    fn new(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
            fail: false,
        }
    }

    fn failing(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
            fail: true,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Compiler for SlowCompiler {
    async fn compile(
        &self,
        entry: &Path,
        mode: CompileMode,
        _options: &CompileOptions,
    ) -> anyhow::Result<CompileOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            anyhow::bail!("unexpected token in Index.svelte");
        }
        let code = match mode {
            CompileMode::Ssr => r#"{"head":"","css":"","html":"<h1>hi</h1>"}"#.to_string(),
            CompileMode::Dom => "export default class {}".to_string(),
            CompileMode::Iife => "var Index = (function () {})();".to_string(),
        };
        Ok(CompileOutput {
            code,
            watch_files: match mode {
                CompileMode::Dom => vec![
                    entry.to_path_buf(),
                    PathBuf::from("/root/pages/Index.svelte"),
                    PathBuf::from("/root/components/NavBar.svelte"),
                ],
                _ => vec![],
            },
        })
    }
}

fn coordinator(compiler: Arc<SlowCompiler>) -> (Arc<BuildCoordinator>, Arc<RwLock<BuildCache>>) {
    let cache = Arc::new(RwLock::new(BuildCache::new()));
    let bundler = Bundler::new(
        compiler,
        ArtifactStore::new(),
        CompileOptions::new(false, BTreeMap::new()),
    );
    (
        Arc::new(BuildCoordinator::new(bundler, cache.clone())),
        cache,
    )
}

#[tokio::test]
async fn watch_add_registers_route_and_first_request_builds() {
    let root = Path::new("/root/pages");
    let mut table = RouteTable::new();
    let compiler = Arc::new(SlowCompiler::new(Duration::ZERO));
    let (coordinator, cache) = coordinator(compiler.clone());

    {
        let mut cache = cache.write();
        let outcome = apply_event(
            &mut table,
            &mut cache,
            root,
            &WatchEvent::Added(PathBuf::from("/root/pages/Index.svelte")),
        );
        assert!(matches!(outcome, EventOutcome::RouteAdded(_)));
    }

    let route = table.match_url("/").expect("route for /").clone();
    let entry = coordinator.get_or_build(&route).await.expect("build");

    assert_eq!(compiler.calls(), 3);
    assert!(coordinator.store().contains(&entry.artifacts.dom));
    assert!(cache.read().get(&route.source_file).is_some());
}

#[tokio::test]
async fn concurrent_requests_share_one_build() {
    let compiler = Arc::new(SlowCompiler::new(Duration::from_millis(25)));
    let (coordinator, _cache) = coordinator(compiler.clone());
    let route = derive_route(
        Path::new("/root/pages"),
        Path::new("/root/pages/Index.svelte"),
    );

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let coordinator = coordinator.clone();
        let route = route.clone();
        tasks.push(tokio::spawn(
            async move { coordinator.get_or_build(&route).await },
        ));
    }

    let mut entries = Vec::new();
    for task in tasks {
        entries.push(task.await.expect("task").expect("build"));
    }

    // one build: three compiler passes total, identical artifacts for all
    assert_eq!(compiler.calls(), 3);
    for entry in &entries[1..] {
        assert_eq!(entry.artifacts, entries[0].artifacts);
    }
}

#[tokio::test]
async fn a_failed_build_reaches_every_waiter_and_caches_nothing() {
    let compiler = Arc::new(SlowCompiler::failing(Duration::from_millis(25)));
    let (coordinator, cache) = coordinator(compiler.clone());
    let route = derive_route(
        Path::new("/root/pages"),
        Path::new("/root/pages/Index.svelte"),
    );

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let coordinator = coordinator.clone();
        let route = route.clone();
        tasks.push(tokio::spawn(
            async move { coordinator.get_or_build(&route).await },
        ));
    }

    for task in tasks {
        let err = task.await.expect("task").expect_err("compile failure");
        assert_eq!(err.route, "/");
        assert!(err.diagnostic.contains("unexpected token"));
    }

    // the leader failed on its first pass; no retries happened behind it
    assert_eq!(compiler.calls(), 1);
    assert!(cache.read().is_empty());
}

#[tokio::test]
async fn dependency_change_evicts_and_next_request_rebuilds() {
    let root = Path::new("/root/pages");
    let mut table = RouteTable::new();
    let compiler = Arc::new(SlowCompiler::new(Duration::ZERO));
    let (coordinator, cache) = coordinator(compiler.clone());
    let route = derive_route(root, Path::new("/root/pages/Index.svelte"));
    table.insert(route.clone());

    coordinator.get_or_build(&route).await.expect("first build");
    assert_eq!(compiler.calls(), 3);

    // a component the page imports changes on disk
    let outcome = {
        let mut cache = cache.write();
        apply_event(
            &mut table,
            &mut cache,
            root,
            &WatchEvent::Changed(PathBuf::from("/root/components/NavBar.svelte")),
        )
    };
    assert_eq!(
        outcome,
        EventOutcome::Evicted(PathBuf::from("/root/pages/Index.svelte"))
    );
    assert!(cache.read().is_empty());

    coordinator.get_or_build(&route).await.expect("rebuild");
    assert_eq!(compiler.calls(), 6);

    // cache hit afterwards, no further compiler work
    coordinator.get_or_build(&route).await.expect("cache hit");
    assert_eq!(compiler.calls(), 6);
}

#[tokio::test]
async fn unlink_evicts_and_unregisters_the_route() {
    let root = Path::new("/root/pages");
    let mut table = RouteTable::new();
    let compiler = Arc::new(SlowCompiler::new(Duration::ZERO));
    let (coordinator, cache) = coordinator(compiler);
    let route = derive_route(root, Path::new("/root/pages/Index.svelte"));
    table.insert(route.clone());

    coordinator.get_or_build(&route).await.expect("build");

    {
        let mut cache = cache.write();
        apply_event(
            &mut table,
            &mut cache,
            root,
            &WatchEvent::Removed(route.source_file.clone()),
        );
    }

    assert!(table.match_url("/").is_none());
    assert!(cache.read().is_empty());
}
