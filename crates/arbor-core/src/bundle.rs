//! Compiler adapter: turns a route into a cached set of artifacts.
//!
//! [`Bundler`] drives the external compiler. It synthesizes a temp entry
//! module importing the target component, runs the ssr/dom/iife passes,
//! filters the reported watch files down to the real dependency set, and
//! persists every output through the fingerprinter. [`BuildCoordinator`] is
//! the cache-writing face of the adapter: it collapses concurrent builds
//! for one key onto a single in-flight build, so late joiners await the
//! first result instead of invoking the compiler again. A failure is shared
//! with every waiter.

use crate::cache::{ArtifactSet, BuildCache, CacheEntry};
use crate::compiler::{CompileMode, CompileOptions, Compiler};
use crate::fingerprint::ArtifactTag;
use crate::routes::{kebab_to_pascal, Route};
use crate::store::ArtifactStore;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{watch, Mutex};

/// Client-side global the hydration entry reads its props from.
pub const PROPS_GLOBAL: &str = "__ARBOR_PROPS__";

/// Path markers identifying vendored dependencies; files under these never
/// count as invalidation sources.
const VENDOR_MARKERS: &[&str] = &["node_modules"];

/// A failed build, carrying the route and the underlying diagnostic.
///
/// Cloneable so the one in-flight failure can be reported to every caller
/// awaiting that key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to compile {route} ({}): {diagnostic}", source_file.display())]
pub struct CompileError {
    /// URL pattern of the route that failed.
    pub route: String,
    /// The component source file.
    pub source_file: PathBuf,
    /// Compiler diagnostic, flattened to text.
    pub diagnostic: String,
}

type BuildResult = Result<CacheEntry, CompileError>;

/// Orchestrates external compilation for a single route.
pub struct Bundler {
    compiler: Arc<dyn Compiler>,
    store: ArtifactStore,
    options: CompileOptions,
}

impl Bundler {
    pub fn new(compiler: Arc<dyn Compiler>, store: ArtifactStore, options: CompileOptions) -> Self {
        Self {
            compiler,
            store,
            options,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Compile `route` and persist its artifacts.
    ///
    /// No cache entry is produced unless every pass succeeds; a compiler
    /// failure surfaces as [`CompileError`] with nothing half-written.
    pub async fn build(&self, route: &Route) -> BuildResult {
        let build_name = format!("{}.js", route.relative_path);
        let component = component_identifier(&route.source_file);
        let started = std::time::Instant::now();

        tracing::debug!(route = %route.url, name = %build_name, "bundling");

        let entry = write_entry_module(&route.source_file, &component)
            .map_err(|err| self.error(route, format!("failed to write entry module: {err}")))?;
        let entry_path = entry.path().to_path_buf();

        let ssr = self
            .compiler
            .compile(&entry_path, CompileMode::Ssr, &self.options.for_mode(CompileMode::Ssr))
            .await
            .map_err(|err| self.error(route, format!("{err:#}")))?;
        let dom = self
            .compiler
            .compile(&entry_path, CompileMode::Dom, &self.options.for_mode(CompileMode::Dom))
            .await
            .map_err(|err| self.error(route, format!("{err:#}")))?;
        let iife = self
            .compiler
            .compile(&entry_path, CompileMode::Iife, &self.options.for_mode(CompileMode::Iife))
            .await
            .map_err(|err| self.error(route, format!("{err:#}")))?;

        let dependencies = filter_watch_files(dom.watch_files, &entry_path);

        let artifacts = ArtifactSet {
            ssr: self.store.insert(&build_name, ArtifactTag::Ssr, ssr.code),
            dom: self.store.insert(&build_name, ArtifactTag::Dom, dom.code),
            iife: self.store.insert(&build_name, ArtifactTag::Iife, iife.code),
        };

        tracing::info!(
            route = %route.url,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "bundled {}",
            route.relative_path
        );

        Ok(CacheEntry::new(
            route.source_file.clone(),
            artifacts,
            dependencies,
            route.relative_path.clone(),
        ))
    }

    fn error(&self, route: &Route, diagnostic: String) -> CompileError {
        CompileError {
            route: route.url.clone(),
            source_file: route.source_file.clone(),
            diagnostic,
        }
    }
}

/// Derive a valid JS module identifier from the component's file stem.
fn component_identifier(source_file: &Path) -> String {
    let stem = source_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = stem.split('.').next().unwrap_or_default();

    let ident = kebab_to_pascal(stem);
    if ident.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        ident
    } else {
        format!("Component{ident}")
    }
}

/// Write the synthetic entry module: import the component, re-export it,
/// and (in a browser) hydrate it against the document body with props from
/// the client-side global.
fn write_entry_module(source_file: &Path, component: &str) -> std::io::Result<tempfile::NamedTempFile> {
    let mut entry = tempfile::Builder::new()
        .prefix("arbor-entry-")
        .suffix(".js")
        .tempfile()?;

    let source = source_file.to_string_lossy();
    writeln!(entry, "import {component} from '{source}';")?;
    writeln!(entry, "export default {component};")?;
    writeln!(
        entry,
        "typeof window !== 'undefined' && new {component}({{ target: document.body, hydrate: true, props: window.{PROPS_GLOBAL} }});"
    )?;
    entry.flush()?;
    Ok(entry)
}

/// Reduce the compiler's watch files to the dependency set: vendored
/// dependencies and the synthetic entry never invalidate a build.
fn filter_watch_files(watch_files: Vec<PathBuf>, entry_path: &Path) -> Vec<PathBuf> {
    watch_files
        .into_iter()
        .filter(|file| file != entry_path)
        .filter(|file| {
            !file
                .components()
                .any(|c| VENDOR_MARKERS.iter().any(|m| c.as_os_str() == *m))
        })
        .collect()
}

/// Per-key single-flight build coordination.
///
/// The first requester for an uncached key becomes the leader and runs the
/// build; every concurrent requester for the same key subscribes to the
/// leader's result channel. Exactly one compiler invocation happens per
/// cache miss, and the leader's outcome (success or failure) reaches all
/// subscribers.
pub struct BuildCoordinator {
    bundler: Bundler,
    cache: Arc<RwLock<BuildCache>>,
    inflight: Mutex<FxHashMap<PathBuf, watch::Receiver<Option<BuildResult>>>>,
}

impl BuildCoordinator {
    pub fn new(bundler: Bundler, cache: Arc<RwLock<BuildCache>>) -> Self {
        Self {
            bundler,
            cache,
            inflight: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn cache(&self) -> &Arc<RwLock<BuildCache>> {
        &self.cache
    }

    pub fn store(&self) -> &ArtifactStore {
        self.bundler.store()
    }

    /// Cached entry for `key`, if any.
    pub fn cached(&self, key: &Path) -> Option<CacheEntry> {
        self.cache.read().get(key).cloned()
    }

    /// Resolve `route` to its cache entry, building at most once however
    /// many callers arrive concurrently.
    pub async fn get_or_build(&self, route: &Route) -> BuildResult {
        let key = route.source_file.clone();

        loop {
            if let Some(entry) = self.cached(&key) {
                return Ok(entry);
            }

            let mut inflight = self.inflight.lock().await;
            // The leader may have finished while we waited for the lock.
            if let Some(entry) = self.cached(&key) {
                return Ok(entry);
            }

            if let Some(rx) = inflight.get(&key) {
                let mut rx = rx.clone();
                drop(inflight);

                loop {
                    if let Some(result) = rx.borrow().clone() {
                        return result;
                    }
                    if rx.changed().await.is_err() {
                        // Leader vanished without reporting; drop the stale
                        // channel and retry from the cache.
                        let mut inflight = self.inflight.lock().await;
                        if let Some(stale) = inflight.get(&key) {
                            if stale.has_changed().is_err() {
                                inflight.remove(&key);
                            }
                        }
                        break;
                    }
                }
                continue;
            }

            let (tx, rx) = watch::channel(None);
            inflight.insert(key.clone(), rx);
            drop(inflight);

            let result = self.bundler.build(route).await;
            if let Ok(entry) = &result {
                self.cache.write().set(entry.clone());
            }
            // Publish to the cache before retiring the in-flight slot so a
            // joiner can never observe neither.
            self.inflight.lock().await.remove(&key);
            let _ = tx.send(Some(result.clone()));
            return result;
        }
    }
}
