//! Build cache: one entry per compiled source file, with the dependency set
//! that must invalidate it.
//!
//! Cache operations never fail; a miss is an absent result. Entries are
//! written whole by the compiler adapter after a successful build and
//! removed whole by watch-event handling, never left half-written.

use crate::fingerprint::ArtifactTag;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

/// Fingerprinted artifact names for the three build outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    /// Serialized server-render output.
    pub ssr: String,
    /// Module-format client bundle.
    pub dom: String,
    /// Classic-script client bundle.
    pub iife: String,
}

impl ArtifactSet {
    pub fn get(&self, tag: ArtifactTag) -> &str {
        match tag {
            ArtifactTag::Ssr => &self.ssr,
            ArtifactTag::Dom => &self.dom,
            ArtifactTag::Iife => &self.iife,
        }
    }
}

/// Cached build result for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Source file path, the primary identity.
    pub key: PathBuf,
    /// References into the artifact store.
    pub artifacts: ArtifactSet,
    /// Files whose modification invalidates this entry. Always contains
    /// `key` itself.
    pub dependencies: FxHashSet<PathBuf>,
    /// Root-relative path, for logging.
    pub display_name: String,
}

impl CacheEntry {
    /// Build an entry, folding the key into its own dependency set.
    pub fn new(
        key: impl Into<PathBuf>,
        artifacts: ArtifactSet,
        dependencies: impl IntoIterator<Item = PathBuf>,
        display_name: impl Into<String>,
    ) -> Self {
        let key = key.into();
        let mut dependencies: FxHashSet<PathBuf> = dependencies.into_iter().collect();
        dependencies.insert(key.clone());
        Self {
            key,
            artifacts,
            dependencies,
            display_name: display_name.into(),
        }
    }

    pub fn depends_on(&self, file: &Path) -> bool {
        self.dependencies.contains(file)
    }
}

/// In-memory cache keyed by source file path.
#[derive(Debug, Default)]
pub struct BuildCache {
    entries: rustc_hash::FxHashMap<PathBuf, CacheEntry>,
}

impl BuildCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Path) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Upsert, replacing any prior entry with the same key.
    pub fn set(&mut self, entry: CacheEntry) {
        self.entries.insert(entry.key.clone(), entry);
    }

    /// Remove an entry. Removing an absent key is not an error.
    pub fn delete(&mut self, key: &Path) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    /// The entry (at most one in practice, since keys are source files)
    /// whose dependency set contains `file`.
    pub fn find_by_dependency(&self, file: &Path) -> Option<&CacheEntry> {
        self.entries.values().find(|e| e.depends_on(file))
    }

    pub fn has_dependency(&self, file: &Path) -> bool {
        self.entries.values().any(|e| e.depends_on(file))
    }

    /// Drop every entry. Emergency reset after an unrecoverable build
    /// failure in non-production mode.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
