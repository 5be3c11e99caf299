//! Content-addressed artifact store.
//!
//! Compiled output lives in memory under its fingerprinted name and is
//! served verbatim for `/_js/<name>` requests. Because names are derived
//! from content, an entry never changes once written; new content for the
//! same logical artifact gets a new name.

use crate::fingerprint::{fingerprint, ArtifactTag};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Thread-safe store mapping fingerprinted names to raw artifact bytes.
///
/// Cloning the store is cheap and shares the underlying map, so one
/// instance can be handed to the compiler adapter and the HTTP layer alike.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    entries: Arc<RwLock<FxHashMap<String, Arc<[u8]>>>>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint `content` under `name`/`tag`, store it, and return the
    /// fingerprinted name. Re-inserting identical content is a no-op that
    /// yields the same name.
    pub fn insert(&self, name: &str, tag: ArtifactTag, content: impl Into<Vec<u8>>) -> String {
        let bytes: Vec<u8> = content.into();
        let fingerprinted = fingerprint(name, tag, &bytes);
        self.entries
            .write()
            .entry(fingerprinted.clone())
            .or_insert_with(|| Arc::from(bytes.into_boxed_slice()));
        fingerprinted
    }

    /// Fetch the bytes stored under a fingerprinted name.
    pub fn get(&self, fingerprinted: &str) -> Option<Arc<[u8]>> {
        self.entries.read().get(fingerprinted).cloned()
    }

    pub fn contains(&self, fingerprinted: &str) -> bool {
        self.entries.read().contains_key(fingerprinted)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
