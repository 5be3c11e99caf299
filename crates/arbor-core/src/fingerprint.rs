//! Deterministic hash-qualified artifact names.
//!
//! A fingerprint is `{stem}-{tag}-{hash12}.{ext}` where `stem` is the build
//! name's leading file stem, `tag` marks the artifact flavor, and `hash12`
//! is the first twelve hex characters of the BLAKE3 content hash. Identical
//! (name, tag, content) inputs always produce the same fingerprint, and any
//! content change produces a different one, which makes artifact URLs safe
//! for immutable HTTP caching.

/// Number of hex characters kept from the content hash.
const HASH_LEN: usize = 12;

/// Artifact flavor, qualifying the fingerprinted name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactTag {
    /// Serialized server-render output (`.json`).
    Ssr,
    /// Module-format client bundle.
    Dom,
    /// Classic-script client bundle for `nomodule` browsers.
    Iife,
}

impl ArtifactTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactTag::Ssr => "ssr",
            ArtifactTag::Dom => "dom",
            ArtifactTag::Iife => "iife",
        }
    }

    /// File extension of the stored artifact. The SSR artifact is the
    /// serialized render output rather than script text.
    fn extension(&self) -> &'static str {
        match self {
            ArtifactTag::Ssr => "json",
            ArtifactTag::Dom | ArtifactTag::Iife => "js",
        }
    }
}

impl std::fmt::Display for ArtifactTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute the fingerprinted name for an artifact.
///
/// `name` is the logical build name (e.g. `pages/Index.svelte.js`); only its
/// final path component's leading stem ends up in the fingerprint.
pub fn fingerprint(name: &str, tag: ArtifactTag, content: &[u8]) -> String {
    let stem = name
        .rsplit('/')
        .next()
        .unwrap_or(name)
        .split('.')
        .next()
        .unwrap_or(name);

    let hash = blake3::hash(content);
    let hex = hash.to_hex();
    let short = &hex.as_str()[..HASH_LEN];

    format!("{stem}-{tag}-{short}.{ext}", ext = tag.extension())
}
