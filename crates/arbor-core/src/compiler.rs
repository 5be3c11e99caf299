//! The external component compiler boundary.
//!
//! The compiler itself lives outside this crate; everything here is the
//! call contract: a compile mode, shared options, and the generated code
//! plus the files the compiler touched while resolving imports. Transport
//! and code generation are the implementor's business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Output flavor requested from the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileMode {
    /// Server-render output. The generated "code" is the serialized render
    /// output (see [`RenderOutput`]).
    Ssr,
    /// Module-format client-hydration bundle.
    Dom,
    /// Classic-script client bundle for `nomodule` browsers.
    Iife,
}

impl CompileMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompileMode::Ssr => "ssr",
            CompileMode::Dom => "dom",
            CompileMode::Iife => "iife",
        }
    }
}

/// Options shared across compile invocations for one build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Minify, strip dev helpers.
    pub production: bool,
    /// Inverse of `production`; kept explicit because compilers read it.
    pub dev: bool,
    /// Whether the client bundle should hydrate server-rendered markup.
    pub hydratable: bool,
    /// Import alias table (`@components` -> `./components`).
    #[serde(default)]
    pub alias: BTreeMap<String, String>,
    /// Pass-through bag of compiler-specific flags.
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CompileOptions {
    pub fn new(production: bool, alias: BTreeMap<String, String>) -> Self {
        Self {
            production,
            dev: !production,
            hydratable: false,
            alias,
            extra: serde_json::Map::new(),
        }
    }

    /// Same options with hydration enabled or not; SSR output is never
    /// hydratable, client bundles always are.
    pub fn for_mode(&self, mode: CompileMode) -> Self {
        let mut options = self.clone();
        options.hydratable = !matches!(mode, CompileMode::Ssr);
        options
    }
}

/// What the compiler hands back for one invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileOutput {
    /// Generated code (or, in SSR mode, serialized render output).
    pub code: String,
    /// Every file the compiler touched while resolving imports. Only
    /// client-mode invocations are required to report them.
    #[serde(default, rename = "watchFiles")]
    pub watch_files: Vec<PathBuf>,
}

/// External component compiler.
///
/// `entry` is a synthetic entry module importing the target component;
/// failures surface as [`anyhow::Error`] diagnostics, which the adapter
/// wraps with route context.
#[async_trait]
pub trait Compiler: Send + Sync {
    async fn compile(
        &self,
        entry: &Path,
        mode: CompileMode,
        options: &CompileOptions,
    ) -> anyhow::Result<CompileOutput>;
}

/// Deserialized SSR artifact: what the server-render pass produced for one
/// component, ready to be poured into the HTML template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderOutput {
    /// Markup destined for `<head>`.
    #[serde(default)]
    pub head: String,
    /// Collected component CSS.
    #[serde(default)]
    pub css: String,
    /// Server-rendered body markup.
    #[serde(default)]
    pub html: String,
}
