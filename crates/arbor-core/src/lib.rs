//! Arbor core - the route-cache-invalidation engine behind the Arbor
//! component server.
//!
//! A tree of component source files is mapped to URL routes; each route is
//! compiled by an external component compiler into a server-render artifact
//! plus client-hydration bundles. Compiled artifacts live in a
//! content-addressed in-memory store, and every cache entry carries the set
//! of files that must invalidate it. Watch events keep routes and cache
//! consistent, and a small JSON protocol tells connected browsers exactly
//! which bundle to hot-swap.
//!
//! # Architecture
//!
//! - [`routes`] - deriving URL routes from file paths and matching requests
//! - [`fingerprint`] - deterministic hash-qualified artifact names
//! - [`store`] - content-addressed artifact bytes
//! - [`cache`] - per-source-file build cache with dependency sets
//! - [`compiler`] - the external compiler boundary
//! - [`bundle`] - build orchestration and single-flight coordination
//! - [`events`] - the watch-event state machine
//! - [`protocol`] - live-reload wire frames
//!
//! All shared state is explicitly owned and injected; nothing in this crate
//! holds ambient singletons.

pub mod bundle;
pub mod cache;
pub mod compiler;
pub mod events;
pub mod fingerprint;
pub mod protocol;
pub mod routes;
pub mod store;

pub use bundle::{BuildCoordinator, Bundler, CompileError};
pub use cache::{BuildCache, CacheEntry};
pub use compiler::{CompileMode, CompileOptions, CompileOutput, Compiler, RenderOutput};
pub use events::{apply_event, EventOutcome, WatchEvent};
pub use fingerprint::{fingerprint, ArtifactTag};
pub use protocol::ReloadMessage;
pub use routes::{derive_route, extract_params, routes_match, Route, RouteTable};
pub use store::ArtifactStore;
