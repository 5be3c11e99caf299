//! Shared server state.
//!
//! One [`ServerState`] is built at startup and handed around as an `Arc`;
//! the HTTP layer, the WebSocket sessions, and the watch loop all see the
//! same route table, build coordinator, and session registry. Nothing here
//! is a global.

use crate::config::ServerConfig;
use crate::sessions::SessionRegistry;
use crate::template::PageTemplate;
use arbor_core::{ArtifactStore, BuildCache, BuildCoordinator, RouteTable};
use parking_lot::RwLock;
use std::sync::Arc;

pub struct ServerState {
    /// Resolved configuration.
    pub config: ServerConfig,
    /// URL routes derived from the pages directory.
    pub routes: RwLock<RouteTable>,
    /// Build cache + single-flight compiler coordination.
    pub coordinator: BuildCoordinator,
    /// Connected live-reload sessions.
    pub sessions: SessionRegistry,
    /// Compiled page template.
    pub template: PageTemplate,
}

impl ServerState {
    pub fn new(config: ServerConfig, coordinator: BuildCoordinator, template: PageTemplate) -> Self {
        Self {
            config,
            routes: RwLock::new(RouteTable::new()),
            coordinator,
            sessions: SessionRegistry::new(),
            template,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        self.coordinator.store()
    }

    pub fn cache(&self) -> &Arc<RwLock<BuildCache>> {
        self.coordinator.cache()
    }
}

/// Shared state handle for passing around the application.
pub type SharedState = Arc<ServerState>;
