//! Initial route discovery.
//!
//! Walks the pages directory once at startup and registers a route per
//! component file. The walk is sorted so the first-registered-wins rule for
//! colliding URLs is deterministic across runs.

use crate::config::ServerConfig;
use crate::error::Result;
use arbor_core::{derive_route, RouteTable};
use walkdir::WalkDir;

/// Build the initial route table from the pages directory.
pub fn scan_routes(config: &ServerConfig) -> Result<RouteTable> {
    let mut table = RouteTable::new();

    for entry in WalkDir::new(&config.pages)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry.map_err(|err| {
            std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
        })?;
        if entry.file_type().is_file() && config.is_component_file(entry.path()) {
            let route = derive_route(&config.pages, entry.path());
            tracing::debug!(url = %route.url, file = %route.relative_path, "route discovered");
            table.insert(route);
        }
    }

    Ok(table)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}
