//! File watching and the watch-event consumer loop.
//!
//! A notify watcher feeds one ordered mpsc channel of [`WatchEvent`]s:
//! component files only, vendored and hidden paths skipped, rapid repeats
//! for the same path debounced. A single consumer applies each event to the
//! route table and build cache, then fans reload frames out to sessions.
//! One channel, one consumer: events for a path can never be reordered.

use crate::config::ServerConfig;
use crate::error::Result;
use crate::state::SharedState;
use arbor_core::{apply_event, ReloadMessage, Route, WatchEvent};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// File watcher over the configured directories.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Start watching; returns the ordered event channel.
    pub fn new(config: &ServerConfig) -> Result<(Self, mpsc::Receiver<WatchEvent>)> {
        let (tx, rx) = mpsc::channel(100);

        let debounce = Duration::from_millis(config.debounce_ms);
        let extension = config.extension.clone();
        let mut last_event: Option<(PathBuf, Instant)> = None;

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                for path in &event.paths {
                    if should_ignore(path, &extension) {
                        continue;
                    }

                    let now = Instant::now();
                    if let Some((last_path, last_time)) = &last_event {
                        if last_path == path && now.duration_since(*last_time) < debounce {
                            continue;
                        }
                    }
                    last_event = Some((path.clone(), now));

                    let change = match event.kind {
                        notify::EventKind::Create(_) => WatchEvent::Added(path.clone()),
                        notify::EventKind::Modify(_) => WatchEvent::Changed(path.clone()),
                        notify::EventKind::Remove(_) => WatchEvent::Removed(path.clone()),
                        _ => continue,
                    };
                    let _ = tx.blocking_send(change);
                }
            }
        })?;

        for root in &config.watch {
            watcher.watch(root, RecursiveMode::Recursive)?;
        }

        Ok((Self { _watcher: watcher }, rx))
    }
}

/// Skip anything that is not a component file, plus vendored and hidden
/// paths.
fn should_ignore(path: &Path, extension: &str) -> bool {
    let is_component = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
    if !is_component {
        return true;
    }

    path.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| {
                name == "node_modules" || (name.starts_with('.') && name != "." && name != "..")
            })
    })
}

/// Consume watch events: update routes and cache, then notify sessions.
pub async fn watch_loop(state: SharedState, mut rx: mpsc::Receiver<WatchEvent>) {
    while let Some(event) = rx.recv().await {
        {
            let mut routes = state.routes.write();
            let mut cache = state.cache().write();
            apply_event(&mut routes, &mut cache, &state.config.pages, &event);
        }

        if !state.config.hmr {
            continue;
        }

        match &event {
            WatchEvent::Changed(path) => notify_changed(&state, path).await,
            // a removed file may be imported by any page; every session
            // reloads, routed or not
            WatchEvent::Removed(_) => state.sessions.broadcast(&ReloadMessage::Unlink),
            WatchEvent::Added(_) => {}
        }
    }
}

/// Push a fresh module to every session whose current page depends on the
/// changed file. Each session's route is resolved against its handshake URL
/// and rebuilt on demand, so this holds even when the change found nothing
/// left to evict.
async fn notify_changed(state: &SharedState, changed: &Path) {
    for (id, url) in state.sessions.handshaken() {
        let route: Option<Route> = state.routes.read().match_url(&url).cloned();
        let Some(route) = route else { continue };

        match state.coordinator.get_or_build(&route).await {
            Ok(entry) => {
                if !entry.depends_on(changed) {
                    continue;
                }
                state.sessions.send_to(
                    id,
                    ReloadMessage::Change {
                        path: entry.artifacts.dom.clone(),
                        name: project_relative(&state.config, changed),
                    },
                );
            }
            Err(err) => {
                crate::ui::error(&format!("{err}"));
                // stale artifacts must not outlive a broken source tree
                state.cache().write().clear();
            }
        }
    }
}

/// Display form of a changed file: relative to the project root (the pages
/// directory's parent), forward slashes.
fn project_relative(config: &ServerConfig, path: &Path) -> String {
    let root = config.pages.parent().unwrap_or(&config.pages);
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}
