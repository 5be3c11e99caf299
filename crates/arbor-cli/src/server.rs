//! HTTP server: artifact serving, the reload endpoints, and page assembly.
//!
//! Request flow for a page: match the URL against the route table, resolve
//! the route through the build coordinator (cache hit or single compile),
//! deserialize the server-render artifact, and pour it into the template.
//! Unmatched URLs fall back to the public directory, then 404.
//!
//! Compile failures split by mode: production answers 500, development
//! clears the build cache and serves a diagnostic page that polls for the
//! fix by reloading itself.

use crate::compiler::ProcessCompiler;
use crate::config::ServerConfig;
use crate::error::{CliError, Result};
use crate::state::{ServerState, SharedState};
use crate::template::PageTemplate;
use crate::{scan, ui, watcher, ws};
use arbor_core::{
    extract_params, ArtifactStore, BuildCache, BuildCoordinator, Bundler, CompileError,
    CompileOptions, RenderOutput,
};
use axum::{
    body::Body,
    extract::{Path as AxumPath, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use parking_lot::RwLock;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Build all server state, discover routes, start the watcher, and serve
/// until ctrl-c.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let template = PageTemplate::load(config.template.as_deref())?;
    let compiler = Arc::new(ProcessCompiler::new(&config.compiler));
    let options = CompileOptions::new(config.production, config.alias.clone());
    let bundler = Bundler::new(compiler, ArtifactStore::new(), options);
    let coordinator = BuildCoordinator::new(bundler, Arc::new(RwLock::new(BuildCache::new())));
    let state = Arc::new(ServerState::new(config, coordinator, template));

    let table = scan::scan_routes(&state.config)?;
    ui::info(&format!("{} route(s) discovered", table.len()));
    *state.routes.write() = table;

    // the watcher must outlive the server loop
    let (_watcher, events) = watcher::FileWatcher::new(&state.config)?;
    tokio::spawn(watcher::watch_loop(state.clone(), events));

    let listener = tokio::net::TcpListener::bind(state.config.addr)
        .await
        .map_err(|err| CliError::Server(format!("failed to bind {}: {err}", state.config.addr)))?;

    ui::success(&format!("Serving at {}", state.config.server_url()));
    if state.config.hmr {
        ui::info("Hot reload enabled");
    }

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| CliError::Server(err.to_string()))?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        ui::info("Shutting down");
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/_js/{*name}", get(handle_artifact))
        .route("/@hmr-client", get(handle_hmr_client))
        .route("/__hmr__", get(ws::handle_upgrade))
        .route("/favicon.ico", get(handle_favicon))
        .fallback(handle_page)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve a fingerprinted artifact. Names embed their content hash, so the
/// response is immutable and cacheable forever.
async fn handle_artifact(
    State(state): State<SharedState>,
    AxumPath(name): AxumPath<String>,
) -> Response {
    match state.store().get(&name) {
        Some(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type(&name)),
                (
                    header::CACHE_CONTROL,
                    "public, max-age=31536000, immutable",
                ),
            ],
            Body::from(bytes.to_vec()),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, format!("Unknown artifact: {name}")).into_response(),
    }
}

async fn handle_hmr_client() -> impl IntoResponse {
    const HMR_CLIENT: &str = include_str!("../assets/hmr-client.js");
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        HMR_CLIENT,
    )
}

async fn handle_favicon() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

/// Every non-reserved URL: routed page, then public file, then 404.
async fn handle_page(State(state): State<SharedState>, uri: Uri) -> Response {
    let url = uri.path();

    let route = state.routes.read().match_url(url).cloned();
    if let Some(route) = route {
        return render_route(&state, &route, url).await;
    }

    if let Some(public) = &state.config.public {
        if let Some(response) = serve_public_file(public, url).await {
            return response;
        }
    }

    (StatusCode::NOT_FOUND, format!("Not found: {url}")).into_response()
}

async fn render_route(state: &SharedState, route: &arbor_core::Route, url: &str) -> Response {
    // a route whose source vanished without an unlink event yet, and with
    // nothing cached, is a plain not-found rather than a compile failure
    if state.coordinator.cached(&route.source_file).is_none() && !route.source_file.exists() {
        return (StatusCode::NOT_FOUND, format!("Not found: {url}")).into_response();
    }

    let entry = match state.coordinator.get_or_build(route).await {
        Ok(entry) => entry,
        Err(err) => return compile_failure(state, &err),
    };

    let Some(ssr) = state.store().get(&entry.artifacts.ssr) else {
        // cache and store are written together; a missing artifact is a bug
        tracing::error!(artifact = %entry.artifacts.ssr, "server-render artifact missing");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    };
    let render: RenderOutput = match serde_json::from_slice(&ssr) {
        Ok(render) => render,
        Err(err) => {
            tracing::error!("malformed server-render artifact: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        }
    };

    let params = extract_params(route, url);
    match state
        .template
        .render_page(&render, &entry.artifacts, params.as_ref(), state.config.hmr)
    {
        Ok(html) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            html,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("template rendering failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// A compile failure reached a request. Production keeps quiet; development
/// drops the whole cache (a broken tree must not serve stale artifacts) and
/// shows the diagnostic with an auto-reload.
fn compile_failure(state: &SharedState, err: &CompileError) -> Response {
    ui::error(&format!("{err}"));

    if state.config.production {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    }

    state.cache().write().clear();
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        diagnostic_page(err),
    )
        .into_response()
}

/// Development-mode diagnostic page; reloads itself until the build is
/// fixed.
fn diagnostic_page(err: &CompileError) -> String {
    let route = html_escape(&err.route);
    let file = html_escape(&err.source_file.display().to_string());
    let diagnostic = html_escape(&err.diagnostic);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <title>Compile error</title>
    <style>
      body {{ background: #1e1e1e; color: #eee; font-family: monospace; padding: 2rem; }}
      h1 {{ color: #ff5555; }}
      pre {{ background: #2a2a2a; padding: 1rem; overflow-x: auto; white-space: pre-wrap; }}
    </style>
  </head>
  <body>
    <h1>Failed to compile {route}</h1>
    <p>{file}</p>
    <pre>{diagnostic}</pre>
    <script>setTimeout(() => location.reload(), 2000)</script>
  </body>
</html>
"#
    )
}

fn html_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Serve a file from the public directory, refusing path traversal.
async fn serve_public_file(public: &Path, url: &str) -> Option<Response> {
    let relative = sanitize_url_path(url)?;
    let file = public.join(relative);
    if !file.is_file() {
        return None;
    }

    match tokio::fs::read(&file).await {
        Ok(content) => Some(
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type(url)),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                Body::from(content),
            )
                .into_response(),
        ),
        Err(err) => {
            ui::warning(&format!("failed to read {}: {err}", file.display()));
            None
        }
    }
}

/// Turn a request path into a relative filesystem path, rejecting anything
/// that escapes the root.
fn sanitize_url_path(url: &str) -> Option<PathBuf> {
    let candidate = Path::new(url.trim_start_matches('/'));
    let mut clean = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!clean.as_os_str().is_empty()).then_some(clean)
}

/// Determine content type from file extension.
fn content_type(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    match extension {
        "js" | "mjs" => "application/javascript",
        "json" | "map" => "application/json",
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
