//! Server configuration.
//!
//! Resolves CLI arguments into an explicit `ServerConfig` with documented
//! defaults: pages under `./pages`, `./components` watched alongside when it
//! exists, static files from `./public` when it exists.

use crate::cli::ServeArgs;
use crate::error::{CliError, Result};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// How many ports past the requested one to probe before giving up.
const PORT_PROBE_RANGE: u16 = 10;

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory whose component files become routes.
    pub pages: PathBuf,

    /// Directories watched for changes. Always contains `pages`.
    pub watch: Vec<PathBuf>,

    /// Static file directory served when no route matches.
    pub public: Option<PathBuf>,

    /// User HTML template, or the builtin when absent.
    pub template: Option<PathBuf>,

    /// Server socket address (IP + port).
    pub addr: SocketAddr,

    /// Production mode.
    pub production: bool,

    /// Hot reload enabled. Never true in production.
    pub hmr: bool,

    /// External compiler command.
    pub compiler: String,

    /// Import alias table.
    pub alias: BTreeMap<String, String>,

    /// Component file extension, without the dot.
    pub extension: String,

    /// Same-path debounce window for watch events, in milliseconds.
    pub debounce_ms: u64,
}

impl ServerConfig {
    /// Resolve CLI arguments into a configuration.
    pub fn from_args(args: &ServeArgs) -> Result<Self> {
        let pages = args.pages.clone();

        let mut watch = vec![pages.clone()];
        for dir in &args.watch {
            if !watch.contains(dir) {
                watch.push(dir.clone());
            }
        }
        // the conventional sibling directory, when nothing else was asked for
        if args.watch.is_empty() {
            let components = default_sibling(&pages, "components");
            if components.is_dir() && !watch.contains(&components) {
                watch.push(components);
            }
        }

        let public = match &args.public {
            Some(dir) => Some(dir.clone()),
            None => {
                let public = default_sibling(&pages, "public");
                public.is_dir().then_some(public)
            }
        };

        let addr = find_available_port(args.port)?;

        Ok(Self {
            pages,
            watch,
            public,
            template: args.template.clone(),
            addr,
            production: args.production,
            hmr: !args.production && !args.no_hmr,
            compiler: args.compiler.clone(),
            alias: args.alias.iter().cloned().collect(),
            extension: args.extension.trim_start_matches('.').to_string(),
            debounce_ms: 100,
        })
    }

    /// Validate that configured paths exist.
    pub fn validate(&self) -> Result<()> {
        if !self.pages.is_dir() {
            return Err(CliError::NotFound {
                path: self.pages.clone(),
                hint: "Create the directory or pass --pages".to_string(),
            });
        }
        for dir in &self.watch {
            if !dir.is_dir() {
                return Err(CliError::NotFound {
                    path: dir.clone(),
                    hint: "Every --watch directory must exist".to_string(),
                });
            }
        }
        if let Some(template) = &self.template {
            if !template.is_file() {
                return Err(CliError::NotFound {
                    path: template.clone(),
                    hint: "Pass --template with an existing HTML file".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Whether a path is a component file by this configuration's extension.
    pub fn is_component_file(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }

    /// Get the server URL as a string.
    pub fn server_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Sibling directory of the pages root (`./pages` -> `./components`).
fn default_sibling(pages: &Path, name: &str) -> PathBuf {
    pages
        .parent()
        .map(|parent| parent.join(name))
        .unwrap_or_else(|| PathBuf::from(name))
}

/// Find an available port starting from the requested port.
///
/// Tries the requested port first, then incrementally probes nearby ports.
fn find_available_port(requested_port: u16) -> Result<SocketAddr> {
    use std::net::TcpListener;

    if requested_port < 1024 {
        crate::ui::warning(&format!(
            "Port {requested_port} is in privileged range, may require root access"
        ));
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], requested_port));
    if TcpListener::bind(addr).is_ok() {
        return Ok(addr);
    }

    for offset in 1..=PORT_PROBE_RANGE {
        let port = requested_port.saturating_add(offset);
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        if TcpListener::bind(addr).is_ok() {
            crate::ui::warning(&format!(
                "Port {requested_port} is busy, using port {port} instead"
            ));
            return Ok(addr);
        }
    }

    Err(CliError::PortUnavailable {
        from: requested_port,
        to: requested_port.saturating_add(PORT_PROBE_RANGE),
    })
}
