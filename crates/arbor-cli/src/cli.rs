//! Command-line interface definition.
//!
//! Defines the full CLI surface with clap v4 derive macros. One command for
//! now: `arbor serve`, which runs the component server against a pages
//! directory.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Arbor - a filesystem-routed component server
#[derive(Parser, Debug)]
#[command(
    name = "arbor",
    version,
    about = "A filesystem-routed component server with hot reload",
    long_about = "Arbor serves a directory of component files as pages.\n\
                  File paths become URL routes, components are compiled on demand\n\
                  through an external compiler, and connected browsers hot-swap\n\
                  rebuilt modules without a full reload."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the component server
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Directory whose component files become routes
    #[arg(long, default_value = "./pages")]
    pub pages: PathBuf,

    /// Additional directories to watch for changes (the pages directory is
    /// always watched)
    #[arg(long)]
    pub watch: Vec<PathBuf>,

    /// Directory of static files served when no route matches
    #[arg(long)]
    pub public: Option<PathBuf>,

    /// HTML template file (falls back to the builtin template)
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Port to listen on; nearby ports are probed when busy
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,

    /// Production mode: minified output, no hot reload, no cache clearing
    /// on build failures
    #[arg(long)]
    pub production: bool,

    /// Disable hot reload even in development mode
    #[arg(long)]
    pub no_hmr: bool,

    /// External compiler command; receives a JSON request on stdin and
    /// replies with JSON on stdout
    #[arg(long, default_value = "arbor-compile")]
    pub compiler: String,

    /// Import alias as NAME=PATH (repeatable)
    #[arg(long, value_parser = parse_alias)]
    pub alias: Vec<(String, String)>,

    /// Component file extension to route and watch
    #[arg(long, default_value = "svelte")]
    pub extension: String,
}

/// Parse a NAME=PATH alias pair.
fn parse_alias(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), path.to_string()))
        }
        _ => Err(format!("invalid alias '{raw}', expected NAME=PATH")),
    }
}
