//! Arbor CLI - component server with filesystem routing and hot reload.
//!
//! This crate is the operational shell around [`arbor_core`]: it parses the
//! command line, builds the server configuration, shells out to the external
//! component compiler, runs the HTTP/WebSocket server, and drives the file
//! watcher that keeps routes and caches current.

pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod logger;
pub mod scan;
pub mod server;
pub mod sessions;
pub mod state;
pub mod template;
pub mod ui;
pub mod watcher;
pub mod ws;
