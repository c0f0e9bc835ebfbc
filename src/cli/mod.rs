//! CLI module
//!
//! Command-line interface for loading and serving catalog datasets.
//!
//! # Commands
//!
//! - `datasets` - List catalog datasets
//! - `validate` - Validate the catalog
//! - `metadata` - Show table variables or look up a value code
//! - `fetch` - Load datasets, falling back to static data
//! - `decode` - Decode a saved response body
//! - `serve` - Start HTTP server mode

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
pub use server::{router, serve, ServerConfig};
