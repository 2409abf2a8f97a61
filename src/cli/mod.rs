//! CLI module
//!
//! Command-line interface and HTTP boundary.
//!
//! # Commands
//!
//! - `serve` - Start the HTTP server
//! - `timeseries` - Fetch a time series page (or every page with `--all`)
//! - `catalog` - Fetch a catalog page
//! - `cursor` - Decode a page token into its fields
//! - `seed` - Load a JSON seed into the configured data source

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{default_log_level, Runner};
pub use server::{router, serve};
