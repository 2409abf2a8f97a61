//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Paged access to time series and catalogs
#[derive(Parser, Debug)]
#[command(name = "series-pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Service configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch one page of a time series
    Timeseries {
        /// Six-part time series identifier
        #[arg(short, long)]
        name: String,

        /// Owning office
        #[arg(short, long)]
        office: Option<String>,

        /// SI, EN or a unit name
        #[arg(short, long, default_value = "EN")]
        unit: String,

        /// Window start
        #[arg(long)]
        begin: Option<String>,

        /// Window end
        #[arg(long)]
        end: Option<String>,

        /// IANA zone for zone-less bounds
        #[arg(long)]
        timezone: Option<String>,

        /// Cursor from a previous page
        #[arg(long)]
        page: Option<String>,

        /// Rows per page (0 = metadata only)
        #[arg(long, allow_hyphen_values = true)]
        page_size: Option<i64>,

        /// Follow next-page cursors until the traversal ends
        #[arg(long)]
        all: bool,
    },

    /// Fetch one page of a catalog
    Catalog {
        /// Dataset to list: timeseries or locations
        dataset: String,

        /// Restrict to one office
        #[arg(short, long)]
        office: Option<String>,

        /// Cursor from a previous page
        #[arg(long)]
        page: Option<String>,

        /// Entries per page (0 = metadata only)
        #[arg(long, allow_hyphen_values = true)]
        page_size: Option<i64>,

        /// Follow next-page cursors until the traversal ends
        #[arg(long)]
        all: bool,
    },

    /// Print the fields inside a page cursor
    Cursor {
        /// Opaque page token
        token: String,

        /// Field delimiter
        #[arg(long, default_value = crate::cursor::DEFAULT_DELIMITER)]
        delimiter: String,
    },

    /// Load a JSON seed into the configured data source
    Seed {
        /// Seed file
        file: PathBuf,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON (one document per line)
    Json,
    /// Indented JSON
    Pretty,
}
