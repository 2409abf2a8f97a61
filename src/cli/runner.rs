//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{ServiceConfig, SourceConfig, SourceKind};
use crate::cursor::decode_cursor;
use crate::error::{Error, Result};
use crate::pagination::{
    fetch_catalog_page, fetch_time_series_page, CatalogRequest, PagingOptions, TimeSeriesRequest,
};
use crate::source::{DataSource, DuckDbSource, InMemorySource, Seed, SeedTarget};
use crate::types::{DatasetKind, UnitSelector};
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

/// A configured data source, before it is shared with request handlers
enum Backend {
    Memory(InMemorySource),
    Duckdb(DuckDbSource),
}

impl Backend {
    fn open(config: &SourceConfig) -> Result<Self> {
        let backend = match config.kind {
            SourceKind::Memory => Self::Memory(InMemorySource::new()),
            SourceKind::Duckdb => Self::Duckdb(match &config.path {
                Some(path) => DuckDbSource::open(path)?,
                None => DuckDbSource::open_in_memory()?,
            }),
        };

        if let Some(seed) = &config.seed {
            backend.load_seed(seed)?;
        }
        Ok(backend)
    }

    fn target(&self) -> &dyn SeedTarget {
        match self {
            Self::Memory(source) => source,
            Self::Duckdb(source) => source,
        }
    }

    fn load_seed(&self, path: &Path) -> Result<()> {
        Seed::from_file(path)?.load_into(self.target())?;
        Ok(())
    }

    fn into_source(self) -> Arc<dyn DataSource> {
        match self {
            Self::Memory(source) => Arc::new(source),
            Self::Duckdb(source) => Arc::new(source),
        }
    }
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::Serve { port } => {
                let mut server = config.server.clone();
                if let Some(port) = port {
                    server.port = *port;
                }
                let source = Backend::open(&config.source)?.into_source();
                crate::cli::serve(&server, config.paging_options(), source).await
            }
            Commands::Timeseries {
                name,
                office,
                unit,
                begin,
                end,
                timezone,
                page,
                page_size,
                all,
            } => {
                let request = TimeSeriesRequest {
                    name: name.clone(),
                    office: office.clone(),
                    units: UnitSelector::parse(Some(unit)),
                    begin: begin.clone(),
                    end: end.clone(),
                    timezone: timezone.clone(),
                    page: page.clone(),
                    page_size: *page_size,
                };
                let source = Backend::open(&config.source)?.into_source();
                self.timeseries(source.as_ref(), request, &config.paging_options(), *all)
            }
            Commands::Catalog {
                dataset,
                office,
                page,
                page_size,
                all,
            } => {
                let request = CatalogRequest {
                    dataset: dataset.parse::<DatasetKind>()?,
                    office: office.clone(),
                    page: page.clone(),
                    page_size: *page_size,
                };
                let source = Backend::open(&config.source)?.into_source();
                self.catalog(source.as_ref(), request, &config.paging_options(), *all)
            }
            Commands::Cursor { token, delimiter } => self.cursor(token, delimiter),
            Commands::Seed { file } => self.seed(&config.source, file),
        }
    }

    /// Load the service config, or defaults when no file is given
    fn load_config(&self) -> Result<ServiceConfig> {
        match &self.cli.config {
            Some(path) => ServiceConfig::from_file(path),
            None => Ok(ServiceConfig::default()),
        }
    }

    fn timeseries(
        &self,
        source: &dyn DataSource,
        mut request: TimeSeriesRequest,
        options: &PagingOptions,
        all: bool,
    ) -> Result<()> {
        loop {
            let page = fetch_time_series_page(source, &request, options)?;
            self.output(&page)?;

            match page.paging.next_page {
                Some(next) if all => request.page = Some(next),
                _ => return Ok(()),
            }
        }
    }

    fn catalog(
        &self,
        source: &dyn DataSource,
        mut request: CatalogRequest,
        options: &PagingOptions,
        all: bool,
    ) -> Result<()> {
        loop {
            let page = fetch_catalog_page(source, &request, options)?;
            self.output(&page)?;

            match page.paging.next_page {
                Some(next) if all => request.page = Some(next),
                _ => return Ok(()),
            }
        }
    }

    fn cursor(&self, token: &str, delimiter: &str) -> Result<()> {
        let fields = decode_cursor(token, delimiter)?.unwrap_or_default();
        self.output(&json!({ "type": "CURSOR", "fields": fields }))
    }

    fn seed(&self, config: &SourceConfig, file: &Path) -> Result<()> {
        if config.kind == SourceKind::Memory || config.path.is_none() {
            tracing::warn!("Seeding an in-memory source; data is discarded on exit");
        }

        let backend = Backend::open(&SourceConfig {
            seed: None,
            ..config.clone()
        })?;
        let summary = Seed::from_file(file)?.load_into(backend.target())?;
        self.output(&json!({
            "type": "SEED",
            "series": summary.series,
            "values": summary.values,
            "locations": summary.locations,
        }))
    }

    /// Print a document in the selected format
    fn output<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        };
        println!("{text}");
        Ok(())
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner").field("cli", &self.cli).finish()
    }
}

/// Log level for the binary's default filter
pub fn default_log_level(verbose: bool) -> tracing::Level {
    if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    }
}
