//! Service configuration
//!
//! Loaded from YAML. Every section is optional:
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 7000
//! paging:
//!   default_page_size: 500
//!   max_page_size: 5000
//!   default_window_hours: 24
//! source:
//!   kind: duckdb
//!   path: /var/lib/series-pager/series.duckdb
//!   seed: seed.json
//! ```

use crate::error::{Error, Result};
use crate::pagination::PagingOptions;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Top-Level Service Config
// ============================================================================

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,

    /// Page size limits and default window
    #[serde(default)]
    pub paging: PagingConfig,

    /// Where series and catalog data come from
    #[serde(default)]
    pub source: SourceConfig,
}

impl ServiceConfig {
    /// Load and validate a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                ))
            }
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check limits are usable
    pub fn validate(&self) -> Result<()> {
        let paging = &self.paging;
        if paging.default_page_size <= 0 {
            return Err(Error::config("paging.default_page_size must be positive"));
        }
        if paging.max_page_size <= 0 {
            return Err(Error::config("paging.max_page_size must be positive"));
        }
        if paging.default_page_size > paging.max_page_size {
            return Err(Error::config(format!(
                "paging.default_page_size ({}) exceeds paging.max_page_size ({})",
                paging.default_page_size, paging.max_page_size
            )));
        }
        if paging.default_window_hours == 0 {
            return Err(Error::config("paging.default_window_hours must be positive"));
        }
        if paging.default_window_hours > MAX_WINDOW_HOURS {
            return Err(Error::config(format!(
                "paging.default_window_hours must not exceed {MAX_WINDOW_HOURS} (100 years)"
            )));
        }
        if self.source.kind == SourceKind::Memory && self.source.path.is_some() {
            return Err(Error::config(
                "source.path is only valid with source.kind: duckdb",
            ));
        }
        Ok(())
    }

    /// Paging options handed to the paginators
    pub fn paging_options(&self) -> PagingOptions {
        PagingOptions {
            default_page_size: self.paging.default_page_size,
            max_page_size: self.paging.max_page_size,
            default_window: Duration::hours(i64::from(self.paging.default_window_hours)),
        }
    }
}

// ============================================================================
// Server
// ============================================================================

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// `host:port` to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7000
}

// ============================================================================
// Paging
// ============================================================================

/// Page size limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PagingConfig {
    /// Used when a request has neither a page size nor a cursor
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,

    /// Larger requested sizes are clamped to this
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,

    /// Length of the trailing window used when `begin` is absent
    #[serde(default = "default_window_hours")]
    pub default_window_hours: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            default_window_hours: default_window_hours(),
        }
    }
}

fn default_page_size() -> i64 {
    500
}

fn default_max_page_size() -> i64 {
    5000
}

/// Longest accepted default window
const MAX_WINDOW_HOURS: u32 = 876_000;

fn default_window_hours() -> u32 {
    24
}

// ============================================================================
// Source
// ============================================================================

/// Data source backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Process memory, lost on exit
    #[default]
    Memory,
    /// DuckDB database file (or in-memory DuckDB without a path)
    Duckdb,
}

/// Data source configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// DuckDB database file
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// JSON seed loaded at startup
    #[serde(default)]
    pub seed: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_yaml_str("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.server.bind_address(), "0.0.0.0:7000");
        assert_eq!(config.paging_options(), PagingOptions::default());
        assert_eq!(config.source.kind, SourceKind::Memory);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
server:
  host: 127.0.0.1
  port: 8080
paging:
  default_page_size: 100
  max_page_size: 1000
  default_window_hours: 6
source:
  kind: duckdb
  path: /tmp/series.duckdb
  seed: seed.json
"#;
        let config = ServiceConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.server.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.source.kind, SourceKind::Duckdb);
        assert_eq!(config.source.path, Some(PathBuf::from("/tmp/series.duckdb")));

        let options = config.paging_options();
        assert_eq!(options.default_page_size, 100);
        assert_eq!(options.max_page_size, 1000);
        assert_eq!(options.default_window, Duration::hours(6));
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config = ServiceConfig::from_yaml_str("paging:\n  max_page_size: 800\n").unwrap();
        assert_eq!(config.paging.default_page_size, 500);
        assert_eq!(config.paging.max_page_size, 800);
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_validation_errors() {
        for yaml in [
            "paging:\n  default_page_size: 0\n",
            "paging:\n  default_page_size: 600\n  max_page_size: 100\n",
            "paging:\n  default_window_hours: 0\n",
            "paging:\n  default_window_hours: 4000000000\n",
            "source:\n  path: /tmp/x.duckdb\n",
        ] {
            let err = ServiceConfig::from_yaml_str(yaml).unwrap_err();
            assert!(matches!(err, Error::Config { .. }), "{yaml}: {err:?}");
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ServiceConfig::from_yaml_str("paging:\n  page_size: 10\n").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 9000").unwrap();
        let config = ServiceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_missing_file() {
        let err = ServiceConfig::from_file("/nonexistent/series-pager.yaml").unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
