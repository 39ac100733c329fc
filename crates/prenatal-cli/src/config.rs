use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "prenatal.toml";

/// Top-level configuration.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PrenatalConfig {
    /// SQLite record store.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Patient list settings.
    #[serde(default)]
    pub list: ListToml,

    /// Export settings.
    #[serde(default)]
    pub export: ExportToml,
}

impl Default for PrenatalConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            list: ListToml::default(),
            export: ExportToml::default(),
        }
    }
}

fn default_database() -> PathBuf {
    PathBuf::from("prenatal.db")
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ListToml {
    /// Window for the "due soon" filter.
    #[serde(default = "default_due_soon_days")]
    pub due_soon_days: u32,
}

impl Default for ListToml {
    fn default() -> Self {
        Self {
            due_soon_days: default_due_soon_days(),
        }
    }
}

fn default_due_soon_days() -> u32 {
    prenatal_core::listing::DEFAULT_DUE_SOON_DAYS
}

#[derive(Debug, Deserialize, PartialEq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ExportToml {
    /// Default output format for `export charts`.
    #[serde(default)]
    pub chart_format: ChartFormat,
}

impl PrenatalConfig {
    /// Load from `path`, or from `prenatal.toml` if present, or defaults.
    ///
    /// An explicitly given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    tracing::debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let toml_str = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: PrenatalConfig =
            toml::from_str(&toml_str).context("failed to parse TOML config")?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: PrenatalConfig = toml::from_str("").unwrap();
        assert_eq!(config, PrenatalConfig::default());
        assert_eq!(config.database, PathBuf::from("prenatal.db"));
        assert_eq!(config.list.due_soon_days, 30);
        assert_eq!(config.export.chart_format, ChartFormat::Json);
    }

    #[test]
    fn test_partial_file() {
        let config: PrenatalConfig = toml::from_str(
            r#"
            database = "/var/lib/prenatal/records.db"

            [list]
            due_soon_days = 14

            [export]
            chart_format = "csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.database, PathBuf::from("/var/lib/prenatal/records.db"));
        assert_eq!(config.list.due_soon_days, 14);
        assert_eq!(config.export.chart_format, ChartFormat::Csv);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(toml::from_str::<PrenatalConfig>("databse = \"x.db\"").is_err());
        assert!(toml::from_str::<PrenatalConfig>("[list]\nwindow = 3").is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[list]\ndue_soon_days = 7\n").unwrap();

        let config = PrenatalConfig::load(Some(&path)).unwrap();
        assert_eq!(config.list.due_soon_days, 7);

        assert!(PrenatalConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
