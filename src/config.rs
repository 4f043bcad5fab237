//! Configuration management for the timeline tools.
//!
//! Settings start from built-in defaults, are overlaid with an optional
//! `timeline.toml`, and finally with command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audit::DEFAULT_IMAGE_YEAR_CUTOFF;
use crate::store::{StoreLayout, DEFAULT_HEADER};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "timeline.toml";

/// Effective settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// The JavaScript data file edited by every command.
    pub data_file: PathBuf,
    /// Directory holding the edit tables.
    pub tables_dir: PathBuf,
    /// Comment written on the first line of the data file.
    pub header_comment: String,
    pub data_var: String,
    pub citations_var: String,
    pub categories_var: String,
    /// Append `window.<var> = <var>;` exports after the declarations.
    pub export_globals: bool,
    /// Entries dated after this year are left out of the image report.
    pub image_year_cutoff: u32,
    /// Directory served by the dev server.
    pub serve_root: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("timeline-data.js"),
            tables_dir: PathBuf::from("tables"),
            header_comment: DEFAULT_HEADER.to_string(),
            data_var: "timelineData".to_string(),
            citations_var: "timelineCitations".to_string(),
            categories_var: "timelineCategories".to_string(),
            export_globals: true,
            image_year_cutoff: DEFAULT_IMAGE_YEAR_CUTOFF,
            serve_root: PathBuf::from("."),
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Settings {
    /// Layout of the generated data file.
    pub fn layout(&self) -> StoreLayout {
        StoreLayout {
            header: self.header_comment.clone(),
            data_var: self.data_var.clone(),
            citations_var: self.citations_var.clone(),
            categories_var: self.categories_var.clone(),
            export_globals: self.export_globals,
        }
    }

    /// Path of a table file, unless overridden.
    pub fn table_path(&self, name: &str, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.tables_dir.join(name))
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path of the data file.
    #[serde(default)]
    pub data_file: Option<String>,
    /// Directory of the edit tables.
    #[serde(default)]
    pub tables_dir: Option<String>,
    #[serde(default)]
    pub header_comment: Option<String>,
    /// Variable names of the declarations in the data file.
    #[serde(default)]
    pub variables: VariableNames,
    #[serde(default)]
    pub export_globals: Option<bool>,
    #[serde(default)]
    pub image_year_cutoff: Option<u32>,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableNames {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub citations: Option<String>,
    #[serde(default)]
    pub categories: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `timeline.toml` in the
    /// working directory is used if present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };

        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref data_file) = self.data_file {
            settings.data_file = expand_path(data_file);
        }
        if let Some(ref tables_dir) = self.tables_dir {
            settings.tables_dir = expand_path(tables_dir);
        }
        if let Some(ref header) = self.header_comment {
            settings.header_comment = header.clone();
        }
        if let Some(ref name) = self.variables.data {
            settings.data_var = name.clone();
        }
        if let Some(ref name) = self.variables.citations {
            settings.citations_var = name.clone();
        }
        if let Some(ref name) = self.variables.categories {
            settings.categories_var = name.clone();
        }
        if let Some(export) = self.export_globals {
            settings.export_globals = export;
        }
        if let Some(cutoff) = self.image_year_cutoff {
            settings.image_year_cutoff = cutoff;
        }
        if let Some(ref root) = self.server.root {
            settings.serve_root = expand_path(root);
        }
        if let Some(ref host) = self.server.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.server.port {
            settings.port = port;
        }
    }
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Load settings from the configuration file.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let config = Config::load(path)?;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.layout().data_var, "timelineData");
        assert_eq!(
            settings.table_path("citations.toml", None),
            PathBuf::from("tables/citations.toml")
        );
        assert_eq!(
            settings.table_path("citations.toml", Some(Path::new("x.toml"))),
            PathBuf::from("x.toml")
        );
    }

    #[test]
    fn test_config_overrides_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.toml");
        fs::write(
            &path,
            r#"
data_file = "site/timeline-data.js"
export_globals = false

[variables]
citations = "sources"

[server]
port = 9000
"#,
        )
        .unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.data_file, PathBuf::from("site/timeline-data.js"));
        assert_eq!(settings.citations_var, "sources");
        assert_eq!(settings.data_var, "timelineData");
        assert!(!settings.export_globals);
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.host, "0.0.0.0");
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent/timeline.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
