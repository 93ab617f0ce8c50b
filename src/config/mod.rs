//! Settings: engine selection, search and ingestion defaults
//!
//! Loaded from `~/.rowseek/config.toml` when present; every key is optional.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const APP_DIR: &str = ".rowseek";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub search: SearchSettings,
    pub ingest: IngestSettings,
}

/// Which engine backs the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Local tantivy indices under `data_dir`
    #[default]
    Embedded,
    /// Remote Elasticsearch at `url`
    Elastic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub backend: Backend,

    /// Storage root of the embedded engine
    pub data_dir: PathBuf,

    /// Elasticsearch base URL
    pub url: String,

    /// Index writer heap size in bytes (default: 50MB)
    pub writer_heap_bytes: usize,

    /// Make remote writes visible to search before returning
    pub refresh: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Embedded,
            data_dir: app_dir().join("data"),
            url: "http://localhost:9200".to_string(),
            writer_heap_bytes: 50_000_000, // 50MB
            refresh: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Maximum documents returned per search
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: crate::search::DEFAULT_MAX_RESULTS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Records echoed back after a successful ingest
    pub preview_rows: usize,
    pub delimiter: char,
    pub has_headers: bool,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            preview_rows: crate::ingest::DEFAULT_PREVIEW_ROWS,
            delimiter: ',',
            has_headers: true,
        }
    }
}

impl IngestSettings {
    /// The delimiter as the single byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        delimiter_byte(self.delimiter)
    }
}

/// Validate a delimiter character.
pub fn delimiter_byte(delimiter: char) -> Result<u8> {
    if delimiter.is_ascii() && delimiter != '\n' && delimiter != '\r' && delimiter != '"' {
        Ok(delimiter as u8)
    } else {
        Err(Error::Config(format!(
            "delimiter must be a single ASCII character other than quote or newline, got {delimiter:?}"
        )))
    }
}

impl Settings {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        app_dir().join("config.toml")
    }

    /// Load settings from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.search.max_results == 0 {
            return Err(Error::Config("search.max_results must be positive".to_string()));
        }
        if self.engine.writer_heap_bytes < 15_000_000 {
            // tantivy refuses smaller writer budgets
            return Err(Error::Config(
                "engine.writer_heap_bytes must be at least 15000000".to_string(),
            ));
        }
        self.ingest.delimiter_byte()?;
        Ok(())
    }
}

fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.engine.backend, Backend::Embedded);
        assert_eq!(settings.search.max_results, 100);
        assert_eq!(settings.ingest.preview_rows, 6);
        assert!(settings.engine.refresh);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = Settings::from_toml(
            r#"
            [engine]
            backend = "elastic"
            url = "http://search:9200"

            [ingest]
            delimiter = ";"
            "#,
        )
        .unwrap();
        assert_eq!(settings.engine.backend, Backend::Elastic);
        assert_eq!(settings.engine.url, "http://search:9200");
        assert_eq!(settings.engine.writer_heap_bytes, 50_000_000);
        assert_eq!(settings.ingest.delimiter_byte().unwrap(), b';');
        assert!(settings.ingest.has_headers);
    }

    #[test]
    fn reads_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[search]\nmax_results = 20\n").unwrap();
        assert_eq!(Settings::load(&path).unwrap().search.max_results, 20);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Settings::from_toml("[engine]\nbackend = \"solr\"\n"),
            Err(Error::Config(_))
        ));
        assert!(Settings::from_toml("[search]\nmax_results = 0\n").is_err());
        assert!(Settings::from_toml("[ingest]\ndelimiter = \"é\"\n").is_err());
    }
}
