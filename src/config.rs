// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! `COURSEGRAPH__SECTION__KEY` environment variables.

use crate::builder::DenylistPolicy;
use crate::course::SuffixPolicy;
use crate::extract::ExtractorStrategy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "COURSEGRAPH";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Course catalog settings
    pub catalog: CatalogConfig,
    /// Prerequisite extraction settings
    pub extractor: ExtractorConfig,
    /// Crawl bounds and policies
    pub crawl: CrawlConfig,
    /// HTTP service settings
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            catalog: CatalogConfig::default(),
            extractor: ExtractorConfig::default(),
            crawl: CrawlConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Course catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Outline endpoint queried with `dept` and `number` parameters
    pub base_url: String,
    /// Per-request timeout; none by default
    pub timeout_secs: Option<u64>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.sfucourses.com/v1/rest/outlines".to_string(),
            timeout_secs: None,
        }
    }
}

/// Prerequisite extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Which extractor to use
    pub strategy: ExtractorStrategy,
    /// Model API root for the `llm` strategy
    pub endpoint: String,
    /// Model name for the `llm` strategy
    pub model: String,
    /// Name of the environment variable holding the model API key
    pub api_key_env: String,
    /// Per-request timeout; none by default
    pub timeout_secs: Option<u64>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            strategy: ExtractorStrategy::Pattern,
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash-lite".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: None,
        }
    }
}

/// Crawl bounds and policies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Deepest recursion level that is still expanded (start course is 0)
    pub max_depth: usize,
    /// Courses that are never looked up
    pub denylist: Vec<String>,
    /// Whether denylisted prerequisites still produce links
    pub denylist_policy: DenylistPolicy,
    /// Whether suffix letters are part of a course id
    pub suffix_policy: SuffixPolicy,
    /// Look the start course up directly when the crawl yields no nodes
    pub fallback_lookup: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            denylist: vec!["CMPT 300".to_string()],
            denylist_policy: DenylistPolicy::Skip,
            suffix_policy: SuffixPolicy::Keep,
            fallback_lookup: true,
        }
    }
}

/// HTTP service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Default location of the configuration file
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "hyperpolymath", "coursegraph")
        .map(|d| d.config_dir().join("config.toml"))
}

/// Load configuration from disk and environment, or use defaults.
///
/// An explicit `path` must exist; the default location is optional.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let mut builder = ::config::Config::builder();

    let file = path.map(Path::to_path_buf).or_else(default_path);
    if let Some(file) = file {
        builder = builder.add_source(
            ::config::File::from(file.as_path())
                .format(::config::FileFormat::Toml)
                .required(path.is_some()),
        );
    }

    builder = builder.add_source(
        ::config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("crawl.denylist"),
    );

    builder
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration")
}

/// Render the configuration as TOML
pub fn to_toml(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize configuration")
}

/// Look up a dotted key such as `crawl.max_depth`
pub fn get(config: &Config, key: &str) -> Result<toml::Value> {
    let mut value = toml::Value::try_from(config).context("Failed to serialize configuration")?;
    for part in key.split('.') {
        value = value
            .get(part)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Unknown configuration key: {}", key))?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.crawl.max_depth, 5);
        assert_eq!(config.crawl.denylist, vec!["CMPT 300"]);
        assert!(config.crawl.fallback_lookup);
        assert_eq!(config.extractor.strategy, ExtractorStrategy::Pattern);
        assert_eq!(config.catalog.timeout_secs, None);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[crawl]\nmax_depth = 2\nsuffix_policy = \"drop\"\ndenylist = []\n\n[extractor]\nstrategy = \"llm\""
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.crawl.max_depth, 2);
        assert_eq!(config.crawl.suffix_policy, SuffixPolicy::Drop);
        assert!(config.crawl.denylist.is_empty());
        assert_eq!(config.extractor.strategy, ExtractorStrategy::Llm);
        // untouched sections keep their defaults
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.extractor.model, "gemini-2.5-flash-lite");
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_get_dotted_key() {
        let config = Config::default();
        assert_eq!(get(&config, "crawl.max_depth").unwrap(), toml::Value::Integer(5));
        assert_eq!(
            get(&config, "extractor.strategy").unwrap(),
            toml::Value::String("pattern".into())
        );
        assert!(get(&config, "crawl.nope").is_err());
    }

    #[test]
    fn test_to_toml_has_sections() {
        let text = to_toml(&Config::default()).unwrap();
        assert!(text.contains("[crawl]"));
        assert!(text.contains("max_depth = 5"));
    }
}
