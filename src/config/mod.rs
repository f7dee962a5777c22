//! Configuration management for faqrag
//!
//! Settings come from an optional TOML file; the store endpoint and
//! credentials come from environment variables named in `[store]`.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Collection name on the store
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// Page the import crawl starts from
    #[serde(default = "default_seed_url")]
    pub seed_url: String,

    /// Web crawling configuration
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Batch import configuration
    #[serde(default)]
    pub batch: BatchConfig,

    /// Store connection configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// QA extraction configuration
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Query configuration
    #[serde(default)]
    pub query: QueryConfig,
}

/// Web crawling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Maximum pages fetched in one crawl
    #[serde(default = "default_crawl_max_pages")]
    pub max_pages: u32,

    /// Request timeout in seconds
    #[serde(default = "default_crawl_timeout")]
    pub timeout_secs: u64,

    /// Total time budget for one crawl in seconds
    #[serde(default = "default_crawl_max_secs")]
    pub max_crawl_secs: u64,

    /// User agent string
    #[serde(default = "default_crawl_user_agent")]
    pub user_agent: String,
}

/// Batch import configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Size of the first batch sent to the store
    #[serde(default = "default_batch_initial_size")]
    pub initial_size: usize,

    /// Largest batch the dynamic sizing may grow to
    #[serde(default = "default_batch_max_size")]
    pub max_size: usize,

    /// Import stops once failures exceed this count
    #[serde(default = "default_batch_max_errors")]
    pub max_errors: usize,
}

/// Store connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Environment variable name for the store endpoint
    #[serde(default = "default_store_url_env")]
    pub url_env: String,

    /// Environment variable name for the store API key
    #[serde(default = "default_store_api_key_env")]
    pub api_key_env: String,

    /// Environment variable name for the optional Cohere API key
    #[serde(default = "default_cohere_api_key_env")]
    pub cohere_api_key_env: String,

    /// Vectorizer module used when creating the collection
    #[serde(default = "default_vectorizer")]
    pub vectorizer: String,

    /// Generative module used when creating the collection
    #[serde(default = "default_generative")]
    pub generative: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

/// QA extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Label for questions that match no rule
    #[serde(default = "default_category")]
    pub default_category: String,

    /// Extra keyword rules, evaluated after the built-in table
    #[serde(default)]
    pub categories: Vec<CategoryRuleConfig>,
}

/// A keyword rule from the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRuleConfig {
    pub label: String,
    pub keywords: Vec<String>,
}

/// Query configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Default number of results
    #[serde(default = "default_query_limit")]
    pub default_limit: usize,
}

/// Endpoint and credentials resolved from the environment
#[derive(Debug, Clone)]
pub struct StoreCredentials {
    pub url: String,
    pub api_key: String,
    pub cohere_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collection_name: default_collection_name(),
            seed_url: default_seed_url(),
            crawl: CrawlConfig::default(),
            batch: BatchConfig::default(),
            store: StoreConfig::default(),
            extract: ExtractConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: default_crawl_max_pages(),
            timeout_secs: default_crawl_timeout(),
            max_crawl_secs: default_crawl_max_secs(),
            user_agent: default_crawl_user_agent(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            initial_size: default_batch_initial_size(),
            max_size: default_batch_max_size(),
            max_errors: default_batch_max_errors(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url_env: default_store_url_env(),
            api_key_env: default_store_api_key_env(),
            cohere_api_key_env: default_cohere_api_key_env(),
            vectorizer: default_vectorizer(),
            generative: default_generative(),
            timeout_secs: default_store_timeout(),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            default_category: default_category(),
            categories: Vec::new(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_query_limit(),
        }
    }
}

impl Config {
    /// Get the default base directory for faqrag (~/.faqrag)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".faqrag")
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let config_file = base_dir
            .unwrap_or_else(Self::default_base_dir)
            .join("config.toml");

        if config_file.exists() {
            return Self::load(&config_file);
        }

        debug!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Resolve store endpoint and credentials from the process environment
    pub fn store_credentials(&self) -> Result<StoreCredentials> {
        self.store_credentials_with(|name| std::env::var(name).ok())
    }

    /// Resolve store endpoint and credentials through a variable lookup
    pub fn store_credentials_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<StoreCredentials> {
        let required = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    Error::Config(format!("Environment variable {} is not set", name))
                })
        };

        let url = required(&self.store.url_env)?;
        let api_key = required(&self.store.api_key_env)?;
        let cohere_api_key = lookup(&self.store.cohere_api_key_env).filter(|v| !v.is_empty());

        Ok(StoreCredentials {
            url,
            api_key,
            cohere_api_key,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Weaviate class names; the name also lands in GraphQL and URL paths
        let class_pattern = Regex::new(r"^[A-Za-z][_0-9A-Za-z]*$")
            .map_err(|e| Error::Config(format!("Invalid collection name pattern: {}", e)))?;
        if !class_pattern.is_match(&self.collection_name) {
            return Err(Error::Config(format!(
                "collection_name '{}' must start with a letter and contain only letters, digits and '_'",
                self.collection_name
            )));
        }

        if self.crawl.max_pages == 0 {
            return Err(Error::Config("crawl.max_pages must be positive".to_string()));
        }

        if self.crawl.timeout_secs == 0 || self.crawl.max_crawl_secs == 0 {
            return Err(Error::Config(
                "crawl.timeout_secs and crawl.max_crawl_secs must be positive".to_string(),
            ));
        }

        if self.batch.initial_size == 0 {
            return Err(Error::Config(
                "batch.initial_size must be positive".to_string(),
            ));
        }

        if self.batch.max_size < self.batch.initial_size {
            return Err(Error::Config(
                "batch.max_size must be >= batch.initial_size".to_string(),
            ));
        }

        if self.store.timeout_secs == 0 {
            return Err(Error::Config("store.timeout_secs must be positive".to_string()));
        }

        if self.extract.default_category.trim().is_empty() {
            return Err(Error::Config(
                "extract.default_category must not be empty".to_string(),
            ));
        }

        for rule in &self.extract.categories {
            if rule.label.trim().is_empty() {
                return Err(Error::Config(
                    "extract.categories entries need a label".to_string(),
                ));
            }
            if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(Error::Config(format!(
                    "category '{}' has no keywords",
                    rule.label
                )));
            }
        }

        if self.query.default_limit == 0 {
            return Err(Error::Config("query.default_limit must be positive".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.collection_name, "faq");
        assert_eq!(config.batch.max_errors, 10);
        assert_eq!(config.query.default_limit, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_missing_dir_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(config.seed_url, default_seed_url());
    }

    #[test]
    fn test_load_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
collection_name = "gtc_faq"

[crawl]
max_pages = 5

[[extract.categories]]
label = "Travel"
keywords = ["hotel", "visa"]
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(config.collection_name, "gtc_faq");
        assert_eq!(config.crawl.max_pages, 5);
        assert_eq!(config.crawl.timeout_secs, default_crawl_timeout());
        assert_eq!(config.extract.categories[0].label, "Travel");
    }

    #[test]
    fn test_load_explicit_missing_path_fails() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load(&tmp.path().join("nope.toml")).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.batch.max_size = config.batch.initial_size - 1;
        assert!(config.validate().is_err());

        config.batch.max_size = config.batch.initial_size;
        assert!(config.validate().is_ok());

        config.crawl.max_pages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_collection_name_must_be_a_class_name() {
        let mut config = Config::default();

        for name in ["faq", "Faq", "gtc_faq2"] {
            config.collection_name = name.to_string();
            assert!(config.validate().is_ok(), "{} should be accepted", name);
        }

        for name in ["", "1faq", "faq-2", "_faq", "Faq(limit: 9) { x }", "faq/../v1"] {
            config.collection_name = name.to_string();
            let err = config.validate().unwrap_err();
            assert!(err.is_config(), "{} should be rejected", name);
        }
    }

    #[test]
    fn test_store_credentials_require_url_and_key() {
        let config = Config::default();

        let env: HashMap<&str, &str> = HashMap::from([("WEAVIATE_URL", "https://x.weaviate.cloud")]);
        let err = config
            .store_credentials_with(|name| env.get(name).map(|v| v.to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("WEAVIATE_API_KEY"));

        let env: HashMap<&str, &str> = HashMap::from([
            ("WEAVIATE_URL", "https://x.weaviate.cloud"),
            ("WEAVIATE_API_KEY", "secret"),
        ]);
        let creds = config
            .store_credentials_with(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(creds.api_key, "secret");
        assert!(creds.cohere_api_key.is_none());
    }

    #[test]
    fn test_blank_credential_is_missing() {
        let config = Config::default();
        let err = config
            .store_credentials_with(|_| Some("  ".to_string()))
            .unwrap_err();
        assert!(err.is_config());
    }
}
