//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + provider
//! variables (`OPENAI_API_KEY`, `QDRANT_URL`, `QDRANT_API_KEY`) + `APP_*` env
//! vars, later sources winning. Nested keys in `APP_*` use `__`, e.g.
//! `APP_QDRANT__COLLECTION`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::{FilterConfig, WeightVector};

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment
            .merge(Env::raw().only(&["OPENAI_API_KEY"]).map(|_| "embedding.api_key".into()))
            .merge(Env::raw().only(&["QDRANT_URL"]).map(|_| "qdrant.url".into()))
            .merge(Env::raw().only(&["QDRANT_API_KEY"]).map(|_| "qdrant.api_key".into()))
            .merge(Env::prefixed("APP_").split("__"));

        let config = Self::from_figment(figment, env_name);
        config.validate_for_env()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment, env_name: &str) -> Self {
        Self { figment, env_name: env_name.to_string() }
    }

    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    /// Typed view of the whole configuration, validated.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self) -> Result<()> {
        match self.env_name.as_str() {
            "prod" | "production" => {
                let settings = self.settings()?;
                if settings.embedding.use_fake {
                    return Err(Error::InvalidConfig("fake embeddings are not allowed in production".into()));
                }
                if settings.embedding.api_key.as_deref().map_or(true, str::is_empty) {
                    return Err(Error::InvalidConfig("embedding.api_key is required in production".into()));
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub embedding: EmbeddingSettings,
    pub qdrant: QdrantSettings,
    pub search: SearchSettings,
    pub catalog: CatalogSettings,
    pub server: ServerSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.search.filter_config().validate()?;
        self.search.default_weights.validate().map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if self.search.overfetch_factor == 0 {
            return Err(Error::InvalidConfig("search.overfetch_factor must be at least 1".into()));
        }
        if self.search.default_limit == 0 || self.search.default_limit > self.search.max_limit {
            return Err(Error::InvalidConfig(format!(
                "search.default_limit ({}) must be in 1..=max_limit ({})",
                self.search.default_limit, self.search.max_limit
            )));
        }
        if self.embedding.dimension == 0 {
            return Err(Error::InvalidConfig("embedding.dimension must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub api_base: String,
    pub model: String,
    pub dimension: usize,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub use_fake: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-ada-002".to_string(),
            dimension: 1536,
            api_key: None,
            timeout_secs: 30,
            use_fake: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub timeout_secs: u64,
}

impl Default for QdrantSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            api_key: None,
            collection: "interior_images".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_limit: usize,
    pub max_limit: usize,
    /// Candidates requested from the index per result slot.
    pub overfetch_factor: usize,
    pub high_relevance_threshold: f32,
    pub min_relevance_threshold: f32,
    pub exact_match_threshold: f32,
    pub default_weights: WeightVector,
}

impl Default for SearchSettings {
    fn default() -> Self {
        let thresholds = FilterConfig::default();
        Self {
            default_limit: 10,
            max_limit: 100,
            overfetch_factor: 3,
            high_relevance_threshold: thresholds.high_relevance_threshold,
            min_relevance_threshold: thresholds.min_relevance_threshold,
            exact_match_threshold: thresholds.exact_match_threshold,
            default_weights: WeightVector::default(),
        }
    }
}

impl SearchSettings {
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            high_relevance_threshold: self.high_relevance_threshold,
            min_relevance_threshold: self.min_relevance_threshold,
            exact_match_threshold: self.exact_match_threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub csv_path: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self { csv_path: "data/interior-image-urls.csv".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 3000, request_timeout_secs: 30 }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
