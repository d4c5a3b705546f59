//! Provider-chain configuration.
//!
//! The chain is an ordered list of provider entries tried in declared order.
//! A legacy single-provider form (top-level `provider` / `api_key` / `model`
//! fields) is still accepted and treated as a one-element chain.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_PROVIDER: &str = "qwen";
pub const DEFAULT_MODEL: &str = "qwen-turbo";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Closed set of supported wire dialects, resolved once from the provider
/// name at configuration load — never re-matched by string per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// DashScope-native structured call (Qwen family).
    Qwen,
    /// OpenAI-compatible HTTP chat completion.
    OpenAi,
}

impl ProviderKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "qwen" | "dashscope" => Some(Self::Qwen),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }
}

/// One entry in the provider chain. Read-only at request time.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: String,
    pub base_url: Option<String>,
    pub api_key: String,
    pub model: String,
    pub timeout_ms: u64,
    /// Loaded for configuration compatibility; failover across the chain is
    /// the only retry mechanism, so no adapter consults this per call.
    pub max_retries: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROVIDER.into(),
            base_url: None,
            api_key: String::new(),
            model: DEFAULT_MODEL.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Top-level AI settings: the ordered chain plus legacy single-provider
/// fields used when the chain is empty.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub provider: String,
    pub base_url: Option<String>,
    pub api_key: String,
    pub model: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub providers: Vec<ProviderConfig>,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.into(),
            base_url: None,
            api_key: String::new(),
            model: DEFAULT_MODEL.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            providers: Vec::new(),
        }
    }
}

impl AiSettings {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// The chain in declared order, or the legacy single-provider fields
    /// wrapped as a one-element chain when no chain is configured.
    pub fn ordered_providers(&self) -> Vec<ProviderConfig> {
        if !self.providers.is_empty() {
            return self.providers.clone();
        }
        vec![ProviderConfig {
            name: self.provider.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            timeout_ms: self.timeout_ms,
            max_retries: self.max_retries,
        }]
    }
}
