use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub highlighting: HighlightingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    #[serde(default = "default_provider")]
    pub name: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider(),
            model: default_model(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Pages per provider call. Must stay strictly below the provider's hard
    /// page limit (observed: 1000).
    #[serde(default = "default_max_pages_per_chunk")]
    pub max_pages_per_chunk: u32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_pages_per_chunk: default_max_pages_per_chunk(),
        }
    }
}

fn default_max_pages_per_chunk() -> u32 {
    500
}

/// Thresholds for the quotation-matching policy. Kept as configuration so
/// the policy is tunable and testable in isolation from the pipeline.
#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    /// Quotations shorter than this (in chars, after trim) are never located.
    #[serde(default = "default_min_quote_chars")]
    pub min_quote_chars: usize,
    /// Mutual-prefix length used when verifying a provider offset hint.
    #[serde(default = "default_hint_verify_chars")]
    pub hint_verify_chars: usize,
    /// Prefix length for the fallback search when the full quotation is absent.
    #[serde(default = "default_search_prefix_chars")]
    pub search_prefix_chars: usize,
    /// How far from the naive end a sentence boundary may sit and still be
    /// used as the extended match end.
    #[serde(default = "default_boundary_window_chars")]
    pub boundary_window_chars: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_quote_chars: default_min_quote_chars(),
            hint_verify_chars: default_hint_verify_chars(),
            search_prefix_chars: default_search_prefix_chars(),
            boundary_window_chars: default_boundary_window_chars(),
        }
    }
}

fn default_min_quote_chars() -> usize {
    5
}
fn default_hint_verify_chars() -> usize {
    30
}
fn default_search_prefix_chars() -> usize {
    40
}
fn default_boundary_window_chars() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct HighlightingConfig {
    /// Number of distinct highlight colors before the cycle repeats.
    #[serde(default = "default_palette_size")]
    pub palette_size: u8,
}

impl Default for HighlightingConfig {
    fn default() -> Self {
        Self {
            palette_size: default_palette_size(),
        }
    }
}

fn default_palette_size() -> u8 {
    5
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

/// Load a config file when present, defaults otherwise. The CLI runs fine
/// without a `sumpane.toml`.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}
