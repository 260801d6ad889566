//! Provider configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use brainkey_core::traits::LessonProvider;

use crate::fallback::{OfflineProvider, ResilientProvider};
use crate::gemini::GeminiProvider;
use crate::openai::OpenAiProvider;

/// Configuration for a single lesson provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Gemini {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
        }
    }
}

/// Top-level brainkey configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrainkeyConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Default provider to use.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Default model to use.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Max retries on provider errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Serve the offline lesson when generation fails.
    #[serde(default = "default_offline_fallback")]
    pub offline_fallback: bool,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    crate::gemini::DEFAULT_MODEL.to_string()
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_offline_fallback() -> bool {
    true
}

impl Default for BrainkeyConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            offline_fallback: default_offline_fallback(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Gemini { api_key, base_url } => ProviderConfig::Gemini {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `brainkey.toml` in the current directory
/// 2. `~/.config/brainkey/config.toml`
///
/// Environment variable overrides: `BRAINKEY_GEMINI_KEY`, `BRAINKEY_OPENAI_KEY`.
pub fn load_config() -> Result<BrainkeyConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<BrainkeyConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("brainkey.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<BrainkeyConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => BrainkeyConfig::default(),
    };

    apply_env_overrides(&mut config);

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    Ok(config)
}

fn apply_env_overrides(config: &mut BrainkeyConfig) {
    if let Ok(key) = std::env::var("BRAINKEY_GEMINI_KEY") {
        let entry = config
            .providers
            .entry("gemini".into())
            .or_insert(ProviderConfig::Gemini {
                api_key: String::new(),
                base_url: None,
            });
        if let ProviderConfig::Gemini { api_key, .. } = entry {
            *api_key = key;
        }
    }

    if let Ok(key) = std::env::var("BRAINKEY_OPENAI_KEY") {
        let entry = config
            .providers
            .entry("openai".into())
            .or_insert(ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                org_id: None,
            });
        if let ProviderConfig::OpenAI { api_key, .. } = entry {
            *api_key = key;
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("brainkey"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(
    config: &ProviderConfig,
    model: Option<String>,
) -> Result<Arc<dyn LessonProvider>> {
    match config {
        ProviderConfig::Gemini { api_key, base_url } => Ok(Arc::new(GeminiProvider::new(
            api_key,
            base_url.clone(),
            model,
        )?)),
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => Ok(Arc::new(OpenAiProvider::new(
            api_key,
            base_url.clone(),
            org_id.clone(),
            model,
        )?)),
    }
}

/// Choices made on the command line that override the config file.
#[derive(Debug, Clone, Default)]
pub struct ProviderSelection {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub offline: bool,
}

/// Build the provider the shell talks to: the named (or default) provider
/// wrapped in retries and the offline fallback.
///
/// With `offline`, or when the named provider is not configured and the
/// fallback is enabled, the offline provider is used directly.
pub fn build_provider(
    config: &BrainkeyConfig,
    selection: &ProviderSelection,
) -> Result<Arc<dyn LessonProvider>> {
    if selection.offline {
        return Ok(Arc::new(OfflineProvider));
    }

    let name = selection
        .provider
        .as_deref()
        .unwrap_or(&config.default_provider);

    let Some(provider_config) = config.providers.get(name) else {
        if config.offline_fallback {
            warn!(provider = name, "provider not configured, lessons will be offline");
            return Ok(Arc::new(OfflineProvider));
        }
        anyhow::bail!(
            "provider '{name}' not found in config. Run `brainkey init` or set BRAINKEY_GEMINI_KEY"
        );
    };

    // default_model belongs to default_provider; other providers keep their own default.
    let model = selection
        .model
        .clone()
        .or_else(|| (name == config.default_provider).then(|| config.default_model.clone()));
    let inner = create_provider(provider_config, model)
        .with_context(|| format!("failed to create provider '{name}'"))?;

    Ok(Arc::new(
        ResilientProvider::new(inner)
            .with_retries(
                config.max_retries,
                Duration::from_millis(config.retry_delay_ms),
            )
            .with_fallback(config.offline_fallback),
    ))
}
