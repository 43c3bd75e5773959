//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use parley_agent::CompressionPolicy;
use parley_ai::{ProviderKind, ProviderSettings, RequestOptions};

/// Configuration for parley
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default provider (claude, deepseek, yandexgpt)
    pub provider: Option<String>,
    /// Default model; provider default when unset
    pub model: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Maximum tokens per reply
    pub max_tokens: Option<u32>,
    /// System prompt for chat sessions
    pub system_prompt: Option<String>,
    /// Where conversations are stored
    pub storage_dir: Option<PathBuf>,
    /// Whole-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
    /// Yandex Cloud folder id (YandexGPT only)
    pub yandex_folder_id: Option<String>,
    /// History compression settings
    pub compression: CompressionPolicy,
    /// API keys (alternative to environment variables)
    pub api_keys: ApiKeys,
}

/// API key configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub anthropic: Option<String>,
    pub deepseek: Option<String>,
    pub yandex: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("parley")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PARLEY_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            provider: Some(ProviderKind::YandexGpt.id().to_string()),
            temperature: Some(parley_ai::DEFAULT_TEMPERATURE),
            max_tokens: Some(parley_ai::DEFAULT_MAX_TOKENS),
            request_timeout_secs: Some(60),
            ..Default::default()
        };

        default_config.save()?;
        Ok(path)
    }

    /// Provider to use, with a command-line override
    pub fn provider_kind(&self, cli: Option<&str>) -> parley_ai::Result<ProviderKind> {
        match cli.or(self.provider.as_deref()) {
            Some(name) => name.parse(),
            None => Ok(ProviderKind::YandexGpt),
        }
    }

    /// Directory for stored conversations
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("parley")
                .join("sessions")
        })
    }

    /// Get API key for a provider, checking config then env
    pub fn get_api_key(&self, kind: ProviderKind) -> Option<String> {
        let from_config = match kind {
            ProviderKind::Claude => self.api_keys.anthropic.clone(),
            ProviderKind::DeepSeek => self.api_keys.deepseek.clone(),
            ProviderKind::YandexGpt => self.api_keys.yandex.clone(),
        };

        from_config
            .filter(|key| !key.trim().is_empty())
            .or_else(|| non_empty_env(kind.api_key_env_var()))
    }

    /// Providers with an API key in config or the environment, in display
    /// order
    pub fn configured_providers(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.get_api_key(*kind).is_some())
            .collect()
    }

    /// Yandex folder id from config, then `YANDEX_FOLDER_ID`
    pub fn folder_id(&self) -> Option<String> {
        self.yandex_folder_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .or_else(|| non_empty_env("YANDEX_FOLDER_ID"))
    }

    /// Everything needed to build a client for `kind`
    pub fn provider_settings(&self, kind: ProviderKind) -> ProviderSettings {
        ProviderSettings {
            api_key: self.get_api_key(kind),
            base_url: None,
            folder_id: match kind {
                ProviderKind::YandexGpt => self.folder_id(),
                _ => None,
            },
            timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Request options from config values
    pub fn request_options(&self) -> RequestOptions {
        RequestOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            model: self.model.clone(),
            system: self.system_prompt.clone(),
            stop: None,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# parley configuration file
# Place at ~/.config/parley/config.toml (Linux), ~/Library/Application Support/parley/config.toml (Mac)
# or %APPDATA%\parley\config.toml (Windows). PARLEY_CONFIG_PATH overrides the location.

# Default provider (claude, deepseek, yandexgpt)
provider = "yandexgpt"

# Default model (provider default when unset)
# model = "yandexgpt/latest"

temperature = 1.0
max_tokens = 1024

# system_prompt = "You are a concise assistant."
# storage_dir = "/home/me/.local/share/parley/sessions"
request_timeout_secs = 60

# Required for YandexGPT (or set YANDEX_FOLDER_ID)
# yandex_folder_id = "b1g..."

[compression]
enabled = true
# Messages kept verbatim; older ones are summarized once history exceeds twice this
max_recent_messages = 6
# Token budget for the approaching-limit warning (shown at 80%)
warn_threshold = 4000

# API keys (optional - can also use environment variables
# ANTHROPIC_API_KEY, DEEPSEEK_API_KEY, YANDEX_API_KEY)
[api_keys]
# anthropic = "sk-ant-..."
# deepseek = "sk-..."
# yandex = "AQVN..."
"#
}
