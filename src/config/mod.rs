/// Configuration system for git-time-machine
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables (including `.env`) > Config file > Defaults
use crate::error::{ConfigError, TimeMachineError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Where vectors, the catalog and scratch clones live
    #[serde(default)]
    pub storage: StorageConfig,

    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Load pipeline configuration
    #[serde(default)]
    pub loader: LoaderConfig,
}

/// Storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// LanceDB data directory path
    #[serde(default = "default_lancedb_path")]
    pub lancedb_path: PathBuf,

    /// SQLite catalog database path
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Directory the remote repository is cloned into (wiped on every load)
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider: "openai" (HTTP, OpenAI-compatible) or "fastembed" (local)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name sent to the provider
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Expected vector dimension (openai provider)
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// API key, only ever read from the environment
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

/// Load pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Number of contiguous commit ranges processed concurrently
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,

    /// Branch cloned when none is given
    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Comma-separated tool chains used when none are given
    #[serde(default = "default_tool_chains")]
    pub default_tool_chains: String,

    /// Width of a time partition in days
    #[serde(default = "default_time_partition_days")]
    pub time_partition_days: u32,

    /// Text length the langchain path truncates to before retrying an embedding
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
}

fn default_lancedb_path() -> PathBuf {
    crate::paths::PlatformPaths::default_lancedb_path()
}

fn default_catalog_path() -> PathBuf {
    crate::paths::PlatformPaths::default_catalog_path()
}

fn default_scratch_dir() -> PathBuf {
    crate::paths::PlatformPaths::default_scratch_dir()
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model_name() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_dimension() -> usize {
    1536
}

fn default_embedding_timeout() -> u64 {
    60
}

fn default_max_threads() -> usize {
    6
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_tool_chains() -> String {
    "langchain".to_string()
}

fn default_time_partition_days() -> u32 {
    7
}

fn default_max_text_length() -> usize {
    2048
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            lancedb_path: default_lancedb_path(),
            catalog_path: default_catalog_path(),
            scratch_dir: default_scratch_dir(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model_name: default_model_name(),
            api_base: default_api_base(),
            dimension: default_dimension(),
            timeout_secs: default_embedding_timeout(),
            api_key: None,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_threads: default_max_threads(),
            default_branch: default_branch(),
            default_tool_chains: default_tool_chains(),
            time_partition_days: default_time_partition_days(),
            max_text_length: default_max_text_length(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, TimeMachineError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location or create default
    pub fn load_or_default() -> Result<Self, TimeMachineError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::info!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), TimeMachineError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), TimeMachineError> {
        if self.embedding.provider != "openai" && self.embedding.provider != "fastembed" {
            return Err(ConfigError::InvalidValue {
                key: "embedding.provider".to_string(),
                reason: format!(
                    "must be 'openai' or 'fastembed', got '{}'",
                    self.embedding.provider
                ),
            }
            .into());
        }

        if self.embedding.dimension == 0 {
            return Err(ConfigError::InvalidValue {
                key: "embedding.dimension".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.loader.max_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "loader.max_threads".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.loader.time_partition_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "loader.time_partition_days".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.loader.max_text_length == 0 {
            return Err(ConfigError::InvalidValue {
                key: "loader.max_text_length".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        crate::toolchain::ToolChainKind::parse_list(&self.loader.default_tool_chains).map_err(
            |e| ConfigError::InvalidValue {
                key: "loader.default_tool_chains".to_string(),
                reason: e.to_string(),
            },
        )?;

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (the environment in production)
    pub(crate) fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty()) {
            self.embedding.api_key = Some(key);
        }

        if let Some(path) = lookup("GIT_TIME_MACHINE_LANCEDB_PATH") {
            self.storage.lancedb_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("GIT_TIME_MACHINE_CATALOG_PATH") {
            self.storage.catalog_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("GIT_TIME_MACHINE_SCRATCH_DIR") {
            self.storage.scratch_dir = PathBuf::from(path);
        }

        if let Some(provider) = lookup("GIT_TIME_MACHINE_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }

        if let Some(model) = lookup("GIT_TIME_MACHINE_MODEL") {
            self.embedding.model_name = model;
        }

        if let Some(base) = lookup("GIT_TIME_MACHINE_API_BASE") {
            self.embedding.api_base = base;
        }

        if let Some(threads) = lookup("GIT_TIME_MACHINE_MAX_THREADS")
            && let Ok(n) = threads.parse()
        {
            self.loader.max_threads = n;
        }
    }

    /// Load from an explicit file (or the default location), then apply
    /// environment overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self, TimeMachineError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::load_or_default()?,
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Create a new Config with defaults and environment overrides
    pub fn new() -> Result<Self, TimeMachineError> {
        Self::load(None)
    }
}
