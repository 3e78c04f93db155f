//! Configuration management for Ergon
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/ergon/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::error::{ErgonError, Result};
use crate::core::types::ExecutionBudget;

/// Main configuration for Ergon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ollama configuration
    pub ollama: OllamaConfig,
    /// Model configuration
    pub model: ModelConfig,
    /// Agent configuration
    pub agent: AgentConfig,
    /// Streaming configuration
    #[serde(default)]
    pub streaming: StreamingConfig,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Completion model driving the reasoning loop
    pub completion: String,
    /// Per-token pricing used for cost accounting
    #[serde(default)]
    pub pricing: PricingConfig,
}

/// Price per 1000 tokens; zero for local backends unless configured
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Price per 1000 prompt tokens
    pub input_per_1k: f64,
    /// Price per 1000 completion tokens
    pub output_per_1k: f64,
}

impl PricingConfig {
    /// Price of a single call with the given token counts
    pub fn price(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 / 1000.0) * self.input_per_1k
            + (output_tokens as f64 / 1000.0) * self.output_per_1k
    }
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum reasoning loop iterations before the fallback answer
    /// Default: 10; unset means unlimited
    pub max_iterations: Option<usize>,
    /// Maximum wall-clock seconds per run; unset means unlimited
    pub max_wall_time_secs: Option<f64>,
    /// Render only the last N scratchpad steps into the prompt; unset means all
    pub trim_last: Option<usize>,
    /// Whether to show debug output
    pub debug: bool,
    /// System prompt prefix
    pub preamble: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: Some(10),
            max_wall_time_secs: None,
            trim_last: None,
            debug: env::var("ERGON_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            preamble: None,
        }
    }
}

/// Streaming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Whether to stream responses in real-time
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            model: ModelConfig::default(),
            agent: AgentConfig::default(),
            streaming: StreamingConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            timeout_secs: 120,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            completion: env::var("ERGON_MODEL").unwrap_or_else(|_| "qwen3:8b".to_string()),
            pricing: PricingConfig::default(),
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            enabled: env::var("ERGON_STREAMING")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ergon")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        // Try to load from config file
        if let Ok(config) = Self::load_from_file() {
            return config;
        }

        // Fall back to defaults (which respect env vars)
        Self::default()
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(ErgonError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| ErgonError::config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ErgonError::config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| ErgonError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ErgonError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| ErgonError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Save configuration and return the path
    pub fn save_and_get_path(&self) -> Result<PathBuf> {
        self.save()?;
        Ok(Self::config_file())
    }

    /// Check if a config file exists
    pub fn config_exists() -> bool {
        Self::config_file().exists()
    }

    /// Delete the config file
    pub fn delete_config() -> Result<()> {
        let config_path = Self::config_file();
        if config_path.exists() {
            fs::remove_file(&config_path)
                .map_err(|e| ErgonError::config(format!("Failed to delete config: {}", e)))?;
        }
        Ok(())
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// The execution budget configured for each run
    pub fn budget(&self) -> ExecutionBudget {
        ExecutionBudget {
            max_iterations: self.agent.max_iterations,
            max_wall_time: self
                .agent
                .max_wall_time_secs
                .map(Duration::from_secs_f64),
        }
    }

    /// Update the completion model
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model.completion = model.into();
    }

    /// Set streaming enabled/disabled
    pub fn set_streaming(&mut self, enabled: bool) {
        self.streaming.enabled = enabled;
    }
}

impl OllamaConfig {
    /// Get the socket address
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
