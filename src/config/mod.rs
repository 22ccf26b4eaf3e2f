use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::OutputFormat;
use crate::resolve::RetryPolicy;
use crate::sources::SourceKind;

const LOCAL_CONFIG_FILE: &str = "fetch-transcript.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Retry behaviour of the resolver
    pub retry: RetryConfig,

    /// Upstream transcript backend settings
    pub source: SourceConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Fixed pause between attempts
    pub delay_seconds: u64,

    /// Stop early on failures another attempt cannot fix
    pub fail_fast: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Backend used to list and fetch transcripts
    pub backend: SourceKind,

    /// Base URL of the YouTube player API
    pub innertube_base_url: String,

    /// Innertube client identity
    pub client_name: String,
    pub client_version: String,

    /// Optional Innertube API key
    pub api_key: Option<String>,

    /// yt-dlp executable
    pub yt_dlp_path: String,

    /// Per-request timeout
    pub timeout_seconds: u64,

    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Language to prefer when none is given on the command line
    pub default_language: String,

    /// Default output format
    pub default_output_format: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_seconds: 5,
            fail_fast: false,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            backend: SourceKind::Innertube,
            innertube_base_url: "https://www.youtube.com".to_string(),
            client_name: "WEB".to_string(),
            client_version: "2.20250626.01.00".to_string(),
            api_key: None,
            yt_dlp_path: "yt-dlp".to_string(),
            timeout_seconds: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            default_output_format: "json".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults when there is none
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("transcript-fetcher").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }

        if self.source.timeout_seconds == 0 {
            anyhow::bail!("source.timeout_seconds must be at least 1");
        }

        if self.app.default_language.trim().is_empty() {
            anyhow::bail!("app.default_language must not be empty");
        }

        self.output_format()?;

        Ok(())
    }

    /// Parse the configured default output format
    pub fn output_format(&self) -> Result<OutputFormat> {
        <OutputFormat as clap::ValueEnum>::from_str(&self.app.default_output_format, true)
            .map_err(|_| {
                anyhow::anyhow!(
                    "Unknown output format in config: {}",
                    self.app.default_output_format
                )
            })
    }

    /// Retry policy described by this configuration
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_secs(self.retry.delay_seconds),
        )
        .with_fail_fast(self.retry.fail_fast)
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Backend: {}", self.source.backend);
        println!("  Max Attempts: {}", self.retry.max_attempts);
        println!("  Delay Between Attempts: {}s", self.retry.delay_seconds);
        println!("  Fail Fast: {}", self.retry.fail_fast);
        println!("  Timeout: {}s", self.source.timeout_seconds);
        if self.source.backend == SourceKind::YtDlp {
            println!("  yt-dlp: {}", self.source.yt_dlp_path);
        }
        println!("  Default Language: {}", self.app.default_language);
        println!("  Default Format: {}", self.app.default_output_format);
    }
}
