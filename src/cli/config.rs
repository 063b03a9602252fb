//! Doorman configuration file handling
//!
//! Provides default configuration generation and loading for the Doorman bot.
//! Configuration files are TOML format and stored adjacent to the ledger.
//!
//! The monitored channel set and the bot token are required for startup;
//! everything else has defaults.

use doorman::admission::DEFAULT_MIN_ACCOUNT_AGE_DAYS;
use doorman::telegram::traits::ChatId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Doorman bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoormanConfig {
    /// Telegram connection settings
    pub telegram: TelegramConfig,

    /// Channels this bot moderates
    pub channels: ChannelsConfig,

    /// Admission tuning
    #[serde(default)]
    pub moderation: ModerationConfig,

    /// Ledger storage
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Telegram-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from @BotFather. Falls back to the TELEGRAM_BOT_TOKEN
    /// environment variable when unset.
    pub token: Option<String>,
}

/// Monitored channel set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsConfig {
    /// Chat ids of the monitored channels. Requests and membership events
    /// for any other chat are ignored.
    pub monitored: Vec<i64>,
}

/// Admission tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Minimum account age in days before a known-age account passes the
    /// classifier.
    #[serde(default = "default_min_account_age_days")]
    pub min_account_age_days: i64,

    /// Courtesy pause between channels during a batch run, in seconds.
    #[serde(default = "default_channel_pause_secs")]
    pub channel_pause_secs: u64,

    /// Delay before a scheduled batch run starts, in seconds.
    #[serde(default = "default_batch_delay_secs")]
    pub batch_delay_secs: u64,
}

/// Ledger storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Path to the ledger JSON file.
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_min_account_age_days() -> i64 {
    DEFAULT_MIN_ACCOUNT_AGE_DAYS
}

fn default_channel_pause_secs() -> u64 {
    1
}

fn default_batch_delay_secs() -> u64 {
    1
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Default ledger location: ~/.local/share/doorman/ledger.json
pub fn default_ledger_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("doorman")
        .join("ledger.json")
}

/// Default config location: ~/.local/share/doorman/config.toml
pub fn default_config_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("doorman")
        .join("config.toml")
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            min_account_age_days: default_min_account_age_days(),
            channel_pause_secs: default_channel_pause_secs(),
            batch_delay_secs: default_batch_delay_secs(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl DoormanConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: DoormanConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Resolve the bot token: config value, else TELEGRAM_BOT_TOKEN.
    pub fn resolve_token(&self) -> Option<String> {
        self.telegram
            .token
            .clone()
            .or_else(|| std::env::var("TELEGRAM_BOT_TOKEN").ok())
    }

    /// Monitored channel set as domain ids.
    pub fn monitored_channels(&self) -> Vec<ChatId> {
        self.channels.monitored.iter().map(|id| ChatId(*id)).collect()
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml() -> String {
        format!(
            r#"# Doorman Bot Configuration
#
# Doorman moderates join requests for the channels listed under
# [channels]. Only channels in that list are acted upon.

[telegram]
# Bot token from @BotFather. Leave commented to use the
# TELEGRAM_BOT_TOKEN environment variable instead.
# token = "123456:ABC-DEF..."

[channels]
# Chat ids of the monitored channels (required, must be non-empty).
# Channel ids are negative numbers, e.g. -1001234567890.
monitored = []

[moderation]
# Accounts younger than this (when the platform exposes account age)
# are rejected.
min_account_age_days = {min_age}

# Pause between channels during a batch run, to respect rate limits.
channel_pause_secs = 1

# Delay before a scheduled batch run starts.
batch_delay_secs = 1

[ledger]
# Where the departure ledger is persisted.
path = "{ledger_path}"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"
"#,
            min_age = DEFAULT_MIN_ACCOUNT_AGE_DAYS,
            ledger_path = default_ledger_path().display()
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = Self::generate_default_toml();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, contents).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}
