//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Wallet policy values.
    #[serde(default)]
    pub wallet: WalletConfig,
    /// Retry policy for transient store failures.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection before giving up.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout() -> u64 {
    5
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    604_800 // 7 days
}

/// Width of the stored gift message column, in characters.
///
/// `max_gift_message_len` is capped at this value.
pub const GIFT_MESSAGE_STORAGE_LEN: u32 = 200;

/// Wallet policy configuration.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct WalletConfig {
    /// Balance granted to every new account.
    #[serde(default = "default_starting_balance")]
    pub starting_balance: i64,
    /// Largest amount accepted by a single top-up.
    #[serde(default = "default_max_top_up")]
    pub max_top_up: i64,
    /// Maximum length of a gift message, in characters. Capped at
    /// `GIFT_MESSAGE_STORAGE_LEN`.
    #[serde(default = "default_max_gift_message_len")]
    pub max_gift_message_len: usize,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            starting_balance: default_starting_balance(),
            max_top_up: default_max_top_up(),
            max_gift_message_len: default_max_gift_message_len(),
        }
    }
}

fn default_starting_balance() -> i64 {
    500
}

fn default_max_top_up() -> i64 {
    10_000
}

fn default_max_gift_message_len() -> usize {
    GIFT_MESSAGE_STORAGE_LEN as usize
}

/// Retry configuration for transient store failures.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound for any single backoff delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    50
}

fn default_max_delay_ms() -> u64 {
    1_000
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("REELPAY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
