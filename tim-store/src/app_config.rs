use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub checkout: CheckoutConfig,
    #[serde(default)]
    pub internet: InternetConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// Where configurations are persisted. No path means in-memory only.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    pub path: Option<String>,
}

/// Optional JSON catalog replacing the built-in line-up
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CheckoutConfig {
    /// Base URL of the hosted functions, e.g. `https://xyz.supabase.co/functions/v1`
    pub functions_url: Option<String>,
    pub anon_key: Option<String>,
    #[serde(default = "default_mock")]
    pub mock: bool,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_mock() -> bool { true }
fn default_timeout() -> u64 { 15 }

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            functions_url: None,
            anon_key: None,
            mock: default_mock(),
            timeout_seconds: default_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InternetConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval() -> u64 { 1000 }

impl Default for InternetConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
        }
    }
}

/// Live configuration sessions are dropped after this much inactivity;
/// their persisted state survives and can be resumed
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

fn default_idle_timeout() -> u64 { 1800 }
fn default_sweep_interval() -> u64 { 60 }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_seconds: default_idle_timeout(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked local overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `TIM_SERVER__PORT=9000`
            .add_source(config::Environment::with_prefix("TIM").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Parse a single TOML document, no environment overlay
    pub fn from_toml(raw: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = Config::from_toml("[server]\nport = 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.storage.path.is_none());
        assert!(config.checkout.mock);
        assert_eq!(config.checkout.timeout_seconds, 15);
        assert_eq!(config.internet.poll_interval_ms, 1000);
        assert_eq!(config.sessions.idle_timeout_seconds, 1800);
        assert_eq!(config.sessions.sweep_interval_seconds, 60);
    }

    #[test]
    fn test_full_document() {
        let raw = r#"
            [server]
            port = 3000

            [storage]
            path = "/var/lib/tim/state.json"

            [checkout]
            functions_url = "https://example.supabase.co/functions/v1"
            anon_key = "anon"
            mock = false

            [internet]
            poll_interval_ms = 250

            [sessions]
            idle_timeout_seconds = 600
        "#;
        let config = Config::from_toml(raw).unwrap();
        assert_eq!(config.storage.path.as_deref(), Some("/var/lib/tim/state.json"));
        assert!(!config.checkout.mock);
        assert_eq!(config.internet.poll_interval_ms, 250);
        assert_eq!(config.sessions.idle_timeout_seconds, 600);
        assert_eq!(config.sessions.sweep_interval_seconds, 60);
    }

    #[test]
    fn test_missing_server_is_error() {
        assert!(Config::from_toml("[storage]\n").is_err());
    }
}
