//! Configuration management for the Intrinsic service.
//!
//! The service reads a single configuration file at `~/.intrinsic/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (`INTRINSIC_*` prefix, plus `ALPHA_VANTAGE_API_KEY`)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `ALPHA_VANTAGE_API_KEY` → secrets.external.alpha_vantage
//! - `INTRINSIC_PORT` → services.valuation.port
//! - `INTRINSIC_BIND_ADDRESS` → network.bind
//! - `INTRINSIC_LOG_LEVEL` → observability.log_level
//! - `INTRINSIC_LOG_FORMAT` → observability.log_format

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".intrinsic"),
        |dirs| dirs.home_dir().join(".intrinsic"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Network Configuration
// ============================================================================

/// Global network configuration.
///
/// Default bind address is `127.0.0.1` (local only).
/// Set to `0.0.0.0` to allow remote access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_bind_address")]
    pub bind: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".into()
}

// ============================================================================
// Services Port Configuration
// ============================================================================

/// Service port configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServicesConfig {
    /// Valuation HTTP service
    #[serde(default)]
    pub valuation: ServicePortConfig,
}

/// Individual service port configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServicePortConfig {
    #[serde(default)]
    pub port: Option<u16>,
}

// ============================================================================
// Secrets Configuration
// ============================================================================

/// Grouped secrets configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecretsConfig {
    /// External data provider credentials
    #[serde(default)]
    pub external: ExternalSecretsConfig,
}

/// External data provider credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExternalSecretsConfig {
    /// Alpha Vantage API key
    #[serde(default)]
    pub alpha_vantage: Option<String>,
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets to force to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Market Data Configuration
// ============================================================================

/// Upstream market-data provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataConfig {
    /// Alpha Vantage base URL (overridable for tests and proxies)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Proactive rate limit (requests per minute)
    #[serde(default = "default_rate_limit_rpm")]
    pub rate_limit_rpm: u32,

    /// Response cache TTL in seconds; 0 disables caching
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: i64,

    /// Upstream request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Number of news articles requested for the one-pager
    #[serde(default = "default_news_limit")]
    pub news_limit: usize,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            rate_limit_rpm: default_rate_limit_rpm(),
            cache_ttl_secs: default_cache_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            news_limit: default_news_limit(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.alphavantage.co".into()
}

fn default_rate_limit_rpm() -> u32 {
    75
}

fn default_cache_ttl_secs() -> i64 {
    15 * 60
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_news_limit() -> usize {
    10
}

// ============================================================================
// Valuation Configuration
// ============================================================================

/// Valuation model assumptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationConfig {
    /// Weight of the P/E fair value in the blended intrinsic value (P/FCF gets the rest)
    #[serde(default = "default_pe_weight")]
    pub pe_weight: f64,

    /// Number of most recent common years used for the multiple medians
    #[serde(default = "default_lookback_years")]
    pub lookback_years: usize,

    /// Risk-free rate used in CAPM
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,

    /// Equity risk premium used in CAPM
    #[serde(default = "default_equity_risk_premium")]
    pub equity_risk_premium: f64,

    /// FCF growth assumed when the historical CAGR cannot be computed
    #[serde(default = "default_growth")]
    pub default_growth: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            pe_weight: default_pe_weight(),
            lookback_years: default_lookback_years(),
            risk_free_rate: default_risk_free_rate(),
            equity_risk_premium: default_equity_risk_premium(),
            default_growth: default_growth(),
        }
    }
}

fn default_pe_weight() -> f64 {
    0.5
}

fn default_lookback_years() -> usize {
    5
}

fn default_risk_free_rate() -> f64 {
    0.04
}

fn default_equity_risk_premium() -> f64 {
    0.05
}

fn default_growth() -> f64 {
    0.03
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// JSON Schema reference
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub services: ServicesConfig,

    #[serde(default)]
    pub secrets: SecretsConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub market_data: MarketDataConfig,

    #[serde(default)]
    pub valuation: ValuationConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("ALPHA_VANTAGE_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.secrets.external.alpha_vantage = Some(key);
        }
        if let Some(port) = lookup("INTRINSIC_PORT").and_then(|p| p.parse().ok()) {
            self.services.valuation.port = Some(port);
        }
        if let Some(bind) = lookup("INTRINSIC_BIND_ADDRESS") {
            self.network.bind = bind;
        }
        if let Some(level) = lookup("INTRINSIC_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("INTRINSIC_LOG_FORMAT") {
            self.observability.log_format = format;
        }
    }

    /// Get the effective bind address.
    pub fn bind_address(&self) -> &str {
        &self.network.bind
    }

    /// Get the valuation service port.
    pub fn valuation_port(&self) -> u16 {
        self.services.valuation.port.unwrap_or(4440)
    }

    /// Get the Alpha Vantage API key, ignoring blank values.
    pub fn alpha_vantage_api_key(&self) -> Option<String> {
        self.secrets
            .external
            .alpha_vantage
            .as_ref()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.valuation_port(), 4440);
        assert_eq!(config.bind_address(), "127.0.0.1");
        assert_eq!(config.market_data.cache_ttl_secs, 900);
        assert_eq!(config.market_data.news_limit, 10);
        assert!((config.valuation.pe_weight - 0.5).abs() < f64::EPSILON);
        assert!(config.alpha_vantage_api_key().is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.valuation_port(), config.valuation_port());
        assert_eq!(parsed.market_data.base_url, config.market_data.base_url);
        assert_eq!(parsed.valuation.lookback_years, config.valuation.lookback_years);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{
            "market_data": { "rate_limit_rpm": 5 },
            "valuation": { "pe_weight": 0.7 },
            "observability": { "level": "debug" }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.market_data.rate_limit_rpm, 5);
        assert_eq!(config.market_data.cache_ttl_secs, 900);
        assert!((config.valuation.pe_weight - 0.7).abs() < f64::EPSILON);
        assert!((config.valuation.risk_free_rate - 0.04).abs() < f64::EPSILON);
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_format, "pretty");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"services": {{"valuation": {{"port": 5050}}}}, "secrets": {{"external": {{"alpha_vantage": "demo"}}}}}}"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.valuation_port(), 5050);
        assert_eq!(config.alpha_vantage_api_key(), Some("demo".to_string()));
    }

    #[test]
    fn test_load_from_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ALPHA_VANTAGE_API_KEY", "env-key"),
            ("INTRINSIC_PORT", "4999"),
            ("INTRINSIC_BIND_ADDRESS", "0.0.0.0"),
            ("INTRINSIC_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.alpha_vantage_api_key(), Some("env-key".to_string()));
        assert_eq!(config.valuation_port(), 4999);
        assert_eq!(config.bind_address(), "0.0.0.0");
        assert_eq!(config.observability.log_format, "json");
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_env_overrides_ignore_invalid_values() {
        let mut config = Config::default();
        config.apply_overrides_from(|key| match key {
            "INTRINSIC_PORT" => Some("not-a-port".into()),
            "ALPHA_VANTAGE_API_KEY" => Some("   ".into()),
            _ => None,
        });

        assert_eq!(config.valuation_port(), 4440);
        assert!(config.alpha_vantage_api_key().is_none());
    }
}
