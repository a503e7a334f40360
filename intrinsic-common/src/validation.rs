//! Configuration validation.
//!
//! Checks that values are present and within ranges the valuation
//! models can work with before the service starts.

use thiserror::Error;

use crate::config::{Config, MarketDataConfig, ObservabilityConfig, ValuationConfig};

/// Longest accepted cache TTL: 30 days
pub const MAX_CACHE_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port {port}: must be between 1 and 65535")]
    InvalidPort { port: u16, field: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration.
    ///
    /// A missing Alpha Vantage key is not an error here: the service can
    /// still start and reports the problem per request.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Some(port) = self.services.valuation.port {
            if port == 0 {
                errors.push(ValidationError::InvalidPort {
                    port,
                    field: "services.valuation.port".into(),
                });
            }
        }

        if self.network.bind.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: "network.bind".into(),
            });
        }

        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }
        if let Err(e) = self.market_data.validate() {
            errors.push(e);
        }
        if let Err(e) = self.valuation.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }

    /// Load and validate configuration, applying environment overrides.
    pub fn load_and_validate() -> anyhow::Result<Self> {
        let config = Self::load_with_env()?;
        config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(config)
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        Ok(())
    }
}

impl Validate for MarketDataConfig {
    fn validate(&self) -> ValidationResult<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidValue {
                field: "market_data.base_url".into(),
                reason: "must start with http:// or https://".into(),
            });
        }
        if self.rate_limit_rpm == 0 {
            return Err(ValidationError::InvalidValue {
                field: "market_data.rate_limit_rpm".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if !(0..=MAX_CACHE_TTL_SECS).contains(&self.cache_ttl_secs) {
            return Err(ValidationError::InvalidValue {
                field: "market_data.cache_ttl_secs".into(),
                reason: format!("must be between 0 and {MAX_CACHE_TTL_SECS}"),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "market_data.request_timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.news_limit == 0 {
            return Err(ValidationError::InvalidValue {
                field: "market_data.news_limit".into(),
                reason: "must be greater than 0".into(),
            });
        }

        Ok(())
    }
}

impl Validate for ValuationConfig {
    fn validate(&self) -> ValidationResult<()> {
        if !(0.0..=1.0).contains(&self.pe_weight) {
            return Err(ValidationError::InvalidValue {
                field: "valuation.pe_weight".into(),
                reason: format!("{} is outside [0, 1]", self.pe_weight),
            });
        }
        if self.lookback_years == 0 {
            return Err(ValidationError::InvalidValue {
                field: "valuation.lookback_years".into(),
                reason: "must be at least 1".into(),
            });
        }

        let rates = [
            ("valuation.risk_free_rate", self.risk_free_rate),
            ("valuation.equity_risk_premium", self.equity_risk_premium),
            ("valuation.default_growth", self.default_growth),
        ];
        for (field, value) in rates {
            if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
                return Err(ValidationError::InvalidValue {
                    field: field.into(),
                    reason: format!("{value} is not a plausible annual rate"),
                });
            }
        }

        Ok(())
    }
}
