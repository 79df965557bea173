//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check addresses and URLs parse
//! - Validate value ranges (timeouts > 0, decimals within u256 range)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EngineConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::EngineConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.blockchain.rpc_url.parse::<url::Url>() {
        errors.push(ValidationError::new("blockchain.rpc_url", e.to_string()));
    }
    for url in &config.blockchain.failover_urls {
        if url.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new(
                "blockchain.failover_urls",
                format!("invalid URL '{}'", url),
            ));
        }
    }
    if config.blockchain.chain_id == 0 {
        errors.push(ValidationError::new("blockchain.chain_id", "must be non-zero"));
    }
    if config.blockchain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("blockchain.rpc_timeout_secs", "must be > 0"));
    }

    if config.token.address.parse::<Address>().is_err() {
        errors.push(ValidationError::new(
            "token.address",
            format!("invalid address '{}'", config.token.address),
        ));
    }
    // 10^28 no longer fits the decimal mantissa
    if config.token.decimals > 27 {
        errors.push(ValidationError::new("token.decimals", "must be <= 27"));
    }

    if config.transfer.native_reserve.is_sign_negative() {
        errors.push(ValidationError::new("transfer.native_reserve", "must not be negative"));
    }
    if config.transfer.native_gas_limit < 21_000 {
        errors.push(ValidationError::new(
            "transfer.native_gas_limit",
            "must be at least 21000",
        ));
    }

    if config.polling.interval_ms == 0 {
        errors.push(ValidationError::new("polling.interval_ms", "must be > 0"));
    }
    if config.polling.max_attempts == 0 {
        errors.push(ValidationError::new("polling.max_attempts", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = EngineConfig::default();
        config.blockchain.rpc_url = "not a url".into();
        config.token.address = "0x1234".into();
        config.polling.max_attempts = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["blockchain.rpc_url", "token.address", "polling.max_attempts"]
        );
    }

    #[test]
    fn test_rejects_negative_reserve() {
        let mut config = EngineConfig::default();
        config.transfer.native_reserve = rust_decimal::Decimal::new(-1, 3);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "transfer.native_reserve");
    }
}
