//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the engine.
//! All types derive Serde traits for deserialization from config files.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the transfer engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Node connection settings.
    pub blockchain: BlockchainConfig,

    /// The token contract transfers and balance reads target.
    pub token: TokenConfig,

    /// Native transfer policy.
    pub transfer: TransferConfig,

    /// Confirmation polling policy.
    pub polling: PollingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Node connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Chain ID signatures are bound to (1 for Ethereum mainnet, 31337 for Anvil).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 1,
            rpc_timeout_secs: 10,
        }
    }
}

/// Token contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Contract address (hex, 0x-prefixed).
    pub address: String,

    /// Display symbol.
    pub symbol: String,

    /// Number of decimals the contract uses for amounts.
    pub decimals: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            // Tether USD on Ethereum mainnet
            address: "0xdAC17F958D2ee523a2206206994597C13D831ec7".to_string(),
            symbol: "USDT".to_string(),
            decimals: 6,
        }
    }
}

/// Native coin transfer policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Native amount held back from every native transfer to pay for gas.
    pub native_reserve: Decimal,

    /// Gas limit used for plain native transfers.
    pub native_gas_limit: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            // roughly 5 USDT worth of ETH
            native_reserve: Decimal::new(42, 4),
            native_gas_limit: 21_000,
        }
    }
}

/// Confirmation polling policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between two status queries, in milliseconds.
    pub interval_ms: u64,

    /// Number of non-terminal polls after which the poller gives up.
    pub max_attempts: u32,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            max_attempts: 20,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let config = EngineConfig::default();
        assert_eq!(config.token.decimals, 6);
        assert_eq!(config.transfer.native_gas_limit, 21_000);
        assert_eq!(config.transfer.native_reserve.to_string(), "0.0042");
        assert_eq!(config.polling.interval(), Duration::from_secs(10));
        assert_eq!(config.polling.max_attempts, 20);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [blockchain]
            rpc_url = "https://rpc.example.org"
            chain_id = 11155111

            [polling]
            max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.blockchain.chain_id, 11155111);
        assert_eq!(config.blockchain.rpc_timeout_secs, 10);
        assert_eq!(config.polling.max_attempts, 5);
        assert_eq!(config.polling.interval_ms, 10_000);
        assert_eq!(config.token.symbol, "USDT");
    }

    #[test]
    fn test_reserve_parses_from_string() {
        let config: EngineConfig = toml::from_str(
            r#"
            [transfer]
            native_reserve = "0.01"
            "#,
        )
        .unwrap();
        assert_eq!(config.transfer.native_reserve, Decimal::new(1, 2));
    }
}
