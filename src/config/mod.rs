//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EngineConfig (validated, immutable)
//!     → handed by value to the node client and engine at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload, since the node
//!   client must not change underneath in-flight transfers
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BlockchainConfig, EngineConfig, ObservabilityConfig, PollingConfig, TokenConfig,
    TransferConfig,
};
