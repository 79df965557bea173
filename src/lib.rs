//! Custodial EVM transfer engine.

pub mod blockchain;
pub mod config;
pub mod engine;
pub mod lifecycle;
pub mod observability;

pub use config::schema::EngineConfig;
pub use engine::TransferEngine;
pub use lifecycle::Shutdown;
