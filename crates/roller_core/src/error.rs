//! Error taxonomy of the roll engine.

use thiserror::Error;

/// Ways a roll can fail. Spawn-time failures reject before the world is
/// touched; a settle timeout leaves the dice in place so the caller can
/// inspect them (the next roll clears them).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RollError {
    #[error("roll count must be at least 1, got {0}")]
    InvalidCount(i32),

    #[error("die shape has not been loaded yet")]
    NotReady,

    #[error("dice failed to settle within {waited_secs:.1} s of simulated time")]
    SettleTimeout { waited_secs: f64 },
}

/// Failures loading an [`EngineConfig`](crate::config::EngineConfig) file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
}
