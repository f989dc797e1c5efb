//! Application-wide error types.
//!
//! Contract-level failures live in [`crate::contract::ContractError`]; this
//! enum covers the host side (config, logging, world state, invocation
//! decoding).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("state error: {0}")]
    State(String),

    #[error("invocation error: {0}")]
    Invocation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
