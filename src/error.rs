//! Error types for the BitSwarp gateway

use axum::http::StatusCode;
use thiserror::Error;

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Intent could not be resolved: {0}")]
    IntentUnresolved(String),

    #[error("No quote available for {pair} on {chain}")]
    QuoteUnavailable { chain: String, pair: String },

    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("Action '{0}' is not executable by this pipeline")]
    NotExecutable(String),

    #[error("Swap amount must be greater than zero")]
    InvalidAmount,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Signing rejected: {0}")]
    SigningRejected(String),

    #[error("Quote generation {generation} superseded by a newer request")]
    StaleGeneration { generation: u64 },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Chain connection error on {chain}: {message}")]
    ChainConnection { chain: String, message: String },

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// HTTP status for the error when it surfaces at the API boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::UnsupportedChain(_)
            | GatewayError::NotExecutable(_)
            | GatewayError::InvalidAmount => StatusCode::BAD_REQUEST,
            GatewayError::IntentUnresolved(_)
            | GatewayError::QuoteUnavailable { .. }
            | GatewayError::SigningRejected(_)
            | GatewayError::StaleGeneration { .. }
            | GatewayError::InvalidStateTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::ChainConnection { .. } | GatewayError::Wallet(_) => {
                StatusCode::BAD_GATEWAY
            }
            GatewayError::Config(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
