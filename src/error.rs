//! Error types for peertrade

use crate::types::PeerID;
use thiserror::Error;

/// Main error type for peertrade
#[derive(Error, Debug)]
pub enum TradeError {
    // Session errors
    #[error("A trade session is already active with {remote}")]
    SessionAlreadyActive { remote: PeerID },

    // Peer errors
    #[error("Peer not found: {0}")]
    PeerNotFound(String),

    // Network errors
    #[error("Network connection error: {0}")]
    NetworkConnection(String),

    #[error("Message routing error: {0}")]
    MessageRouting(String),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfig(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for peertrade operations
pub type Result<T> = std::result::Result<T, TradeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = TradeError::PeerNotFound("peer_123".to_string());
        assert_eq!(err.to_string(), "Peer not found: peer_123");
    }

    #[test]
    fn test_session_conflict_message() {
        let err = TradeError::SessionAlreadyActive {
            remote: PeerID("bob".to_string()),
        };
        assert_eq!(err.to_string(), "A trade session is already active with bob");
    }

    #[test]
    fn test_error_conversion() {
        fn io_error_function() -> Result<()> {
            std::fs::read_to_string("/nonexistent/peertrade.toml")?;
            Ok(())
        }

        let result = io_error_function();
        assert!(matches!(result.unwrap_err(), TradeError::Io(_)));
    }

    #[test]
    fn test_toml_conversion() {
        fn parse() -> Result<toml::Value> {
            Ok(toml::from_str("not = [valid")?)
        }

        assert!(matches!(parse().unwrap_err(), TradeError::Toml(_)));
    }
}
