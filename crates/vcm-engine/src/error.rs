//! Engine error types.

use thiserror::Error;
use vcm_protocol::ProtocolError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::ConfigParse(e.to_string())
    }
}

impl From<serde_yaml::Error> for EngineError {
    fn from(e: serde_yaml::Error) -> Self {
        EngineError::ConfigParse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcm_protocol::FrameDefect;

    #[test]
    fn test_error_display() {
        let err = EngineError::InvalidConfig("broadcast interval must be non-zero".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: broadcast interval must be non-zero"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: EngineError = io_err.into();
        assert!(matches!(err, EngineError::Io(_)));
    }

    #[test]
    fn test_error_from_protocol() {
        let err: EngineError = ProtocolError::from(FrameDefect::Truncated {
            minimum: 12,
            actual: 0,
        })
        .into();
        assert!(matches!(err, EngineError::Protocol(_)));
    }
}
