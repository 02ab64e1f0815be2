pub mod model;
pub mod settings;

pub use model::PricePoint;
pub use settings::{AppConfig, DetectorSettings, SourceKind, SourceSettings, StreamSettings};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdoError {
    #[error("detector used before a successful initialize")]
    Uninitialized,

    #[error("input window is empty")]
    EmptyWindow,

    #[error("no observers available for scoring")]
    InsufficientObservers,

    #[error("non-finite value in input: {0}")]
    NonFinite(f64),

    #[error("Invalid detector configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SdoError {
    /// True for the errors a caller provokes by misusing the detector handle.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            SdoError::Uninitialized
                | SdoError::EmptyWindow
                | SdoError::InsufficientObservers
                | SdoError::NonFinite(_)
                | SdoError::InvalidConfig(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SdoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_errors() {
        assert!(SdoError::Uninitialized.is_caller_error());
        assert!(SdoError::EmptyWindow.is_caller_error());
        assert!(SdoError::NonFinite(f64::NAN).is_caller_error());
        assert!(!SdoError::Data("missing".to_string()).is_caller_error());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(SdoError::EmptyWindow.to_string(), "input window is empty");
        assert_eq!(
            SdoError::InvalidConfig("capacity must be at least 1".to_string()).to_string(),
            "Invalid detector configuration: capacity must be at least 1"
        );
    }
}
