//! Error types for the spin engine

use thiserror::Error;

/// Engine error type
#[derive(Error, Debug)]
pub enum SpinError {
    #[error("Insufficient balance: {balance} available, bet is {bet}")]
    InsufficientBalance { balance: u64, bet: u64 },

    #[error("Spin already in progress")]
    SpinInProgress,

    #[error("Invalid grid state: {0}")]
    InvalidGridState(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Milestone reward is not available")]
    RewardUnavailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SpinError {
    /// Rejected spin requests leave the machine untouched and may be retried
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SpinError::InsufficientBalance { .. } | SpinError::SpinInProgress
        )
    }
}

impl From<serde_json::Error> for SpinError {
    fn from(e: serde_json::Error) -> Self {
        SpinError::Serialization(e.to_string())
    }
}

/// Result type alias
pub type EngineResult<T> = Result<T, SpinError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections() {
        assert!(SpinError::SpinInProgress.is_rejection());
        assert!(SpinError::InsufficientBalance { balance: 5, bet: 20 }.is_rejection());
        assert!(!SpinError::InvalidGridState("column 9".into()).is_rejection());
    }

    #[test]
    fn test_display() {
        let err = SpinError::InsufficientBalance { balance: 5, bet: 20 };
        assert_eq!(err.to_string(), "Insufficient balance: 5 available, bet is 20");
    }
}
