use thiserror::Error;

/// Errors raised by the numeric core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecayError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("No sample exceeds the critical value {critical_value}")]
    EmptyRejectionRegion { critical_value: u64 },
}

impl DecayError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        DecayError::InvalidParameter(msg.into())
    }
}

pub type Result<T, E = DecayError> = std::result::Result<T, E>;
