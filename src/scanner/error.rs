use thiserror::Error;

/// Caller-supplied or configured input was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("client error: {message}")]
pub struct ParameterError {
    pub message: String,
}

impl ParameterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Starting or running the external scanner failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("scan error: {message}")]
pub struct ExecutionError {
    pub message: String,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Every failure a scan can produce
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl ScanError {
    /// The bare message, without the `client error:` / `scan error:` prefix
    pub fn message(&self) -> &str {
        match self {
            ScanError::Parameter(e) => &e.message,
            ScanError::Execution(e) => &e.message,
        }
    }
}
