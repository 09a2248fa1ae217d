/// Error types for workspace operations
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreatsError {
    /// Bad input: unknown ids, out-of-range values, malformed text.
    #[error("{0}")]
    Input(String),

    /// The caller exists but may not do this.
    #[error("{0}")]
    Auth(String),
}

impl TreatsError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, TreatsError>;
