use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Uniqueness violation; the message names the conflicting field.
    #[error("{0}")]
    Conflict(String),

    /// Malformed or referentially invalid input.
    #[error("{0}")]
    Validation(String),

    /// Connection-level failure talking to the remote API.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Well-formed error response from the remote API.
    #[error("{0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
