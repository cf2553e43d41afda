use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegcacheError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Authority error {code}: {message}")]
    Authority { code: i32, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegcacheError {
    /// Whether the failure is transient and the next cycle may succeed.
    ///
    /// Nothing retries inline. The delta loop logs retryable failures at
    /// `warn` and everything else at `error`.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RegcacheError::Transport(_) | RegcacheError::Timeout(_) | RegcacheError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RegcacheError>;
