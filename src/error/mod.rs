use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Text-generation service errors
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generation service unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Semantic retrieval service errors
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Session store errors
///
/// The in-memory store is infallible; this is the failure surface a
/// durable `SessionStore` backend reports through.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session backend error: {message}")]
    Backend { message: String },
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for generation operations
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Result type alias for retrieval operations
pub type RetrievalResult<T> = Result<T, RetrievalError>;

/// Result type alias for session store operations
pub type SessionResult<T> = Result<T, SessionError>;
