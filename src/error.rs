use thiserror::Error;

/// Generic text shown when the backend refuses or fails a request.
/// Internal details stay in the logs.
pub const GENERIC_FAILURE_MESSAGE: &str = "요청을 처리하지 못했어요. 잠시 후 다시 시도해주세요.";

#[derive(Error, Debug)]
pub enum AppError {
    /// Remote call failed (transport, non-2xx status, missing API key).
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    /// The operation was superseded or explicitly aborted.
    #[error("Cancelled")]
    Cancelled,

    /// Input rejected before any remote call. The payload is user-facing.
    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A state-machine transition was refused.
    #[error("Transition refused: {0}")]
    Guard(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Business-logic storage errors (bad row, failed write, etc.)
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Raw database errors from rusqlite
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Date parse errors from chrono
    #[error("Date parse error: {0}")]
    DateParse(#[from] chrono::ParseError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Network and timeout failures are recovered with fallback data.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Text the shell may display. Validation and guard messages pass through,
    /// everything coming from the backend collapses to a generic message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Guard(_) => "지금은 이 작업을 할 수 없어요.".to_string(),
            Self::Network(_) | Self::Timeout(_) => {
                "네트워크 연결이 원활하지 않아요. 다시 시도해주세요.".to_string()
            }
            Self::Cancelled => String::new(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}
