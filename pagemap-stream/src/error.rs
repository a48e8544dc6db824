use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Connection dropped or failed to open. Recoverable by reconnecting.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Reconnect budget spent. Terminal.
    #[error("Connection lost after {attempts} failed attempts")]
    ConnectionExhausted { attempts: u32 },

    /// An event payload that is not valid JSON. Logged and dropped by the client.
    #[error("Malformed '{event}' payload: {reason}")]
    MalformedPayload { event: String, reason: String },

    #[error("Session {action} rejected with status {status}")]
    Rejected { action: String, status: u16 },

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl StreamError {
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StreamError::Transport(_) | StreamError::HttpError(_) | StreamError::MalformedPayload { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
