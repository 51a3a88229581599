/// Shown when the live session reports a failure.
pub const TRANSPORT_ERROR_MESSAGE: &str = "An error occurred with the conversation service.";
/// Shown when opening the session fails without a usable message.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";
/// Shown when the broker rejects a request without saying why.
pub const BROKER_ERROR_MESSAGE: &str = "Failed to get signed URL for conversation.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Microphone access denied: {0}")]
    Permission(String),
    #[error("{0}")]
    Broker(String),
    #[error("{0}")]
    Open(String),
    #[error("{0}")]
    Transport(String),
    #[error("A conversation is already active")]
    AlreadyActive,
    #[error("No conversation is open")]
    NotConnected,
}

impl SessionError {
    /// Wraps a session-open failure, falling back to the generic message when it has none.
    pub fn open(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            SessionError::Open(UNKNOWN_ERROR_MESSAGE.to_string())
        } else {
            SessionError::Open(message)
        }
    }
}
