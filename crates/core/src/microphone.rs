use crate::error::SessionError;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// Audio input owned by a conversation for its whole lifetime.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Microphone: Send {
    /// Fails with [`SessionError::Permission`] when access is denied or no device exists.
    async fn acquire(&mut self) -> Result<(), SessionError>;

    fn release(&mut self);
}
