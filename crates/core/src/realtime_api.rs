use crate::generic_types::TransportEvent;
use anyhow::Result;
use async_trait::async_trait;
use convai_realtime_types::ConversationOverrides;
use convai_realtime_types::audio::Base64EncodedAudioBytes;
#[cfg(test)]
use mockall::automock;

/// A real-time voice session with the provider.
/// Lets the controller run against the live WebSocket client or a test double.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RealtimeTransport: Send {
    /// Connects to `signed_url` and sends the per-topic overrides.
    async fn open(&mut self, signed_url: &str, overrides: ConversationOverrides) -> Result<()>;

    async fn send_user_text(&mut self, text: String) -> Result<()>;

    /// Appends a chunk of base64 16 kHz PCM16 microphone audio.
    async fn send_user_audio(&mut self, audio: Base64EncodedAudioBytes) -> Result<()>;

    /// Tells the agent something about the user's view without prompting a reply.
    async fn send_context(&mut self, text: String) -> Result<()>;

    /// Returns the receiver of provider events. Only valid after `open`.
    async fn events(&mut self) -> Result<tokio::sync::mpsc::Receiver<TransportEvent>>;

    /// Releases the session. Closing a closed transport is a no-op.
    async fn close(&mut self) -> Result<()>;
}
