pub mod client;
pub mod server;

use client::*;
use server::*;

/// Typed client frames. Every one of them carries a `type` discriminator.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    ConversationInitiationClientData(ConversationInitiationClientDataEvent),
    Pong(PongEvent),
    UserMessage(UserMessageEvent),
    ContextualUpdate(ContextualUpdateEvent),
}

/// Anything the client can put on the socket.
///
/// Audio chunks are the one frame the protocol sends without a `type` field.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ClientEvent {
    Message(ClientMessage),
    UserAudioChunk(UserAudioChunkEvent),
}

impl From<ClientMessage> for ClientEvent {
    fn from(message: ClientMessage) -> Self {
        ClientEvent::Message(message)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    ConversationInitiationMetadata(ConversationInitiationMetadataEvent),
    UserTranscript(UserTranscriptEvent),
    AgentResponse(AgentResponseEvent),
    AgentResponseCorrection(AgentResponseCorrectionEvent),
    Audio(AudioEvent),
    Interruption(InterruptionEvent),
    Ping(PingEvent),
    VadScore(VadScoreEvent),
    /// Emitted locally when reading the socket fails, just before `Close`.
    #[serde(skip)]
    ConnectionError {
        message: String,
    },
    /// Emitted locally when the socket closes; never sent by the server.
    Close {
        reason: Option<String>,
    },
    #[serde(other)]
    Unknown,
}
