use crate::audio::Base64EncodedAudioBytes;
use crate::overrides::ConversationOverrides;

/// `conversation_initiation_client_data` event, the first frame of a session.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConversationInitiationClientDataEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_config_override: Option<ConversationOverrides>,
}

impl ConversationInitiationClientDataEvent {
    pub fn new() -> Self {
        Self {
            conversation_config_override: None,
        }
    }

    pub fn with_overrides(mut self, overrides: ConversationOverrides) -> Self {
        self.conversation_config_override = Some(overrides);
        self
    }

    pub fn overrides(&self) -> Option<&ConversationOverrides> {
        self.conversation_config_override.as_ref()
    }
}

impl Default for ConversationInitiationClientDataEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// `pong` event, the answer to a server `ping`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PongEvent {
    event_id: u64,
}

impl PongEvent {
    pub fn new(event_id: u64) -> Self {
        Self { event_id }
    }

    pub fn event_id(&self) -> u64 {
        self.event_id
    }
}

/// `user_message` event: a typed user turn.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UserMessageEvent {
    text: String,
}

impl UserMessageEvent {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// `contextual_update` event: background information that does not prompt a reply.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ContextualUpdateEvent {
    text: String,
}

impl ContextualUpdateEvent {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Untyped `{"user_audio_chunk": ...}` frame.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UserAudioChunkEvent {
    user_audio_chunk: Base64EncodedAudioBytes,
}

impl UserAudioChunkEvent {
    pub fn new(audio: Base64EncodedAudioBytes) -> Self {
        Self {
            user_audio_chunk: audio,
        }
    }

    pub fn audio(&self) -> &Base64EncodedAudioBytes {
        &self.user_audio_chunk
    }
}
