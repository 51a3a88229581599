//! Decoding of inbound conversation messages into user and agent utterances.
//!
//! The provider and its client SDKs deliver utterances in several shapes:
//!
//! * `{"source": "user" | "ai", "message": "..."}`
//! * `{"user_transcription_event": {"user_transcript": "..."}}` and
//!   `{"agent_response_event": {"agent_response": "..."}}`
//! * bare `{"transcript": "..."}` and `{"response": "..."}`
//!
//! Each shape is a typed field of [`ProviderMessage`]. Fields outside this set are ignored.
//! A message whose known fields carry the wrong JSON types is unrecognized as a whole.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSource {
    User,
    Ai,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTranscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_transcript: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_response: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<MessageSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_transcription_event: Option<UserTranscription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_response_event: Option<AgentResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

/// At most one utterance per role, extracted from a single message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Utterances {
    pub user: Option<String>,
    pub agent: Option<String>,
}

fn first_non_empty<'a>(candidates: [Option<&'a str>; 3]) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .find(|text| !text.is_empty())
}

impl ProviderMessage {
    /// Decodes a JSON object. Anything else, or an object with mistyped fields, is `None`.
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        match serde_json::from_value(value) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::debug!("unrecognized conversation message: {}", e);
                None
            }
        }
    }

    pub fn from_json(text: &str) -> Option<Self> {
        serde_json::from_str::<serde_json::Value>(text)
            .ok()
            .and_then(Self::from_value)
    }

    /// `{"source": "user", "message": text}`
    pub fn user(text: &str) -> Self {
        Self {
            source: Some(MessageSource::User),
            message: Some(text.to_string()),
            ..Default::default()
        }
    }

    /// `{"source": "ai", "message": text}`
    pub fn agent(text: &str) -> Self {
        Self {
            source: Some(MessageSource::Ai),
            message: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn user_transcription(text: &str) -> Self {
        Self {
            user_transcription_event: Some(UserTranscription {
                user_transcript: Some(text.to_string()),
            }),
            ..Default::default()
        }
    }

    pub fn agent_response(text: &str) -> Self {
        Self {
            agent_response_event: Some(AgentResponse {
                agent_response: Some(text.to_string()),
            }),
            ..Default::default()
        }
    }

    fn sourced_message(&self, source: MessageSource) -> Option<&str> {
        if self.source == Some(source) {
            self.message.as_deref()
        } else {
            None
        }
    }

    /// Precedence per role: sourced `message`, nested event, bare field.
    /// The first present and non-empty candidate wins.
    pub fn utterances(&self) -> Utterances {
        let user = first_non_empty([
            self.sourced_message(MessageSource::User),
            self.user_transcription_event
                .as_ref()
                .and_then(|event| event.user_transcript.as_deref()),
            self.transcript.as_deref(),
        ]);
        let agent = first_non_empty([
            self.sourced_message(MessageSource::Ai),
            self.agent_response_event
                .as_ref()
                .and_then(|event| event.agent_response.as_deref()),
            self.response.as_deref(),
        ]);
        Utterances {
            user: user.map(str::to_string),
            agent: agent.map(str::to_string),
        }
    }
}
