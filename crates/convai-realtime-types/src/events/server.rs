use crate::audio::Base64EncodedAudioBytes;

/// `conversation_initiation_metadata` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConversationInitiationMetadataEvent {
    conversation_initiation_metadata_event: InitiationMetadata,
}

impl ConversationInitiationMetadataEvent {
    pub fn metadata(&self) -> &InitiationMetadata {
        &self.conversation_initiation_metadata_event
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct InitiationMetadata {
    conversation_id: String,
    /// ex: "pcm_16000"
    agent_output_audio_format: Option<String>,
    user_input_audio_format: Option<String>,
}

impl InitiationMetadata {
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn agent_output_audio_format(&self) -> Option<&str> {
        self.agent_output_audio_format.as_deref()
    }

    pub fn user_input_audio_format(&self) -> Option<&str> {
        self.user_input_audio_format.as_deref()
    }
}

/// `user_transcript` event: a finished transcription of user speech.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UserTranscriptEvent {
    user_transcription_event: UserTranscription,
}

impl UserTranscriptEvent {
    pub fn new(transcript: &str) -> Self {
        Self {
            user_transcription_event: UserTranscription {
                user_transcript: transcript.to_string(),
            },
        }
    }

    pub fn transcript(&self) -> &str {
        &self.user_transcription_event.user_transcript
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UserTranscription {
    user_transcript: String,
}

/// `agent_response` event: the full text of one agent turn.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AgentResponseEvent {
    agent_response_event: AgentResponse,
}

impl AgentResponseEvent {
    pub fn new(response: &str) -> Self {
        Self {
            agent_response_event: AgentResponse {
                agent_response: response.to_string(),
            },
        }
    }

    pub fn response(&self) -> &str {
        &self.agent_response_event.agent_response
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AgentResponse {
    agent_response: String,
}

/// `agent_response_correction` event: the agent was interrupted and its turn truncated.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AgentResponseCorrectionEvent {
    agent_response_correction_event: AgentResponseCorrection,
}

impl AgentResponseCorrectionEvent {
    pub fn original(&self) -> &str {
        &self
            .agent_response_correction_event
            .original_agent_response
    }

    pub fn corrected(&self) -> &str {
        &self
            .agent_response_correction_event
            .corrected_agent_response
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AgentResponseCorrection {
    original_agent_response: String,
    corrected_agent_response: String,
}

/// `audio` event: one chunk of synthesized agent speech.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AudioEvent {
    audio_event: AudioChunk,
}

impl AudioEvent {
    pub fn audio(&self) -> &Base64EncodedAudioBytes {
        &self.audio_event.audio_base_64
    }

    pub fn event_id(&self) -> u64 {
        self.audio_event.event_id
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AudioChunk {
    audio_base_64: Base64EncodedAudioBytes,
    event_id: u64,
}

/// `interruption` event: the user talked over the agent.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct InterruptionEvent {
    #[serde(default)]
    interruption_event: Interruption,
}

impl InterruptionEvent {
    pub fn event_id(&self) -> Option<u64> {
        self.interruption_event.event_id
    }

    pub fn reason(&self) -> Option<&str> {
        self.interruption_event.reason.as_deref()
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Interruption {
    event_id: Option<u64>,
    reason: Option<String>,
}

/// `ping` event. Must be answered with a `pong` carrying the same id.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PingEvent {
    ping_event: Ping,
}

impl PingEvent {
    pub fn event_id(&self) -> u64 {
        self.ping_event.event_id
    }

    pub fn ping_ms(&self) -> Option<u64> {
        self.ping_event.ping_ms
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Ping {
    event_id: u64,
    ping_ms: Option<u64>,
}

/// `vad_score` event: voice activity probability for the latest user audio.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VadScoreEvent {
    vad_score_event: VadScore,
}

impl VadScoreEvent {
    pub fn score(&self) -> f32 {
        self.vad_score_event.vad_score
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VadScore {
    vad_score: f32,
}
