use crate::broker::SessionBroker;
use crate::error::{SessionError, TRANSPORT_ERROR_MESSAGE};
use crate::generic_types::{AgentMode, TransportEvent};
use crate::microphone::Microphone;
use crate::orb::{ConnectionStatus, OrbState};
use crate::overrides::session_overrides;
use crate::realtime_api::RealtimeTransport;
use crate::topic::{Persona, Topic};
use crate::transcript::{Role, Transcript, TranscriptItem};
use convai_realtime_types::audio::Base64EncodedAudioBytes;
use tokio::sync::mpsc;

/// A change the runtime should present to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Transcript(TranscriptItem),
    ImageFocus(usize),
    Orb(OrbState),
    Error(String),
}

/// Drives one voice conversation about one topic.
///
/// At most one session is active at a time. The microphone and the transport are
/// released on every exit path: a failed `start`, `stop`, or the provider closing
/// the session.
pub struct ConversationController<M, B, T> {
    topic: Topic,
    microphone: M,
    broker: B,
    transport: T,
    status: ConnectionStatus,
    agent_speaking: bool,
    start_failed: bool,
    microphone_held: bool,
    transport_open: bool,
    transcript: Transcript,
    error: Option<String>,
    persona: Option<Persona>,
    document_id: Option<String>,
    image_index: usize,
    reported_orb: OrbState,
}

impl<M, B, T> ConversationController<M, B, T>
where
    M: Microphone,
    B: SessionBroker,
    T: RealtimeTransport,
{
    pub fn new(topic: Topic, microphone: M, broker: B, transport: T) -> Self {
        Self {
            topic,
            microphone,
            broker,
            transport,
            status: ConnectionStatus::Disconnected,
            agent_speaking: false,
            start_failed: false,
            microphone_held: false,
            transport_open: false,
            transcript: Transcript::new(),
            error: None,
            persona: None,
            document_id: None,
            image_index: 0,
            reported_orb: OrbState::Idle,
        }
    }

    /// Opens a session and returns the receiver of its provider events.
    ///
    /// Feed every received event to [`handle_event`](Self::handle_event) in arrival order.
    pub async fn start(&mut self) -> Result<mpsc::Receiver<TransportEvent>, SessionError> {
        if self.status != ConnectionStatus::Disconnected {
            tracing::warn!("start requested while a conversation is {:?}", self.status);
            return Err(SessionError::AlreadyActive);
        }

        self.error = None;
        self.start_failed = false;
        self.agent_speaking = false;
        self.transcript = Transcript::new();
        self.image_index = 0;
        self.status = ConnectionStatus::Connecting;

        let result = match self.open_session().await {
            Ok(events) => {
                self.status = ConnectionStatus::Connected;
                tracing::info!("conversation about {} connected", self.topic.id);
                Ok(events)
            }
            Err(e) => {
                tracing::error!("failed to start conversation about {}: {}", self.topic.id, e);
                self.release().await;
                self.start_failed = true;
                self.error = Some(e.to_string());
                Err(e)
            }
        };
        self.reported_orb = self.orb_state();
        result
    }

    async fn open_session(&mut self) -> Result<mpsc::Receiver<TransportEvent>, SessionError> {
        self.microphone.acquire().await?;
        self.microphone_held = true;

        let grant = self.broker.request_session(&self.topic.id).await?;
        tracing::debug!(
            "starting conversation with knowledge base document {}",
            grant.document_id
        );
        let overrides = session_overrides(&self.topic, &grant.document_id);
        self.persona = Some(grant.persona);
        self.document_id = Some(grant.document_id);

        // Marked before the attempt so a half-open transport is closed on failure.
        self.transport_open = true;
        self.transport
            .open(&grant.signed_url, overrides)
            .await
            .map_err(|e| SessionError::open(e.to_string()))?;
        self.transport
            .events()
            .await
            .map_err(|e| SessionError::open(e.to_string()))
    }

    /// Ends the session. Stopping an idle controller is a no-op.
    pub async fn stop(&mut self) {
        if self.status != ConnectionStatus::Disconnected {
            tracing::info!("stopping conversation about {}", self.topic.id);
        }
        self.release().await;
        self.start_failed = false;
        self.reported_orb = self.orb_state();
    }

    async fn release(&mut self) {
        if self.transport_open {
            self.transport_open = false;
            if let Err(e) = self.transport.close().await {
                tracing::warn!("failed to close conversation transport: {}", e);
            }
        }
        if self.microphone_held {
            self.microphone_held = false;
            self.microphone.release();
        }
        self.status = ConnectionStatus::Disconnected;
        self.agent_speaking = false;
    }

    /// Applies one provider event and reports what changed.
    pub fn handle_event(&mut self, event: TransportEvent) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        match event {
            TransportEvent::Message(message) => {
                if self.status != ConnectionStatus::Connected {
                    tracing::debug!("dropping message received outside a session");
                    return updates;
                }
                let utterances = message.utterances();
                if let Some(text) = utterances.user {
                    self.append_user(text, &mut updates);
                }
                if let Some(text) = utterances.agent {
                    let item = self.transcript.push(Role::Agent, text);
                    updates.push(SessionUpdate::Transcript(item.clone()));
                }
            }
            TransportEvent::Mode(mode) => {
                if self.status == ConnectionStatus::Connected {
                    self.agent_speaking = mode == AgentMode::Speaking;
                }
            }
            TransportEvent::Error(message) => {
                tracing::error!("conversation error: {}", message);
                self.error = Some(TRANSPORT_ERROR_MESSAGE.to_string());
                updates.push(SessionUpdate::Error(TRANSPORT_ERROR_MESSAGE.to_string()));
            }
            TransportEvent::Closed => {
                if self.status != ConnectionStatus::Disconnected {
                    tracing::info!("conversation about {} closed by provider", self.topic.id);
                    // The provider already dropped the socket.
                    self.transport_open = false;
                    if self.microphone_held {
                        self.microphone_held = false;
                        self.microphone.release();
                    }
                    self.status = ConnectionStatus::Disconnected;
                    self.agent_speaking = false;
                }
            }
        }
        self.report_orb(&mut updates);
        updates
    }

    /// Sends a typed user turn. The provider does not echo typed text, so it is
    /// appended to the transcript here.
    pub async fn send_text(&mut self, text: &str) -> Result<Vec<SessionUpdate>, SessionError> {
        if self.status != ConnectionStatus::Connected {
            return Err(SessionError::NotConnected);
        }
        self.transport
            .send_user_text(text.to_string())
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let mut updates = Vec::new();
        self.append_user(text.to_string(), &mut updates);
        self.report_orb(&mut updates);
        Ok(updates)
    }

    pub async fn send_audio(&mut self, audio: Base64EncodedAudioBytes) -> Result<(), SessionError> {
        if self.status != ConnectionStatus::Connected {
            return Err(SessionError::NotConnected);
        }
        self.transport
            .send_user_audio(audio)
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))
    }

    /// Lets the agent know which carousel image the user is now looking at.
    pub async fn share_image_context(&mut self, index: usize) -> Result<(), SessionError> {
        if self.status != ConnectionStatus::Connected {
            return Err(SessionError::NotConnected);
        }
        let Some(image) = self.topic.images.get(index) else {
            return Ok(());
        };
        let text = format!("The user is now looking at an image: {}", image.context);
        self.transport
            .send_context(text)
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))
    }

    fn append_user(&mut self, text: String, updates: &mut Vec<SessionUpdate>) {
        let focus = self.topic.relevant_image_index(&text);
        let item = self.transcript.push(Role::User, text);
        updates.push(SessionUpdate::Transcript(item.clone()));
        if let Some(index) = focus {
            if index != self.image_index {
                self.image_index = index;
                updates.push(SessionUpdate::ImageFocus(index));
            }
        }
    }

    fn report_orb(&mut self, updates: &mut Vec<SessionUpdate>) {
        let orb = self.orb_state();
        if orb != self.reported_orb {
            self.reported_orb = orb;
            updates.push(SessionUpdate::Orb(orb));
        }
    }

    pub fn orb_state(&self) -> OrbState {
        OrbState::derive(
            self.status,
            self.agent_speaking,
            self.transcript.last_role(),
            self.start_failed,
        )
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status != ConnectionStatus::Disconnected
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The current user-facing error, if any. Only the latest one is kept.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Persona returned by the broker for the current or last session.
    pub fn persona(&self) -> Option<&Persona> {
        self.persona.as_ref()
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    /// Carousel position of the image currently in focus.
    pub fn image_index(&self) -> usize {
        self.image_index
    }
}
