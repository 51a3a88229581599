use anyhow::{Context, Result};
use async_trait::async_trait;
use convai_realtime::types::ServerEvent;
use convai_realtime::types::audio::Base64EncodedAudioBytes;
use convai_realtime::{ConvaiClient, ServerRx};
use echoes_core::generic_types::{AgentMode, TransportEvent};
use echoes_core::message::ProviderMessage;
use echoes_core::realtime_api::RealtimeTransport;
use futures_util::future::BoxFuture;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::time::Instant;

type Connector<C> = Box<dyn Fn(String) -> BoxFuture<'static, Result<C>> + Send + Sync>;

/// Implements `RealtimeTransport` on top of a `ConvaiClient`.
/// Generic over the client so the provider connection can be mocked in tests.
pub struct ConvaiAdapter<C: ConvaiClient> {
    connect: Connector<C>,
    client: Option<C>,
    server_rx: Option<ServerRx>,
    quiet_window: Duration,
}

impl ConvaiAdapter<convai_realtime::Client> {
    pub fn new(quiet_window: Duration) -> Self {
        Self::with_connector(quiet_window, |signed_url| {
            Box::pin(async move { convai_realtime::connect(&signed_url).await })
        })
    }
}

impl<C: ConvaiClient> ConvaiAdapter<C> {
    pub fn with_connector<F>(quiet_window: Duration, connect: F) -> Self
    where
        F: Fn(String) -> BoxFuture<'static, Result<C>> + Send + Sync + 'static,
    {
        Self {
            connect: Box::new(connect),
            client: None,
            server_rx: None,
            quiet_window,
        }
    }

    fn client(&mut self) -> Result<&mut C> {
        self.client
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("conversation is not open"))
    }
}

#[async_trait]
impl<C: ConvaiClient + 'static> RealtimeTransport for ConvaiAdapter<C> {
    async fn open(
        &mut self,
        signed_url: &str,
        overrides: convai_realtime::types::ConversationOverrides,
    ) -> Result<()> {
        if self.client.is_some() {
            return Err(anyhow::anyhow!("conversation is already open"));
        }

        let mut client = (self.connect)(signed_url.to_string())
            .await
            .context("Failed to connect to the conversation service")?;
        // Subscribe before initiating so no early event is missed.
        let server_rx = client.server_events().await?;
        client
            .initiate(overrides)
            .await
            .context("Failed to send conversation overrides")?;

        self.client = Some(client);
        self.server_rx = Some(server_rx);
        Ok(())
    }

    async fn send_user_text(&mut self, text: String) -> Result<()> {
        self.client()?.send_user_message(text).await
    }

    async fn send_user_audio(&mut self, audio: Base64EncodedAudioBytes) -> Result<()> {
        self.client()?.append_user_audio(audio).await
    }

    async fn send_context(&mut self, text: String) -> Result<()> {
        self.client()?.send_contextual_update(text).await
    }

    async fn events(&mut self) -> Result<mpsc::Receiver<TransportEvent>> {
        let server_rx = self
            .server_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("event channel is not available"))?;
        let (tx, rx) = mpsc::channel(128);
        tokio::spawn(forward_events(server_rx, tx, self.quiet_window));
        Ok(rx)
    }

    async fn close(&mut self) -> Result<()> {
        self.server_rx = None;
        let Some(mut client) = self.client.take() else {
            return Ok(());
        };
        match client.stats() {
            Ok(stats) => tracing::info!(
                user_transcripts = stats.user_transcripts(),
                agent_responses = stats.agent_responses(),
                audio_chunks = stats.audio_chunks(),
                audio_bytes = stats.audio_bytes(),
                "conversation usage"
            ),
            Err(e) => tracing::debug!("conversation usage unavailable: {}", e),
        }
        client.close().await
    }
}

/// Maps one provider event, tracking whether the agent is audible.
///
/// Audio marks the agent speaking; an interruption or a user transcript marks it
/// listening. A socket failure becomes an error event ahead of the close.
/// Returns `None` once the session has closed.
fn translate(event: ServerEvent, speaking: &mut bool) -> Option<Vec<TransportEvent>> {
    let mut out = Vec::new();
    match event {
        ServerEvent::Audio(_) => {
            if !*speaking {
                *speaking = true;
                out.push(TransportEvent::Mode(AgentMode::Speaking));
            }
        }
        ServerEvent::Interruption(_) => stop_speaking(speaking, &mut out),
        ServerEvent::UserTranscript(event) => {
            stop_speaking(speaking, &mut out);
            out.push(TransportEvent::Message(ProviderMessage::user_transcription(
                event.transcript(),
            )));
        }
        ServerEvent::AgentResponse(event) => {
            out.push(TransportEvent::Message(ProviderMessage::agent_response(
                event.response(),
            )));
        }
        ServerEvent::AgentResponseCorrection(event) => {
            tracing::debug!("agent response truncated to {:?}", event.corrected());
        }
        ServerEvent::ConversationInitiationMetadata(event) => {
            tracing::info!(
                "conversation {} started",
                event.metadata().conversation_id()
            );
        }
        ServerEvent::ConnectionError { message } => {
            stop_speaking(speaking, &mut out);
            out.push(TransportEvent::Error(message));
        }
        ServerEvent::Close { reason } => {
            tracing::info!("conversation closed: {:?}", reason);
            return None;
        }
        ServerEvent::Ping(_) | ServerEvent::VadScore(_) | ServerEvent::Unknown => {}
    }
    Some(out)
}

fn stop_speaking(speaking: &mut bool, out: &mut Vec<TransportEvent>) {
    if *speaking {
        *speaking = false;
        out.push(TransportEvent::Mode(AgentMode::Listening));
    }
}

async fn forward_events(
    mut server_rx: ServerRx,
    tx: mpsc::Sender<TransportEvent>,
    quiet_window: Duration,
) {
    let mut speaking = false;
    let silence = tokio::time::sleep(quiet_window);
    tokio::pin!(silence);

    loop {
        let received = tokio::select! {
            received = server_rx.recv() => received,
            _ = &mut silence, if speaking => {
                speaking = false;
                if tx.send(TransportEvent::Mode(AgentMode::Listening)).await.is_err() {
                    return;
                }
                continue;
            }
        };

        let event = match received {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("dropped {} conversation events", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        if matches!(event, ServerEvent::Audio(_)) {
            silence.as_mut().reset(Instant::now() + quiet_window);
        }

        let Some(events) = translate(event, &mut speaking) else {
            break;
        };
        for event in events {
            if tx.send(event).await.is_err() {
                tracing::warn!("transport event receiver dropped, stopping adapter task.");
                return;
            }
        }
    }

    if tx.send(TransportEvent::Closed).await.is_err() {
        tracing::debug!("transport event receiver already dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convai_realtime::Stats;
    use convai_realtime::types::ConversationOverrides;
    use mockall::mock;

    mock! {
        pub Convai {}
        #[async_trait]
        impl ConvaiClient for Convai {
            async fn initiate(&mut self, overrides: ConversationOverrides) -> Result<()>;
            async fn send_user_message(&mut self, text: String) -> Result<()>;
            async fn append_user_audio(&mut self, audio: Base64EncodedAudioBytes) -> Result<()>;
            async fn send_contextual_update(&mut self, text: String) -> Result<()>;
            async fn server_events(&mut self) -> Result<ServerRx>;
            fn stats(&self) -> Result<Stats>;
            async fn close(&mut self) -> Result<()>;
        }
    }

    fn server_event(json: &str) -> ServerEvent {
        serde_json::from_str(json).unwrap()
    }

    fn audio() -> ServerEvent {
        server_event(r#"{"type":"audio","audio_event":{"audio_base_64":"AAAA","event_id":1}}"#)
    }

    /// An adapter whose connector hands out `client` once.
    fn adapter(client: MockConvai, quiet_window: Duration) -> ConvaiAdapter<MockConvai> {
        let slot = std::sync::Mutex::new(Some(client));
        ConvaiAdapter::with_connector(quiet_window, move |url| {
            assert_eq!(url, "wss://signed.example");
            let client = slot.lock().unwrap().take();
            Box::pin(async move { client.ok_or_else(|| anyhow::anyhow!("connected twice")) })
        })
    }

    #[test]
    fn test_translate_speaking_heuristic() {
        let mut speaking = false;

        let events = translate(audio(), &mut speaking).unwrap();
        assert_eq!(events, vec![TransportEvent::Mode(AgentMode::Speaking)]);
        assert!(translate(audio(), &mut speaking).unwrap().is_empty());

        let events = translate(server_event(r#"{"type":"interruption"}"#), &mut speaking).unwrap();
        assert_eq!(events, vec![TransportEvent::Mode(AgentMode::Listening)]);
        assert!(!speaking);
    }

    #[test]
    fn test_translate_transcripts() {
        let mut speaking = true;
        let events = translate(
            server_event(
                r#"{"type":"user_transcript","user_transcription_event":{"user_transcript":"hi"}}"#,
            ),
            &mut speaking,
        )
        .unwrap();
        assert_eq!(
            events,
            vec![
                TransportEvent::Mode(AgentMode::Listening),
                TransportEvent::Message(ProviderMessage::user_transcription("hi")),
            ]
        );

        let events = translate(
            server_event(
                r#"{"type":"agent_response","agent_response_event":{"agent_response":"hello"}}"#,
            ),
            &mut speaking,
        )
        .unwrap();
        assert_eq!(
            events,
            vec![TransportEvent::Message(ProviderMessage::agent_response("hello"))]
        );

        assert!(translate(ServerEvent::Close { reason: None }, &mut speaking).is_none());
    }

    #[tokio::test]
    async fn test_socket_failure_forwards_error_before_close() {
        let (server_tx, server_rx) = tokio::sync::broadcast::channel(16);
        let (tx, mut events) = mpsc::channel(16);
        let task = tokio::spawn(forward_events(server_rx, tx, Duration::from_secs(5)));

        let reason = "Connection reset without closing handshake".to_string();
        server_tx.send(audio()).unwrap();
        server_tx
            .send(ServerEvent::ConnectionError {
                message: reason.clone(),
            })
            .unwrap();
        server_tx
            .send(ServerEvent::Close {
                reason: Some(reason.clone()),
            })
            .unwrap();
        task.await.unwrap();

        let mut received = Vec::new();
        while let Some(event) = events.recv().await {
            received.push(event);
        }
        assert_eq!(
            received,
            vec![
                TransportEvent::Mode(AgentMode::Speaking),
                TransportEvent::Mode(AgentMode::Listening),
                TransportEvent::Error(reason),
                TransportEvent::Closed,
            ]
        );
    }

    #[tokio::test]
    async fn test_open_initiates_and_forwards_events() {
        // --- Arrange ---
        let (server_tx, server_rx) = tokio::sync::broadcast::channel(16);
        let mut client = MockConvai::new();
        client
            .expect_server_events()
            .times(1)
            .return_once(move || Ok(server_rx));
        client
            .expect_initiate()
            .withf(|overrides| overrides.tts().voice_id() == Some("voice-1"))
            .times(1)
            .returning(|_| Ok(()));
        client.expect_stats().times(1).returning(|| Ok(Stats::default()));
        client.expect_close().times(1).returning(|| Ok(()));
        let mut adapter = adapter(client, Duration::from_millis(50));
        let overrides = ConversationOverrides::builder()
            .with_voice_id("voice-1")
            .build();

        // --- Act ---
        adapter.open("wss://signed.example", overrides).await.unwrap();
        let mut events = adapter.events().await.unwrap();
        server_tx.send(audio()).unwrap();

        // --- Assert ---
        assert_eq!(
            events.recv().await,
            Some(TransportEvent::Mode(AgentMode::Speaking))
        );
        // No more audio: the quiet window hands the turn back to the user.
        assert_eq!(
            events.recv().await,
            Some(TransportEvent::Mode(AgentMode::Listening))
        );

        server_tx.send(ServerEvent::Close { reason: None }).unwrap();
        assert_eq!(events.recv().await, Some(TransportEvent::Closed));

        adapter.close().await.unwrap();
        adapter.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_send_forwards_to_client() {
        let (_server_tx, server_rx) = tokio::sync::broadcast::channel(16);
        let mut client = MockConvai::new();
        client
            .expect_server_events()
            .return_once(move || Ok(server_rx));
        client.expect_initiate().returning(|_| Ok(()));
        client
            .expect_send_user_message()
            .withf(|text| text == "hello")
            .times(1)
            .returning(|_| Ok(()));
        client
            .expect_append_user_audio()
            .times(1)
            .returning(|_| Ok(()));
        client
            .expect_send_contextual_update()
            .withf(|text| text == "looking at the launch pad")
            .times(1)
            .returning(|_| Ok(()));
        client.expect_stats().returning(|| Ok(Stats::default()));
        client.expect_close().returning(|| Ok(()));
        let mut adapter = adapter(client, Duration::from_millis(50));

        adapter
            .open("wss://signed.example", ConversationOverrides::builder().build())
            .await
            .unwrap();
        adapter.send_user_text("hello".to_string()).await.unwrap();
        adapter.send_user_audio("AAAA".to_string()).await.unwrap();
        adapter
            .send_context("looking at the launch pad".to_string())
            .await
            .unwrap();
        adapter.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_unopened_adapter_rejects_use() {
        let mut adapter = adapter(MockConvai::new(), Duration::from_millis(50));
        assert!(adapter.send_user_text("hello".to_string()).await.is_err());
        assert!(adapter.events().await.is_err());
        assert!(adapter.close().await.is_ok());
    }
}
