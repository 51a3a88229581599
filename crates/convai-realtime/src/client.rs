use crate::client::stats::Stats;
use crate::types;
use anyhow::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use types::audio::Base64EncodedAudioBytes;
use types::events::client::{
    ContextualUpdateEvent, ConversationInitiationClientDataEvent, PongEvent, UserAudioChunkEvent,
    UserMessageEvent,
};
use types::{ClientEvent, ClientMessage, ConversationOverrides, ServerEvent};

pub(crate) mod config;
pub(crate) mod consts;
pub(crate) mod stats;
mod utils;

/// What the writer task puts on the socket.
enum Outbound {
    Event(ClientEvent),
    Close,
}

type ClientTx = tokio::sync::mpsc::Sender<Outbound>;
type ServerTx = tokio::sync::broadcast::Sender<ServerEvent>;
pub type ServerRx = tokio::sync::broadcast::Receiver<ServerEvent>;

/// The operations a conversation runtime needs from a live session.
#[async_trait]
pub trait ConvaiClient: Send {
    async fn initiate(&mut self, overrides: ConversationOverrides) -> Result<()>;
    async fn send_user_message(&mut self, text: String) -> Result<()>;
    async fn append_user_audio(&mut self, audio: Base64EncodedAudioBytes) -> Result<()>;
    /// Background information for the agent that does not prompt a reply.
    async fn send_contextual_update(&mut self, text: String) -> Result<()>;
    async fn server_events(&mut self) -> Result<ServerRx>;
    fn stats(&self) -> Result<Stats>;
    async fn close(&mut self) -> Result<()>;
}

// One WebSocket session: the outbound queue, the broadcast of decoded server events,
// and usage counters shared with the reader task.
pub struct Client {
    capacity: usize,
    signed_url: String,
    c_tx: Option<ClientTx>,
    s_tx: Option<ServerTx>,
    stats: Arc<Mutex<Stats>>,
}

impl Client {
    fn new(capacity: usize, signed_url: &str) -> Self {
        Self {
            capacity,
            signed_url: signed_url.to_string(),
            c_tx: None,
            s_tx: None,
            stats: Arc::new(Mutex::new(Stats::new())),
        }
    }

    async fn connect(&mut self) -> Result<()> {
        if self.c_tx.is_some() {
            return Err(anyhow::anyhow!("already connected"));
        }

        let request = utils::build_request(&self.signed_url)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;
        let (mut write, mut read) = ws_stream.split();

        let (c_tx, mut c_rx) = tokio::sync::mpsc::channel::<Outbound>(self.capacity);
        let (s_tx, _) = tokio::sync::broadcast::channel(self.capacity);

        self.c_tx = Some(c_tx.clone());
        self.s_tx = Some(s_tx.clone());

        // Writer: serializes queued events until asked to close.
        tokio::spawn(async move {
            while let Some(outbound) = c_rx.recv().await {
                match outbound {
                    Outbound::Event(event) => match serde_json::to_string(&event) {
                        Ok(text) => {
                            if let Err(e) = write.send(Message::Text(text)).await {
                                tracing::error!("failed to send message: {}", e);
                            }
                        }
                        Err(e) => {
                            tracing::error!("failed to serialize event: {}", e);
                        }
                    },
                    Outbound::Close => {
                        if let Err(e) = write.send(Message::Close(None)).await {
                            tracing::debug!("failed to send close frame: {}", e);
                        }
                        break;
                    }
                }
            }
        });

        let stats = self.stats.clone();
        let pong_tx = c_tx;
        // Reader: decodes frames, answers pings, broadcasts everything else.
        tokio::spawn(async move {
            let mut close_reason = None;
            while let Some(message) = read.next().await {
                let message = match message {
                    Err(e) => {
                        tracing::error!("failed to read message: {}", e);
                        let event = ServerEvent::ConnectionError {
                            message: e.to_string(),
                        };
                        if s_tx.send(event).is_err() {
                            tracing::debug!("no subscribers for connection error");
                        }
                        close_reason = Some(e.to_string());
                        break;
                    }
                    Ok(message) => message,
                };
                match message {
                    Message::Text(text) => {
                        let event = match serde_json::from_str::<ServerEvent>(&text) {
                            Ok(event) => event,
                            Err(e) => {
                                tracing::error!(
                                    "failed to deserialize event: {}, text=> {:?}",
                                    e,
                                    text
                                );
                                continue;
                            }
                        };

                        match &event {
                            ServerEvent::Ping(ping) => {
                                let pong = ClientMessage::Pong(PongEvent::new(ping.event_id()));
                                if let Err(e) = pong_tx.send(Outbound::Event(pong.into())).await {
                                    tracing::warn!("failed to queue pong: {}", e);
                                }
                                continue;
                            }
                            ServerEvent::UserTranscript(_) => {
                                if let Ok(mut guard) = stats.lock() {
                                    guard.record_user_transcript();
                                }
                            }
                            ServerEvent::AgentResponse(_) => {
                                if let Ok(mut guard) = stats.lock() {
                                    guard.record_agent_response();
                                }
                            }
                            ServerEvent::Audio(audio) => {
                                if let Ok(mut guard) = stats.lock() {
                                    guard.record_audio(audio.audio().len());
                                }
                            }
                            ServerEvent::Unknown => {
                                tracing::debug!("ignoring unrecognized event: {}", text);
                                continue;
                            }
                            _ => {}
                        }

                        if s_tx.send(event).is_err() {
                            tracing::debug!("no subscribers for server event");
                        }
                    }
                    Message::Binary(bin) => {
                        tracing::warn!("unexpected binary message: {} bytes", bin.len());
                    }
                    Message::Close(frame) => {
                        tracing::info!("connection closed: {:?}", frame);
                        close_reason = frame.map(|f| f.reason.to_string());
                        break;
                    }
                    _ => {}
                }
            }
            if s_tx
                .send(ServerEvent::Close {
                    reason: close_reason,
                })
                .is_err()
            {
                tracing::debug!("no subscribers for close event");
            }
        });
        Ok(())
    }

    async fn send_client_event(&mut self, event: ClientEvent) -> Result<()> {
        match self.c_tx {
            Some(ref tx) => {
                tx.send(Outbound::Event(event))
                    .await
                    .map_err(|_| anyhow::anyhow!("connection writer has stopped"))?;
                Ok(())
            }
            None => Err(anyhow::anyhow!("not connected yet")),
        }
    }
}

#[async_trait]
impl ConvaiClient for Client {
    /// Sends `conversation_initiation_client_data`; must be the first frame of a session.
    async fn initiate(&mut self, overrides: ConversationOverrides) -> Result<()> {
        let event = ClientMessage::ConversationInitiationClientData(
            ConversationInitiationClientDataEvent::new().with_overrides(overrides),
        );
        self.send_client_event(event.into()).await
    }

    async fn send_user_message(&mut self, text: String) -> Result<()> {
        let event = ClientMessage::UserMessage(UserMessageEvent::new(&text));
        self.send_client_event(event.into()).await
    }

    async fn append_user_audio(&mut self, audio: Base64EncodedAudioBytes) -> Result<()> {
        let event = ClientEvent::UserAudioChunk(UserAudioChunkEvent::new(audio));
        self.send_client_event(event).await
    }

    async fn send_contextual_update(&mut self, text: String) -> Result<()> {
        let event = ClientMessage::ContextualUpdate(ContextualUpdateEvent::new(&text));
        self.send_client_event(event.into()).await
    }

    async fn server_events(&mut self) -> Result<ServerRx> {
        match self.s_tx {
            Some(ref tx) => Ok(tx.subscribe()),
            None => Err(anyhow::anyhow!("not connected yet")),
        }
    }

    fn stats(&self) -> Result<Stats> {
        if let Ok(stats_guard) = self.stats.lock() {
            Ok(stats_guard.clone())
        } else {
            Err(anyhow::anyhow!("failed to get stats"))
        }
    }

    /// Asks the writer to send a close frame. Closing twice is a no-op.
    async fn close(&mut self) -> Result<()> {
        if let Some(tx) = self.c_tx.take() {
            if tx.send(Outbound::Close).await.is_err() {
                tracing::debug!("connection writer already stopped");
            }
        }
        self.s_tx = None;
        Ok(())
    }
}

pub async fn connect_with_capacity(signed_url: &str, capacity: usize) -> Result<Client> {
    let mut client = Client::new(capacity, signed_url);
    client.connect().await?;
    Ok(client)
}

pub async fn connect(signed_url: &str) -> Result<Client> {
    connect_with_capacity(signed_url, consts::DEFAULT_CAPACITY).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn next_text<S>(ws: &mut S) -> String
    where
        S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(_)) => continue,
                other => panic!("expected a text frame, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_initiate_ping_and_transcript_round() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            let initiation: serde_json::Value =
                serde_json::from_str(&next_text(&mut ws).await).unwrap();
            assert_eq!(initiation["type"], "conversation_initiation_client_data");
            assert_eq!(
                initiation["conversation_config_override"]["tts"]["voice_id"],
                "voice-x"
            );

            ws.send(Message::Text(
                r#"{"type":"ping","ping_event":{"event_id":42,"ping_ms":10}}"#.to_string(),
            ))
            .await
            .unwrap();
            let pong: serde_json::Value = serde_json::from_str(&next_text(&mut ws).await).unwrap();
            assert_eq!(pong, serde_json::json!({"type": "pong", "event_id": 42}));

            ws.send(Message::Text(
                r#"{"type":"user_transcript","user_transcription_event":{"user_transcript":"hello"}}"#
                    .to_string(),
            ))
            .await
            .unwrap();
            ws.close(None).await.ok();
        });

        let mut client = connect(&format!("ws://{}", addr)).await.unwrap();
        let mut events = client.server_events().await.unwrap();
        let overrides = ConversationOverrides::builder()
            .with_voice_id("voice-x")
            .build();
        client.initiate(overrides).await.unwrap();

        match events.recv().await.unwrap() {
            ServerEvent::UserTranscript(event) => assert_eq!(event.transcript(), "hello"),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(
            events.recv().await.unwrap(),
            ServerEvent::Close { .. }
        ));

        server.await.unwrap();
        assert_eq!(client.stats().unwrap().user_transcripts(), 1);
    }

    #[tokio::test]
    async fn test_user_turn_events_are_written_in_order() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let mut frames = Vec::new();
            for _ in 0..3 {
                let frame: serde_json::Value =
                    serde_json::from_str(&next_text(&mut ws).await).unwrap();
                frames.push(frame);
            }
            frames
        });

        let mut client = connect(&format!("ws://{}", addr)).await.unwrap();
        client
            .send_contextual_update("The user is looking at the Saturn V photo".to_string())
            .await
            .unwrap();
        client.send_user_message("hello".to_string()).await.unwrap();
        client.append_user_audio("AAAA".to_string()).await.unwrap();

        let frames = server.await.unwrap();
        assert_eq!(
            frames[0],
            serde_json::json!({
                "type": "contextual_update",
                "text": "The user is looking at the Saturn V photo"
            })
        );
        assert_eq!(frames[1], serde_json::json!({"type": "user_message", "text": "hello"}));
        assert_eq!(frames[2], serde_json::json!({"user_audio_chunk": "AAAA"}));
        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_socket_reports_connection_error_before_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (subscribed_tx, subscribed_rx) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            subscribed_rx.await.unwrap();
            // Gone without a closing handshake.
            drop(ws);
        });

        let mut client = connect(&format!("ws://{}", addr)).await.unwrap();
        let mut events = client.server_events().await.unwrap();
        subscribed_tx.send(()).unwrap();
        server.await.unwrap();

        match events.recv().await.unwrap() {
            ServerEvent::ConnectionError { message } => assert!(!message.is_empty()),
            other => panic!("unexpected event: {:?}", other),
        }
        match events.recv().await.unwrap() {
            ServerEvent::Close { reason } => assert!(reason.is_some()),
            other => panic!("unexpected event: {:?}", other),
        }
        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_send_before_connect_fails() {
        let mut client = Client::new(8, "ws://127.0.0.1:1");
        assert!(client.send_user_message("hi".to_string()).await.is_err());
        assert!(client.server_events().await.is_err());
        // Closing an unconnected client is harmless.
        assert!(client.close().await.is_ok());
    }
}
