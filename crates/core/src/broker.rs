use crate::error::{BROKER_ERROR_MESSAGE, SessionError};
use crate::topic::Persona;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

/// What the broker hands back for one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    pub signed_url: String,
    pub agent_id: String,
    pub topic_id: String,
    pub document_id: String,
    pub persona: Persona,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequest<'a> {
    topic_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionBroker: Send + Sync {
    async fn request_session(&self, topic_id: &str) -> Result<SessionGrant, SessionError>;
}

/// Requests grants from the broker service over HTTP.
pub struct HttpSessionBroker {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpSessionBroker {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/api/conversation", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SessionBroker for HttpSessionBroker {
    async fn request_session(&self, topic_id: &str) -> Result<SessionGrant, SessionError> {
        tracing::debug!("requesting session for topic {} from {}", topic_id, self.endpoint);
        let response = self
            .http
            .post(&self.endpoint)
            .json(&SessionRequest { topic_id })
            .send()
            .await
            .map_err(|e| {
                tracing::error!("broker request failed: {}", e);
                SessionError::Broker(BROKER_ERROR_MESSAGE.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| BROKER_ERROR_MESSAGE.to_string());
            tracing::warn!("broker rejected topic {}: {} ({})", topic_id, message, status);
            return Err(SessionError::Broker(message));
        }

        response.json::<SessionGrant>().await.map_err(|e| {
            tracing::error!("malformed broker response: {}", e);
            SessionError::Broker(BROKER_ERROR_MESSAGE.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response and returns the raw request it received.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let length = text
                        .lines()
                        .find_map(|line| {
                            line.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if request.len() >= split + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });
        (base, handle)
    }

    #[tokio::test]
    async fn test_successful_grant() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"signedUrl":"wss://signed","agentId":"agent","topicId":"apollo-11","documentId":"doc","persona":{"name":"Guide","traits":["calm"],"voiceId":"v"}}"#,
        )
        .await;

        let broker = HttpSessionBroker::new(&format!("{}/", base));
        let grant = broker.request_session("apollo-11").await.unwrap();
        assert_eq!(grant.signed_url, "wss://signed");
        assert_eq!(grant.persona.name, "Guide");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/conversation "));
        assert!(request.contains(r#"{"topicId":"apollo-11"}"#));
    }

    #[tokio::test]
    async fn test_rejection_surfaces_broker_message() {
        let (base, _server) = serve_once("404 Not Found", r#"{"error":"Topic not found"}"#).await;
        let broker = HttpSessionBroker::new(&base);
        let err = broker.request_session("unknown-topic").await.unwrap_err();
        assert_eq!(err, SessionError::Broker("Topic not found".to_string()));
    }

    #[tokio::test]
    async fn test_rejection_without_body_uses_fallback() {
        let (base, _server) = serve_once("502 Bad Gateway", "").await;
        let broker = HttpSessionBroker::new(&base);
        let err = broker.request_session("apollo-11").await.unwrap_err();
        assert_eq!(err.to_string(), BROKER_ERROR_MESSAGE);
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let broker = HttpSessionBroker::new("http://localhost:3000/");
        assert_eq!(broker.endpoint(), "http://localhost:3000/api/conversation");
    }
}
