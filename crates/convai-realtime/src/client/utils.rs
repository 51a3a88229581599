use anyhow::Result;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;

/// Builds the WebSocket handshake for a signed session URL.
///
/// The signed URL already carries its authorization, so no headers are added.
pub fn build_request(signed_url: &str) -> Result<Request> {
    if !(signed_url.starts_with("wss://") || signed_url.starts_with("ws://")) {
        return Err(anyhow::anyhow!(
            "signed URL must use the ws:// or wss:// scheme"
        ));
    }
    Ok(signed_url.into_client_request()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_accepts_websocket_urls() {
        let request =
            build_request("wss://example.com/v1/convai/conversation?conversation_signature=abc")
            .unwrap();
        assert_eq!(request.uri().host(), Some("example.com"));
        assert_eq!(
            request.uri().query(),
            Some("conversation_signature=abc")
        );
    }

    #[test]
    fn test_build_request_rejects_http() {
        assert!(build_request("https://example.com/socket").is_err());
        assert!(build_request("").is_err());
    }
}
