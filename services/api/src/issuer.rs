use anyhow::Result;
use async_trait::async_trait;
use convai_realtime::SignedUrlClient;
#[cfg(test)]
use mockall::automock;

/// Issues signed session URLs for the provider agent.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SignedUrlIssuer: Send + Sync {
    async fn signed_url(&self, agent_id: &str) -> Result<String>;
}

#[async_trait]
impl SignedUrlIssuer for SignedUrlClient {
    async fn signed_url(&self, agent_id: &str) -> Result<String> {
        self.get_signed_url(agent_id).await
    }
}
