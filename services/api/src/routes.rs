use crate::AppState;
use crate::error::{
    AGENT_ID_NOT_CONFIGURED, ApiError, INVALID_BODY, SIGNED_URL_FAILED, TOPIC_ID_REQUIRED,
    TOPIC_NOT_FOUND,
};
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use echoes_core::broker::SessionGrant;
use echoes_core::topic::TopicSummary;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    #[serde(default)]
    pub topic_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: &'static str,
    pub has_api_key: bool,
    pub has_agent_id: bool,
}

/// `POST /api/conversation`
///
/// The body is parsed as JSON whatever its `Content-Type`.
pub async fn request_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SessionGrant>, ApiError> {
    let request: SessionRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!("rejected session request body: {}", e);
        ApiError::Validation(INVALID_BODY)
    })?;

    let topic_id = request
        .topic_id
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::Validation(TOPIC_ID_REQUIRED))?;

    let agent_id = state.agent_id.clone().ok_or_else(|| {
        error!("ELEVENLABS_AGENT_ID is not configured");
        ApiError::Configuration(AGENT_ID_NOT_CONFIGURED)
    })?;

    let topic = state
        .catalog
        .get_by_id(&topic_id)
        .ok_or(ApiError::NotFound(TOPIC_NOT_FOUND))?;

    info!(
        topic_id = %topic.id,
        title = %topic.title,
        persona = %topic.persona.name,
        voice_id = %topic.persona.voice_id,
        document_id = %topic.document_id,
        has_first_message = !topic.dynamic_first_message.is_empty(),
        has_system_prompt = !topic.dynamic_system_prompt.is_empty(),
        "activating topic configuration"
    );

    let signed_url = state.issuer.signed_url(&agent_id).await.map_err(|e| {
        error!("failed to get signed URL for topic {}: {:#}", topic.id, e);
        ApiError::Upstream(SIGNED_URL_FAILED)
    })?;

    Ok(Json(SessionGrant {
        signed_url,
        agent_id,
        topic_id: topic.id.clone(),
        document_id: topic.document_id.clone(),
        persona: topic.persona.clone(),
    }))
}

/// `GET /api/conversation`
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        has_api_key: state.has_api_key,
        has_agent_id: state.agent_id.is_some(),
    })
}

/// `GET /api/topics`
pub async fn list_topics(State(state): State<AppState>) -> Json<Vec<TopicSummary>> {
    Json(state.catalog.topics().iter().map(|t| t.summary()).collect())
}

/// `GET /api/topics/{id}`
pub async fn get_topic(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TopicSummary>, ApiError> {
    state
        .catalog
        .get_by_id(&id)
        .map(|topic| Json(topic.summary()))
        .ok_or(ApiError::NotFound(TOPIC_NOT_FOUND))
}
