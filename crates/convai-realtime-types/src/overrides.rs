/// Embedding model used for retrieval over the knowledge base.
pub const RAG_EMBEDDING_MODEL: &str = "e5_mistral_7b_instruct";
/// Chunks farther than this from the query embedding are not retrieved.
pub const RAG_MAX_VECTOR_DISTANCE: f64 = 0.6;
/// Upper bound on the characters of retrieved context added to one turn.
pub const RAG_MAX_DOCUMENTS_LENGTH: u32 = 50_000;
/// Upper bound on the chunks retrieved for one turn.
pub const RAG_MAX_RETRIEVED_CHUNKS: u32 = 20;

/// Conversation settings that replace the agent's defaults for one session.
///
/// Sent once, as `conversation_config_override` of the
/// `conversation_initiation_client_data` event.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConversationOverrides {
    agent: AgentOverride,
    tts: TtsOverride,
}

impl ConversationOverrides {
    pub fn builder() -> ConversationOverridesBuilder {
        ConversationOverridesBuilder::new()
    }

    pub fn agent(&self) -> &AgentOverride {
        &self.agent
    }

    pub fn tts(&self) -> &TtsOverride {
        &self.tts
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AgentOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    first_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<PromptOverride>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
}

impl AgentOverride {
    pub fn first_message(&self) -> Option<&str> {
        self.first_message.as_deref()
    }

    pub fn prompt(&self) -> Option<&PromptOverride> {
        self.prompt.as_ref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PromptOverride {
    /// The system prompt.
    prompt: String,
    knowledge_base: Vec<KnowledgeBaseFile>,
    rag: RagConfig,
}

impl PromptOverride {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn knowledge_base(&self) -> &[KnowledgeBaseFile] {
        &self.knowledge_base
    }

    pub fn rag(&self) -> &RagConfig {
        &self.rag
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TtsOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_id: Option<String>,
}

impl TtsOverride {
    pub fn voice_id(&self) -> Option<&str> {
        self.voice_id.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeBaseKind {
    File,
    Url,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageMode {
    Auto,
    Prompt,
}

/// A pre-indexed knowledge-base document the agent may retrieve from.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KnowledgeBaseFile {
    #[serde(rename = "type")]
    kind: KnowledgeBaseKind,
    name: String,
    id: String,
    usage_mode: UsageMode,
}

impl KnowledgeBaseFile {
    /// A file document used automatically whenever retrieval finds it relevant.
    pub fn auto_file(name: &str, id: &str) -> Self {
        Self {
            kind: KnowledgeBaseKind::File,
            name: name.to_string(),
            id: id.to_string(),
            usage_mode: UsageMode::Auto,
        }
    }

    pub fn kind(&self) -> KnowledgeBaseKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn usage_mode(&self) -> UsageMode {
        self.usage_mode
    }
}

/// Retrieval-augmented generation settings.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RagConfig {
    enabled: bool,
    embedding_model: String,
    max_vector_distance: f64,
    max_documents_length: u32,
    max_retrieved_rag_chunks_count: u32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            embedding_model: RAG_EMBEDDING_MODEL.to_string(),
            max_vector_distance: RAG_MAX_VECTOR_DISTANCE,
            max_documents_length: RAG_MAX_DOCUMENTS_LENGTH,
            max_retrieved_rag_chunks_count: RAG_MAX_RETRIEVED_CHUNKS,
        }
    }
}

impl RagConfig {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn max_vector_distance(&self) -> f64 {
        self.max_vector_distance
    }

    pub fn max_documents_length(&self) -> u32 {
        self.max_documents_length
    }

    pub fn max_retrieved_rag_chunks_count(&self) -> u32 {
        self.max_retrieved_rag_chunks_count
    }
}

pub struct ConversationOverridesBuilder {
    agent: AgentOverride,
    tts: TtsOverride,
    prompt: Option<String>,
    knowledge_base: Vec<KnowledgeBaseFile>,
    rag: RagConfig,
}

impl ConversationOverridesBuilder {
    pub fn new() -> Self {
        Self {
            agent: AgentOverride::default(),
            tts: TtsOverride::default(),
            prompt: None,
            knowledge_base: vec![],
            rag: RagConfig::default(),
        }
    }

    pub fn with_voice_id(mut self, voice_id: &str) -> Self {
        self.tts.voice_id = Some(voice_id.to_string());
        self
    }

    pub fn with_first_message(mut self, first_message: &str) -> Self {
        self.agent.first_message = Some(first_message.to_string());
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.agent.language = Some(language.to_string());
        self
    }

    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.prompt = Some(prompt.to_string());
        self
    }

    pub fn with_knowledge_base_file(mut self, file: KnowledgeBaseFile) -> Self {
        self.knowledge_base.push(file);
        self
    }

    pub fn with_rag(mut self, rag: RagConfig) -> Self {
        self.rag = rag;
        self
    }

    /// The prompt block is only emitted when a system prompt was given; knowledge base
    /// and retrieval settings ride along with it.
    pub fn build(mut self) -> ConversationOverrides {
        self.agent.prompt = self.prompt.map(|prompt| PromptOverride {
            prompt,
            knowledge_base: self.knowledge_base,
            rag: self.rag,
        });
        ConversationOverrides {
            agent: self.agent,
            tts: self.tts,
        }
    }
}

impl Default for ConversationOverridesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_full_override() {
        let overrides = ConversationOverrides::builder()
            .with_voice_id("voice-1")
            .with_first_message("Hello!")
            .with_prompt("You are a guide.")
            .with_knowledge_base_file(KnowledgeBaseFile::auto_file("Apollo 11", "doc-1"))
            .build();

        let json = serde_json::to_value(&overrides).unwrap();
        let expected = serde_json::json!({
            "agent": {
                "first_message": "Hello!",
                "prompt": {
                    "prompt": "You are a guide.",
                    "knowledge_base": [
                        {"type": "file", "name": "Apollo 11", "id": "doc-1", "usage_mode": "auto"}
                    ],
                    "rag": {
                        "enabled": true,
                        "embedding_model": "e5_mistral_7b_instruct",
                        "max_vector_distance": 0.6,
                        "max_documents_length": 50000,
                        "max_retrieved_rag_chunks_count": 20
                    }
                }
            },
            "tts": {"voice_id": "voice-1"}
        });
        assert_eq!(json, expected);
    }

    #[test]
    fn test_prompt_block_omitted_without_prompt() {
        let overrides = ConversationOverrides::builder()
            .with_voice_id("voice-1")
            .with_knowledge_base_file(KnowledgeBaseFile::auto_file("x", "y"))
            .build();

        assert!(overrides.agent().prompt().is_none());
        let json = serde_json::to_string(&overrides).unwrap();
        assert_eq!(json, r#"{"agent":{},"tts":{"voice_id":"voice-1"}}"#);
    }

    #[test]
    fn test_deserialize_back() {
        let json = r#"{"agent":{"first_message":"hi","language":"en"},"tts":{}}"#;
        let overrides: ConversationOverrides = serde_json::from_str(json).unwrap();
        assert_eq!(overrides.agent().first_message(), Some("hi"));
        assert_eq!(overrides.agent().language(), Some("en"));
        assert_eq!(overrides.tts().voice_id(), None);
    }
}
