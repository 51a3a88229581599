use crate::topic::Topic;
use convai_realtime_types::{ConversationOverrides, KnowledgeBaseFile, RagConfig};

/// Per-topic session configuration sent when the conversation opens.
///
/// `document_id` is the knowledge-base document returned by the broker, which may
/// differ from the catalog copy the client holds.
pub fn session_overrides(topic: &Topic, document_id: &str) -> ConversationOverrides {
    ConversationOverrides::builder()
        .with_voice_id(&topic.persona.voice_id)
        .with_first_message(&topic.dynamic_first_message)
        .with_prompt(&topic.dynamic_system_prompt)
        .with_knowledge_base_file(KnowledgeBaseFile::auto_file(&topic.title, document_id))
        .with_rag(RagConfig::default())
        .build()
}
