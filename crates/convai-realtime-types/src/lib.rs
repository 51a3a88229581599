//! Wire types of the conversational-AI real-time WebSocket protocol.
pub mod audio;
pub mod events;
pub mod overrides;

pub use events::{ClientEvent, ClientMessage, ServerEvent};
pub use overrides::{ConversationOverrides, KnowledgeBaseFile, RagConfig};
