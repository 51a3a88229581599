use crate::message::ProviderMessage;

/// Whether the agent is currently producing audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentMode {
    Speaking,
    Listening,
}

/// Events a real-time provider emits back to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Message(ProviderMessage),
    Mode(AgentMode),
    Error(String),
    Closed,
}
