use crate::transcript::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// The five-valued session indicator shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrbState {
    #[default]
    Idle,
    Listening,
    Thinking,
    Speaking,
    Disconnected,
}

impl OrbState {
    /// Derives the indicator from the session inputs.
    ///
    /// While connected and silent, the provider gives no signal that a reply is being
    /// generated. Silence right after a user turn is shown as `Thinking`, any other
    /// silence as `Listening`. This is an approximation.
    pub fn derive(
        status: ConnectionStatus,
        agent_speaking: bool,
        last_role: Option<Role>,
        start_failed: bool,
    ) -> Self {
        match status {
            ConnectionStatus::Disconnected if start_failed => OrbState::Disconnected,
            ConnectionStatus::Disconnected => OrbState::Idle,
            ConnectionStatus::Connecting => OrbState::Thinking,
            ConnectionStatus::Connected if agent_speaking => OrbState::Speaking,
            ConnectionStatus::Connected => match last_role {
                Some(Role::User) => OrbState::Thinking,
                Some(Role::Agent) | None => OrbState::Listening,
            },
        }
    }
}

impl fmt::Display for OrbState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrbState::Idle => "idle",
            OrbState::Listening => "listening",
            OrbState::Thinking => "thinking",
            OrbState::Speaking => "speaking",
            OrbState::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}
