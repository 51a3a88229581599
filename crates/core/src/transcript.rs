use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptItem {
    pub role: Role,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only conversation record, in event arrival order.
///
/// Arrival order is not utterance order: user and agent speech come from independent
/// streams, so two quick turns can land swapped.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    items: Vec<TranscriptItem>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: Role, message: String) -> &TranscriptItem {
        self.items.push(TranscriptItem {
            role,
            message,
            timestamp: Utc::now(),
        });
        &self.items[self.items.len() - 1]
    }

    pub fn items(&self) -> &[TranscriptItem] {
        &self.items
    }

    pub fn last_role(&self) -> Option<Role> {
        self.items.last().map(|item| item.role)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
