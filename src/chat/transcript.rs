use super::mood::Mood;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// One message in the coach conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub text: String,
    pub is_user: bool,
    pub mood: Option<Mood>,
    pub xp_gained: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// A message typed (or spoken) by the user, tagged with its mood
    pub fn user(text: impl Into<String>, mood: Mood) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            is_user: true,
            mood: Some(mood),
            xp_gained: None,
            timestamp: Utc::now(),
        }
    }

    /// A response from the coach
    pub fn coach(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            is_user: false,
            mood: None,
            xp_gained: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_mood(mut self, mood: Mood) -> Self {
        self.mood = Some(mood);
        self
    }

    pub fn with_xp(mut self, xp: u32) -> Self {
        self.xp_gained = Some(xp);
        self
    }
}

/// Ordered, append-only conversation transcript
///
/// Messages are never mutated after append.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Arc<RwLock<Vec<ChatMessage>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn append(&self, message: ChatMessage) {
        self.messages.write().push(message);
    }

    pub fn get_all(&self) -> Vec<ChatMessage> {
        self.messages.read().clone()
    }

    pub fn last(&self) -> Option<ChatMessage> {
        self.messages.read().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
