use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::chat::session::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    role: Role,
    text: String,
    created_at: DateTime<Utc>,
}

impl Turn {
    /// The system instruction turn. Only memory construction and reset create these.
    pub(crate) fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Result<Self, ChatError> {
        Self::message(Role::User, text.into())
    }

    pub fn assistant(text: impl Into<String>) -> Result<Self, ChatError> {
        Self::message(Role::Assistant, text.into())
    }

    fn message(role: Role, text: String) -> Result<Self, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        Ok(Self {
            role,
            text: text.to_string(),
            created_at: Utc::now(),
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Rough token estimate (~4 characters per token) used for context budgeting.
    pub fn estimated_tokens(&self) -> usize {
        self.text.chars().count().div_ceil(4)
    }
}
