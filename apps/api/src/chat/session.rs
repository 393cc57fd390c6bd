use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::assembler::{assemble, compose_user_text, ContextWindow};
use crate::chat::memory::ConversationMemory;
use crate::chat::Turn;
use crate::config::Config;
use crate::llm_client::{ChatModel, LlmError};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("System turns cannot be appended to a conversation")]
    SystemTurnAppend,

    #[error("There is no unanswered message to retry")]
    NothingToRetry,

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Per-call model settings, copied from `Config` once at startup.
#[derive(Debug, Clone, Copy)]
pub struct ChatSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub window: ContextWindow,
    pub max_stored_exchanges: usize,
}

impl ChatSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            window: ContextWindow::from_config(config),
            max_stored_exchanges: config.max_stored_exchanges,
        }
    }
}

/// The state of one browser session. Never shared between sessions.
#[derive(Debug)]
pub struct ChatSession {
    pub id: Uuid,
    memory: ConversationMemory,
    pending_resume: Option<String>,
    total_tokens_used: u64,
    created_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(settings: &ChatSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            memory: ConversationMemory::new(settings.max_stored_exchanges),
            pending_resume: None,
            total_tokens_used: 0,
            created_at: Utc::now(),
        }
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn has_pending_resume(&self) -> bool {
        self.pending_resume.is_some()
    }

    pub fn total_tokens_used(&self) -> u64 {
        self.total_tokens_used
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Holds extracted resume text until the next message is sent.
    pub fn attach_resume(&mut self, text: String) {
        debug!(session_id = %self.id, chars = text.len(), "Resume attached to session");
        self.pending_resume = Some(text);
    }

    pub fn clear_resume(&mut self) {
        if self.pending_resume.take().is_some() {
            debug!(session_id = %self.id, "Pending resume discarded");
        }
    }

    /// Records the user's message and asks the model for a reply.
    ///
    /// A pending resume is folded into this message and then dropped from the
    /// session. When the model call fails the user turn stays in memory with no
    /// reply, so it can be resubmitted through [`ChatSession::retry`].
    pub async fn send(
        &mut self,
        model: &dyn ChatModel,
        settings: &ChatSettings,
        message: &str,
    ) -> Result<String, ChatError> {
        let text = compose_user_text(message, self.pending_resume.as_deref())
            .ok_or(ChatError::EmptyMessage)?;
        self.memory.append(Turn::user(text)?)?;
        if self.pending_resume.take().is_some() {
            debug!(session_id = %self.id, "Pending resume consumed");
        }

        self.complete(model, settings).await
    }

    /// Resubmits an unanswered user message without recording a new one.
    pub async fn retry(
        &mut self,
        model: &dyn ChatModel,
        settings: &ChatSettings,
    ) -> Result<String, ChatError> {
        if !self.memory.awaiting_reply() {
            return Err(ChatError::NothingToRetry);
        }
        info!(session_id = %self.id, "Retrying unanswered message");
        self.complete(model, settings).await
    }

    pub fn reset(&mut self) {
        self.memory.reset();
        self.pending_resume = None;
        self.total_tokens_used = 0;
        info!(session_id = %self.id, "Chat session cleared");
    }

    async fn complete(
        &mut self,
        model: &dyn ChatModel,
        settings: &ChatSettings,
    ) -> Result<String, ChatError> {
        let turns = assemble(self.memory.all(), &settings.window);

        let generation = model
            .generate(&turns, settings.temperature, settings.max_output_tokens)
            .await
            .map_err(|e| {
                warn!(session_id = %self.id, "Model call failed: {e}");
                e
            })?;

        self.memory.append(Turn::assistant(generation.text.as_str())?)?;
        self.total_tokens_used += generation.total_tokens;

        debug!(
            session_id = %self.id,
            history = self.memory.len(),
            total_tokens = self.total_tokens_used,
            "Assistant reply recorded"
        );

        Ok(generation.text)
    }
}
