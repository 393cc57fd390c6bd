use tracing::debug;

use crate::chat::prompts::{DEFAULT_RESUME_QUESTION, RESUME_LABEL};
use crate::chat::{Role, Turn};
use crate::config::Config;

/// Limits on how much history is submitted with each model call.
#[derive(Debug, Clone, Copy)]
pub struct ContextWindow {
    /// Maximum number of non-system turns.
    pub max_messages: usize,
    /// Estimated token budget for the non-system turns.
    pub token_budget: usize,
}

impl ContextWindow {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_messages: config.context_messages,
            token_budget: config.context_token_budget,
        }
    }
}

/// Builds the text of a user turn. Resume text, when present, goes first under
/// its label, followed by the question.
///
/// Returns `None` when there is neither a question nor resume text.
pub fn compose_user_text(question: &str, resume: Option<&str>) -> Option<String> {
    let question = question.trim();
    let resume = resume.map(str::trim).filter(|r| !r.is_empty());

    match (resume, question.is_empty()) {
        (None, true) => None,
        (None, false) => Some(question.to_string()),
        (Some(resume), true) => Some(format!(
            "{RESUME_LABEL}\n{resume}\n\n{DEFAULT_RESUME_QUESTION}"
        )),
        (Some(resume), false) => Some(format!("{RESUME_LABEL}\n{resume}\n\n{question}")),
    }
}

/// Selects the turns to submit: the system turn, then the newest history that
/// fits the window. Oldest non-system turns are dropped first. The newest turn
/// is always kept, and the selection never opens with an assistant turn.
pub fn assemble(history: &[Turn], window: &ContextWindow) -> Vec<Turn> {
    let (system, messages) = match history.split_first() {
        Some((first, rest)) if first.role() == Role::System => (Some(first), rest),
        _ => (None, history),
    };

    let mut start = messages.len();
    let mut tokens = 0usize;
    for (i, turn) in messages.iter().enumerate().rev() {
        let taken = messages.len() - i - 1;
        let cost = turn.estimated_tokens();
        if taken > 0 && (taken >= window.max_messages || tokens + cost > window.token_budget) {
            break;
        }
        tokens += cost;
        start = i;
    }

    // A leading reply without its question confuses the model.
    while start + 1 < messages.len() && messages[start].role() == Role::Assistant {
        start += 1;
    }

    let dropped = start;
    if dropped > 0 {
        debug!(
            dropped,
            kept = messages.len() - start,
            estimated_tokens = tokens,
            "Trimmed conversation history to context window"
        );
    }

    system
        .into_iter()
        .chain(messages[start..].iter())
        .cloned()
        .collect()
}
