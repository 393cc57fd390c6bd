use tracing::debug;

use crate::chat::prompts::SYSTEM_PROMPT;
use crate::chat::session::ChatError;
use crate::chat::{Role, Turn};

/// Ordered, append-only conversation history for one session.
///
/// The first entry is always the system turn. Once more than `max_exchanges`
/// user turns are stored, the oldest user turn and the replies that follow it
/// are evicted together, so the history never starts with an assistant turn.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    turns: Vec<Turn>,
    max_exchanges: usize,
}

impl ConversationMemory {
    pub fn new(max_exchanges: usize) -> Self {
        Self {
            turns: vec![Turn::system(SYSTEM_PROMPT)],
            max_exchanges: max_exchanges.max(1),
        }
    }

    pub fn append(&mut self, turn: Turn) -> Result<(), ChatError> {
        if turn.role() == Role::System {
            return Err(ChatError::SystemTurnAppend);
        }
        self.turns.push(turn);
        self.evict_oldest();
        Ok(())
    }

    /// The full history, system turn first.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    /// Everything after the system turn.
    pub fn messages(&self) -> &[Turn] {
        &self.turns[1..]
    }

    pub fn reset(&mut self) {
        let removed = self.turns.len() - 1;
        self.turns.truncate(1);
        debug!(removed, "Conversation memory reset");
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Number of user and assistant turns.
    pub fn message_count(&self) -> usize {
        self.turns.len() - 1
    }

    /// True when the last turn is a user message still waiting for a reply.
    pub fn awaiting_reply(&self) -> bool {
        self.turns
            .last()
            .is_some_and(|turn| turn.role() == Role::User)
    }

    fn user_turns(&self) -> usize {
        self.messages()
            .iter()
            .filter(|t| t.role() == Role::User)
            .count()
    }

    fn evict_oldest(&mut self) {
        let mut evicted = 0;
        while self.user_turns() > self.max_exchanges {
            // Drop the oldest user turn plus any assistant replies up to the next user turn.
            let end = self.turns[2..]
                .iter()
                .position(|t| t.role() == Role::User)
                .map(|i| i + 2)
                .unwrap_or(self.turns.len());
            evicted += end - 1;
            self.turns.drain(1..end);
        }
        if evicted > 0 {
            debug!(evicted, "Evicted oldest turns from conversation memory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(memory: &mut ConversationMemory, i: usize) {
        memory
            .append(Turn::user(format!("question {i}")).unwrap())
            .unwrap();
        memory
            .append(Turn::assistant(format!("answer {i}")).unwrap())
            .unwrap();
    }

    #[test]
    fn test_new_memory_holds_only_system_turn() {
        let memory = ConversationMemory::new(100);
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.all()[0].role(), Role::System);
        assert_eq!(memory.all()[0].text(), SYSTEM_PROMPT);
        assert_eq!(memory.message_count(), 0);
    }

    #[test]
    fn test_n_exchanges_give_two_n_plus_one_turns_in_order() {
        for n in [1, 3, 10] {
            let mut memory = ConversationMemory::new(100);
            for i in 0..n {
                exchange(&mut memory, i);
            }
            assert_eq!(memory.len(), 2 * n + 1);
            for (i, pair) in memory.messages().chunks(2).enumerate() {
                assert_eq!(pair[0].role(), Role::User);
                assert_eq!(pair[0].text(), format!("question {i}"));
                assert_eq!(pair[1].role(), Role::Assistant);
                assert_eq!(pair[1].text(), format!("answer {i}"));
            }
        }
    }

    #[test]
    fn test_reset_restores_single_system_turn() {
        for n in [0, 1, 7] {
            let mut memory = ConversationMemory::new(100);
            for i in 0..n {
                exchange(&mut memory, i);
            }
            memory.reset();
            assert_eq!(memory.len(), 1);
            assert_eq!(memory.all()[0].role(), Role::System);
        }
    }

    #[test]
    fn test_system_turn_cannot_be_appended() {
        let mut memory = ConversationMemory::new(100);
        let err = memory.append(Turn::system("override")).unwrap_err();
        assert!(matches!(err, ChatError::SystemTurnAppend));
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_awaiting_reply_tracks_last_turn() {
        let mut memory = ConversationMemory::new(100);
        assert!(!memory.awaiting_reply());
        memory.append(Turn::user("hi").unwrap()).unwrap();
        assert!(memory.awaiting_reply());
        memory.append(Turn::assistant("hello").unwrap()).unwrap();
        assert!(!memory.awaiting_reply());
    }

    #[test]
    fn test_bound_evicts_oldest_exchange_first() {
        let mut memory = ConversationMemory::new(3);
        for i in 0..5 {
            exchange(&mut memory, i);
        }
        assert_eq!(memory.len(), 7);
        assert_eq!(memory.all()[0].role(), Role::System);
        assert_eq!(memory.messages()[0].text(), "question 2");
        assert_eq!(memory.messages()[5].text(), "answer 4");
    }

    #[test]
    fn test_eviction_keeps_unanswered_user_turns_together() {
        let mut memory = ConversationMemory::new(2);
        memory.append(Turn::user("a").unwrap()).unwrap();
        memory.append(Turn::user("b").unwrap()).unwrap();
        memory.append(Turn::assistant("reply b").unwrap()).unwrap();
        memory.append(Turn::user("c").unwrap()).unwrap();

        let texts: Vec<_> = memory.messages().iter().map(|t| t.text()).collect();
        assert_eq!(texts, vec!["b", "reply b", "c"]);
    }
}
