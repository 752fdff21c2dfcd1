//! Bounded rolling conversation history.

use crate::types::{Message, MessageRole};

/// Number of turns kept when no other limit is configured.
pub const DEFAULT_MAX_TURNS: usize = 10;

/// The user/assistant messages of a conversation, excluding the system prompt.
///
/// The history only grows by whole turns (a user message followed by an
/// assistant message), so its length is always even. Once it holds more than
/// `max_turns` turns the oldest turns are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHistory {
    messages: Vec<Message>,
    max_turns: usize,
}

impl ConversationHistory {
    /// Creates an empty history that keeps the last [`DEFAULT_MAX_TURNS`] turns.
    pub fn new() -> Self {
        Self::with_max_turns(DEFAULT_MAX_TURNS)
    }

    /// Creates an empty history that keeps the last `max_turns` turns.
    ///
    /// A limit of zero is raised to one.
    pub fn with_max_turns(max_turns: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_turns: max_turns.max(1),
        }
    }

    /// Appends one completed turn, dropping the oldest turns beyond the limit.
    pub fn push_turn(&mut self, user_input: impl Into<String>, assistant_output: impl Into<String>) {
        self.messages.push(Message::new(MessageRole::User, user_input));
        self.messages.push(Message::new(MessageRole::Assistant, assistant_output));
        let max_messages = self.max_messages();
        if self.messages.len() > max_messages {
            let excess = self.messages.len() - max_messages;
            self.messages.drain(..excess);
        }
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// The stored messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of stored messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of stored turns.
    pub fn turn_count(&self) -> usize {
        self.messages.len() / 2
    }

    /// The configured turn limit.
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// The configured message limit, twice the turn limit.
    pub fn max_messages(&self) -> usize {
        self.max_turns * 2
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_history_is_empty() {
        let history = ConversationHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.max_turns(), 10);
        assert_eq!(history.max_messages(), 20);
    }

    #[test]
    fn length_follows_min_of_two_n_and_cap() {
        let mut history = ConversationHistory::new();
        for n in 1..=25 {
            history.push_turn(format!("q{n}"), format!("a{n}"));
            assert_eq!(history.len(), (2 * n).min(20));
            assert_eq!(history.len() % 2, 0);
        }
    }

    #[test]
    fn oldest_turns_are_dropped_first() {
        let mut history = ConversationHistory::new();
        for n in 1..=12 {
            history.push_turn(format!("q{n}"), format!("a{n}"));
        }
        let messages = history.messages();
        assert_eq!(messages.first(), Some(&Message::user("q3")));
        assert_eq!(messages.last(), Some(&Message::assistant("a12")));
    }

    #[test]
    fn roles_alternate() {
        let mut history = ConversationHistory::new();
        for n in 0..15 {
            history.push_turn(format!("q{n}"), format!("a{n}"));
        }
        for (i, message) in history.messages().iter().enumerate() {
            let expected = if i % 2 == 0 {
                MessageRole::User
            } else {
                MessageRole::Assistant
            };
            assert_eq!(message.role, expected);
        }
    }

    #[test]
    fn clear_empties_history() {
        let mut history = ConversationHistory::new();
        for n in 0..30 {
            history.push_turn(format!("q{n}"), format!("a{n}"));
        }
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.turn_count(), 0);
    }

    #[test]
    fn custom_limit() {
        let mut history = ConversationHistory::with_max_turns(2);
        history.push_turn("q1", "a1");
        history.push_turn("q2", "a2");
        history.push_turn("q3", "a3");
        assert_eq!(history.turn_count(), 2);
        assert_eq!(history.messages()[0], Message::user("q2"));
    }

    #[test]
    fn zero_limit_keeps_one_turn() {
        let mut history = ConversationHistory::with_max_turns(0);
        history.push_turn("q1", "a1");
        history.push_turn("q2", "a2");
        assert_eq!(
            history.messages(),
            &[Message::user("q2"), Message::assistant("a2")]
        );
    }
}
