//! Core chat session state.
//!
//! This module provides the `ChatSession` struct which owns the system prompt
//! and the rolling history, and builds the message list for each turn.

use crate::chat::history::ConversationHistory;
use crate::observability::SESSION_TURNS;
use crate::types::Message;

/// Conversation state for one run of the chat client.
///
/// The session never talks to the network; the turn loop asks it for the
/// outbound messages and reports completed turns back.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    system_prompt: Option<String>,
    history: ConversationHistory,
}

impl ChatSession {
    /// Creates a new session. An empty system prompt is treated as none.
    pub fn new(system_prompt: Option<String>) -> Self {
        Self::with_history(system_prompt, ConversationHistory::new())
    }

    /// Creates a new session around an existing (usually empty) history.
    pub fn with_history(system_prompt: Option<String>, history: ConversationHistory) -> Self {
        let system_prompt = system_prompt.filter(|prompt| !prompt.trim().is_empty());
        Self {
            system_prompt,
            history,
        }
    }

    /// Returns the messages to send for `user_input`.
    ///
    /// The list is the system prompt (if any), then the history, then a new
    /// user message holding `user_input`. The session is not modified.
    pub fn build_messages(&self, user_input: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        if let Some(prompt) = &self.system_prompt {
            messages.push(Message::system(prompt.clone()));
        }
        messages.extend(self.history.messages().iter().cloned());
        messages.push(Message::user(user_input));
        messages
    }

    /// Records a completed turn.
    pub fn commit_turn(&mut self, user_input: &str, assistant_output: &str) {
        self.history.push_turn(user_input, assistant_output);
        SESSION_TURNS.click();
    }

    /// Clears the conversation history. The system prompt is kept.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Returns the system prompt, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Returns the conversation history.
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Returns the number of messages in the history.
    pub fn message_count(&self) -> usize {
        self.history.len()
    }

    /// Returns the number of turns in the history.
    pub fn turn_count(&self) -> usize {
        self.history.turn_count()
    }
}
