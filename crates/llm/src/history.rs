//! Rolling chat history with a capped window
//!
//! A history is a fixed system instruction followed by the most recent
//! exchanges. Once more than `cap` messages accumulate the oldest are
//! dropped, whole user/assistant pairs at a time, so the window never
//! starts with an orphaned assistant reply.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::prompt::{Message, Role};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistory {
    system: Message,
    turns: VecDeque<Message>,
    cap: usize,
}

impl ChatHistory {
    /// `cap` counts non-system messages and is raised to at least 2
    pub fn new(system_prompt: impl Into<String>, cap: usize) -> Self {
        Self {
            system: Message::system(system_prompt),
            turns: VecDeque::new(),
            cap: cap.max(2),
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Non-system messages currently held
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// System instruction plus the retained window
    pub fn messages(&self) -> Vec<Message> {
        std::iter::once(self.system.clone())
            .chain(self.turns.iter().cloned())
            .collect()
    }

    /// Messages to send for a new user turn, without recording it
    pub fn with_user(&self, content: &str) -> Vec<Message> {
        let mut messages = self.messages();
        messages.push(Message::user(content));
        messages
    }

    /// Record a completed exchange
    pub fn record_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push_back(Message::user(user));
        self.turns.push_back(Message::assistant(assistant));
        self.trim();
    }

    /// Drop everything except the system instruction
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    fn trim(&mut self) {
        while self.turns.len() > self.cap {
            self.turns.pop_front();
            while matches!(self.turns.front(), Some(m) if m.role == Role::Assistant) {
                self.turns.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_start_with_system() {
        let mut history = ChatHistory::new("시스템", 4);
        history.record_exchange("질문", "답변");

        let messages = history.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[2], Message::assistant("답변"));
    }

    #[test]
    fn test_with_user_does_not_record() {
        let history = ChatHistory::new("시스템", 4);
        let pending = history.with_user("머리가 아파요");

        assert_eq!(pending.len(), 2);
        assert_eq!(pending[1], Message::user("머리가 아파요"));
        assert!(history.is_empty());
    }

    #[test]
    fn test_window_is_capped() {
        let mut history = ChatHistory::new("시스템", 4);
        for i in 0..10 {
            history.record_exchange(format!("q{i}"), format!("a{i}"));
        }

        assert_eq!(history.len(), 4);
        let messages = history.messages();
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1], Message::user("q8"));
        assert_eq!(messages[4], Message::assistant("a9"));
    }

    #[test]
    fn test_odd_cap_keeps_pairs_aligned() {
        let mut history = ChatHistory::new("시스템", 3);
        for i in 0..5 {
            history.record_exchange(format!("q{i}"), format!("a{i}"));
        }

        assert!(history.len() <= 3);
        assert_eq!(history.messages()[1].role, Role::User);
    }

    #[test]
    fn test_cap_floor() {
        let history = ChatHistory::new("시스템", 0);
        assert_eq!(history.cap(), 2);
    }

    #[test]
    fn test_clear_keeps_system() {
        let mut history = ChatHistory::new("시스템", 4);
        history.record_exchange("q", "a");
        history.clear();
        assert_eq!(history.messages(), vec![Message::system("시스템")]);
    }
}
