//! Bounded conversation memory for one chat session.

use std::collections::VecDeque;

use crate::models::Turn;

/// Turns kept after each exchange (five question/answer pairs).
pub const MAX_HISTORY_TURNS: usize = 10;

/// FIFO list of recent turns. Oldest turns are dropped first once the cap
/// is exceeded. Lives only as long as the session.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: VecDeque<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user question and the assistant's answer, then trim.
    pub fn push_exchange(&mut self, question: &str, answer: &str) {
        self.turns.push_back(Turn::user(question));
        self.turns.push_back(Turn::assistant(answer));
        while self.turns.len() > MAX_HISTORY_TURNS {
            self.turns.pop_front();
        }
    }

    /// Turns in chronological order.
    pub fn turns(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
