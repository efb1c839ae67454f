//! Token-bounded conversation memory.
//!
//! An ordered log of prior (question, answer) turns. Every append is
//! followed by an oldest-first trim so the estimated token total of the
//! stored turns never exceeds the configured budget. Nothing is persisted;
//! the memory lives and dies with the process.

use crate::models::Turn;

pub struct ConversationMemory {
    turns: Vec<Turn>,
    max_tokens: usize,
}

impl ConversationMemory {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            turns: Vec::new(),
            max_tokens,
        }
    }

    /// Stored turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Append a completed turn, then evict from the front while the
    /// estimated token total exceeds the budget. With `max_tokens == 0`
    /// every push trims the memory back to empty.
    pub fn push(&mut self, turn: Turn, estimate_tokens: impl Fn(&str) -> usize) {
        self.turns.push(turn);

        while !self.turns.is_empty() && self.total_tokens(&estimate_tokens) > self.max_tokens {
            self.turns.remove(0);
        }
    }

    fn total_tokens(&self, estimate_tokens: &impl Fn(&str) -> usize) -> usize {
        self.turns
            .iter()
            .map(|t| estimate_tokens(&t.question) + estimate_tokens(&t.answer))
            .sum()
    }
}
