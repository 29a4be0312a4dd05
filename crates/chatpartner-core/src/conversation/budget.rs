//! Token-budget guard.
//!
//! Before a new message is sent, the token count of the *previous* turn is
//! compared against the configured ceiling. After backfill, the last two
//! stored messages carry the prompt usage and the completion usage of that
//! turn, so their sum is what the backend last had to process.

use chatpartner_types::message::Message;

/// How many of the most recent stored messages make up the previous turn.
pub const PREVIOUS_TURN_WINDOW: u32 = 2;

/// Decides whether a conversation must be truncated before the next send.
#[derive(Debug, Clone, Copy)]
pub struct TokenGuard {
    pub max_context_tokens: u32,
}

impl TokenGuard {
    pub fn new(max_context_tokens: u32) -> Self {
        Self { max_context_tokens }
    }

    /// Token count of the previous turn from the most recent stored rows.
    pub fn previous_turn_tokens(recent: &[Message]) -> u32 {
        recent
            .iter()
            .take(PREVIOUS_TURN_WINDOW as usize)
            .map(|m| m.token_count)
            .sum()
    }

    /// Whether the previous turn went over the ceiling.
    pub fn exceeds(&self, previous_turn_tokens: u32) -> bool {
        previous_turn_tokens > self.max_context_tokens
    }
}
