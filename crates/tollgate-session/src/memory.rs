// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token-bounded conversation memory.

use std::collections::VecDeque;
use std::sync::LazyLock;

use tiktoken_rs::CoreBPE;
use tollgate_core::types::ChatTurn;

static BPE: LazyLock<Option<CoreBPE>> = LazyLock::new(|| match tiktoken_rs::cl100k_base() {
    Ok(bpe) => Some(bpe),
    Err(e) => {
        tracing::warn!(error = %e, "cl100k_base unavailable, estimating tokens from characters");
        None
    }
});

/// Count tokens in `text` with the cl100k_base encoding.
///
/// Falls back to roughly four characters per token when the BPE tables
/// cannot be loaded.
pub fn count_tokens(text: &str) -> usize {
    match BPE.as_ref() {
        Some(bpe) => bpe.encode_with_special_tokens(text).len(),
        None => estimate_tokens(text),
    }
}

fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

#[derive(Debug, Clone)]
struct StoredTurn {
    turn: ChatTurn,
    tokens: usize,
}

/// FIFO conversation buffer that evicts its oldest turns once the token
/// budget is exceeded.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    token_limit: usize,
    turns: VecDeque<StoredTurn>,
    tokens: usize,
}

impl ConversationMemory {
    pub fn new(token_limit: usize) -> Self {
        Self {
            token_limit,
            turns: VecDeque::new(),
            tokens: 0,
        }
    }

    /// Append a turn and evict from the front until the budget holds.
    ///
    /// A single turn larger than the whole budget evicts everything,
    /// itself included.
    pub fn push(&mut self, turn: ChatTurn) {
        let tokens = count_tokens(&turn.content);
        self.turns.push_back(StoredTurn { turn, tokens });
        self.tokens += tokens;

        while self.tokens > self.token_limit {
            match self.turns.pop_front() {
                Some(evicted) => self.tokens -= evicted.tokens,
                None => break,
            }
        }
    }

    /// Append a completed user/assistant exchange.
    pub fn record_exchange(&mut self, user: &str, assistant: &str) {
        self.push(ChatTurn::user(user));
        self.push(ChatTurn::assistant(assistant));
    }

    /// Turns currently held, oldest first.
    pub fn snapshot(&self) -> Vec<ChatTurn> {
        self.turns.iter().map(|s| s.turn.clone()).collect()
    }

    pub fn token_count(&self) -> usize {
        self.tokens
    }

    pub fn token_limit(&self) -> usize {
        self.token_limit
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.tokens = 0;
    }
}
