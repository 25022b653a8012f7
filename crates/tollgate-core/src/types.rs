// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the collaborator traits and the dispatcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Difficulty bucket used to restrict which workers may serve a request.
///
/// The set is closed; tier membership of workers is configuration.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTier {
    /// Greetings, flashcard facts, small talk.
    #[default]
    Fast,
    /// Multi-step explanations, calculations, code.
    Complex,
    /// Derivations, proofs, deep analysis.
    Reasoning,
}

impl DifficultyTier {
    /// Every tier, in declaration order.
    pub const ALL: [DifficultyTier; 3] = [
        DifficultyTier::Fast,
        DifficultyTier::Complex,
        DifficultyTier::Reasoning,
    ];
}

/// Label returned by the safety gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SafetyVerdict {
    Safe,
    Unsafe,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Classifier,
    Safety,
    Retrieval,
    Worker,
    Embedding,
    Identity,
    Observability,
}

/// A verified Tollgate identity, decoded from a signed credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable user identifier (the token subject).
    pub subject: String,
    /// Role claim, e.g. `student`.
    pub role: String,
    /// When the credential stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// Identity asserted by an external identity provider (e.g. Google sign-in).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    /// Verified e-mail address.
    pub email: String,
}

impl ExternalIdentity {
    /// Derive the Tollgate user id: the local part of the e-mail address.
    pub fn user_id(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

// --- Conversation types ---

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single turn of conversation memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

// --- Retrieval types ---

/// A query against the retrieval index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalQuery {
    /// Free text to embed and search with.
    pub text: String,
    /// Restrict to documents whose `page_label` equals this label exactly.
    pub page_filter: Option<String>,
    /// Number of passages to return.
    pub top_k: usize,
}

/// A ranked context passage returned by the retrieval index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextPassage {
    /// Passage text.
    pub text: String,
    /// Similarity score reported by the index.
    pub score: f32,
    /// Page label metadata, if the document carries one.
    pub page_label: Option<String>,
}

// --- Worker types ---

/// Everything a worker needs to answer one request.
#[derive(Debug, Clone)]
pub struct WorkerRequest {
    /// Registry name of the chosen worker (the upstream model id).
    pub worker: String,
    /// The user's message.
    pub query: String,
    /// Retrieved context passages, best first.
    pub context: Vec<ContextPassage>,
    /// Conversation memory snapshot, oldest first.
    pub memory: Vec<ChatTurn>,
}

// --- Embedding types ---

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// Output from an embedding adapter, one vector per input text.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    pub embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn tier_display_and_parse() {
        assert_eq!(DifficultyTier::Fast.to_string(), "fast");
        assert_eq!(DifficultyTier::Complex.to_string(), "complex");
        assert_eq!(DifficultyTier::Reasoning.to_string(), "reasoning");
        assert_eq!(
            DifficultyTier::from_str("Reasoning").unwrap(),
            DifficultyTier::Reasoning
        );
        assert!(DifficultyTier::from_str("expensive").is_err());
    }

    #[test]
    fn tier_defaults_to_fast() {
        assert_eq!(DifficultyTier::default(), DifficultyTier::Fast);
    }

    #[test]
    fn tier_serde_is_lowercase() {
        let json = serde_json::to_string(&DifficultyTier::Complex).unwrap();
        assert_eq!(json, "\"complex\"");
        let parsed: DifficultyTier = serde_json::from_str("\"reasoning\"").unwrap();
        assert_eq!(parsed, DifficultyTier::Reasoning);
    }

    #[test]
    fn external_identity_user_id_is_local_part() {
        let id = ExternalIdentity {
            email: "alice@example.com".into(),
        };
        assert_eq!(id.user_id(), "alice");

        let bare = ExternalIdentity {
            email: "no-at-sign".into(),
        };
        assert_eq!(bare.user_id(), "no-at-sign");
    }

    #[test]
    fn chat_turn_constructors() {
        assert_eq!(ChatTurn::user("hi").role, ChatRole::User);
        assert_eq!(ChatTurn::assistant("hello").role, ChatRole::Assistant);
    }
}
