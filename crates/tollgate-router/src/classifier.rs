// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic difficulty classification.
//!
//! Classifies user messages into fast/complex/reasoning tiers using
//! zero-cost heuristic rules. No network, no latency.

use async_trait::async_trait;
use tollgate_core::types::{AdapterType, HealthStatus};
use tollgate_core::{DifficultyClassifier, DifficultyTier, PluginAdapter, TollgateError};

/// Result of classifying a message.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub tier: DifficultyTier,
    /// Human-readable reason for the classification.
    pub reason: &'static str,
}

/// Greeting/closing patterns (exact match, case-insensitive).
const SIMPLE_EXACT: &[&str] = &[
    "hi", "hello", "hey", "yo", "thanks", "thank you", "thank you very much", "bye",
    "bye bye", "ok", "okay", "yes", "no", "sure", "stop", "clear chat", "good morning",
    "cool", "nice", "great",
];

/// Small-talk and flashcard prefixes (contains, case-insensitive).
const SIMPLE_QUESTIONS: &[&str] = &[
    "how are you", "who are you", "are you ai", "what time", "tell me a joke",
    "what is the weather", "value of", "atomic number", "boiling point", "stand for",
    "formula for", "define ",
];

/// Multi-step work: calculations, code, explanations (contains, case-insensitive).
const COMPLEX_INDICATORS: &[&str] = &[
    "calculate", "solve", "explain", "compare", "design", "configure", "implement",
    "troubleshoot", "debug", "refactor", "write a", "script", "algorithm", "how does",
    "how do", "difference between", "derivative", "integration", "equation", "matrix",
    "step by step", "in detail",
];

/// Word stems that signal derivations, proofs, and deep analysis.
const REASONING_STEMS: &[&str] = &[
    "derive", "prove", "proof", "theorem", "analyze", "analyse", "evaluate", "justify",
];

/// Phrases that signal deep analysis (contains, case-insensitive).
const REASONING_PHRASES: &[&str] = &[
    "what if", "trade-off", "tradeoff", "deep analysis", "vulnerability", "zero-trust",
    "root cause",
];

/// Keyword and length scoring classifier.
#[derive(Debug, Default, Clone)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a message using heuristic signals.
    pub fn classify_text(&self, message: &str) -> ClassificationResult {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return ClassificationResult {
                tier: DifficultyTier::Fast,
                reason: "empty message",
            };
        }

        let lower = trimmed.to_lowercase();
        let normalized = lower.trim_end_matches(['?', '!', '.']);

        if SIMPLE_EXACT.contains(&normalized) {
            return ClassificationResult {
                tier: DifficultyTier::Fast,
                reason: "greeting or closing",
            };
        }

        if Self::has_reasoning_signal(&lower) {
            return ClassificationResult {
                tier: DifficultyTier::Reasoning,
                reason: "derivation or analysis indicators",
            };
        }

        let mut score: i32 = 0;

        let word_count = trimmed.split_whitespace().count();
        score += Self::length_score(word_count);

        if SIMPLE_QUESTIONS.iter().any(|q| lower.contains(q)) {
            score -= 2;
        }

        if COMPLEX_INDICATORS.iter().any(|c| lower.contains(c)) {
            score += 2;
        }

        if trimmed.contains("```") {
            score += 3;
        }

        if Self::count_sentences(trimmed) >= 3 {
            score += 1;
        }

        if score >= 2 {
            ClassificationResult {
                tier: DifficultyTier::Complex,
                reason: "multi-step indicators",
            }
        } else {
            ClassificationResult {
                tier: DifficultyTier::Fast,
                reason: "short or factual query",
            }
        }
    }

    fn has_reasoning_signal(lower: &str) -> bool {
        let stem_hit = lower
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .any(|word| REASONING_STEMS.iter().any(|stem| word.starts_with(stem)));
        stem_hit || REASONING_PHRASES.iter().any(|p| lower.contains(p))
    }

    fn length_score(word_count: usize) -> i32 {
        match word_count {
            0..=3 => -1,
            4..=15 => 0,
            16..=50 => 1,
            _ => 2,
        }
    }

    fn count_sentences(text: &str) -> usize {
        text.chars()
            .filter(|c| matches!(c, '.' | '?' | '!'))
            .count()
            .max(1)
    }
}

#[async_trait]
impl PluginAdapter for HeuristicClassifier {
    fn name(&self) -> &str {
        "heuristic-classifier"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Classifier
    }

    async fn health_check(&self) -> Result<HealthStatus, TollgateError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl DifficultyClassifier for HeuristicClassifier {
    async fn classify(&self, text: &str) -> Result<DifficultyTier, TollgateError> {
        let result = self.classify_text(text);
        tracing::debug!(tier = %result.tier, reason = result.reason, "heuristic classification");
        Ok(result.tier)
    }
}
