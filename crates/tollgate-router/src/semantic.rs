// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Utterance-based semantic classification.
//!
//! Each tier is described by example utterances. The request is embedded
//! and takes the tier of its most similar utterance. Utterance embeddings
//! are computed once, on the first classification.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tollgate_config::model::ClassifierConfig;
use tollgate_core::types::{AdapterType, EmbeddingInput, HealthStatus};
use tollgate_core::{
    DifficultyClassifier, DifficultyTier, EmbeddingAdapter, PluginAdapter, TollgateError,
};

const FAST_UTTERANCES: &[&str] = &[
    "hi", "hello", "hey", "good morning", "yo", "hows it going",
    "what is an ip address", "define dns", "what is photosynthesis",
    "how many layers in the osi model", "what is subnetting", "3rd planet from the sun",
    "what is vector quantity", "what is scalar quantity",
    "tell me a joke", "who are you", "how are you", "are you ai",
    "what is the weather", "do you like rust", "are you single",
    "what time is it", "define a cat", "1+1", "thank you",
    "help me with my homework", "thank you very much", "bye bye", "stop", "clear chat",
    "value of g", "atomic number of carbon", "what is newton's first law",
    "speed of light value", "formula for water", "what is a prime number",
    "boiling point of water", "refractive index of glass",
    "what is a multimeter", "define a logic gate", "standard paper sizes",
    "what is alternating current", "parts of a lathe machine",
    "what does sft stand for in tech stream", "binary to decimal conversion",
    "summarize this page", "what book is this?",
];

const COMPLEX_UTTERANCES: &[&str] = &[
    "calculate the subnets for 10.0.0.0/8",
    "design a secure network topology",
    "how to configure vlans on a cisco switch",
    "troubleshoot a connection timed out error",
    "why is my c2 framework not receiving heartbeats",
    "debug this code for me",
    "explain memory safety in rust",
    "how does djkstra's algorithm work in ospf",
    "compare rag vs fine-tuning for student ai",
    "explain the math of embeddings",
    "write a python script for network automation",
    "refactor this code using oop principles",
    "explain the borrow checker in rust",
    "solve the quadratic equation x^2 - 5x + 6", "find the derivative of sin(x)",
    "how to calculate the z-score", "explain the center of gravity",
    "calculate the area of a circle using integration", "matrix multiplication",
    "bernoulli's principle explanation", "calculate total resistance in parallel",
    "how does a four stroke engine work", "explain pascal's law",
    "logic circuit for an xor gate", "calculate the efficiency of a transformer",
    "how to measure torque", "explain modulation in communication",
    "how to balance a chemical equation", "difference between mitosis and meiosis",
    "explain the periodic table groups", "how does photosynthesis work",
    "organic chemistry naming rules", "titration calculation steps",
];

const REASONING_UTTERANCES: &[&str] = &[
    "why", "how", "what if", "reason", "logic", "cause",
    "derive the formula for the time of flight of a projectile",
    "prove the cosine rule using vectors", "mathematical proof of work-energy theorem",
    "derive the equation for a standing wave", "prove the binomial theorem",
    "design a zero-trust network architecture for a school",
    "analyze this pcap file for a man-in-the-middle attack",
    "troubleshoot why this rust memory safety check is failing",
    "evaluate the trade-offs between OSPF and BGP for an ISP",
    "find the security vulnerability in this python listener",
    "provide a deep analysis of last 5 years physics past papers",
    "evaluate my study plan for combined maths to get an A",
    "explain gödel's incompleteness theorem in simple terms",
];

/// Example utterances for one tier.
#[derive(Debug, Clone)]
pub struct Route {
    pub tier: DifficultyTier,
    pub utterances: Vec<String>,
}

impl Route {
    pub fn new(tier: DifficultyTier, utterances: &[&str]) -> Self {
        Self {
            tier,
            utterances: utterances.iter().map(|u| u.to_string()).collect(),
        }
    }
}

/// The built-in routes for every tier.
pub fn default_routes() -> Vec<Route> {
    vec![
        Route::new(DifficultyTier::Fast, FAST_UTTERANCES),
        Route::new(DifficultyTier::Complex, COMPLEX_UTTERANCES),
        Route::new(DifficultyTier::Reasoning, REASONING_UTTERANCES),
    ]
}

/// Embedded utterance index, flattened across tiers.
type UtteranceIndex = Vec<(DifficultyTier, Vec<f32>)>;

/// Nearest-utterance classifier backed by an embedding adapter.
pub struct SemanticClassifier {
    embedder: Arc<dyn EmbeddingAdapter>,
    routes: Vec<Route>,
    threshold: f32,
    index: OnceCell<UtteranceIndex>,
}

impl SemanticClassifier {
    pub fn new(embedder: Arc<dyn EmbeddingAdapter>, routes: Vec<Route>, threshold: f32) -> Self {
        Self {
            embedder,
            routes,
            threshold,
            index: OnceCell::new(),
        }
    }

    /// Default routes extended with any utterances from `[classifier]`.
    pub fn from_config(config: &ClassifierConfig, embedder: Arc<dyn EmbeddingAdapter>) -> Self {
        let mut routes = default_routes();
        for route in &mut routes {
            let extra = match route.tier {
                DifficultyTier::Fast => &config.fast_utterances,
                DifficultyTier::Complex => &config.complex_utterances,
                DifficultyTier::Reasoning => &config.reasoning_utterances,
            };
            route.utterances.extend(extra.iter().cloned());
        }
        Self::new(embedder, routes, config.similarity_threshold)
    }

    async fn index(&self) -> Result<&UtteranceIndex, TollgateError> {
        self.index
            .get_or_try_init(|| async {
                let (tiers, texts): (Vec<DifficultyTier>, Vec<String>) = self
                    .routes
                    .iter()
                    .flat_map(|r| r.utterances.iter().map(move |u| (r.tier, u.clone())))
                    .unzip();

                let output = self.embedder.embed(EmbeddingInput { texts }).await?;
                if output.embeddings.len() != tiers.len() {
                    return Err(TollgateError::upstream(
                        "embedding",
                        format!(
                            "expected {} utterance embeddings, got {}",
                            tiers.len(),
                            output.embeddings.len()
                        ),
                    ));
                }
                tracing::info!(utterances = tiers.len(), "semantic route index built");
                Ok(tiers.into_iter().zip(output.embeddings).collect())
            })
            .await
    }
}

/// Cosine similarity; zero when either vector has zero length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl PluginAdapter for SemanticClassifier {
    fn name(&self) -> &str {
        "semantic-classifier"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Classifier
    }

    async fn health_check(&self) -> Result<HealthStatus, TollgateError> {
        self.embedder.health_check().await
    }
}

#[async_trait]
impl DifficultyClassifier for SemanticClassifier {
    async fn classify(&self, text: &str) -> Result<DifficultyTier, TollgateError> {
        let index = self.index().await?;

        let output = self
            .embedder
            .embed(EmbeddingInput {
                texts: vec![text.to_string()],
            })
            .await?;
        let query = output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| TollgateError::upstream("embedding", "empty embedding response"))?;

        let best = index
            .iter()
            .map(|(tier, vector)| (*tier, cosine_similarity(&query, vector)))
            .max_by(|a, b| a.1.total_cmp(&b.1));

        match best {
            Some((tier, score)) if score >= self.threshold => {
                tracing::debug!(%tier, score, "semantic classification");
                Ok(tier)
            }
            _ => {
                tracing::debug!("no utterance above threshold, using fast tier");
                Ok(DifficultyTier::Fast)
            }
        }
    }
}
