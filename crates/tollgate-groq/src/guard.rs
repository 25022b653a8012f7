// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Guard-model safety gate.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use tollgate_config::TollgateConfig;
use tollgate_core::types::{AdapterType, HealthStatus};
use tollgate_core::{PluginAdapter, SafetyGate, SafetyVerdict, TollgateError};
use tracing::debug;

use crate::client::ChatClient;
use crate::types::{ChatCompletionRequest, ChatMessage};

/// Asks a guard chat model to label text as safe or unsafe.
///
/// A reply whose first line is exactly `safe`, ignoring case and
/// whitespace, is [`SafetyVerdict::Safe`]. Anything else, including
/// `unsafe\nS7` and `Safe.`, is [`SafetyVerdict::Unsafe`]. Transport and
/// API failures are errors, never verdicts.
pub struct GuardModelSafetyGate {
    client: ChatClient,
    model: String,
    instruction: String,
}

impl GuardModelSafetyGate {
    pub fn new(client: ChatClient, model: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            instruction: instruction.into(),
        }
    }

    /// Build from the `[safety]` and `[worker]` sections; the guard model
    /// shares the worker API endpoint and key.
    pub fn from_config(config: &TollgateConfig) -> Result<Self, TollgateError> {
        let api_key = config.worker.api_key.clone().ok_or_else(|| {
            TollgateError::Config("worker.api_key (or GROQ_API_KEY) is required".into())
        })?;
        let client = ChatClient::new(
            &config.worker.base_url,
            &SecretString::from(api_key),
            Duration::from_secs(config.worker.timeout_secs),
        )?;
        Ok(Self::new(
            client,
            config.safety.model.clone(),
            config.safety.instruction.clone(),
        ))
    }
}

/// Map a guard-model reply onto a verdict.
///
/// Only a first line reading exactly `safe` (ignoring case and
/// surrounding whitespace) is Safe.
pub fn parse_verdict(reply: &str) -> SafetyVerdict {
    let first_line = reply.trim().lines().next().unwrap_or_default();
    if first_line.trim().eq_ignore_ascii_case("safe") {
        SafetyVerdict::Safe
    } else {
        SafetyVerdict::Unsafe
    }
}

#[async_trait]
impl PluginAdapter for GuardModelSafetyGate {
    fn name(&self) -> &str {
        "guard-model"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Safety
    }

    async fn health_check(&self) -> Result<HealthStatus, TollgateError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SafetyGate for GuardModelSafetyGate {
    async fn evaluate(&self, text: &str) -> Result<SafetyVerdict, TollgateError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::user(text),
                ChatMessage::system(self.instruction.clone()),
            ],
            max_tokens: None,
            temperature: None,
        };
        let reply = self.client.complete(&request).await?;
        let verdict = parse_verdict(&reply);
        debug!(model = %self.model, %verdict, "guard model verdict");
        Ok(verdict)
    }
}
