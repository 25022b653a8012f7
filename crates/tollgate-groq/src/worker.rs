// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker adapter: one chat-completions call per dispatched request.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use tollgate_config::model::WorkerApiConfig;
use tollgate_core::types::{AdapterType, HealthStatus, WorkerRequest};
use tollgate_core::{PluginAdapter, TollgateError, WorkerAdapter};

use crate::client::ChatClient;
use crate::types::{ChatCompletionRequest, ChatMessage};

/// Sends dispatched requests to the model named by the selected worker.
pub struct GroqWorker {
    client: ChatClient,
    system_prompt: String,
    max_tokens: u32,
}

impl GroqWorker {
    pub fn new(client: ChatClient, system_prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
            max_tokens,
        }
    }

    /// Build from the `[worker]` section. Requires an API key.
    pub fn from_config(config: &WorkerApiConfig) -> Result<Self, TollgateError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            TollgateError::Config("worker.api_key (or GROQ_API_KEY) is required".into())
        })?;
        let client = ChatClient::new(
            &config.base_url,
            &SecretString::from(api_key),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self::new(client, config.system_prompt.clone(), config.max_tokens))
    }

    /// Assemble the message list: system prompt with context, memory, then
    /// the user's message.
    pub fn build_messages(&self, request: &WorkerRequest) -> Vec<ChatMessage> {
        let mut system = self.system_prompt.clone();
        if !request.context.is_empty() {
            system.push_str("\n\nContext:\n");
            let passages: Vec<&str> = request.context.iter().map(|p| p.text.as_str()).collect();
            system.push_str(&passages.join("\n---\n"));
        }

        let mut messages = Vec::with_capacity(request.memory.len() + 2);
        messages.push(ChatMessage::system(system));
        messages.extend(request.memory.iter().map(ChatMessage::from));
        messages.push(ChatMessage::user(request.query.clone()));
        messages
    }
}

#[async_trait]
impl PluginAdapter for GroqWorker {
    fn name(&self) -> &str {
        "groq-worker"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Worker
    }

    async fn health_check(&self) -> Result<HealthStatus, TollgateError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl WorkerAdapter for GroqWorker {
    async fn invoke(&self, request: WorkerRequest) -> Result<String, TollgateError> {
        let body = ChatCompletionRequest {
            model: request.worker.clone(),
            messages: self.build_messages(&request),
            max_tokens: Some(self.max_tokens),
            temperature: None,
        };
        self.client
            .complete(&body)
            .await
            .map_err(|e| TollgateError::WorkerUnavailable {
                worker: request.worker,
                message: e.to_string(),
            })
    }
}
