//! Chat-completion step and chat dispatcher, backed by an OpenAI-compatible
//! `/v1/chat/completions` endpoint. Connection pooling via a shared
//! `reqwest::Client`, transient failures retried with exponential backoff
//! (spec §4.5 "Chat dispatch").

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoffBuilder;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::AgentConfig;
use crate::domain::ports::dispatcher::{ChatDispatcher, DispatchOutcome, DispatchStatus, StepDispatcher};

#[derive(Debug, Clone)]
pub struct ChatDispatcherConfig {
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub max_retries: u32,
}

impl ChatDispatcherConfig {
    fn key(&self) -> (String, String, String) {
        (self.provider.clone(), self.model.clone(), self.base_url.clone())
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Holds one pooled `reqwest::Client` per `(provider, model, base_url)` so
/// agents that override their dispatcher target don't all share one pool.
pub struct ChatCompletionDispatcher {
    default_config: ChatDispatcherConfig,
    clients: Mutex<HashMap<(String, String, String), Arc<HttpClient>>>,
}

impl ChatCompletionDispatcher {
    #[must_use]
    pub fn new(default_config: ChatDispatcherConfig) -> Self {
        Self { default_config, clients: Mutex::new(HashMap::new()) }
    }

    fn effective_config(&self, agent_config: Option<&AgentConfig>) -> ChatDispatcherConfig {
        let mut config = self.default_config.clone();
        if let Some(agent_config) = agent_config {
            if let Some(provider) = &agent_config.dispatcher_provider {
                config.provider = provider.clone();
            }
            if let Some(model) = &agent_config.dispatcher_model {
                config.model = model.clone();
            }
            if let Some(base_url) = &agent_config.dispatcher_base_url {
                config.base_url = base_url.clone();
            }
        }
        config
    }

    async fn client_for(&self, config: &ChatDispatcherConfig) -> Arc<HttpClient> {
        let mut clients = self.clients.lock().await;
        clients
            .entry(config.key())
            .or_insert_with(|| {
                Arc::new(
                    HttpClient::builder()
                        .timeout(Duration::from_secs(300))
                        .pool_max_idle_per_host(10)
                        .build()
                        .unwrap_or_default(),
                )
            })
            .clone()
    }

    async fn complete(&self, config: &ChatDispatcherConfig, prompt: &str) -> DomainResult<String> {
        let client = self.client_for(config).await;
        let request = ChatCompletionRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage { role: "user", content: prompt.to_string() }],
        };

        let backoff_policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_secs(1))
            .with_max_interval(Duration::from_secs(30))
            .with_max_elapsed_time(Some(Duration::from_secs(120)))
            .build();

        let url = format!("{}/v1/chat/completions", config.base_url);

        let response = retry(backoff_policy, || {
            let client = client.clone();
            let request = &request;
            let url = &url;
            let api_key = &config.api_key;
            async move {
                let resp = client
                    .post(url)
                    .bearer_auth(api_key)
                    .json(request)
                    .send()
                    .await
                    .map_err(|e| backoff::Error::transient(DomainError::Transport(e.to_string())))?;

                if resp.status().is_server_error() || resp.status().as_u16() == 429 {
                    let status = resp.status();
                    return Err(backoff::Error::transient(DomainError::Transport(format!(
                        "chat completion transient status {status}"
                    ))));
                }
                if !resp.status().is_success() {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(backoff::Error::permanent(DomainError::Dispatcher(format!(
                        "chat completion returned {status}: {body}"
                    ))));
                }

                resp.json::<ChatCompletionResponse>()
                    .await
                    .map_err(|e| backoff::Error::permanent(DomainError::Dispatcher(e.to_string())))
            }
        })
        .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| DomainError::Dispatcher("chat completion returned no choices".to_string()))
    }
}

#[async_trait]
impl StepDispatcher for ChatCompletionDispatcher {
    async fn dispatch(
        &self,
        step_id: Uuid,
        prompt: &str,
        timeout: Duration,
        agent_config: Option<&AgentConfig>,
    ) -> DomainResult<DispatchOutcome> {
        let config = self.effective_config(agent_config);
        match tokio::time::timeout(timeout, self.complete(&config, prompt)).await {
            Ok(Ok(text)) => Ok(DispatchOutcome { status: DispatchStatus::Completed, text }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DomainError::Dispatcher(format!("step {step_id} dispatch timed out after {timeout:?}"))),
        }
    }
}

#[async_trait]
impl ChatDispatcher for ChatCompletionDispatcher {
    async fn send(&self, prompt: &str, agent_config: Option<&AgentConfig>) -> DomainResult<String> {
        let config = self.effective_config(agent_config);
        self.complete(&config, prompt).await
    }

    async fn available(&self) -> bool {
        let client = self.client_for(&self.default_config).await;
        client
            .get(format!("{}/v1/models", self.default_config.base_url))
            .bearer_auth(&self.default_config.api_key)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
