//! HTTP client for the external task board (spec §6 "Board protocol").
//!
//! Wraps the board's REST surface with a token-bucket rate limiter (spec's
//! ambient stack calls for `governor`) so inbound sync and outbound status
//! reports never exceed the board's request budget.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::board::{BoardClient, BoardSummary, BoardTask};

type GovernorLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

#[derive(Debug, Clone)]
pub struct BoardHttpConfig {
    pub base_url: String,
    /// Read from config, never hardcoded (spec §6 "Board protocol").
    pub token: String,
    pub org_id: Option<String>,
    pub requests_per_minute: u32,
}

#[derive(Debug, Deserialize)]
struct BoardListResponse {
    items: Vec<BoardSummary>,
}

#[derive(Debug, Deserialize)]
struct TaskListResponse {
    items: Vec<BoardTask>,
}

pub struct HttpBoardClient {
    http: HttpClient,
    config: BoardHttpConfig,
    limiter: Arc<GovernorLimiter>,
}

impl HttpBoardClient {
    #[must_use]
    pub fn new(config: BoardHttpConfig) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(config.requests_per_minute.max(1)).unwrap());
        Self {
            http: HttpClient::new(),
            config,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    async fn authorized(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.limiter.until_ready().await;
        let url = format!("{}{}", self.config.base_url, path);
        let mut builder = self
            .http
            .request(method, url)
            .bearer_auth(&self.config.token)
            .header("content-type", "application/json");
        if let Some(org_id) = &self.config.org_id {
            builder = builder.header("X-Organization-Id", org_id);
        }
        builder
    }
}

#[async_trait]
impl BoardClient for HttpBoardClient {
    async fn list_boards(&self) -> DomainResult<Vec<BoardSummary>> {
        let resp = self
            .authorized(reqwest::Method::GET, "/api/v1/boards")
            .await
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("list_boards failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(DomainError::Transport(format!("list_boards returned {}", resp.status())));
        }

        resp.json::<BoardListResponse>()
            .await
            .map(|r| r.items)
            .map_err(|e| DomainError::Transport(format!("list_boards parse failed: {e}")))
    }

    async fn list_tasks(&self, board_id: &str, status: Option<&str>) -> DomainResult<Vec<BoardTask>> {
        let path = match status {
            Some(status) => format!("/api/v1/boards/{board_id}/tasks?status={status}"),
            None => format!("/api/v1/boards/{board_id}/tasks"),
        };
        let resp = self
            .authorized(reqwest::Method::GET, &path)
            .await
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("list_tasks failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(DomainError::Transport(format!("list_tasks returned {}", resp.status())));
        }

        resp.json::<TaskListResponse>()
            .await
            .map(|r| r.items)
            .map_err(|e| DomainError::Transport(format!("list_tasks parse failed: {e}")))
    }

    async fn update_task_status(
        &self,
        board_id: &str,
        task_id: &str,
        status: &str,
        comment: Option<&str>,
    ) -> DomainResult<()> {
        let path = format!("/api/v1/boards/{board_id}/tasks/{task_id}");
        let body = serde_json::json!({ "status": status, "comment": comment });

        let resp = self
            .authorized(reqwest::Method::PATCH, &path)
            .await
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("update_task_status failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(DomainError::Transport(format!("update_task_status returned {}", resp.status())));
        }
        Ok(())
    }

    async fn create_task(
        &self,
        board_id: &str,
        title: &str,
        description: &str,
        priority: &str,
    ) -> DomainResult<()> {
        let path = format!("/api/v1/boards/{board_id}/tasks");
        let body = serde_json::json!({ "title": title, "description": description, "priority": priority });

        let resp = self
            .authorized(reqwest::Method::POST, &path)
            .await
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("create_task failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(DomainError::Transport(format!("create_task returned {}", resp.status())));
        }
        Ok(())
    }

    async fn post_comment(&self, board_id: &str, task_id: &str, content: &str) -> DomainResult<()> {
        let path = format!("/api/v1/boards/{board_id}/tasks/{task_id}/comments");
        let body = serde_json::json!({ "content": content });

        let resp = self
            .authorized(reqwest::Method::POST, &path)
            .await
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("post_comment failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(DomainError::Transport(format!("post_comment returned {}", resp.status())));
        }
        Ok(())
    }

    async fn ask_user(&self, board_id: &str, content: &str, correlation_id: Option<&str>) -> DomainResult<()> {
        let body = serde_json::json!({
            "board_id": board_id,
            "content": content,
            "correlation_id": correlation_id,
        });

        let resp = self
            .authorized(reqwest::Method::POST, "/gateway/main/ask-user")
            .await
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("ask_user failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(DomainError::Transport(format!("ask_user returned {}", resp.status())));
        }
        Ok(())
    }
}
