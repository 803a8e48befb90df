//! HTTP `TaskBackend` — talks to the agent API edge function.
//!
//! Every call is a POST of `{action, params}` to
//! `{base_url}/functions/v1/ai-agent-api` with the bearer token and the
//! `x-agent-key` service identity. Failures come back verbatim; nothing
//! is retried here.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::backend::traits::{NewProject, NewTask, TaskBackend, TaskFilter, TaskUpdate};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::tasks::model::{Comment, Project, Task};

/// Path of the agent API relative to the base URL.
const AGENT_API_PATH: &str = "/functions/v1/ai-agent-api";

/// Header carrying the service identity.
const AGENT_KEY_HEADER: &str = "x-agent-key";

/// Remote backend reached over HTTP.
pub struct HttpBackend {
    config: BackendConfig,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Use a preconfigured client (timeouts, proxies).
    pub fn with_client(config: BackendConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn endpoint(&self) -> String {
        format!("{}{AGENT_API_PATH}", self.config.base_url)
    }

    /// POST one action and return the decoded JSON body.
    async fn call(&self, action: &str, params: Value) -> Result<Value, BackendError> {
        debug!(action, "Calling agent API");

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.config.auth_token.expose_secret())
            .header(AGENT_KEY_HEADER, self.config.agent_key.expose_secret())
            .json(&json!({ "action": action, "params": params }))
            .send()
            .await
            .map_err(|e| BackendError::RequestFailed {
                action: action.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| BackendError::RequestFailed {
            action: action.to_string(),
            reason: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            warn!(action, status = status.as_u16(), "Agent API returned an error");
            return Err(BackendError::Upstream {
                action: action.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| BackendError::InvalidResponse {
            action: action.to_string(),
            reason: e.to_string(),
        })
    }

    /// Call `action` and decode the `key` field of the response envelope.
    async fn call_for<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Value,
        key: &str,
    ) -> Result<T, BackendError> {
        let mut body = self.call(action, params).await?;
        let field = body
            .get_mut(key)
            .map(Value::take)
            .ok_or_else(|| BackendError::InvalidResponse {
                action: action.to_string(),
                reason: format!("missing `{key}` in response"),
            })?;
        serde_json::from_value(field).map_err(|e| BackendError::InvalidResponse {
            action: action.to_string(),
            reason: e.to_string(),
        })
    }
}

fn to_params<T: serde::Serialize>(action: &str, value: &T) -> Result<Value, BackendError> {
    serde_json::to_value(value).map_err(|e| BackendError::InvalidResponse {
        action: action.to_string(),
        reason: format!("failed to encode params: {e}"),
    })
}

#[async_trait]
impl TaskBackend for HttpBackend {
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, BackendError> {
        let params = to_params("list_tasks", filter)?;
        self.call_for("list_tasks", params, "tasks").await
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, BackendError> {
        let params = to_params("create_task", task)?;
        self.call_for("create_task", params, "task").await
    }

    async fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<Task, BackendError> {
        let params = json!({
            "task_id": task_id,
            "updates": to_params("update_task", update)?,
        });
        self.call_for("update_task", params, "task").await
    }

    async fn assign_task(&self, task_id: &str, user_id: &str) -> Result<(), BackendError> {
        let params = json!({ "task_id": task_id, "user_id": user_id });
        let body = self.call("assign_task", params).await?;
        if body.get("success").and_then(Value::as_bool) == Some(true) {
            Ok(())
        } else {
            Err(BackendError::InvalidResponse {
                action: "assign_task".into(),
                reason: format!("unexpected response: {body}"),
            })
        }
    }

    async fn create_project(&self, project: &NewProject) -> Result<Project, BackendError> {
        let params = to_params("create_project", project)?;
        self.call_for("create_project", params, "project").await
    }

    async fn list_projects(&self, limit: usize) -> Result<Vec<Project>, BackendError> {
        self.call_for("list_projects", json!({ "limit": limit }), "projects")
            .await
    }

    async fn add_comment(&self, task_id: &str, content: &str) -> Result<Comment, BackendError> {
        let params = json!({ "task_id": task_id, "content": content });
        self.call_for("add_comment", params, "comment").await
    }
}
