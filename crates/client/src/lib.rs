//! HTTP client for the Tasklane API.
//!
//! Protected calls take an explicit [`SessionContext`]; [`authorize`] is the
//! single place that turns it into an `Authorization: Bearer` header.

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

mod state;

pub use state::{ClientState, Theme};
pub use tasklane_tasks::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error("{message} ({status})")]
    Api { status: u16, message: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("client state error: {0}")]
    State(#[from] serde_json::Error),
    #[error("client state io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Credentials for protected calls. Passed explicitly to every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    token: Option<String>,
}

impl SessionContext {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|token| !token.trim().is_empty()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Attach the session's bearer token, or fail without sending anything.
pub fn authorize(builder: RequestBuilder, session: &SessionContext) -> Result<RequestBuilder, ClientError> {
    let token = session.token().ok_or(ClientError::NotLoggedIn)?;
    Ok(builder.bearer_auth(token))
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSession {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<Account, ClientError> {
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&Credentials { email, password })
            .send()
            .await?;
        decode(response).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession, ClientError> {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&Credentials { email, password })
            .send()
            .await?;
        decode(response).await
    }

    pub async fn me(&self, session: &SessionContext) -> Result<Account, ClientError> {
        let request = authorize(self.client.get(self.url("/api/auth/me")), session)?;
        decode(request.send().await?).await
    }

    pub async fn list_tasks(&self, session: &SessionContext) -> Result<Vec<Task>, ClientError> {
        let request = authorize(self.client.get(self.url("/api/tasks")), session)?;
        decode(request.send().await?).await
    }

    pub async fn create_task(
        &self,
        session: &SessionContext,
        task: &NewTask,
    ) -> Result<Task, ClientError> {
        let request = authorize(self.client.post(self.url("/api/tasks")), session)?;
        decode(request.json(task).send().await?).await
    }

    pub async fn update_task(
        &self,
        session: &SessionContext,
        task_id: &str,
        patch: &TaskPatch,
    ) -> Result<Task, ClientError> {
        let request = authorize(
            self.client.put(self.url(&format!("/api/tasks/{task_id}"))),
            session,
        )?;
        decode(request.json(patch).send().await?).await
    }

    pub async fn delete_task(&self, session: &SessionContext, task_id: &str) -> Result<(), ClientError> {
        let request = authorize(
            self.client.delete(self.url(&format!("/api/tasks/{task_id}"))),
            session,
        )?;
        let _: serde_json::Value = decode(request.send().await?).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    debug!(status = status.as_u16(), %message, "api request failed");
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
