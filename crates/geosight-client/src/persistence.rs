use async_trait::async_trait;

use geosight_core::models::{Identity, PersistedMessage};
use geosight_core::ports::TranscriptStore;
use geosight_core::{GeosightError, PersistenceError, Result};

use crate::dto::{CreateSessionBody, CreateSessionResponse};
use crate::http::endpoint;

pub const SESSIONS_PATH: &str = "/api/chat/sessions";

/// Chat session store of the platform API
pub struct HttpTranscriptStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTranscriptStore {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self { base_url: base_url.into(), client }
    }
}

fn rejected(reason: impl Into<String>) -> GeosightError {
    GeosightError::Persistence(PersistenceError::Rejected { reason: reason.into() })
}

async fn check(url: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(endpoint = url, %status, "Persistence request rejected");
    Err(rejected(format!("HTTP {}: {}", status, body.trim())))
}

#[async_trait]
impl TranscriptStore for HttpTranscriptStore {
    async fn create_session(&self, identity: &Identity, title: &str) -> Result<String> {
        let url = endpoint(&self.base_url, SESSIONS_PATH);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&identity.token)
            .json(&CreateSessionBody { title })
            .send()
            .await
            .map_err(|e| GeosightError::network(&url, e))?;
        let response = check(&url, response).await?;

        let created: CreateSessionResponse = response
            .json()
            .await
            .map_err(|e| rejected(format!("unreadable session response: {}", e)))?;
        let id = created.session.id_string().ok_or_else(|| rejected("session id missing"))?;

        tracing::info!(session_id = %id, user = %identity.user, "Created chat session");
        Ok(id)
    }

    async fn append_message(
        &self,
        identity: &Identity,
        session_id: &str,
        message: &PersistedMessage,
    ) -> Result<()> {
        let url = endpoint(&self.base_url, &format!("{}/{}/messages", SESSIONS_PATH, session_id));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&identity.token)
            .json(message)
            .send()
            .await
            .map_err(|e| GeosightError::network(&url, e))?;
        check(&url, response).await?;

        Ok(())
    }
}
