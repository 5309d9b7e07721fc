use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{Story, UserEvent},
};

/// Client for the application server that owns durable storage and the
/// story catalogue.
///
/// The recommender never talks to a database of its own; everything
/// durable lives behind this interface. The three calls mirror the remote
/// contract: a full-replace catalogue fetch, an append-only event save and
/// a full replay-log load.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlatformClient: Send + Sync {
    /// Fetch the complete story catalogue. Full-replace semantics: the
    /// caller discards its previous snapshot only on success.
    async fn fetch_catalogue(&self) -> AppResult<Vec<Story>>;

    /// Append a batch of events to a user's durable log. Failure leaves
    /// the batch with the caller for retry (at-least-once delivery).
    async fn save_user_events(&self, user_id: &str, events: &[UserEvent]) -> AppResult<()>;

    /// Load a user's full event log for replay. An empty log is a valid
    /// response (new user).
    async fn load_user_events(&self, user_id: &str) -> AppResult<Vec<UserEvent>>;
}

#[derive(Debug, Deserialize)]
struct CatalogueResponse {
    stories: Vec<Story>,
}

#[derive(Debug, Serialize)]
struct SaveEventsRequest<'a> {
    events: &'a [UserEvent],
}

#[derive(Debug, Deserialize)]
struct EventLogResponse {
    events: Vec<UserEvent>,
}

/// HTTP implementation of [`PlatformClient`]
pub struct HttpPlatformClient {
    http_client: HttpClient,
    base_url: String,
}

impl HttpPlatformClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl PlatformClient for HttpPlatformClient {
    async fn fetch_catalogue(&self) -> AppResult<Vec<Story>> {
        let url = format!("{}/catalogue", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Fetch(format!(
                "catalogue request returned status {}",
                status
            )));
        }

        let body: CatalogueResponse = response
            .json()
            .await
            .map_err(|e| AppError::Fetch(format!("malformed catalogue response: {}", e)))?;

        tracing::debug!(story_count = body.stories.len(), "Fetched story catalogue");

        Ok(body.stories)
    }

    async fn save_user_events(&self, user_id: &str, events: &[UserEvent]) -> AppResult<()> {
        let url = format!("{}/users/{}/events", self.base_url, user_id);

        let response = self
            .http_client
            .post(&url)
            .json(&SaveEventsRequest { events })
            .send()
            .await
            .map_err(|e| AppError::Persist(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Persist(format!(
                "event save for user {} returned status {}",
                user_id, status
            )));
        }

        Ok(())
    }

    async fn load_user_events(&self, user_id: &str) -> AppResult<Vec<UserEvent>> {
        let url = format!("{}/users/{}/events", self.base_url, user_id);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Replay(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Replay(format!(
                "event log load for user {} returned status {}",
                user_id, status
            )));
        }

        let body: EventLogResponse = response
            .json()
            .await
            .map_err(|e| AppError::Replay(format!("unreadable event log: {}", e)))?;

        Ok(body.events)
    }
}
