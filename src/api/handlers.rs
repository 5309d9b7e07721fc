use std::time::{Duration, Instant};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::UserEvent,
};

use super::AppState;

/// Hard response-time budget for a recommendation request
const RECOMMENDATION_BUDGET: Duration = Duration::from_millis(500);
/// Warn when a request lands this close to the budget
const WARN_THRESHOLD: Duration = Duration::from_millis(450);

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct StoryEventRequest {
    pub user_id: String,
    pub story_id: String,
    /// Defaults to the server clock when the caller omits it.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AnsweredRequest {
    pub user_id: String,
    pub story_id: String,
    pub score: u8,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct MoodRequest {
    pub user_id: String,
    pub mood: u8,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub story_ids: Vec<String>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Records that a user viewed a story
pub async fn viewed(
    State(state): State<AppState>,
    Json(request): Json<StoryEventRequest>,
) -> AppResult<StatusCode> {
    let timestamp = request.timestamp.unwrap_or_else(Utc::now);
    state
        .store
        .ingest(UserEvent::viewed(request.user_id, request.story_id, timestamp))
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// Records that a user completed a story
pub async fn completed(
    State(state): State<AppState>,
    Json(request): Json<StoryEventRequest>,
) -> AppResult<StatusCode> {
    let timestamp = request.timestamp.unwrap_or_else(Utc::now);
    state
        .store
        .ingest(UserEvent::completed(
            request.user_id,
            request.story_id,
            timestamp,
        ))
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// Records a user's end-of-story score (1-5)
pub async fn answered(
    State(state): State<AppState>,
    Json(request): Json<AnsweredRequest>,
) -> AppResult<StatusCode> {
    let timestamp = request.timestamp.unwrap_or_else(Utc::now);
    state
        .store
        .ingest(UserEvent::answered(
            request.user_id,
            request.story_id,
            request.score,
            timestamp,
        ))
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// Records a user's current mood (1-5)
pub async fn mood(
    State(state): State<AppState>,
    Json(request): Json<MoodRequest>,
) -> AppResult<StatusCode> {
    let timestamp = request.timestamp.unwrap_or_else(Utc::now);
    state
        .store
        .ingest(UserEvent::mood(request.user_id, request.mood, timestamp))
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// Computes up to 6 recommendations within the 500ms budget.
///
/// The budget is enforced here at the transport boundary; an expired
/// computation is abandoned, not retried.
pub async fn recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<RecommendationsResponse>> {
    let started = Instant::now();

    let story_ids = match tokio::time::timeout(
        RECOMMENDATION_BUDGET,
        state.engine.recommend(&user_id),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => {
            tracing::warn!(user_id = %user_id, "Recommendation computation exceeded budget");
            return Err(AppError::BudgetExceeded);
        }
    };

    let elapsed = started.elapsed();
    if elapsed > WARN_THRESHOLD {
        tracing::warn!(
            user_id = %user_id,
            elapsed_ms = elapsed.as_millis() as u64,
            "Recommendation request close to budget"
        );
    } else {
        tracing::debug!(
            user_id = %user_id,
            elapsed_ms = elapsed.as_millis() as u64,
            "Recommendation request served"
        );
    }

    Ok(Json(RecommendationsResponse { story_ids }))
}
