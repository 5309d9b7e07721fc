use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum_test::TestServer;
use serde_json::json;

use fable_recommender::api::{create_router, AppState};
use fable_recommender::error::{AppError, AppResult};
use fable_recommender::models::{Story, UserEvent};
use fable_recommender::platform::PlatformClient;
use fable_recommender::services::{CatalogueCache, RecommendationEngine, UserStateStore};

/// In-memory stand-in for the application server: a story list plus an
/// append-only per-user event log, with a toggle to simulate catalogue
/// outages.
struct InMemoryPlatform {
    stories: Mutex<Vec<Story>>,
    logs: Mutex<HashMap<String, Vec<UserEvent>>>,
    fail_catalogue: AtomicBool,
}

impl InMemoryPlatform {
    fn with_stories(stories: Vec<Story>) -> Self {
        Self {
            stories: Mutex::new(stories),
            logs: Mutex::new(HashMap::new()),
            fail_catalogue: AtomicBool::new(false),
        }
    }
}

#[async_trait::async_trait]
impl PlatformClient for InMemoryPlatform {
    async fn fetch_catalogue(&self) -> AppResult<Vec<Story>> {
        if self.fail_catalogue.load(Ordering::SeqCst) {
            return Err(AppError::Fetch("simulated outage".into()));
        }
        Ok(self.stories.lock().unwrap().clone())
    }

    async fn save_user_events(&self, user_id: &str, events: &[UserEvent]) -> AppResult<()> {
        self.logs
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default()
            .extend_from_slice(events);
        Ok(())
    }

    async fn load_user_events(&self, user_id: &str) -> AppResult<Vec<UserEvent>> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}

fn story(id: &str, themes: &[&str], tags: &[&str]) -> Story {
    Story {
        story_id: id.into(),
        title: id.to_uppercase(),
        themes: themes.iter().map(|s| s.to_string()).collect(),
        tags: tags.iter().map(|s| s.to_string()).collect(),
    }
}

fn sample_stories() -> Vec<Story> {
    vec![
        story("s1", &["mystery"], &["noir", "detective"]),
        story("s2", &["mystery"], &["noir"]),
        story("s3", &["adventure"], &["pirates"]),
        story("s4", &["adventure"], &["treasure"]),
        story("s5", &["fantasy"], &["dragons"]),
        story("s6", &["fantasy"], &["magic"]),
        story("s7", &["romance"], &[]),
        story("s8", &["scifi"], &["space"]),
    ]
}

struct TestContext {
    server: TestServer,
    platform: Arc<InMemoryPlatform>,
    catalogue: Arc<CatalogueCache>,
    store: Arc<UserStateStore>,
}

async fn test_context() -> TestContext {
    let platform = Arc::new(InMemoryPlatform::with_stories(sample_stories()));
    let client: Arc<dyn PlatformClient> = platform.clone();

    let catalogue = Arc::new(CatalogueCache::new(client.clone()));
    catalogue.refresh().await.unwrap();

    let store = Arc::new(UserStateStore::new(client, catalogue.clone()));
    let engine = Arc::new(RecommendationEngine::new(catalogue.clone(), store.clone()));

    let state = AppState::new(store.clone(), engine);
    let server = TestServer::new(create_router(state, 10)).unwrap();

    TestContext {
        server,
        platform,
        catalogue,
        store,
    }
}

#[tokio::test]
async fn test_health_check() {
    let ctx = test_context().await;
    let response = ctx.server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_event_ingestion_shapes_recommendations() {
    let ctx = test_context().await;

    // Viewed + completed s1: it must never come back.
    let response = ctx
        .server
        .post("/api/v1/events/viewed")
        .json(&json!({ "user_id": "u1", "story_id": "s1" }))
        .await;
    response.assert_status(axum::http::StatusCode::ACCEPTED);

    let response = ctx
        .server
        .post("/api/v1/events/completed")
        .json(&json!({ "user_id": "u1", "story_id": "s1" }))
        .await;
    response.assert_status(axum::http::StatusCode::ACCEPTED);

    let response = ctx.server.get("/api/v1/recommendations/u1").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let ids: Vec<String> = body["story_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();

    assert!(ids.len() <= 6);
    assert!(!ids.contains(&"s1".to_string()));
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
}

#[tokio::test]
async fn test_out_of_range_score_rejected() {
    let ctx = test_context().await;

    let response = ctx
        .server
        .post("/api/v1/events/answered")
        .json(&json!({ "user_id": "u1", "story_id": "s1", "score": 6 }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    // The rejected event must not have touched the profile.
    let profile = ctx.store.get_profile("u1").await.unwrap();
    assert!(profile.story_scores.is_empty());
    assert!(profile.is_cold());
}

#[tokio::test]
async fn test_mood_accepted_and_stored() {
    let ctx = test_context().await;

    let response = ctx
        .server
        .post("/api/v1/events/mood")
        .json(&json!({ "user_id": "u1", "mood": 4 }))
        .await;
    response.assert_status(axum::http::StatusCode::ACCEPTED);

    let profile = ctx.store.get_profile("u1").await.unwrap();
    assert_eq!(profile.last_mood, Some(4));
    assert!(profile.is_cold());
}

#[tokio::test]
async fn test_zero_event_user_gets_recommendations() {
    let ctx = test_context().await;

    let response = ctx.server.get("/api/v1/recommendations/brand-new").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["story_ids"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_recommendations_survive_catalogue_outage() {
    let ctx = test_context().await;

    // A refresh during an outage fails but keeps the last good snapshot.
    ctx.platform.fail_catalogue.store(true, Ordering::SeqCst);
    assert!(ctx.catalogue.refresh().await.is_err());

    let response = ctx.server.get("/api/v1/recommendations/u1").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["story_ids"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_state_round_trip_through_platform() {
    let ctx = test_context().await;

    ctx.server
        .post("/api/v1/events/viewed")
        .json(&json!({ "user_id": "u1", "story_id": "s1" }))
        .await
        .assert_status(axum::http::StatusCode::ACCEPTED);
    ctx.server
        .post("/api/v1/events/answered")
        .json(&json!({ "user_id": "u1", "story_id": "s2", "score": 5 }))
        .await
        .assert_status(axum::http::StatusCode::ACCEPTED);

    let before = ctx.store.get_profile("u1").await.unwrap();
    ctx.store.flush().await.unwrap();

    // Simulate a restart: a fresh store against the same platform log.
    let client: Arc<dyn PlatformClient> = ctx.platform.clone();
    let restarted = UserStateStore::new(client, ctx.catalogue.clone());
    let after = restarted.get_profile("u1").await.unwrap();

    assert_eq!(after.viewed, before.viewed);
    assert_eq!(after.story_scores, before.story_scores);
    for (dim, weight) in &before.weights {
        assert!(
            (after.weights.get(dim).copied().unwrap_or(0.0) - weight).abs() < 1e-9,
            "dimension {}",
            dim
        );
    }
}
