use std::sync::Arc;

use crate::services::{RecommendationEngine, UserStateStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<UserStateStore>,
    pub engine: Arc<RecommendationEngine>,
}

impl AppState {
    pub fn new(store: Arc<UserStateStore>, engine: Arc<RecommendationEngine>) -> Self {
        Self { store, engine }
    }
}
