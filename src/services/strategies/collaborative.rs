use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use super::RankingStrategy;
use crate::{
    models::UserProfile,
    services::{catalogue::CatalogueSnapshot, similarity},
};

/// Neighborhood size for the user-user similarity scan
const TOP_K_SIMILAR_USERS: usize = 20;

// Engagement score per story per similar user
const ENGAGEMENT_VIEWED: f64 = 0.5;
const ENGAGEMENT_COMPLETED: f64 = 2.0;
const ENGAGEMENT_SCORE_DIVISOR: f64 = 5.0;

/// Recommends stories favoured by users with similar preference profiles.
///
/// Computes cosine similarity between the target's weight vector and every
/// other known user's, keeps the top 20 neighbours, then scores candidate
/// stories by the sum of `similarity x engagement` over those neighbours.
/// The aggregate is monotonic in both similarity and interaction
/// frequency. Stories the target has already viewed are excluded outright.
///
/// This O(users x dimensions) scan is the engine's dominant cost; vectors
/// are sparse maps so each pair costs only the shared dimensions.
pub struct CollaborativeStrategy;

impl CollaborativeStrategy {
    fn engagement(peer: &UserProfile, story_id: &str) -> f64 {
        let mut engagement = 0.0;
        if peer.viewed.contains(story_id) {
            engagement += ENGAGEMENT_VIEWED;
        }
        if peer.completed.contains(story_id) {
            engagement += ENGAGEMENT_COMPLETED;
        }
        if let Some(score) = peer.story_scores.get(story_id) {
            engagement += f64::from(*score) / ENGAGEMENT_SCORE_DIVISOR;
        }
        engagement
    }
}

impl RankingStrategy for CollaborativeStrategy {
    fn name(&self) -> &'static str {
        "collaborative"
    }

    fn recommend(
        &self,
        profile: &UserProfile,
        snapshot: &CatalogueSnapshot,
        peers: &[UserProfile],
        exclude: &HashSet<String>,
        limit: usize,
    ) -> Vec<String> {
        if limit == 0 || snapshot.is_empty() || profile.is_cold() {
            return Vec::new();
        }

        let mut neighbours: Vec<(&UserProfile, f64)> = peers
            .iter()
            .filter(|p| p.user_id != profile.user_id)
            .map(|p| (p, similarity::cosine_weights(&profile.weights, &p.weights)))
            .filter(|(_, sim)| *sim > 0.0)
            .collect();
        if neighbours.is_empty() {
            return Vec::new();
        }

        neighbours.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.user_id.cmp(&b.0.user_id))
        });
        neighbours.truncate(TOP_K_SIMILAR_USERS);

        // Aggregate over everything the neighbours interacted with.
        let mut scores: HashMap<&str, f64> = HashMap::new();
        for (peer, sim) in &neighbours {
            for story_id in peer.viewed.union(&peer.completed) {
                if exclude.contains(story_id) || profile.viewed.contains(story_id) {
                    continue;
                }
                if snapshot.get(story_id).is_none() {
                    continue;
                }
                *scores.entry(story_id.as_str()).or_insert(0.0) +=
                    sim * Self::engagement(peer, story_id);
            }
        }

        let mut ranked: Vec<(&str, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });

        ranked
            .into_iter()
            .take(limit)
            .map(|(id, _)| id.to_string())
            .collect()
    }
}
