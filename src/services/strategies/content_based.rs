use std::cmp::Ordering;
use std::collections::HashSet;

use super::RankingStrategy;
use crate::{
    models::UserProfile,
    services::{catalogue::CatalogueSnapshot, similarity},
};

/// Recommends stories whose themes/tags best match the user's profile.
///
/// Scores every candidate by cosine similarity between the user's weight
/// vector and the story's 0/1 indicator vector. Ties break on story id
/// ascending so results are reproducible. A user with no preference signal
/// gets nothing from this strategy; the engine's fallback chain covers
/// cold users instead.
pub struct ContentBasedStrategy;

impl RankingStrategy for ContentBasedStrategy {
    fn name(&self) -> &'static str {
        "content_based"
    }

    fn recommend(
        &self,
        profile: &UserProfile,
        snapshot: &CatalogueSnapshot,
        _peers: &[UserProfile],
        exclude: &HashSet<String>,
        limit: usize,
    ) -> Vec<String> {
        if limit == 0 || snapshot.is_empty() || profile.is_cold() {
            return Vec::new();
        }

        let mut scored: Vec<(&str, f64)> = snapshot
            .stories()
            .filter(|s| !exclude.contains(&s.story_id) && !profile.viewed.contains(&s.story_id))
            .map(|s| {
                let similarity = similarity::cosine_indicator(&profile.weights, &s.dimensions());
                (s.story_id.as_str(), similarity)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });

        scored
            .into_iter()
            .take(limit)
            .map(|(id, _)| id.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::story;
    use super::*;

    fn snapshot() -> CatalogueSnapshot {
        CatalogueSnapshot::from_stories(vec![
            story("s1", &["mystery"], &["noir"]),
            story("s2", &["mystery"], &[]),
            story("s3", &["fantasy"], &["dragons"]),
            story("s4", &["romance"], &[]),
        ])
    }

    fn mystery_fan() -> UserProfile {
        let mut profile = UserProfile::new("u1");
        profile.weights.insert("mystery".into(), 3.0);
        profile.weights.insert("noir".into(), 2.0);
        profile
    }

    #[test]
    fn test_ranks_best_matching_stories_first() {
        let strategy = ContentBasedStrategy;
        let picks = strategy.recommend(&mystery_fan(), &snapshot(), &[], &HashSet::new(), 2);
        assert_eq!(picks, vec!["s1".to_string(), "s2".to_string()]);
    }

    #[test]
    fn test_cold_profile_yields_nothing() {
        let strategy = ContentBasedStrategy;
        let profile = UserProfile::new("u1");
        let picks = strategy.recommend(&profile, &snapshot(), &[], &HashSet::new(), 2);
        assert!(picks.is_empty());
    }

    #[test]
    fn test_respects_exclusions_and_viewed() {
        let strategy = ContentBasedStrategy;
        let mut profile = mystery_fan();
        profile.viewed.insert("s1".into());
        let exclude: HashSet<String> = ["s2".to_string()].into_iter().collect();

        let picks = strategy.recommend(&profile, &snapshot(), &[], &exclude, 4);
        assert!(!picks.contains(&"s1".to_string()));
        assert!(!picks.contains(&"s2".to_string()));
    }

    #[test]
    fn test_ties_break_by_story_id_ascending() {
        let snapshot = CatalogueSnapshot::from_stories(vec![
            story("b", &["mystery"], &[]),
            story("a", &["mystery"], &[]),
        ]);
        let strategy = ContentBasedStrategy;
        let picks = strategy.recommend(&mystery_fan(), &snapshot, &[], &HashSet::new(), 2);
        assert_eq!(picks, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_returns_fewer_than_limit_when_starved() {
        let snapshot = CatalogueSnapshot::from_stories(vec![story("s1", &["mystery"], &[])]);
        let strategy = ContentBasedStrategy;
        let picks = strategy.recommend(&mystery_fan(), &snapshot, &[], &HashSet::new(), 5);
        assert_eq!(picks.len(), 1);
    }
}
