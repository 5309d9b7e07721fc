use std::collections::HashSet;

use rand::distributions::{Distribution, WeightedIndex};

use super::RankingStrategy;
use crate::{
    models::{Story, UserProfile},
    services::catalogue::CatalogueSnapshot,
};

/// Selection-weight multiplier for stories whose themes are all
/// unexplored by the user. A boost, not a filter: familiar-theme stories
/// stay in the pool at weight 1.0.
const UNEXPLORED_BOOST: f64 = 4.0;

/// Serendipitous discovery pick.
///
/// Draws at random from the user's unviewed stories, with stories whose
/// themes lie entirely outside the user's explored-themes set drawn at
/// [`UNEXPLORED_BOOST`] times the base probability. When every candidate
/// is in familiar territory the draw degenerates to uniform.
pub struct WildcardStrategy;

impl WildcardStrategy {
    fn is_unexplored(story: &Story, explored: &HashSet<String>) -> bool {
        story.themes.iter().all(|t| !explored.contains(t))
    }
}

impl RankingStrategy for WildcardStrategy {
    fn name(&self) -> &'static str {
        "wildcard"
    }

    fn recommend(
        &self,
        profile: &UserProfile,
        snapshot: &CatalogueSnapshot,
        _peers: &[UserProfile],
        exclude: &HashSet<String>,
        limit: usize,
    ) -> Vec<String> {
        let mut pool: Vec<(&Story, f64)> = snapshot
            .stories()
            .filter(|s| !profile.viewed.contains(&s.story_id) && !exclude.contains(&s.story_id))
            .map(|s| {
                let weight = if Self::is_unexplored(s, &profile.explored_themes) {
                    UNEXPLORED_BOOST
                } else {
                    1.0
                };
                (s, weight)
            })
            .collect();

        let mut rng = rand::thread_rng();
        let mut picks = Vec::new();
        while picks.len() < limit && !pool.is_empty() {
            let dist = match WeightedIndex::new(pool.iter().map(|(_, w)| *w)) {
                Ok(dist) => dist,
                Err(_) => break,
            };
            let index = dist.sample(&mut rng);
            let (story, _) = pool.swap_remove(index);
            picks.push(story.story_id.clone());
        }
        picks
    }
}
