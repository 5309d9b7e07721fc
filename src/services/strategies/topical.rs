use std::cmp::Ordering;
use std::collections::HashSet;

use super::RankingStrategy;
use crate::{
    models::{Story, UserProfile},
    services::catalogue::CatalogueSnapshot,
};

/// Recommends from the user's single strongest theme/tag dimension.
///
/// Finds the highest-weight dimension in the profile (lexicographic
/// tie-break for reproducibility) and returns unviewed stories carrying
/// it, ranked by how many positively weighted dimensions they share with
/// the user, then by story id. Users with no history fall back to the
/// catalogue's most frequent tag.
pub struct TopicalStrategy;

impl TopicalStrategy {
    fn top_dimension<'a>(profile: &'a UserProfile) -> Option<&'a str> {
        profile
            .weights
            .iter()
            .max_by(|a, b| {
                a.1.partial_cmp(b.1)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| b.0.cmp(a.0))
            })
            .map(|(dim, _)| dim.as_str())
    }

    fn carries(story: &Story, dimension: &str) -> bool {
        story.themes.iter().any(|t| t == dimension) || story.tags.iter().any(|t| t == dimension)
    }
}

impl RankingStrategy for TopicalStrategy {
    fn name(&self) -> &'static str {
        "topical"
    }

    fn recommend(
        &self,
        profile: &UserProfile,
        snapshot: &CatalogueSnapshot,
        _peers: &[UserProfile],
        exclude: &HashSet<String>,
        limit: usize,
    ) -> Vec<String> {
        if limit == 0 || snapshot.is_empty() {
            return Vec::new();
        }

        let top = match Self::top_dimension(profile) {
            Some(dim) => dim.to_string(),
            None => match snapshot.most_frequent_tag() {
                Some(tag) => tag.to_string(),
                None => return Vec::new(),
            },
        };

        let mut candidates: Vec<&Story> = snapshot
            .stories()
            .filter(|s| {
                Self::carries(s, &top)
                    && !profile.viewed.contains(&s.story_id)
                    && !exclude.contains(&s.story_id)
            })
            .collect();

        candidates.sort_by(|a, b| {
            let a_overlap = a.dimensions().iter().filter(|d| profile.weight(d) > 0.0).count();
            let b_overlap = b.dimensions().iter().filter(|d| profile.weight(d) > 0.0).count();
            b_overlap
                .cmp(&a_overlap)
                .then_with(|| a.story_id.cmp(&b.story_id))
        });

        candidates
            .into_iter()
            .take(limit)
            .map(|s| s.story_id.clone())
            .collect()
    }
}
