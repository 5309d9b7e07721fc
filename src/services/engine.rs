use std::collections::HashSet;
use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::{
    error::{AppError, AppResult},
    models::{Story, UserProfile},
    services::{
        catalogue::{CatalogueCache, CatalogueSnapshot},
        state::UserStateStore,
        strategies::{
            CollaborativeStrategy, ContentBasedStrategy, RankingStrategy, TopicalStrategy,
            WildcardStrategy,
        },
    },
};

/// Total recommendation slots returned per request
pub const TOTAL_SLOTS: usize = 6;

const CONTENT_BASED_SLOTS: usize = 2;
const COLLABORATIVE_SLOTS: usize = 2;
const TOPICAL_SLOTS: usize = 1;
const WILDCARD_SLOTS: usize = 1;

/// Orchestrates the four ranking strategies into one result set.
///
/// Slot allocation: content-based x2, collaborative x2, topical x1,
/// wildcard x1. Each strategy runs against the accumulated exclusion set
/// (picks so far plus every story the user has viewed or completed), so
/// no story appears twice and nothing already seen comes back. When a strategy
/// starves, the shortfall backfills down the same priority order and
/// finally from random unviewed stories; an exhausted catalogue yields
/// fewer than six rather than an error. The final list is shuffled so
/// callers cannot infer which slot produced which story.
///
/// Stateless per call: one profile snapshot, one catalogue snapshot and
/// one peer-profile snapshot are taken up front and used throughout.
pub struct RecommendationEngine {
    catalogue: Arc<CatalogueCache>,
    store: Arc<UserStateStore>,
    slots: Vec<(Box<dyn RankingStrategy>, usize)>,
}

impl RecommendationEngine {
    pub fn new(catalogue: Arc<CatalogueCache>, store: Arc<UserStateStore>) -> Self {
        let slots: Vec<(Box<dyn RankingStrategy>, usize)> = vec![
            (Box::new(ContentBasedStrategy), CONTENT_BASED_SLOTS),
            (Box::new(CollaborativeStrategy), COLLABORATIVE_SLOTS),
            (Box::new(TopicalStrategy), TOPICAL_SLOTS),
            (Box::new(WildcardStrategy), WILDCARD_SLOTS),
        ];
        Self {
            catalogue,
            store,
            slots,
        }
    }

    /// Up to [`TOTAL_SLOTS`] distinct story ids the user has neither
    /// viewed nor completed, in random order.
    pub async fn recommend(&self, user_id: &str) -> AppResult<Vec<String>> {
        if user_id.is_empty() {
            return Err(AppError::Validation("user_id must be non-empty".into()));
        }

        let profile = self.store.get_profile(user_id).await?;
        let snapshot = self.catalogue.snapshot();
        let peers = self.store.all_profiles().await;

        // A completion may arrive without its view event; both mean "seen".
        let mut exclude: HashSet<String> = profile
            .viewed
            .iter()
            .chain(profile.completed.iter())
            .cloned()
            .collect();
        let mut picks: Vec<String> = Vec::with_capacity(TOTAL_SLOTS);

        for (strategy, slot_count) in &self.slots {
            let results = strategy.recommend(&profile, &snapshot, &peers, &exclude, *slot_count);
            tracing::debug!(
                user_id = %user_id,
                strategy = strategy.name(),
                count = results.len(),
                "Strategy slot results"
            );
            for story_id in results {
                if exclude.insert(story_id.clone()) {
                    picks.push(story_id);
                }
            }
        }

        if picks.len() < TOTAL_SLOTS {
            self.backfill(&mut picks, &mut exclude, &profile, &snapshot, &peers);
        }

        picks.shuffle(&mut rand::thread_rng());
        tracing::debug!(user_id = %user_id, picks = ?picks, "Recommendations computed");
        Ok(picks)
    }

    /// Fills remaining slots after strategy starvation.
    ///
    /// Walks the strategies again in priority order with the shortfall as
    /// the limit, then falls back to random unviewed stories. Runs out of
    /// catalogue silently; duplicates never enter because `exclude` keeps
    /// accumulating.
    fn backfill(
        &self,
        picks: &mut Vec<String>,
        exclude: &mut HashSet<String>,
        profile: &UserProfile,
        snapshot: &CatalogueSnapshot,
        peers: &[UserProfile],
    ) {
        for (strategy, _) in &self.slots {
            let needed = TOTAL_SLOTS - picks.len();
            if needed == 0 {
                return;
            }
            let results = strategy.recommend(profile, snapshot, peers, exclude, needed);
            for story_id in results {
                if exclude.insert(story_id.clone()) {
                    picks.push(story_id);
                }
            }
        }

        let needed = TOTAL_SLOTS - picks.len();
        if needed == 0 {
            return;
        }

        // Last resort: random unseen leftovers.
        let mut remaining: Vec<&Story> = snapshot
            .stories()
            .filter(|s| !exclude.contains(&s.story_id))
            .collect();
        remaining.shuffle(&mut rand::thread_rng());
        for story in remaining.into_iter().take(needed) {
            exclude.insert(story.story_id.clone());
            picks.push(story.story_id.clone());
        }
    }
}
