use std::collections::HashSet;

use crate::{models::UserProfile, services::catalogue::CatalogueSnapshot};

pub mod collaborative;
pub mod content_based;
pub mod topical;
pub mod wildcard;

pub use collaborative::CollaborativeStrategy;
pub use content_based::ContentBasedStrategy;
pub use topical::TopicalStrategy;
pub use wildcard::WildcardStrategy;

/// One recommendation approach.
///
/// The engine calls each strategy in turn with the accumulated `exclude`
/// set (stories already selected this pass plus everything the user has
/// viewed), so later strategies never duplicate earlier picks. Strategies
/// are pure over their inputs and deterministic except where randomness is
/// the point (wildcard). Running out of candidates returns a short list,
/// never an error.
pub trait RankingStrategy: Send + Sync {
    /// Strategy name for logging and debugging
    fn name(&self) -> &'static str;

    /// Return up to `limit` story ids for `profile`, best first.
    fn recommend(
        &self,
        profile: &UserProfile,
        snapshot: &CatalogueSnapshot,
        peers: &[UserProfile],
        exclude: &HashSet<String>,
        limit: usize,
    ) -> Vec<String>;
}
