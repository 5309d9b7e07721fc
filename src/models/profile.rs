use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::{EventKind, Story, UserEvent};

// Weight deltas applied when processing events
pub const WEIGHT_VIEW: f64 = 1.0;
pub const WEIGHT_COMPLETE_BONUS: f64 = 2.0; // additive with the view weight
pub const WEIGHT_SCORE_FACTOR: f64 = 0.5; // (score - 3) * factor

/// Accumulated preference state for a single user.
///
/// The profile is a pure fold of that user's event log: every field is
/// derived by [`UserProfile::apply`] and nothing else mutates it. Weights
/// are additive, so the final vector is independent of event arrival order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserProfile {
    pub user_id: String,
    /// Accumulated preference weight per theme/tag dimension. Unseen
    /// dimensions default to 0; sign and magnitude are unbounded.
    pub weights: HashMap<String, f64>,
    /// Stories the user has viewed. Only grows; used for exclusion.
    pub viewed: HashSet<String>,
    /// Stories the user has completed.
    pub completed: HashSet<String>,
    /// End-of-story scores (1-5) keyed by story.
    pub story_scores: HashMap<String, u8>,
    /// Themes touched by any weight-affecting event. Drives the wildcard
    /// strategy's unexplored-theme boost.
    pub explored_themes: HashSet<String>,
    /// Most recent mood report (1-5). Stored, never weighted.
    pub last_mood: Option<u8>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// The accumulated weight for a dimension, 0 when unseen.
    pub fn weight(&self, dimension: &str) -> f64 {
        self.weights.get(dimension).copied().unwrap_or(0.0)
    }

    /// True when the user carries no preference signal at all.
    pub fn is_cold(&self) -> bool {
        self.weights.values().all(|w| *w == 0.0)
    }

    /// Applies one event to the profile, cumulatively.
    ///
    /// `story` is the catalogue entry for the event's story at application
    /// time. When the story is no longer (or not yet) in the catalogue the
    /// membership sets are still updated but no weight delta is applied,
    /// since the event's dimensions are unknown.
    pub fn apply(&mut self, event: &UserEvent, story: Option<&Story>) {
        match event.kind {
            EventKind::Viewed => {
                if let Some(story_id) = &event.story_id {
                    self.viewed.insert(story_id.clone());
                }
                if let Some(story) = story {
                    self.add_weight_delta(story, WEIGHT_VIEW);
                }
            }
            EventKind::Completed => {
                if let Some(story_id) = &event.story_id {
                    self.completed.insert(story_id.clone());
                }
                if let Some(story) = story {
                    self.add_weight_delta(story, WEIGHT_COMPLETE_BONUS);
                }
            }
            EventKind::Answered { score } => {
                if let Some(story_id) = &event.story_id {
                    self.story_scores.insert(story_id.clone(), score);
                }
                if let Some(story) = story {
                    let delta = (f64::from(score) - 3.0) * WEIGHT_SCORE_FACTOR;
                    self.add_weight_delta(story, delta);
                }
            }
            EventKind::MoodReported { mood } => {
                self.last_mood = Some(mood);
            }
        }
    }

    /// Adds `delta` to every theme and tag dimension the story carries,
    /// uniformly, never normalised by dimension count.
    fn add_weight_delta(&mut self, story: &Story, delta: f64) {
        for theme in &story.themes {
            *self.weights.entry(theme.clone()).or_insert(0.0) += delta;
            self.explored_themes.insert(theme.clone());
        }
        for tag in &story.tags {
            *self.weights.entry(tag.clone()).or_insert(0.0) += delta;
        }
    }
}
