use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub mod profile;

pub use profile::UserProfile;

/// A single story in the catalogue.
///
/// Themes are broad category labels (e.g. "adventure", "mystery"); tags are
/// fine-grained content labels (e.g. "pirates", "treasure"). Together they
/// form the dimensions of the story's indicator vector. Stories are
/// immutable once fetched and replaced wholesale on catalogue refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub story_id: String,
    pub title: String,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Story {
    /// The distinct theme/tag dimensions this story carries (its indicator
    /// vector is 1.0 on each of these, 0 elsewhere).
    pub fn dimensions(&self) -> HashSet<&str> {
        self.themes
            .iter()
            .chain(self.tags.iter())
            .map(String::as_str)
            .collect()
    }
}

/// Categories of user interaction events tracked by the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    Viewed,
    Completed,
    Answered { score: u8 },
    MoodReported { mood: u8 },
}

/// A single recorded user interaction.
///
/// Events are append-only and are the canonical source of truth for
/// preference state: profiles are only ever rebuilt by replaying them.
/// `event_id` is the identity used to de-duplicate replayed logs after
/// an at-least-once flush retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEvent {
    pub event_id: Uuid,
    pub user_id: String,
    /// The story involved; `None` only for mood events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_id: Option<String>,
    #[serde(flatten)]
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
}

impl UserEvent {
    fn new(
        user_id: String,
        story_id: Option<String>,
        kind: EventKind,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            user_id,
            story_id,
            kind,
            timestamp,
        }
    }

    pub fn viewed(user_id: String, story_id: String, timestamp: DateTime<Utc>) -> Self {
        Self::new(user_id, Some(story_id), EventKind::Viewed, timestamp)
    }

    pub fn completed(user_id: String, story_id: String, timestamp: DateTime<Utc>) -> Self {
        Self::new(user_id, Some(story_id), EventKind::Completed, timestamp)
    }

    pub fn answered(
        user_id: String,
        story_id: String,
        score: u8,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(
            user_id,
            Some(story_id),
            EventKind::Answered { score },
            timestamp,
        )
    }

    pub fn mood(user_id: String, mood: u8, timestamp: DateTime<Utc>) -> Self {
        Self::new(user_id, None, EventKind::MoodReported { mood }, timestamp)
    }

    /// Checks the event is well formed before it may touch any profile.
    ///
    /// Out-of-range scores and moods are rejected here, never clamped.
    pub fn validate(&self) -> AppResult<()> {
        if self.user_id.is_empty() {
            return Err(AppError::Validation("user_id must be non-empty".into()));
        }
        match self.kind {
            EventKind::Viewed | EventKind::Completed => {
                if self.story_id.is_none() {
                    return Err(AppError::Validation(
                        "story_id is required for story events".into(),
                    ));
                }
            }
            EventKind::Answered { score } => {
                if self.story_id.is_none() {
                    return Err(AppError::Validation(
                        "story_id is required for score events".into(),
                    ));
                }
                if !(1..=5).contains(&score) {
                    return Err(AppError::Validation(format!(
                        "score must be between 1 and 5, got {}",
                        score
                    )));
                }
            }
            EventKind::MoodReported { mood } => {
                if !(1..=5).contains(&mood) {
                    return Err(AppError::Validation(format!(
                        "mood must be between 1 and 5, got {}",
                        mood
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story() -> Story {
        Story {
            story_id: "s1".into(),
            title: "The Hidden Cove".into(),
            themes: vec!["adventure".into()],
            tags: vec!["pirates".into(), "treasure".into()],
        }
    }

    #[test]
    fn test_story_dimensions_merges_themes_and_tags() {
        let story = story();
        let dims = story.dimensions();
        assert_eq!(dims.len(), 3);
        assert!(dims.contains("adventure"));
        assert!(dims.contains("pirates"));
        assert!(dims.contains("treasure"));
    }

    #[test]
    fn test_validate_accepts_well_formed_events() {
        let ts = Utc::now();
        assert!(UserEvent::viewed("u1".into(), "s1".into(), ts).validate().is_ok());
        assert!(UserEvent::completed("u1".into(), "s1".into(), ts).validate().is_ok());
        assert!(UserEvent::answered("u1".into(), "s1".into(), 5, ts).validate().is_ok());
        assert!(UserEvent::mood("u1".into(), 1, ts).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_score() {
        let event = UserEvent::answered("u1".into(), "s1".into(), 6, Utc::now());
        assert!(matches!(
            event.validate(),
            Err(crate::error::AppError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_mood() {
        let event = UserEvent::mood("u1".into(), 0, Utc::now());
        assert!(matches!(
            event.validate(),
            Err(crate::error::AppError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_user_id() {
        let event = UserEvent::viewed(String::new(), "s1".into(), Utc::now());
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_event_serde_round_trip() {
        let event = UserEvent::answered("u1".into(), "s1".into(), 4, Utc::now());
        let json = serde_json::to_string(&event).unwrap();
        let back: UserEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_mood_event_omits_story_id() {
        let event = UserEvent::mood("u1".into(), 3, Utc::now());
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("story_id"));
        assert!(json.contains(r#""kind":"mood_reported""#));
    }
}
