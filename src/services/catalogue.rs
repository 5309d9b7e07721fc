use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

use crate::{error::AppResult, models::Story, platform::PlatformClient};

/// An immutable view of the story catalogue at one refresh instant.
///
/// Snapshots are built whole and never mutated; readers that hold one keep
/// a consistent view for the duration of a computation even while a
/// refresh swaps in a replacement.
#[derive(Debug, Default)]
pub struct CatalogueSnapshot {
    stories: HashMap<String, Story>,
}

impl CatalogueSnapshot {
    pub fn from_stories(stories: Vec<Story>) -> Self {
        Self {
            stories: stories
                .into_iter()
                .map(|s| (s.story_id.clone(), s))
                .collect(),
        }
    }

    pub fn get(&self, story_id: &str) -> Option<&Story> {
        self.stories.get(story_id)
    }

    pub fn stories(&self) -> impl Iterator<Item = &Story> {
        self.stories.values()
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// The tag carried by the most stories, ties broken lexicographically.
    /// Cold-start seed for the topical strategy.
    pub fn most_frequent_tag(&self) -> Option<&str> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for story in self.stories.values() {
            for tag in &story.tags {
                *counts.entry(tag.as_str()).or_insert(0) += 1;
            }
        }
        counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(tag, _)| tag)
    }
}

/// Cached story catalogue, refreshed on a timer from the platform.
///
/// Holds exactly one snapshot at a time. Reads are lock-free loads of the
/// current `Arc`; a refresh builds the replacement completely before the
/// atomic swap, so readers never observe a partial catalogue. A failed
/// refresh keeps the previous snapshot (stale-but-available).
pub struct CatalogueCache {
    client: Arc<dyn PlatformClient>,
    current: ArcSwap<CatalogueSnapshot>,
}

impl CatalogueCache {
    pub fn new(client: Arc<dyn PlatformClient>) -> Self {
        Self {
            client,
            current: ArcSwap::from_pointee(CatalogueSnapshot::default()),
        }
    }

    /// The current snapshot. Never blocks, never observes a refresh in
    /// progress.
    pub fn snapshot(&self) -> Arc<CatalogueSnapshot> {
        self.current.load_full()
    }

    /// Fetches the full catalogue and replaces the snapshot wholesale.
    ///
    /// On failure the existing snapshot is left untouched and the error is
    /// returned for the caller (or the refresh loop) to log.
    pub async fn refresh(&self) -> AppResult<()> {
        let stories = self.client.fetch_catalogue().await?;
        let snapshot = CatalogueSnapshot::from_stories(stories);
        tracing::info!(story_count = snapshot.len(), "Story catalogue refreshed");
        self.current.store(Arc::new(snapshot));
        Ok(())
    }

    /// Spawns the background refresh loop. Failures are logged and retried
    /// on the next tick; they never invalidate the held snapshot.
    pub fn spawn_refresh_loop(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick fires immediately; the caller already did the
            // startup refresh.
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = cache.refresh().await {
                    tracing::error!(
                        error = %e,
                        story_count = cache.snapshot().len(),
                        "Catalogue refresh failed; keeping existing snapshot"
                    );
                }
            }
        })
    }
}
