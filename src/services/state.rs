use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{UserEvent, UserProfile},
    platform::PlatformClient,
    services::catalogue::CatalogueCache,
};

/// Per-user record: the derived profile plus events ingested since the
/// last acknowledged flush.
struct UserEntry {
    profile: UserProfile,
    pending: Vec<UserEvent>,
}

/// In-memory store for all user profiles.
///
/// The store is the single authoritative source of user state at runtime;
/// the application server holds the durable copy as a raw event log.
/// Profiles are lazily rebuilt by replaying that log on a user's first
/// reference, then kept current by synchronous ingestion.
///
/// Locking: the outer map lock guards membership only. Each user has their
/// own lock, so ingestion for one user is serialised (preserving the
/// additive-replay invariant) while different users mutate fully in
/// parallel and a slow remote call for one user never stalls another.
pub struct UserStateStore {
    client: Arc<dyn PlatformClient>,
    catalogue: Arc<CatalogueCache>,
    users: RwLock<HashMap<String, Arc<RwLock<UserEntry>>>>,
}

impl UserStateStore {
    pub fn new(client: Arc<dyn PlatformClient>, catalogue: Arc<CatalogueCache>) -> Self {
        Self {
            client,
            catalogue,
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Validates and applies one event to the user's in-memory profile,
    /// then queues it for the next flush.
    ///
    /// The event is fully applied before this returns, so a recommendation
    /// request issued immediately afterwards sees its effect. A malformed
    /// event is rejected whole; nothing is partially applied.
    pub async fn ingest(&self, event: UserEvent) -> AppResult<()> {
        event.validate()?;

        let entry = self.entry(&event.user_id).await?;
        let snapshot = self.catalogue.snapshot();
        let story = event.story_id.as_deref().and_then(|id| snapshot.get(id));

        let mut entry = entry.write().await;
        entry.profile.apply(&event, story);
        entry.pending.push(event);
        Ok(())
    }

    /// An owned snapshot of the user's profile, replaying their event log
    /// first if this is the user's first reference.
    pub async fn get_profile(&self, user_id: &str) -> AppResult<UserProfile> {
        let entry = self.entry(user_id).await?;
        let entry = entry.read().await;
        Ok(entry.profile.clone())
    }

    /// Snapshot clones of every known profile (collaborative filtering
    /// input).
    pub async fn all_profiles(&self) -> Vec<UserProfile> {
        let entries: Vec<Arc<RwLock<UserEntry>>> =
            self.users.read().await.values().cloned().collect();

        let mut profiles = Vec::with_capacity(entries.len());
        for entry in entries {
            profiles.push(entry.read().await.profile.clone());
        }
        profiles
    }

    /// Appends every user's pending events to the durable log.
    ///
    /// Delivery is at-least-once: a batch is removed from the pending
    /// buffer only for the exact event ids the platform acknowledged, and
    /// a failed batch is retried unchanged on the next tick. Users are
    /// flushed independently so one user's failure never blocks another's.
    pub async fn flush(&self) -> AppResult<()> {
        let entries: Vec<(String, Arc<RwLock<UserEntry>>)> = self
            .users
            .read()
            .await
            .iter()
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect();

        let mut flushed = 0usize;
        let mut first_error = None;

        for (user_id, entry) in entries {
            let batch: Vec<UserEvent> = {
                let entry = entry.read().await;
                entry.pending.clone()
            };
            if batch.is_empty() {
                continue;
            }

            match self.client.save_user_events(&user_id, &batch).await {
                Ok(()) => {
                    let acked: HashSet<Uuid> = batch.iter().map(|e| e.event_id).collect();
                    let mut entry = entry.write().await;
                    // Events ingested while the save was in flight stay
                    // pending for the next tick.
                    entry.pending.retain(|e| !acked.contains(&e.event_id));
                    flushed += batch.len();
                }
                Err(e) => {
                    tracing::error!(
                        user_id = %user_id,
                        batch_size = batch.len(),
                        error = %e,
                        "Event flush failed; batch retained for retry"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        if flushed > 0 {
            tracing::info!(event_count = flushed, "Flushed user events to platform");
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Spawns the background flush loop. Failed batches are retried with
    /// the same contents on every subsequent tick until acknowledged.
    pub fn spawn_flush_loop(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = store.flush().await {
                    tracing::error!(error = %e, "Periodic state flush incomplete");
                }
            }
        })
    }

    /// Returns the entry for `user_id`, performing the cold-start replay
    /// on first reference.
    ///
    /// If replay fails an empty profile is installed so the process keeps
    /// serving; only this first call observes the error.
    async fn entry(&self, user_id: &str) -> AppResult<Arc<RwLock<UserEntry>>> {
        if user_id.is_empty() {
            return Err(AppError::Validation("user_id must be non-empty".into()));
        }

        {
            let users = self.users.read().await;
            if let Some(entry) = users.get(user_id) {
                return Ok(entry.clone());
            }
        }

        // Cold start: replay the durable log before the first read. This is
        // the only remote call on the request path.
        let replayed = self.replay(user_id).await;

        let mut users = self.users.write().await;
        if let Some(entry) = users.get(user_id) {
            // Another caller completed the load while we replayed.
            return Ok(entry.clone());
        }

        match replayed {
            Ok(profile) => {
                let entry = Arc::new(RwLock::new(UserEntry {
                    profile,
                    pending: Vec::new(),
                }));
                users.insert(user_id.to_string(), entry.clone());
                Ok(entry)
            }
            Err(e) => {
                tracing::error!(
                    user_id = %user_id,
                    error = %e,
                    "Event log replay failed; degrading to empty profile"
                );
                let entry = Arc::new(RwLock::new(UserEntry {
                    profile: UserProfile::new(user_id),
                    pending: Vec::new(),
                }));
                users.insert(user_id.to_string(), entry.clone());
                Err(e)
            }
        }
    }

    /// Rebuilds a profile as a pure fold of the user's event log.
    ///
    /// The fold skips any event id it has already applied: the flush path
    /// is at-least-once, so the durable log may contain duplicates of the
    /// same event instance, and identity (not content) decides what counts
    /// once.
    async fn replay(&self, user_id: &str) -> AppResult<UserProfile> {
        let events = self.client.load_user_events(user_id).await?;
        let snapshot = self.catalogue.snapshot();

        let mut profile = UserProfile::new(user_id);
        let mut seen = HashSet::with_capacity(events.len());
        for event in &events {
            event
                .validate()
                .map_err(|e| AppError::Replay(format!("corrupt event in log: {}", e)))?;
            if !seen.insert(event.event_id) {
                continue;
            }
            let story = event.story_id.as_deref().and_then(|id| snapshot.get(id));
            profile.apply(event, story);
        }

        tracing::debug!(
            user_id = %user_id,
            event_count = events.len(),
            "Replayed user event log"
        );
        Ok(profile)
    }
}
