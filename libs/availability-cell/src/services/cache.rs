// libs/availability-cell/src/services/cache.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use shared_models::notification::{Notification, Notifier};

use crate::models::{Availability, AvailabilityError};
use crate::services::availability::AvailabilityRepository;
use crate::services::calendar::CalendarGate;
use crate::services::normalizer::{normalize, NormalizedSlots};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load availability";

/// Raw slots for one professional together with their normalized view.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilitySnapshot {
    pub professional_id: String,
    pub slots: Vec<Availability>,
    pub normalized: NormalizedSlots,
    /// Set when the fetch failed and this is the empty fallback.
    pub failed: bool,
}

impl AvailabilitySnapshot {
    fn fetched(professional_id: &str, slots: Vec<Availability>) -> Self {
        let normalized = normalize(&slots);
        Self {
            professional_id: professional_id.to_string(),
            slots,
            normalized,
            failed: false,
        }
    }

    fn failed(professional_id: &str) -> Self {
        Self {
            professional_id: professional_id.to_string(),
            slots: Vec::new(),
            normalized: NormalizedSlots::default(),
            failed: true,
        }
    }

    pub fn gate(&self, today: NaiveDate) -> CalendarGate<'_> {
        CalendarGate::new(&self.normalized, today)
    }

    pub fn find(&self, availability_id: &str) -> Option<&Availability> {
        self.normalized.find(availability_id)
    }
}

struct CachedSnapshot {
    snapshot: Arc<AvailabilitySnapshot>,
    fetched_at: Instant,
}

#[derive(Default)]
struct KeyState {
    // Bumped on every invalidation; a fetch started under an older
    // generation is returned to its caller but never stored.
    generation: u64,
    cached: Option<CachedSnapshot>,
}

/// Availability keyed by professional id.
pub struct AvailabilityCache {
    repository: Arc<dyn AvailabilityRepository>,
    notifier: Arc<dyn Notifier>,
    stale_after: Duration,
    keys: RwLock<HashMap<String, KeyState>>,
}

impl AvailabilityCache {
    pub fn new(
        repository: Arc<dyn AvailabilityRepository>,
        notifier: Arc<dyn Notifier>,
        stale_after: Duration,
    ) -> Self {
        Self {
            repository,
            notifier,
            stale_after,
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Loads the snapshot for `professional_id`. A failed fetch raises one
    /// error notification and yields an empty, uncached snapshot.
    pub async fn load(&self, professional_id: &str, auth_token: &str) -> Arc<AvailabilitySnapshot> {
        match self.try_load(professional_id, auth_token).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Failed to load availability for {}: {}", professional_id, e);
                self.notifier.notify(Notification::error(LOAD_FAILED_MESSAGE));
                Arc::new(AvailabilitySnapshot::failed(professional_id))
            }
        }
    }

    pub async fn try_load(
        &self,
        professional_id: &str,
        auth_token: &str,
    ) -> Result<Arc<AvailabilitySnapshot>, AvailabilityError> {
        let (generation, previous) = {
            let keys = self.keys.read().await;
            match keys.get(professional_id) {
                Some(state) => {
                    if let Some(cached) = &state.cached {
                        if cached.fetched_at.elapsed() < self.stale_after {
                            debug!("Availability cache hit for {}", professional_id);
                            return Ok(Arc::clone(&cached.snapshot));
                        }
                    }
                    (state.generation, state.cached.as_ref().map(|c| Arc::clone(&c.snapshot)))
                }
                None => (0, None),
            }
        };

        let slots = self.repository
            .list_for_professional(professional_id, auth_token)
            .await?;

        let snapshot = match previous {
            // Unchanged raw list: keep the previous normalized view.
            Some(previous) if previous.slots == slots => previous,
            _ => Arc::new(AvailabilitySnapshot::fetched(professional_id, slots)),
        };

        let mut keys = self.keys.write().await;
        let state = keys.entry(professional_id.to_string()).or_default();
        if state.generation == generation {
            state.cached = Some(CachedSnapshot {
                snapshot: Arc::clone(&snapshot),
                fetched_at: Instant::now(),
            });
        } else {
            debug!("Discarding availability fetched before invalidation of {}", professional_id);
        }

        Ok(snapshot)
    }

    pub async fn invalidate(&self, professional_id: &str) {
        let mut keys = self.keys.write().await;
        let state = keys.entry(professional_id.to_string()).or_default();
        state.generation += 1;
        state.cached = None;
        info!("Invalidated availability for {}", professional_id);
    }

    /// Cached snapshot regardless of age, without fetching.
    pub async fn peek(&self, professional_id: &str) -> Option<Arc<AvailabilitySnapshot>> {
        let keys = self.keys.read().await;
        keys.get(professional_id)
            .and_then(|state| state.cached.as_ref())
            .map(|cached| Arc::clone(&cached.snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use shared_backend::BackendError;
    use shared_models::notification::NotificationLevel;
    use shared_utils::test_utils::RecordingNotifier;
    use tokio::sync::Notify;

    use crate::models::{CreateAvailabilityRequest, UpdateAvailabilityRequest};
    use crate::services::availability::MockAvailabilityRepository;

    fn open_slot(id: &str) -> Availability {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        Availability {
            id: id.to_string(),
            professional_id: "p-1".to_string(),
            available_date: start.date_naive(),
            start_time: start,
            end_time: start + chrono::Duration::minutes(30),
            is_booked: false,
            created_at: None,
            updated_at: None,
        }
    }

    fn cache_with(repository: MockAvailabilityRepository, notifier: &RecordingNotifier) -> AvailabilityCache {
        AvailabilityCache::new(
            Arc::new(repository),
            Arc::new(notifier.clone()),
            Duration::from_secs(300),
        )
    }

    #[tokio::test]
    async fn fresh_entry_is_served_from_cache() {
        let mut repository = MockAvailabilityRepository::new();
        repository
            .expect_list_for_professional()
            .times(1)
            .returning(|_, _| Ok(vec![open_slot("s-1")]));
        let notifier = RecordingNotifier::new();
        let cache = cache_with(repository, &notifier);

        let first = cache.load("p-1", "token").await;
        let second = cache.load("p-1", "token").await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.normalized.open_dates().len(), 1);
        assert!(notifier.all().is_empty());
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let mut repository = MockAvailabilityRepository::new();
        repository
            .expect_list_for_professional()
            .times(2)
            .returning(|_, _| Ok(vec![open_slot("s-1")]));
        let notifier = RecordingNotifier::new();
        let cache = cache_with(repository, &notifier);

        let first = cache.load("p-1", "token").await;
        cache.invalidate("p-1").await;
        assert!(cache.peek("p-1").await.is_none());

        // The entry is gone, so there is no previous view to reuse.
        let second = cache.load("p-1", "token").await;
        assert_eq!(first.as_ref(), second.as_ref());
    }

    #[tokio::test]
    async fn stale_entry_with_same_slots_keeps_normalized_view() {
        let mut repository = MockAvailabilityRepository::new();
        repository
            .expect_list_for_professional()
            .times(2)
            .returning(|_, _| Ok(vec![open_slot("s-1")]));
        let notifier = RecordingNotifier::new();
        let cache = AvailabilityCache::new(
            Arc::new(repository),
            Arc::new(notifier.clone()),
            Duration::ZERO,
        );

        let first = cache.load("p-1", "token").await;
        let second = cache.load("p-1", "token").await;

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn stale_entry_with_changed_slots_recomputes_open_dates() {
        let mut sequence = mockall::Sequence::new();
        let mut repository = MockAvailabilityRepository::new();
        repository
            .expect_list_for_professional()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _| Ok(vec![open_slot("s-1")]));
        repository
            .expect_list_for_professional()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _| {
                let mut booked = open_slot("s-1");
                booked.is_booked = true;
                Ok(vec![booked])
            });
        let cache = AvailabilityCache::new(
            Arc::new(repository),
            Arc::new(RecordingNotifier::new()),
            Duration::ZERO,
        );

        let first = cache.load("p-1", "token").await;
        assert_eq!(first.normalized.open_dates().len(), 1);

        let second = cache.load("p-1", "token").await;
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.normalized.open_dates().is_empty());
        assert!(second.slots[0].is_booked);
        assert!(Arc::ptr_eq(&second, &cache.peek("p-1").await.unwrap()));
    }

    #[tokio::test]
    async fn failure_notifies_once_and_is_not_cached() {
        let mut repository = MockAvailabilityRepository::new();
        repository
            .expect_list_for_professional()
            .times(2)
            .returning(|_, _| {
                Err(AvailabilityError::Backend(BackendError::Status {
                    status: 500,
                    message: "boom".to_string(),
                }))
            });
        let notifier = RecordingNotifier::new();
        let cache = cache_with(repository, &notifier);

        let snapshot = cache.load("p-1", "token").await;
        assert!(snapshot.failed);
        assert!(snapshot.slots.is_empty());
        assert_eq!(notifier.count(NotificationLevel::Error), 1);
        assert_eq!(notifier.all()[0].description, LOAD_FAILED_MESSAGE);
        assert!(cache.peek("p-1").await.is_none());

        cache.load("p-1", "token").await;
        assert_eq!(notifier.count(NotificationLevel::Error), 2);
    }

    #[tokio::test]
    async fn try_load_surfaces_the_error_without_notifying() {
        let mut repository = MockAvailabilityRepository::new();
        repository
            .expect_list_for_professional()
            .returning(|_, _| Err(AvailabilityError::NotFound("p-1".to_string())));
        let notifier = RecordingNotifier::new();
        let cache = cache_with(repository, &notifier);

        assert!(cache.try_load("p-1", "token").await.is_err());
        assert!(notifier.all().is_empty());
    }

    /// Holds every list call until released.
    struct HeldRepository {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl AvailabilityRepository for HeldRepository {
        async fn list_for_professional(&self, _: &str, _: &str) -> Result<Vec<Availability>, AvailabilityError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(vec![open_slot("s-1")])
        }

        async fn get(&self, id: &str, _: &str) -> Result<Availability, AvailabilityError> {
            Err(AvailabilityError::NotFound(id.to_string()))
        }

        async fn create(&self, _: CreateAvailabilityRequest, _: &str) -> Result<Availability, AvailabilityError> {
            Err(AvailabilityError::InvalidTimeRange)
        }

        async fn update(&self, id: &str, _: UpdateAvailabilityRequest, _: &str) -> Result<Availability, AvailabilityError> {
            Err(AvailabilityError::NotFound(id.to_string()))
        }

        async fn delete(&self, id: &str, _: &str) -> Result<(), AvailabilityError> {
            Err(AvailabilityError::NotFound(id.to_string()))
        }
    }

    #[tokio::test]
    async fn fetch_finishing_after_invalidation_is_not_stored() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let cache = Arc::new(AvailabilityCache::new(
            Arc::new(HeldRepository {
                started: Arc::clone(&started),
                release: Arc::clone(&release),
            }),
            Arc::new(RecordingNotifier::new()),
            Duration::from_secs(300),
        ));

        let in_flight = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.load("p-1", "token").await })
        };
        started.notified().await;

        cache.invalidate("p-1").await;
        release.notify_one();

        let snapshot = in_flight.await.unwrap();
        assert_eq!(snapshot.slots.len(), 1);
        assert!(cache.peek("p-1").await.is_none());
    }
}
