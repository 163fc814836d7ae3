use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::{
    error::StoreError,
    models::trip::{NewTrip, Trip, TripPatch},
    services::store::TripStore,
};

#[derive(Debug, Default)]
struct Mirror {
    trips: Vec<Trip>,
    is_loading: bool,
    error: Option<String>,
}

/// Point-in-time copy of the mirror for rendering.
#[derive(Debug, Clone, Default)]
pub struct TripListSnapshot {
    pub trips: Vec<Trip>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Owns the in-memory mirror of the trip collection and keeps it in step with
/// the store. Clones share the same mirror.
///
/// The lock is never held across a store call; the mirror is only written from
/// the completion of this repository's own operations.
#[derive(Clone)]
pub struct TripRepository {
    store: Arc<dyn TripStore>,
    mirror: Arc<RwLock<Mirror>>,
}

impl TripRepository {
    /// Empty mirror, nothing fetched yet.
    pub fn new(store: Arc<dyn TripStore>) -> Self {
        Self {
            store,
            mirror: Arc::new(RwLock::new(Mirror::default())),
        }
    }

    /// Builds the repository and performs its one initial fetch. A failed
    /// fetch is recorded on the repository rather than returned.
    pub async fn load(store: Arc<dyn TripStore>) -> Self {
        let repo = Self::new(store);
        if let Err(err) = repo.fetch_all().await {
            warn!("initial trip fetch failed: {err}");
        }
        repo
    }

    pub async fn fetch_all(&self) -> Result<Vec<Trip>, StoreError> {
        {
            let mut mirror = self.write();
            mirror.is_loading = true;
            mirror.error = None;
        }

        let result = self.store.select_all().await;

        let mut mirror = self.write();
        mirror.is_loading = false;
        match result {
            Ok(trips) => {
                debug!(count = trips.len(), "refreshed trip mirror");
                mirror.trips = trips.clone();
                Ok(trips)
            }
            Err(err) => {
                warn!("fetching trips failed: {err}");
                mirror.error = Some(err.message.clone());
                Err(err)
            }
        }
    }

    pub async fn create(&self, fields: NewTrip) -> Result<Trip, StoreError> {
        let result = self.store.insert(&fields).await;

        let mut mirror = self.write();
        match result {
            Ok(trip) => {
                info!(id = %trip.id, "created trip");
                mirror.trips.insert(0, trip.clone());
                Ok(trip)
            }
            Err(err) => Err(Self::record(&mut mirror, "create", err)),
        }
    }

    /// Replaces the mirrored entry in place; order is never re-sorted.
    pub async fn update(&self, id: &str, patch: TripPatch) -> Result<Trip, StoreError> {
        let result = self.store.update(id, &patch).await;

        let mut mirror = self.write();
        match result {
            Ok(trip) => {
                info!(id, "updated trip");
                if let Some(slot) = mirror.trips.iter_mut().find(|t| t.id == id) {
                    *slot = trip.clone();
                }
                Ok(trip)
            }
            Err(err) => Err(Self::record(&mut mirror, "update", err)),
        }
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = self.store.delete(id).await;

        let mut mirror = self.write();
        match result {
            Ok(()) => {
                info!(id, "deleted trip");
                mirror.trips.retain(|t| t.id != id);
                Ok(())
            }
            Err(err) => Err(Self::record(&mut mirror, "delete", err)),
        }
    }

    pub fn trips(&self) -> Vec<Trip> {
        self.read().trips.clone()
    }

    pub fn find(&self, id: &str) -> Option<Trip> {
        self.read().trips.iter().find(|t| t.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().trips.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.read().is_loading
    }

    /// Message of the most recent failure; cleared when a fetch starts.
    pub fn last_error(&self) -> Option<String> {
        self.read().error.clone()
    }

    pub fn snapshot(&self) -> TripListSnapshot {
        let mirror = self.read();
        TripListSnapshot {
            trips: mirror.trips.clone(),
            is_loading: mirror.is_loading,
            error: mirror.error.clone(),
        }
    }

    fn record(mirror: &mut Mirror, op: &str, err: StoreError) -> StoreError {
        warn!("trip {op} failed: {err}");
        mirror.error = Some(err.message.clone());
        err
    }

    fn read(&self) -> RwLockReadGuard<'_, Mirror> {
        self.mirror.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Mirror> {
        self.mirror.write().unwrap_or_else(PoisonError::into_inner)
    }
}
