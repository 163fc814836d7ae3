use async_trait::async_trait;

use crate::{
    error::StoreError,
    models::trip::{NewTrip, Trip, TripPatch},
};

/// Remote persistence for the `trips` collection.
///
/// The store owns identifiers, timestamps and ordering. Every failure is an
/// undifferentiated [`StoreError`].
#[async_trait]
pub trait TripStore: Send + Sync {
    /// All trips, newest `created_at` first.
    async fn select_all(&self) -> Result<Vec<Trip>, StoreError>;

    async fn insert(&self, trip: &NewTrip) -> Result<Trip, StoreError>;

    /// Fails when no trip with `id` exists.
    async fn update(&self, id: &str, patch: &TripPatch) -> Result<Trip, StoreError>;

    /// Fails when no trip with `id` exists.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

pub(crate) fn not_found(id: &str) -> StoreError {
    StoreError::new(format!("no trip with id {id}"))
}
