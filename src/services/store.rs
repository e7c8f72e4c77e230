//! Trip & distance store seam

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::warn;

use crate::db;
use crate::defaults::{STORE_RETRY_ATTEMPTS, STORE_RETRY_BASE_MS};
use crate::error::PlanError;
use crate::types::location::{Coordinates, DistanceRow, LocationId};
use crate::types::trip::RawTrip;

/// Read access to trip history and the location/distance reference
/// network. All failures surface as `StoreUnavailable`; callers decide
/// whether to retry.
#[async_trait]
pub trait TripStore: Send + Sync {
    /// Trips whose start date falls in `[from, to)`, ordered by start.
    async fn trips_in_range(&self, from: NaiveDate, to: NaiveDate)
        -> Result<Vec<RawTrip>, PlanError>;

    /// Subset of `candidates` known to the reference network.
    async fn known_locations(
        &self,
        candidates: &HashSet<LocationId>,
    ) -> Result<HashSet<LocationId>, PlanError>;

    /// Distance rows whose endpoints are both inside `locations`.
    async fn distance_rows(
        &self,
        locations: &HashSet<LocationId>,
    ) -> Result<Vec<DistanceRow>, PlanError>;

    /// Coordinates for one location, if the network has them.
    async fn coordinates(&self, location: LocationId) -> Result<Option<Coordinates>, PlanError>;

    fn name(&self) -> &str;
}

/// Retry a store call with bounded exponential backoff. Only transient
/// errors are retried; everything else returns immediately.
pub async fn with_retry<T, F, Fut>(what: &str, mut call: F) -> Result<T, PlanError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PlanError>>,
{
    let mut delay = Duration::from_millis(STORE_RETRY_BASE_MS);
    let mut attempt = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < STORE_RETRY_ATTEMPTS => {
                warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    what, attempt, STORE_RETRY_ATTEMPTS, delay, err
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Postgres-backed store.
pub struct PgTripStore {
    pool: PgPool,
}

impl PgTripStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unavailable(e: anyhow::Error) -> PlanError {
    PlanError::StoreUnavailable(e.to_string())
}

#[async_trait]
impl TripStore for PgTripStore {
    async fn trips_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawTrip>, PlanError> {
        db::queries::trip::trips_in_code_range(&self.pool, from, to).await.map_err(unavailable)
    }

    async fn known_locations(
        &self,
        candidates: &HashSet<LocationId>,
    ) -> Result<HashSet<LocationId>, PlanError> {
        let mut ids: Vec<LocationId> = candidates.iter().copied().collect();
        ids.sort_unstable();
        let known = db::queries::location::known_locations(&self.pool, &ids)
            .await
            .map_err(unavailable)?;
        Ok(known.into_iter().collect())
    }

    async fn distance_rows(
        &self,
        locations: &HashSet<LocationId>,
    ) -> Result<Vec<DistanceRow>, PlanError> {
        let mut ids: Vec<LocationId> = locations.iter().copied().collect();
        ids.sort_unstable();
        db::queries::distance::rows_within(&self.pool, &ids).await.map_err(unavailable)
    }

    async fn coordinates(&self, location: LocationId) -> Result<Option<Coordinates>, PlanError> {
        let record = db::queries::location::coordinates_for(&self.pool, location)
            .await
            .map_err(unavailable)?;
        Ok(record.and_then(|r| r.coordinates()))
    }

    fn name(&self) -> &str {
        "postgres"
    }
}

/// In-memory store for scheduler and pipeline tests. `fail_remaining`
/// makes the next N calls fail with a transient error.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryTripStore {
    pub trips: Vec<RawTrip>,
    pub locations: HashSet<LocationId>,
    pub distances: Vec<DistanceRow>,
    pub coords: std::collections::HashMap<LocationId, Coordinates>,
    pub fail_remaining: std::sync::atomic::AtomicU32,
}

#[cfg(test)]
impl MemoryTripStore {
    fn maybe_fail(&self) -> Result<(), PlanError> {
        use std::sync::atomic::Ordering;
        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(PlanError::StoreUnavailable("simulated outage".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[async_trait]
impl TripStore for MemoryTripStore {
    async fn trips_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawTrip>, PlanError> {
        self.maybe_fail()?;
        let from_code = from.format("%Y%m%d").to_string();
        let to_code = to.format("%Y%m%d").to_string();
        Ok(self
            .trips
            .iter()
            .filter(|t| {
                t.start_date_code
                    .as_deref()
                    .map(|code| code >= from_code.as_str() && code < to_code.as_str())
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn known_locations(
        &self,
        candidates: &HashSet<LocationId>,
    ) -> Result<HashSet<LocationId>, PlanError> {
        self.maybe_fail()?;
        Ok(candidates.intersection(&self.locations).copied().collect())
    }

    async fn distance_rows(
        &self,
        locations: &HashSet<LocationId>,
    ) -> Result<Vec<DistanceRow>, PlanError> {
        self.maybe_fail()?;
        Ok(self
            .distances
            .iter()
            .filter(|row| locations.contains(&row.origin) && locations.contains(&row.destination))
            .cloned()
            .collect())
    }

    async fn coordinates(&self, location: LocationId) -> Result<Option<Coordinates>, PlanError> {
        self.maybe_fail()?;
        Ok(self.coords.get(&location).copied())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
