//! OSRM-backed travel matrix maintenance

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::db::queries::{distance, location};
use crate::error::PlanError;
use crate::services::store::with_retry;
use crate::types::location::{Coordinates, LocationId};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub batch_size: usize,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            timeout_seconds: 30,
            batch_size: 200,
        }
    }
}

/// A single measured pair. Travel time is truncated to whole minutes,
/// distance rounded to two decimals, matching the stored rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub minutes: i64,
    pub kilometers: f64,
}

#[derive(Debug, Deserialize)]
struct TableResponse {
    code: String,
    durations: Option<Vec<Vec<Option<f64>>>>,
    distances: Option<Vec<Vec<Option<f64>>>>,
}

pub struct OsrmClient {
    http: reqwest::Client,
    base_url: String,
    batch_size: usize,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build OSRM HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            batch_size: config.batch_size,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn table_url(&self, origin: Coordinates, destinations: &[Coordinates]) -> String {
        let mut coords = format!("{},{}", origin.lng, origin.lat);
        for dest in destinations {
            coords.push_str(&format!(";{},{}", dest.lng, dest.lat));
        }
        format!(
            "{}/table/v1/driving/{}?sources=0&annotations=distance,duration",
            self.base_url, coords
        )
    }

    /// One row of the OSRM table API: `origin` against every destination.
    /// Unreachable pairs come back as `None`.
    pub async fn table(
        &self,
        origin: Coordinates,
        destinations: &[Coordinates],
    ) -> Result<Vec<Option<Measurement>>, PlanError> {
        if destinations.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.table_url(origin, destinations);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PlanError::StoreUnavailable(format!("osrm request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlanError::StoreUnavailable(format!("osrm responded with {status}")));
        }

        let body: TableResponse = response
            .json()
            .await
            .map_err(|e| PlanError::StoreUnavailable(format!("osrm body: {e}")))?;

        measurements_from(body, destinations.len())
    }
}

fn measurements_from(
    response: TableResponse,
    destinations: usize,
) -> Result<Vec<Option<Measurement>>, PlanError> {
    if response.code != "Ok" {
        return Err(PlanError::StoreUnavailable(format!("osrm table error: {}", response.code)));
    }

    let durations = first_row(response.durations, destinations, "durations")?;
    let distances = first_row(response.distances, destinations, "distances")?;

    // Cell 0 is the origin against itself; destination j sits at j + 1.
    let measurements = (0..destinations)
        .map(|j| match (durations[j + 1], distances[j + 1]) {
            (Some(seconds), Some(meters)) if seconds > 0.0 && meters > 0.0 => Some(Measurement {
                minutes: (seconds / 60.0) as i64,
                kilometers: (meters / 1000.0 * 100.0).round() / 100.0,
            }),
            _ => None,
        })
        .collect();

    Ok(measurements)
}

fn first_row(
    matrix: Option<Vec<Vec<Option<f64>>>>,
    destinations: usize,
    what: &str,
) -> Result<Vec<Option<f64>>, PlanError> {
    let mut rows = matrix
        .ok_or_else(|| PlanError::StoreUnavailable(format!("osrm table missing {what}")))?;
    if rows.is_empty() {
        return Err(PlanError::StoreUnavailable(format!("osrm table returned no {what} rows")));
    }

    let row = rows.swap_remove(0);
    if row.len() != destinations + 1 {
        return Err(PlanError::StoreUnavailable(format!(
            "osrm {what} row has {} cells, expected {}",
            row.len(),
            destinations + 1
        )));
    }
    Ok(row)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SyncSummary {
    pub locations: usize,
    pub candidate_pairs: usize,
    pub inserted: usize,
    pub skipped: usize,
}

struct Batch {
    origin: (LocationId, Coordinates),
    destinations: Vec<(LocationId, Coordinates)>,
}

/// Measures every missing pair of routable locations and stores the
/// results. Pairs are canonicalized to (low id, high id) so each one is
/// fetched once; `workers` table calls run concurrently.
pub async fn sync_distances(
    pool: &PgPool,
    client: &OsrmClient,
    workers: usize,
) -> Result<SyncSummary> {
    let records = location::all_locations(pool).await?;
    let routable: Vec<(LocationId, Coordinates)> = records
        .iter()
        .filter_map(|r| r.coordinates().filter(Coordinates::is_routable).map(|c| (r.location_id, c)))
        .collect();
    info!(
        "Syncing distances for {} routable locations ({} stored)",
        routable.len(),
        records.len()
    );

    let existing: HashSet<(LocationId, LocationId)> = distance::existing_pairs(pool)
        .await?
        .into_iter()
        .map(|(a, b)| (a.min(b), a.max(b)))
        .collect();

    let mut batches = Vec::new();
    let mut candidate_pairs = 0usize;
    for (i, &(origin_id, origin)) in routable.iter().enumerate() {
        let missing: Vec<(LocationId, Coordinates)> = routable[i + 1..]
            .iter()
            .filter(|(dest_id, _)| {
                !existing.contains(&(origin_id.min(*dest_id), origin_id.max(*dest_id)))
            })
            .copied()
            .collect();
        candidate_pairs += missing.len();
        for chunk in missing.chunks(client.batch_size().max(1)) {
            batches.push(Batch { origin: (origin_id, origin), destinations: chunk.to_vec() });
        }
    }
    info!("{} missing pairs across {} table calls", candidate_pairs, batches.len());

    let mut results = futures::stream::iter(
        batches.into_iter().map(|batch| sync_batch(pool, client, batch)),
    )
    .buffer_unordered(workers.max(1));

    let mut summary =
        SyncSummary { locations: routable.len(), candidate_pairs, ..SyncSummary::default() };
    while let Some(outcome) = results.next().await {
        let (inserted, skipped) = outcome?;
        summary.inserted += inserted;
        summary.skipped += skipped;
    }
    info!("Distance sync done: {} inserted, {} skipped", summary.inserted, summary.skipped);

    Ok(summary)
}

async fn sync_batch(pool: &PgPool, client: &OsrmClient, batch: Batch) -> Result<(usize, usize)> {
    let (origin_id, origin) = batch.origin;
    let coords: Vec<Coordinates> = batch.destinations.iter().map(|(_, c)| *c).collect();
    let measured = with_retry("osrm table lookup", || client.table(origin, &coords)).await?;

    let mut inserted = 0;
    let mut skipped = 0;
    for ((dest_id, _), measurement) in batch.destinations.iter().zip(measured) {
        match measurement {
            Some(m) if m.minutes > 0 => {
                distance::insert_distance(
                    pool,
                    origin_id.min(*dest_id),
                    origin_id.max(*dest_id),
                    m.minutes,
                    m.kilometers,
                )
                .await?;
                inserted += 1;
            }
            Some(_) => {
                // A stored zero reads back as the unknown sentinel, so
                // sub-minute pairs are not worth keeping.
                debug!("Skipping sub-minute pair {} -> {}", origin_id, dest_id);
                skipped += 1;
            }
            None => {
                debug!("OSRM has no route {} -> {}", origin_id, dest_id);
                skipped += 1;
            }
        }
    }
    Ok((inserted, skipped))
}
