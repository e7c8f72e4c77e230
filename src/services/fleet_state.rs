//! Durable vehicle state snapshots, one file per truck type

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PlanError;
use crate::types::leg::timestamp;
use crate::types::location::LocationId;
use crate::types::vehicle::VehicleState;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRow {
    vehicle_id: String,
    #[serde(with = "timestamp")]
    free_time: NaiveDateTime,
    location: LocationId,
}

/// Per-truck-type persistence of "where will each vehicle next be
/// free". One CSV snapshot per partition in a state directory, so a
/// sequential day loop can be stopped and resumed without losing
/// continuity. Partitions are guarded by their own lock; parallel
/// partition tasks never contend with each other.
pub struct FleetStateStore {
    dir: PathBuf,
    partitions: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FleetStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), partitions: Mutex::new(HashMap::new()) }
    }

    /// Current states for one partition. A partition never written
    /// yields an empty map; every vehicle then starts fresh.
    pub fn get(&self, truck_type: &str) -> Result<BTreeMap<String, VehicleState>, PlanError> {
        let lock = self.partition_lock(truck_type);
        let _guard = lock.lock();
        read_snapshot(&self.snapshot_path(truck_type))
            .map_err(|e| PlanError::StoreUnavailable(format!("fleet state read: {e:#}")))
    }

    /// Record a vehicle's new free location and time, replacing any
    /// previous entry for it.
    pub fn put(
        &self,
        truck_type: &str,
        vehicle_id: &str,
        location: LocationId,
        free_at: NaiveDateTime,
    ) -> Result<(), PlanError> {
        let lock = self.partition_lock(truck_type);
        let _guard = lock.lock();
        self.put_locked(truck_type, vehicle_id, location, free_at)
            .map_err(|e| PlanError::StoreUnavailable(format!("fleet state write: {e:#}")))
    }

    fn put_locked(
        &self,
        truck_type: &str,
        vehicle_id: &str,
        location: LocationId,
        free_at: NaiveDateTime,
    ) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating state directory {}", self.dir.display()))?;

        let path = self.snapshot_path(truck_type);
        let mut states = read_snapshot(&path)?;
        states.insert(
            vehicle_id.to_string(),
            VehicleState::continuing(vehicle_id.to_string(), location, free_at),
        );

        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        for state in states.values() {
            writer.serialize(SnapshotRow {
                vehicle_id: state.vehicle_id.clone(),
                free_time: state.free_at,
                location: state.location,
            })?;
        }
        writer.flush()?;
        Ok(())
    }

    fn partition_lock(&self, truck_type: &str) -> Arc<Mutex<()>> {
        let mut partitions = self.partitions.lock();
        partitions
            .entry(truck_type.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn snapshot_path(&self, truck_type: &str) -> PathBuf {
        let sanitized: String = truck_type
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!("fleet_state_{sanitized}.csv"))
    }
}

fn read_snapshot(path: &Path) -> Result<BTreeMap<String, VehicleState>> {
    let mut states = BTreeMap::new();
    if !path.exists() {
        return Ok(states);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    for row in reader.deserialize::<SnapshotRow>() {
        match row {
            Ok(row) => {
                states.insert(
                    row.vehicle_id.clone(),
                    VehicleState::continuing(row.vehicle_id, row.location, row.free_time),
                );
            }
            Err(e) => warn!("Skipping malformed fleet state row in {}: {}", path.display(), e),
        }
    }
    Ok(states)
}
