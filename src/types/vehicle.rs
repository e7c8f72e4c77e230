//! Per-vehicle rolling state

use chrono::NaiveDateTime;

use crate::types::location::LocationId;

/// Where a vehicle will next be free, carried across day boundaries.
///
/// `initial` marks a vehicle still at its very first location, seeded
/// from its first pickup rather than read back from a snapshot. Such a
/// vehicle may begin before the working day opens; a vehicle continuing
/// from a previous solve may not.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    pub vehicle_id: String,
    pub location: LocationId,
    pub free_at: NaiveDateTime,
    pub initial: bool,
}

impl VehicleState {
    /// State read back from a durable snapshot.
    pub fn continuing(vehicle_id: String, location: LocationId, free_at: NaiveDateTime) -> Self {
        Self { vehicle_id, location, free_at, initial: false }
    }

    /// State synthesized for a vehicle never seen before.
    pub fn fresh(vehicle_id: String, location: LocationId, free_at: NaiveDateTime) -> Self {
        Self { vehicle_id, location, free_at, initial: true }
    }
}
