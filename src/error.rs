//! Planning pipeline error types

use thiserror::Error;

use crate::types::location::LocationId;

/// Everything that can go wrong between fetching a day of trips and
/// applying a solved assignment.
///
/// Record-level defects (`MalformedTime`, `DistanceUnknown`) drop one
/// trip; partition-level defects skip one truck type for one day;
/// `StoreUnavailable` is the only transient, retryable condition.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A trip record with a date/time field that does not parse, or a
    /// required field missing entirely.
    #[error("malformed trip record: {0}")]
    MalformedTime(String),

    /// The distance table has no entry for this location pair.
    #[error("no distance known between locations {a} and {b}")]
    DistanceUnknown { a: LocationId, b: LocationId },

    /// No distance rows at all for the partition's locations, so no
    /// cost function can be built.
    #[error("no distance coverage for truck type {truck_type}")]
    NoDistanceCoverage { truck_type: String },

    /// No usable trips survived filtering for this partition.
    #[error("no usable trips for truck type {truck_type}")]
    EmptyPartition { truck_type: String },

    /// A trip whose delivery day lands before its pickup day.
    #[error("trip {trip_id} delivers before it picks up")]
    IncoherentPair { trip_id: i64 },

    /// The routing engine finished without covering every shipment.
    #[error("routing engine found no complete assignment")]
    EngineNoSolution,

    /// The routing engine spent its whole time budget without covering
    /// every shipment.
    #[error("routing engine hit its time budget")]
    EngineTimeLimit,

    /// The routing engine rejected the model outright.
    #[error("routing engine rejected the model: {0}")]
    EngineInvalidModel(String),

    /// A backing store or external service could not be reached.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl PlanError {
    /// Whether retrying the same call can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlanError::StoreUnavailable(_))
    }
}
