//! Symmetric travel time / distance lookups

use std::collections::HashMap;

use crate::defaults::{PlanningPolicy, UNKNOWN_DISTANCE_SENTINEL};
use crate::error::PlanError;
use crate::types::location::{DistanceRow, LocationId};

/// Expected travel between two locations, already calibrated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance {
    pub minutes: f64,
    pub kilometers: f64,
}

impl Distance {
    /// Minutes truncated to a whole number, as arc costs use them.
    pub fn whole_minutes(&self) -> i64 {
        self.minutes as i64
    }
}

/// Lookup table over unordered location pairs for one partition.
///
/// Stored travel times of zero are remapped to the large sentinel before
/// calibration, so "no real measurement" pairs are maximally disfavored
/// instead of free. Nonzero times are multiplied by the policy's
/// calibration factor. Kilometers pass through unchanged.
#[derive(Debug)]
pub struct DistanceOracle {
    pairs: HashMap<(LocationId, LocationId), Distance>,
}

fn canonical(a: LocationId, b: LocationId) -> (LocationId, LocationId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl DistanceOracle {
    pub fn from_rows(rows: &[DistanceRow], policy: &PlanningPolicy) -> Self {
        let mut pairs = HashMap::with_capacity(rows.len());
        for row in rows {
            let minutes = if row.travel_time == 0 {
                UNKNOWN_DISTANCE_SENTINEL as f64
            } else {
                row.travel_time as f64 * policy.travel_time_factor
            };
            pairs.insert(
                canonical(row.origin, row.destination),
                Distance { minutes, kilometers: row.kilometers },
            );
        }
        Self { pairs }
    }

    pub fn lookup(&self, a: LocationId, b: LocationId) -> Result<Distance, PlanError> {
        self.pairs
            .get(&canonical(a, b))
            .copied()
            .ok_or(PlanError::DistanceUnknown { a, b })
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}
