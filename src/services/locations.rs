//! Known-location filtering and window validation

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::types::location::LocationId;
use crate::types::trip::{ParsedTrip, ValidatedTrip};
use crate::types::vehicle::VehicleState;
use crate::types::window::PlanningWindow;

/// Every location a partition batch can touch: trip endpoints plus the
/// locations vehicles are currently free at. Including the latter keeps
/// continuity locations from being spuriously excluded.
pub fn candidate_locations(
    trips: &[ParsedTrip],
    states: &BTreeMap<String, VehicleState>,
) -> HashSet<LocationId> {
    let mut candidates = HashSet::new();
    for trip in trips {
        candidates.insert(trip.origin);
        candidates.insert(trip.destination);
    }
    for state in states.values() {
        candidates.insert(state.location);
    }
    candidates
}

/// Keep trips that start inside the analysis window and reference only
/// known locations, resolve their minute and day offsets, and order
/// them by start time.
pub fn validate_trips(
    trips: Vec<ParsedTrip>,
    known: &HashSet<LocationId>,
    window: &PlanningWindow,
) -> Vec<ValidatedTrip> {
    let before = trips.len();
    let mut validated: Vec<ValidatedTrip> = trips
        .into_iter()
        .filter(|trip| {
            if !window.contains(trip.start) {
                return false;
            }
            if !known.contains(&trip.origin) || !known.contains(&trip.destination) {
                debug!("Trip {} references an unknown location, dropping", trip.trip_id);
                return false;
            }
            true
        })
        .map(|trip| ValidatedTrip {
            trip_id: trip.trip_id,
            origin: trip.origin,
            destination: trip.destination,
            start_minutes: window.minutes_from_start(trip.start),
            end_minutes: window.minutes_from_start(trip.end),
            start_day_offset: window.day_offset(trip.start),
            end_day_offset: window.day_offset(trip.end),
            vehicle_id: trip.vehicle_id,
            truck_type: trip.truck_type,
        })
        .collect();

    validated.sort_by_key(|t| (t.start_minutes, t.trip_id));
    if validated.len() < before {
        debug!("Window and location checks kept {} of {} trips", validated.len(), before);
    }
    validated
}
