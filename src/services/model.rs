//! Routing model construction for one truck type and one day

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tracing::warn;

use crate::defaults::{PlanningPolicy, OPEN_END_MINUTE};
use crate::error::PlanError;
use crate::services::distance::DistanceOracle;
use crate::types::location::LocationId;
use crate::types::trip::ValidatedTrip;
use crate::types::vehicle::VehicleState;
use crate::types::window::PlanningWindow;

/// Node index of the inert depot placeholder.
pub const DEPOT_NODE: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Depot,
    Pickup,
    Delivery,
    Start,
}

/// One stop in the model graph.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingNode {
    pub id: usize,
    pub location: LocationId,
    pub kind: NodeKind,
    /// Minute the source data says this stop happened at; kept for
    /// reporting, the engine only sees the windows.
    pub target_minute: i64,
    /// Inclusive earliest/latest serviceable minute.
    pub window: (i64, i64),
    pub day_offset: i64,
    /// Off-hours gaps inside `window` during which arrival is
    /// disallowed outright.
    pub blocked: Vec<(i64, i64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickupDeliveryPair {
    pub pickup: usize,
    pub delivery: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleStart {
    pub node: usize,
    pub vehicle_id: String,
}

/// Complete instance handed to the routing engine. Built fresh per
/// (day, truck type), never shared across partitions.
#[derive(Debug)]
pub struct RoutingModel {
    pub truck_type: String,
    pub nodes: Vec<RoutingNode>,
    pub pairs: Vec<PickupDeliveryPair>,
    pub starts: Vec<VehicleStart>,
    pub demands: Vec<i32>,
    oracle: Arc<DistanceOracle>,
}

impl RoutingModel {
    pub fn oracle(&self) -> &DistanceOracle {
        &self.oracle
    }

    /// Arc cost in whole minutes. Zero to/from the depot, between a
    /// node and itself, and between co-located nodes. `None` when a
    /// node index is unknown or the oracle has no entry for the pair.
    pub fn arc_minutes(&self, from: usize, to: usize) -> Option<i64> {
        if from == to || from == DEPOT_NODE || to == DEPOT_NODE {
            return Some(0);
        }
        let origin = self.nodes.get(from)?;
        let destination = self.nodes.get(to)?;
        if origin.location == destination.location {
            return Some(0);
        }
        self.oracle
            .lookup(origin.location, destination.location)
            .ok()
            .map(|d| d.whole_minutes())
    }

    /// Modeled kilometers for an arc, under the same conventions as
    /// [`Self::arc_minutes`].
    pub fn arc_kilometers(&self, from: usize, to: usize) -> Option<f64> {
        if from == to || from == DEPOT_NODE || to == DEPOT_NODE {
            return Some(0.0);
        }
        let origin = self.nodes.get(from)?;
        let destination = self.nodes.get(to)?;
        if origin.location == destination.location {
            return Some(0.0);
        }
        self.oracle
            .lookup(origin.location, destination.location)
            .ok()
            .map(|d| d.kilometers)
    }

    /// Locations referenced by real nodes, ascending, depot excluded.
    pub fn distinct_locations(&self) -> Vec<LocationId> {
        let set: BTreeSet<LocationId> = self
            .nodes
            .iter()
            .filter(|n| n.kind != NodeKind::Depot)
            .map(|n| n.location)
            .collect();
        set.into_iter().collect()
    }

    pub fn start_node_of(&self, vehicle_id: &str) -> Option<usize> {
        self.starts.iter().find(|s| s.vehicle_id == vehicle_id).map(|s| s.node)
    }
}

/// Turns an ordered batch of accepted trips plus the partition's fleet
/// state into a [`RoutingModel`].
pub struct ModelBuilder<'a> {
    policy: &'a PlanningPolicy,
    oracle: Arc<DistanceOracle>,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(policy: &'a PlanningPolicy, oracle: Arc<DistanceOracle>) -> Self {
        Self { policy, oracle }
    }

    /// Build the model for one partition. `trips` must be ordered by
    /// start minute; `states` holds the partition's current vehicle
    /// states keyed by vehicle id.
    pub fn build(
        &self,
        truck_type: &str,
        trips: &[ValidatedTrip],
        states: &BTreeMap<String, VehicleState>,
        window: &PlanningWindow,
    ) -> Result<RoutingModel, PlanError> {
        if self.oracle.is_empty() {
            return Err(PlanError::NoDistanceCoverage { truck_type: truck_type.to_string() });
        }

        let mut nodes = vec![RoutingNode {
            id: DEPOT_NODE,
            location: 0,
            kind: NodeKind::Depot,
            target_minute: 0,
            window: (0, OPEN_END_MINUTE),
            day_offset: 0,
            blocked: Vec::new(),
        }];
        let mut pairs = Vec::new();
        let mut demands = vec![0i32];

        // Vehicles in first-appearance order, with each one's earliest
        // pickup kept for fallback seeding.
        let mut vehicle_order: Vec<&str> = Vec::new();
        let mut first_trip: HashMap<&str, &ValidatedTrip> = HashMap::new();
        for trip in trips {
            if let Some(vehicle) = trip.vehicle_id.as_deref() {
                match first_trip.get(vehicle) {
                    None => {
                        vehicle_order.push(vehicle);
                        first_trip.insert(vehicle, trip);
                    }
                    Some(earliest) if trip.start_minutes < earliest.start_minutes => {
                        first_trip.insert(vehicle, trip);
                    }
                    Some(_) => {}
                }
            }
        }

        for trip in trips {
            let d = trip.start_day_offset;
            if trip.end_day_offset < d {
                let err = PlanError::IncoherentPair { trip_id: trip.trip_id };
                warn!("{}, dropping it", err);
                continue;
            }
            let expected = match self.oracle.lookup(trip.origin, trip.destination) {
                Ok(distance) => distance,
                Err(err) => {
                    warn!("{}, dropping trip {}", err, trip.trip_id);
                    continue;
                }
            };

            let s = trip.start_minutes;
            let pickup_id = nodes.len();
            nodes.push(RoutingNode {
                id: pickup_id,
                location: trip.origin,
                kind: NodeKind::Pickup,
                target_minute: s,
                window: (self.policy.day_open(d).min(s), self.policy.day_close(d).max(s)),
                day_offset: d,
                blocked: Vec::new(),
            });

            let inflation = self.policy.delivery_inflation_days(expected.minutes);
            let blocked: Vec<(i64, i64)> = (0..inflation)
                .map(|a| (self.policy.day_close(d + a) + 1, self.policy.day_open(d + a + 1) - 1))
                .collect();
            let delivery_id = nodes.len();
            nodes.push(RoutingNode {
                id: delivery_id,
                location: trip.destination,
                kind: NodeKind::Delivery,
                target_minute: trip.end_minutes,
                window: (self.policy.day_open(d), self.policy.day_close(d + inflation)),
                day_offset: trip.end_day_offset,
                blocked,
            });

            pairs.push(PickupDeliveryPair { pickup: pickup_id, delivery: delivery_id });
            demands.push(1);
            demands.push(-1);
        }

        if pairs.is_empty() {
            return Err(PlanError::EmptyPartition { truck_type: truck_type.to_string() });
        }

        let mut starts = Vec::new();
        for vehicle in vehicle_order {
            let state = match (states.get(vehicle), first_trip.get(vehicle)) {
                (Some(state), _) => state.clone(),
                // Never seen before: the vehicle materializes at its
                // first pickup of the batch.
                (None, Some(trip)) => VehicleState::fresh(
                    vehicle.to_string(),
                    trip.origin,
                    window.instant_at(trip.start_minutes),
                ),
                (None, None) => continue,
            };
            let node_id = nodes.len();
            nodes.push(self.start_node(node_id, &state, window));
            demands.push(0);
            starts.push(VehicleStart { node: node_id, vehicle_id: vehicle.to_string() });
        }

        Ok(RoutingModel {
            truck_type: truck_type.to_string(),
            nodes,
            pairs,
            starts,
            demands,
            oracle: Arc::clone(&self.oracle),
        })
    }

    fn start_node(&self, id: usize, state: &VehicleState, window: &PlanningWindow) -> RoutingNode {
        let free_minute = if state.free_at <= window.start() {
            0
        } else {
            window.minutes_from_start(state.free_at)
        };
        let day = window.day_offset(state.free_at);
        let open = self.policy.day_open(day);
        // A continuing vehicle cannot leave before both its free time
        // and the working day allow; a fresh one may leave as soon as
        // either does.
        let lower = if state.initial { open.min(free_minute) } else { open.max(free_minute) };
        RoutingNode {
            id,
            location: state.location,
            kind: NodeKind::Start,
            target_minute: free_minute,
            window: (lower, OPEN_END_MINUTE),
            day_offset: day,
            blocked: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::types::location::DistanceRow;

    fn window() -> PlanningWindow {
        PlanningWindow::from_dates(
            NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 3, 8).unwrap(),
        )
        .unwrap()
    }

    fn oracle() -> Arc<DistanceOracle> {
        let rows = vec![
            DistanceRow { origin: 10, destination: 20, travel_time: 100, kilometers: 80.0 },
            DistanceRow { origin: 20, destination: 30, travel_time: 50, kilometers: 40.0 },
            DistanceRow { origin: 10, destination: 30, travel_time: 1000, kilometers: 700.0 },
        ];
        Arc::new(DistanceOracle::from_rows(&rows, &PlanningPolicy::default()))
    }

    fn trip(
        trip_id: i64,
        vehicle: &str,
        origin: i64,
        destination: i64,
        start_minutes: i64,
        end_minutes: i64,
    ) -> ValidatedTrip {
        ValidatedTrip {
            trip_id,
            origin,
            destination,
            start_minutes,
            end_minutes,
            start_day_offset: start_minutes.div_euclid(1440),
            end_day_offset: end_minutes.div_euclid(1440),
            vehicle_id: Some(vehicle.into()),
            truck_type: "T1".into(),
        }
    }

    fn build(
        trips: &[ValidatedTrip],
        states: &BTreeMap<String, VehicleState>,
    ) -> Result<RoutingModel, PlanError> {
        let policy = PlanningPolicy::default();
        ModelBuilder::new(&policy, oracle()).build("T1", trips, states, &window())
    }

    #[test]
    fn test_two_nodes_per_trip_plus_depot_and_starts() {
        let trips = vec![
            trip(1, "A", 10, 20, 450, 610),
            trip(2, "B", 20, 30, 1890, 1970),
        ];
        let model = build(&trips, &BTreeMap::new()).unwrap();

        assert_eq!(model.nodes.len(), 7);
        assert_eq!(model.pairs.len(), 2);
        assert_eq!(model.starts.len(), 2);
        assert_eq!(model.demands.len(), model.nodes.len());
        assert_eq!(model.demands.iter().sum::<i32>(), 0);
        for pair in &model.pairs {
            assert_eq!(model.demands[pair.pickup] + model.demands[pair.delivery], 0);
            assert_eq!(model.nodes[pair.pickup].kind, NodeKind::Pickup);
            assert_eq!(model.nodes[pair.delivery].kind, NodeKind::Delivery);
            assert_eq!(pair.delivery, pair.pickup + 1);
        }
        assert_eq!(model.nodes[DEPOT_NODE].kind, NodeKind::Depot);
    }

    #[test]
    fn test_pickup_window_stretches_to_target() {
        let trips = vec![trip(1, "A", 10, 20, 300, 460)];
        let model = build(&trips, &BTreeMap::new()).unwrap();
        let pickup = &model.nodes[model.pairs[0].pickup];
        // Start before the working day opens widens the lower bound.
        assert_eq!(pickup.window, (300, 1080));
        assert_eq!(pickup.target_minute, 300);
    }

    #[test]
    fn test_delivery_window_inflation_and_blocked_gaps() {
        // Expected 160 minutes -> 4 inflation days.
        let trips = vec![trip(1, "A", 10, 20, 450, 610)];
        let model = build(&trips, &BTreeMap::new()).unwrap();
        let delivery = &model.nodes[model.pairs[0].delivery];

        assert_eq!(delivery.window, (420, 1080 + 4 * 1440));
        assert_eq!(delivery.blocked.len(), 4);
        for (a, &(lo, hi)) in delivery.blocked.iter().enumerate() {
            let a = a as i64;
            assert_eq!(lo, 1080 + a * 1440 + 1);
            assert_eq!(hi, 420 + (a + 1) * 1440 - 1);
        }
    }

    #[test]
    fn test_delivery_windows_anchor_at_pickup_day() {
        // Day-offset-1 trip; the same shape as day 0, shifted 1440.
        let trips = vec![trip(1, "A", 10, 20, 1890, 2050)];
        let model = build(&trips, &BTreeMap::new()).unwrap();
        let delivery = &model.nodes[model.pairs[0].delivery];
        assert_eq!(delivery.window, (420 + 1440, 1080 + 5 * 1440));
        assert_eq!(delivery.blocked[0], (1080 + 1440 + 1, 420 + 2 * 1440 - 1));
    }

    #[test]
    fn test_delivery_day_offset_never_precedes_pickup() {
        let trips = vec![
            trip(1, "A", 10, 20, 450, 2050),
            trip(2, "A", 20, 30, 3330, 3410),
        ];
        let model = build(&trips, &BTreeMap::new()).unwrap();
        for pair in &model.pairs {
            assert!(model.nodes[pair.delivery].day_offset >= model.nodes[pair.pickup].day_offset);
        }
    }

    #[test]
    fn test_incoherent_pair_drops_single_trip() {
        let mut bad = trip(1, "A", 10, 20, 1890, 1970);
        bad.end_day_offset = 0;
        let trips = vec![bad, trip(2, "B", 20, 30, 450, 530)];
        let model = build(&trips, &BTreeMap::new()).unwrap();
        assert_eq!(model.pairs.len(), 1);
        assert_eq!(model.nodes[model.pairs[0].pickup].location, 20);
    }

    #[test]
    fn test_unknown_pair_drops_single_trip() {
        let trips = vec![
            trip(1, "A", 10, 99, 450, 610),
            trip(2, "B", 20, 30, 450, 530),
        ];
        let model = build(&trips, &BTreeMap::new()).unwrap();
        assert_eq!(model.pairs.len(), 1);
    }

    #[test]
    fn test_no_trips_is_empty_partition() {
        let err = build(&[], &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, PlanError::EmptyPartition { .. }));
    }

    #[test]
    fn test_empty_oracle_is_no_coverage() {
        let policy = PlanningPolicy::default();
        let empty = Arc::new(DistanceOracle::from_rows(&[], &policy));
        let trips = vec![trip(1, "A", 10, 20, 450, 610)];
        let err = ModelBuilder::new(&policy, empty)
            .build("T1", &trips, &BTreeMap::new(), &window())
            .unwrap_err();
        assert!(matches!(err, PlanError::NoDistanceCoverage { .. }));
    }

    #[test]
    fn test_fallback_start_sits_at_first_pickup() {
        let trips = vec![
            trip(1, "A", 20, 30, 500, 580),
            trip(2, "A", 10, 20, 600, 760),
        ];
        let model = build(&trips, &BTreeMap::new()).unwrap();
        assert_eq!(model.starts.len(), 1);
        let start = &model.nodes[model.starts[0].node];
        assert_eq!(start.kind, NodeKind::Start);
        assert_eq!(start.location, 20);
        assert_eq!(start.window, (420, OPEN_END_MINUTE));
        assert_eq!(start.target_minute, 500);
        assert_eq!(model.demands[start.id], 0);
    }

    #[test]
    fn test_fallback_start_picks_earliest_pickup_regardless_of_input_order() {
        let trips = vec![
            trip(2, "A", 10, 20, 600, 760),
            trip(1, "A", 20, 30, 500, 580),
        ];
        let model = build(&trips, &BTreeMap::new()).unwrap();
        let start = &model.nodes[model.starts[0].node];
        assert_eq!(start.location, 20);
        assert_eq!(start.target_minute, 500);
    }

    #[test]
    fn test_continuing_start_respects_free_time() {
        let free_at = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        let mut states = BTreeMap::new();
        states.insert("A".to_string(), VehicleState::continuing("A".into(), 30, free_at));
        let trips = vec![trip(1, "A", 10, 20, 450, 610)];
        let model = build(&trips, &states).unwrap();
        let start = &model.nodes[model.starts[0].node];
        assert_eq!(start.location, 30);
        // Free at minute 600, after the day opens.
        assert_eq!(start.window.0, 600);
        assert_eq!(start.window.1, OPEN_END_MINUTE);
    }

    #[test]
    fn test_continuing_start_waits_for_day_open() {
        let free_at = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap().and_hms_opt(5, 0, 0).unwrap();
        let mut states = BTreeMap::new();
        states.insert("A".to_string(), VehicleState::continuing("A".into(), 30, free_at));
        let trips = vec![trip(1, "A", 10, 20, 450, 610)];
        let model = build(&trips, &states).unwrap();
        let start = &model.nodes[model.starts[0].node];
        assert_eq!(start.window.0, 420);
        assert_eq!(start.target_minute, 300);
    }

    #[test]
    fn test_state_free_before_window_clamps_to_zero() {
        let free_at = NaiveDate::from_ymd_opt(2023, 2, 20).unwrap().and_hms_opt(23, 0, 0).unwrap();
        let mut states = BTreeMap::new();
        states.insert("A".to_string(), VehicleState::continuing("A".into(), 30, free_at));
        let trips = vec![trip(1, "A", 10, 20, 450, 610)];
        let model = build(&trips, &states).unwrap();
        let start = &model.nodes[model.starts[0].node];
        assert_eq!(start.target_minute, 0);
        assert_eq!(start.window.0, 0);
    }

    #[test]
    fn test_stored_state_for_absent_vehicle_is_ignored() {
        let free_at = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap().and_hms_opt(6, 0, 0).unwrap();
        let mut states = BTreeMap::new();
        states.insert("Z".to_string(), VehicleState::continuing("Z".into(), 30, free_at));
        let trips = vec![trip(1, "A", 10, 20, 450, 610)];
        let model = build(&trips, &states).unwrap();
        assert_eq!(model.starts.len(), 1);
        assert_eq!(model.starts[0].vehicle_id, "A");
    }

    #[test]
    fn test_arc_costs() {
        let trips = vec![
            trip(1, "A", 10, 20, 450, 610),
            trip(2, "B", 20, 30, 1890, 1970),
        ];
        let model = build(&trips, &BTreeMap::new()).unwrap();
        let p1 = model.pairs[0].pickup;
        let d1 = model.pairs[0].delivery;
        let p2 = model.pairs[1].pickup;

        assert_eq!(model.arc_minutes(DEPOT_NODE, p1), Some(0));
        assert_eq!(model.arc_minutes(p1, p1), Some(0));
        // Delivery of pair 1 and pickup of pair 2 share location 20.
        assert_eq!(model.arc_minutes(d1, p2), Some(0));
        assert_eq!(model.arc_minutes(p1, d1), Some(160));
        assert_eq!(model.arc_kilometers(p1, d1), Some(80.0));
        assert_eq!(model.arc_minutes(p1, 999), None);
    }

    #[test]
    fn test_distinct_locations_sorted_without_depot() {
        let trips = vec![
            trip(1, "A", 30, 20, 450, 610),
            trip(2, "B", 20, 10, 1890, 1970),
        ];
        let model = build(&trips, &BTreeMap::new()).unwrap();
        assert_eq!(model.distinct_locations(), vec![10, 20, 30]);
        assert_eq!(model.start_node_of("A"), Some(model.starts[0].node));
        assert_eq!(model.start_node_of("missing"), None);
    }
}
