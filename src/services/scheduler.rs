//! Day-by-day replanning pipeline

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::defaults::{PlanningPolicy, DEFAULT_SOLVE_BUDGET_SECS, UNKNOWN_DISTANCE_SENTINEL};
use crate::error::PlanError;
use crate::services::distance::DistanceOracle;
use crate::services::engine::{Assignment, EngineOutcome, RoutingEngine, Visit};
use crate::services::fleet_state::FleetStateStore;
use crate::services::locations;
use crate::services::model::{ModelBuilder, NodeKind, RoutingModel, RoutingNode, DEPOT_NODE};
use crate::services::plausibility::TripValidator;
use crate::services::route_log::RouteLog;
use crate::services::store::{with_retry, TripStore};
use crate::services::timeparse;
use crate::types::leg::RouteLeg;
use crate::types::location::{Coordinates, LocationId};
use crate::types::trip::ParsedTrip;
use crate::types::window::PlanningWindow;

/// Runs the full pipeline one day at a time: fetch, parse, partition by
/// truck type, solve each partition and fold the results back into the
/// fleet state and route log. Partitions of a day run concurrently;
/// days run in order so each sees the state its predecessor left.
pub struct DailyScheduler {
    store: Arc<dyn TripStore>,
    engine: Arc<dyn RoutingEngine>,
    fleet: Arc<FleetStateStore>,
    route_log: Arc<RouteLog>,
    policy: PlanningPolicy,
    solve_budget: Duration,
}

/// Everything a partition task needs, detached from the scheduler so it
/// can move into a spawned task.
#[derive(Clone)]
struct PipelineContext {
    store: Arc<dyn TripStore>,
    engine: Arc<dyn RoutingEngine>,
    fleet: Arc<FleetStateStore>,
    route_log: Arc<RouteLog>,
    policy: PlanningPolicy,
    budget: Duration,
    window: PlanningWindow,
}

#[derive(Debug)]
pub struct DayReport {
    pub day: NaiveDate,
    pub partitions: Vec<PartitionReport>,
    /// Set when the day could not even be fetched; partitions are then
    /// empty and the run moves on to the next day.
    pub error: Option<PlanError>,
}

#[derive(Debug)]
pub struct PartitionReport {
    pub truck_type: String,
    pub trips: usize,
    pub vehicles: usize,
    pub status: PartitionStatus,
}

#[derive(Debug)]
pub enum PartitionStatus {
    Solved { vehicles_used: usize, legs: usize },
    Skipped(PlanError),
}

impl fmt::Display for PartitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionStatus::Solved { vehicles_used, legs } => {
                write!(f, "solved ({vehicles_used} vehicles used, {legs} legs)")
            }
            PartitionStatus::Skipped(err) => write!(f, "skipped: {err}"),
        }
    }
}

impl DailyScheduler {
    pub fn new(
        store: Arc<dyn TripStore>,
        engine: Arc<dyn RoutingEngine>,
        fleet: Arc<FleetStateStore>,
        route_log: Arc<RouteLog>,
    ) -> Self {
        Self {
            store,
            engine,
            fleet,
            route_log,
            policy: PlanningPolicy::default(),
            solve_budget: Duration::from_secs(DEFAULT_SOLVE_BUDGET_SECS),
        }
    }

    pub fn with_solve_budget(mut self, budget: Duration) -> Self {
        self.solve_budget = budget;
        self
    }

    /// Plan every day of the window in order.
    pub async fn run(&self, window: &PlanningWindow) -> Vec<DayReport> {
        let days = window.days();
        info!("Planning {} days starting {} ({} store)", days.len(), window.start(), self.store.name());

        let mut reports = Vec::with_capacity(days.len());
        for day in days {
            info!("Planning day {}", day);
            let report = self.run_day(day, window).await;
            for partition in &report.partitions {
                info!("Day {} / {}: {}", day, partition.truck_type, partition.status);
            }
            if let Some(err) = &report.error {
                error!("Day {} aborted: {}", day, err);
            }
            reports.push(report);
        }
        reports
    }

    async fn run_day(&self, day: NaiveDate, window: &PlanningWindow) -> DayReport {
        let Some(next_day) = day.succ_opt() else {
            warn!("Day {} has no successor, skipping", day);
            return DayReport { day, partitions: Vec::new(), error: None };
        };

        let raw = match with_retry("trip fetch", || self.store.trips_in_range(day, next_day)).await
        {
            Ok(raw) => raw,
            Err(err) => return DayReport { day, partitions: Vec::new(), error: Some(err) },
        };

        let mut parsed: Vec<ParsedTrip> = Vec::with_capacity(raw.len());
        for trip in &raw {
            match timeparse::parse_trip(trip) {
                Ok(p) => parsed.push(p),
                Err(err) => debug!("Dropping trip {}: {}", trip.trip_id, err),
            }
        }
        info!("Day {}: {} of {} trips parse cleanly", day, parsed.len(), raw.len());

        let mut partitions: BTreeMap<String, Vec<ParsedTrip>> = BTreeMap::new();
        for trip in parsed {
            partitions.entry(trip.truck_type.clone()).or_default().push(trip);
        }

        let mut tasks = JoinSet::new();
        for (truck_type, trips) in partitions {
            let ctx = self.context(*window);
            tasks.spawn(run_partition(ctx, truck_type, trips));
        }

        let mut reports = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(err) => error!("Partition task failed: {}", err),
            }
        }
        reports.sort_by(|a, b| a.truck_type.cmp(&b.truck_type));

        DayReport { day, partitions: reports, error: None }
    }

    fn context(&self, window: PlanningWindow) -> PipelineContext {
        PipelineContext {
            store: self.store.clone(),
            engine: self.engine.clone(),
            fleet: self.fleet.clone(),
            route_log: self.route_log.clone(),
            policy: self.policy,
            budget: self.solve_budget,
            window,
        }
    }
}

async fn run_partition(
    ctx: PipelineContext,
    truck_type: String,
    trips: Vec<ParsedTrip>,
) -> PartitionReport {
    let states = match ctx.fleet.get(&truck_type) {
        Ok(states) => states,
        Err(err) => {
            return PartitionReport {
                truck_type,
                trips: trips.len(),
                vehicles: 0,
                status: PartitionStatus::Skipped(err),
            }
        }
    };

    let candidates = locations::candidate_locations(&trips, &states);
    let known = match with_retry("location lookup", || ctx.store.known_locations(&candidates))
        .await
    {
        Ok(known) => known,
        Err(err) => {
            return PartitionReport {
                truck_type,
                trips: trips.len(),
                vehicles: 0,
                status: PartitionStatus::Skipped(err),
            }
        }
    };

    let validated = locations::validate_trips(trips, &known, &ctx.window);

    let rows = match with_retry("distance lookup", || ctx.store.distance_rows(&known)).await {
        Ok(rows) => rows,
        Err(err) => {
            return PartitionReport {
                truck_type,
                trips: validated.len(),
                vehicles: 0,
                status: PartitionStatus::Skipped(err),
            }
        }
    };

    let oracle = Arc::new(DistanceOracle::from_rows(&rows, &ctx.policy));
    if oracle.is_empty() {
        info!("Truck type {}: no distance coverage, skipping", truck_type);
        return PartitionReport {
            truck_type: truck_type.clone(),
            trips: validated.len(),
            vehicles: 0,
            status: PartitionStatus::Skipped(PlanError::NoDistanceCoverage { truck_type }),
        };
    }

    let accepted = TripValidator::new(&oracle, &ctx.policy).retain_plausible(validated);
    if accepted.is_empty() {
        info!("Truck type {}: nothing plausible to plan", truck_type);
        return PartitionReport {
            truck_type: truck_type.clone(),
            trips: 0,
            vehicles: 0,
            status: PartitionStatus::Skipped(PlanError::EmptyPartition { truck_type }),
        };
    }

    let vehicle_count = accepted
        .iter()
        .filter_map(|t| t.vehicle_id.as_deref())
        .collect::<HashSet<_>>()
        .len();
    info!("Truck type {}: {} trips across {} vehicles", truck_type, accepted.len(), vehicle_count);

    let trips_count = accepted.len();
    let model = match ModelBuilder::new(&ctx.policy, oracle)
        .build(&truck_type, &accepted, &states, &ctx.window)
    {
        Ok(model) => model,
        Err(err) => {
            return PartitionReport {
                truck_type,
                trips: trips_count,
                vehicles: vehicle_count,
                status: PartitionStatus::Skipped(err),
            }
        }
    };

    // The solver is CPU bound and can hold the thread for the whole
    // budget, so it runs off the async runtime.
    let engine = ctx.engine.clone();
    let budget = ctx.budget;
    let solve = tokio::task::spawn_blocking(move || {
        let outcome = engine.solve(&model, budget);
        (outcome, model)
    });
    let (outcome, model) = match solve.await {
        Ok(pair) => pair,
        Err(err) => {
            return PartitionReport {
                truck_type,
                trips: trips_count,
                vehicles: vehicle_count,
                status: PartitionStatus::Skipped(PlanError::EngineInvalidModel(format!(
                    "solver task failed: {err}"
                ))),
            }
        }
    };

    let status = match outcome {
        EngineOutcome::Success(assignment) => {
            match apply_result(&ctx, &truck_type, &model, &assignment).await {
                Ok((vehicles_used, legs)) => PartitionStatus::Solved { vehicles_used, legs },
                Err(err) => PartitionStatus::Skipped(err),
            }
        }
        EngineOutcome::NoSolution => {
            info!("Truck type {}: engine found no solution", truck_type);
            PartitionStatus::Skipped(PlanError::EngineNoSolution)
        }
        EngineOutcome::TimeLimit => {
            info!("Truck type {}: solve budget exhausted", truck_type);
            PartitionStatus::Skipped(PlanError::EngineTimeLimit)
        }
        EngineOutcome::InvalidModel(detail) => {
            PartitionStatus::Skipped(PlanError::EngineInvalidModel(detail))
        }
    };

    PartitionReport { truck_type, trips: trips_count, vehicles: vehicle_count, status }
}

/// Fold a successful assignment back into the route log and the fleet
/// state. Legs are written first; vehicle states advance only once the
/// whole batch is on disk.
async fn apply_result(
    ctx: &PipelineContext,
    truck_type: &str,
    model: &RoutingModel,
    assignment: &Assignment,
) -> Result<(usize, usize), PlanError> {
    let mut coords: HashMap<LocationId, Option<Coordinates>> = HashMap::new();
    for location in model.distinct_locations() {
        let found = with_retry("coordinate lookup", || ctx.store.coordinates(location)).await?;
        coords.insert(location, found);
    }

    let node_of = |visit: &Visit| -> Result<&RoutingNode, PlanError> {
        model.nodes.get(visit.node).ok_or_else(|| {
            PlanError::EngineInvalidModel(format!("assignment references node {}", visit.node))
        })
    };

    let mut vehicles: Vec<&String> = assignment.routes.keys().collect();
    vehicles.sort();

    let mut legs = Vec::new();
    let mut finals: Vec<(&String, LocationId, i64)> = Vec::new();
    let mut vehicles_used = 0usize;
    for vehicle in vehicles {
        let visits = &assignment.routes[vehicle];
        let moved = visits.iter().any(|v| {
            model
                .nodes
                .get(v.node)
                .map(|n| matches!(n.kind, NodeKind::Pickup | NodeKind::Delivery))
                .unwrap_or(false)
        });
        if moved {
            vehicles_used += 1;
        }

        for pair in visits.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.node == DEPOT_NODE || b.node == DEPOT_NODE {
                continue;
            }
            let from = node_of(a)?;
            let to = node_of(b)?;
            if from.location == to.location {
                continue;
            }
            let origin_coords = coords.get(&from.location).copied().flatten();
            let dest_coords = coords.get(&to.location).copied().flatten();
            let loaded = model.pairs.iter().any(|p| p.pickup == a.node && p.delivery == b.node);
            legs.push(RouteLeg {
                origin_id: from.location,
                destination_id: to.location,
                origin_lat: origin_coords.map(|c| c.lat),
                origin_long: origin_coords.map(|c| c.lng),
                destination_lat: dest_coords.map(|c| c.lat),
                destination_long: dest_coords.map(|c| c.lng),
                vehicle_id: vehicle.clone(),
                truck_type: truck_type.to_string(),
                start_time: ctx.window.instant_at(a.arrival_minute),
                end_time: ctx.window.instant_at(b.arrival_minute),
                minutes: b.arrival_minute - a.arrival_minute,
                calculated_minutes: model
                    .arc_minutes(a.node, b.node)
                    .unwrap_or(UNKNOWN_DISTANCE_SENTINEL),
                calculated_kms: model.arc_kilometers(a.node, b.node).unwrap_or(0.0),
                loaded: u8::from(loaded),
            });
        }

        if let Some(last) = visits.last() {
            let node = node_of(last)?;
            finals.push((vehicle, node.location, last.arrival_minute));
        }
    }

    let written = ctx
        .route_log
        .append(&legs)
        .map_err(|e| PlanError::StoreUnavailable(format!("route log: {e:#}")))?;

    for (vehicle, location, minute) in finals {
        ctx.fleet.put(truck_type, vehicle, location, ctx.window.instant_at(minute))?;
    }

    Ok((vehicles_used, written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    use uuid::Uuid;

    use crate::defaults::STORE_RETRY_ATTEMPTS;
    use crate::services::engine::MockEngine;
    use crate::services::store::MemoryTripStore;
    use crate::types::location::DistanceRow;
    use crate::types::trip::RawTrip;

    fn temp_dir() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("scheduler-test-{}", Uuid::new_v4()))
    }

    fn raw(
        trip_id: i64,
        vehicle: &str,
        origin: i64,
        destination: i64,
        date: &str,
        start: &str,
        end: &str,
    ) -> RawTrip {
        RawTrip {
            trip_id,
            origin: Some(origin),
            destination: Some(destination),
            start_date_code: Some(date.into()),
            start_time_text: Some(start.into()),
            end_date_code: Some(date.into()),
            end_time_text: Some(end.into()),
            vehicle_id: Some(vehicle.into()),
            truck_type: Some("T1".into()),
        }
    }

    /// Assigns every pair to every vehicle at its target minutes, with
    /// the start visit first. Good enough for single-vehicle fixtures.
    fn echo_engine() -> MockEngine {
        MockEngine::from_fn(|model| {
            let mut assignment = Assignment::default();
            for start in &model.starts {
                let mut visits = vec![Visit {
                    node: start.node,
                    arrival_minute: model.nodes[start.node].window.0,
                }];
                for pair in &model.pairs {
                    visits.push(Visit {
                        node: pair.pickup,
                        arrival_minute: model.nodes[pair.pickup].target_minute,
                    });
                    visits.push(Visit {
                        node: pair.delivery,
                        arrival_minute: model.nodes[pair.delivery].target_minute,
                    });
                }
                assignment.routes.insert(start.vehicle_id.clone(), visits);
            }
            EngineOutcome::Success(assignment)
        })
    }

    fn window(from: (i32, u32, u32), to: (i32, u32, u32)) -> PlanningWindow {
        PlanningWindow::from_dates(
            NaiveDate::from_ymd_opt(from.0, from.1, from.2).unwrap(),
            NaiveDate::from_ymd_opt(to.0, to.1, to.2).unwrap(),
        )
        .unwrap()
    }

    struct Fixture {
        dir: std::path::PathBuf,
        fleet: Arc<FleetStateStore>,
        route_log: Arc<RouteLog>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = temp_dir();
            std::fs::create_dir_all(&dir).unwrap();
            let fleet = Arc::new(FleetStateStore::new(&dir));
            let route_log = Arc::new(RouteLog::new(dir.join("routes.csv")));
            Self { dir, fleet, route_log }
        }

        fn scheduler(
            &self,
            store: Arc<dyn TripStore>,
            engine: Arc<dyn RoutingEngine>,
        ) -> DailyScheduler {
            DailyScheduler::new(store, engine, self.fleet.clone(), self.route_log.clone())
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.dir).ok();
        }
    }

    #[tokio::test]
    async fn test_fleet_state_carries_across_days() {
        let fixture = Fixture::new();
        let store = Arc::new(MemoryTripStore {
            trips: vec![
                raw(1, "U-1", 10, 20, "20230301", "7:30:00 a.m.", "9:06:00 a.m."),
                raw(2, "U-1", 20, 10, "20230302", "7:30:00 a.m.", "9:06:00 a.m."),
            ],
            locations: HashSet::from([10, 20]),
            distances: vec![DistanceRow {
                origin: 10,
                destination: 20,
                travel_time: 60,
                kilometers: 50.0,
            }],
            coords: HashMap::from([
                (10, Coordinates { lat: 19.43, lng: -99.13 }),
                (20, Coordinates { lat: 19.49, lng: -99.11 }),
            ]),
            ..Default::default()
        });
        let engine = Arc::new(echo_engine());
        let scheduler = fixture.scheduler(store, engine.clone());

        let window = window((2023, 3, 1), (2023, 3, 3));
        let reports = scheduler.run(&window).await;

        assert_eq!(reports.len(), 2);
        assert!(matches!(
            reports[0].partitions[0].status,
            PartitionStatus::Solved { vehicles_used: 1, legs: 1 }
        ));
        assert!(matches!(reports[1].partitions[0].status, PartitionStatus::Solved { .. }));

        // Both days had one vehicle, one pair and the depot.
        assert_eq!(
            engine.seen(),
            vec![("T1".to_string(), 4), ("T1".to_string(), 4)]
        );

        // After day 2 the vehicle is back at 10, free at its delivery.
        let states = fixture.fleet.get("T1").unwrap();
        let state = &states["U-1"];
        assert_eq!(state.location, 10);
        assert_eq!(state.free_at, window.instant_at(1440 + 546));
        assert!(!state.initial);

        let legs = fixture.route_log.read_all().unwrap();
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].origin_id, 10);
        assert_eq!(legs[0].destination_id, 20);
        assert_eq!(legs[0].loaded, 1);
        assert_eq!(legs[0].minutes, 96);
        assert_eq!(legs[0].calculated_minutes, 96);
        assert_eq!(legs[0].calculated_kms, 50.0);
        assert_eq!(legs[0].origin_lat, Some(19.43));
        assert_eq!(legs[1].origin_id, 20);
    }

    #[tokio::test]
    async fn test_implausible_trip_is_excluded_from_the_model() {
        let fixture = Fixture::new();
        let store = Arc::new(MemoryTripStore {
            trips: vec![
                raw(1, "U-1", 10, 20, "20230301", "7:30:00 a.m.", "9:06:00 a.m."),
                // 210 observed minutes against 96 expected.
                raw(3, "U-1", 10, 20, "20230301", "7:30:00 a.m.", "11:00:00 a.m."),
            ],
            locations: HashSet::from([10, 20]),
            distances: vec![DistanceRow {
                origin: 10,
                destination: 20,
                travel_time: 60,
                kilometers: 50.0,
            }],
            ..Default::default()
        });
        let engine = Arc::new(echo_engine());
        let scheduler = fixture.scheduler(store, engine.clone());

        let reports = scheduler.run(&window((2023, 3, 1), (2023, 3, 2))).await;

        assert_eq!(reports[0].partitions[0].trips, 1);
        assert_eq!(engine.seen(), vec![("T1".to_string(), 4)]);
    }

    #[tokio::test]
    async fn test_missing_distance_coverage_skips_partition() {
        let fixture = Fixture::new();
        let store = Arc::new(MemoryTripStore {
            trips: vec![raw(1, "U-1", 10, 20, "20230301", "7:30:00 a.m.", "9:06:00 a.m.")],
            locations: HashSet::from([10, 20]),
            ..Default::default()
        });
        let scheduler = fixture.scheduler(store, Arc::new(echo_engine()));

        let reports = scheduler.run(&window((2023, 3, 1), (2023, 3, 2))).await;

        assert!(matches!(
            reports[0].partitions[0].status,
            PartitionStatus::Skipped(PlanError::NoDistanceCoverage { .. })
        ));
        assert!(fixture.fleet.get("T1").unwrap().is_empty());
        assert!(!fixture.dir.join("routes.csv").exists());
    }

    #[tokio::test]
    async fn test_failed_solve_leaves_fleet_state_untouched() {
        let fixture = Fixture::new();
        let store = Arc::new(MemoryTripStore {
            trips: vec![raw(1, "U-1", 10, 20, "20230301", "7:30:00 a.m.", "9:06:00 a.m.")],
            locations: HashSet::from([10, 20]),
            distances: vec![DistanceRow {
                origin: 10,
                destination: 20,
                travel_time: 60,
                kilometers: 50.0,
            }],
            ..Default::default()
        });
        let scheduler =
            fixture.scheduler(store, Arc::new(MockEngine::fixed(EngineOutcome::NoSolution)));

        let reports = scheduler.run(&window((2023, 3, 1), (2023, 3, 2))).await;

        assert!(matches!(
            reports[0].partitions[0].status,
            PartitionStatus::Skipped(PlanError::EngineNoSolution)
        ));
        assert!(fixture.fleet.get("T1").unwrap().is_empty());
        assert!(!fixture.dir.join("routes.csv").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_store_outage_is_retried() {
        let fixture = Fixture::new();
        let store = Arc::new(MemoryTripStore {
            trips: vec![raw(1, "U-1", 10, 20, "20230301", "7:30:00 a.m.", "9:06:00 a.m.")],
            locations: HashSet::from([10, 20]),
            distances: vec![DistanceRow {
                origin: 10,
                destination: 20,
                travel_time: 60,
                kilometers: 50.0,
            }],
            fail_remaining: AtomicU32::new(1),
            ..Default::default()
        });
        let scheduler = fixture.scheduler(store, Arc::new(echo_engine()));

        let reports = scheduler.run(&window((2023, 3, 1), (2023, 3, 2))).await;

        assert!(reports[0].error.is_none());
        assert!(matches!(reports[0].partitions[0].status, PartitionStatus::Solved { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_day_fetch_failure_is_reported_and_later_days_continue() {
        let fixture = Fixture::new();
        let store = Arc::new(MemoryTripStore {
            trips: vec![
                raw(1, "U-1", 10, 20, "20230301", "7:30:00 a.m.", "9:06:00 a.m."),
                raw(2, "U-1", 10, 20, "20230302", "7:30:00 a.m.", "9:06:00 a.m."),
            ],
            locations: HashSet::from([10, 20]),
            distances: vec![DistanceRow {
                origin: 10,
                destination: 20,
                travel_time: 60,
                kilometers: 50.0,
            }],
            fail_remaining: AtomicU32::new(STORE_RETRY_ATTEMPTS),
            ..Default::default()
        });
        let scheduler = fixture.scheduler(store, Arc::new(echo_engine()));

        let reports = scheduler.run(&window((2023, 3, 1), (2023, 3, 3))).await;

        assert!(reports[0].error.is_some());
        assert!(reports[0].partitions.is_empty());
        assert!(reports[1].error.is_none());
        assert!(matches!(reports[1].partitions[0].status, PartitionStatus::Solved { .. }));
    }

    #[tokio::test]
    async fn test_partitions_are_planned_independently() {
        let fixture = Fixture::new();
        let mut flatbed = raw(4, "U-2", 10, 20, "20230301", "7:30:00 a.m.", "9:06:00 a.m.");
        flatbed.truck_type = Some("T2".into());
        let store = Arc::new(MemoryTripStore {
            trips: vec![raw(1, "U-1", 10, 20, "20230301", "7:30:00 a.m.", "9:06:00 a.m."), flatbed],
            locations: HashSet::from([10, 20]),
            distances: vec![DistanceRow {
                origin: 10,
                destination: 20,
                travel_time: 60,
                kilometers: 50.0,
            }],
            ..Default::default()
        });
        let scheduler = fixture.scheduler(store, Arc::new(echo_engine()));

        let reports = scheduler.run(&window((2023, 3, 1), (2023, 3, 2))).await;

        let names: Vec<&str> =
            reports[0].partitions.iter().map(|p| p.truck_type.as_str()).collect();
        assert_eq!(names, vec!["T1", "T2"]);
        assert!(fixture.fleet.get("T1").unwrap().contains_key("U-1"));
        assert!(fixture.fleet.get("T2").unwrap().contains_key("U-2"));
    }
}
