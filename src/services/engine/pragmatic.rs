//! vrp-pragmatic solver integration

use std::collections::HashMap;
use std::io::BufWriter;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use tracing::debug;
use vrp_cli::extensions::solve::config::{create_builder_from_config, Config, TerminationConfig};
use vrp_core::solver::Solver;
use vrp_pragmatic::format::problem::{Matrix, PragmaticProblem, Problem};
use vrp_pragmatic::format::solution::{
    write_pragmatic, PragmaticOutputType, Solution as PragmaticSolution,
};

use crate::defaults::UNKNOWN_DISTANCE_SENTINEL;
use crate::services::engine::{Assignment, EngineOutcome, RoutingEngine, Visit};
use crate::services::model::{PickupDeliveryPair, RoutingModel, RoutingNode};
use crate::types::location::LocationId;
use crate::types::window::PlanningWindow;

const MATRIX_PROFILE: &str = "truck";
const DEFAULT_MAX_GENERATIONS: usize = 3000;

/// Adapts a [`RoutingModel`] onto the vrp-pragmatic solver stack.
///
/// Each pickup/delivery pair becomes one shipment job, each vehicle
/// start becomes a single-vehicle type with an open-ended shift, and
/// the distance oracle is flattened into a row-major travel matrix over
/// the model's distinct locations. Minute offsets convert to RFC3339
/// against the window start.
pub struct PragmaticEngine {
    window: PlanningWindow,
    max_generations: usize,
}

impl PragmaticEngine {
    pub fn new(window: PlanningWindow) -> Self {
        Self { window, max_generations: DEFAULT_MAX_GENERATIONS }
    }

    pub fn with_max_generations(mut self, max_generations: usize) -> Self {
        self.max_generations = max_generations;
        self
    }

    fn format_minute(&self, minute: i64) -> String {
        let naive = self.window.instant_at(minute);
        DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn minute_of(&self, rfc: &str) -> Result<i64, String> {
        let parsed = DateTime::parse_from_rfc3339(rfc)
            .map_err(|e| format!("bad timestamp {rfc:?} in solution: {e}"))?;
        Ok(parsed.naive_utc().signed_duration_since(self.window.start()).num_minutes())
    }

    fn job_task(&self, node: &RoutingNode, index: &HashMap<LocationId, usize>) -> serde_json::Value {
        let times: Vec<[String; 2]> = allowed_windows(node)
            .into_iter()
            .map(|(lo, hi)| [self.format_minute(lo), self.format_minute(hi)])
            .collect();
        json!({
            "places": [{
                "location": { "index": index.get(&node.location).copied().unwrap_or(0) },
                "duration": 0,
                "times": times,
            }],
            "demand": [1],
        })
    }

    fn build_problem(&self, model: &RoutingModel, locations: &[LocationId]) -> serde_json::Value {
        let index: HashMap<LocationId, usize> =
            locations.iter().enumerate().map(|(i, loc)| (*loc, i)).collect();

        let jobs: Vec<serde_json::Value> = model
            .pairs
            .iter()
            .enumerate()
            .map(|(i, pair)| {
                json!({
                    "id": format!("pair-{i}"),
                    "pickups": [self.job_task(&model.nodes[pair.pickup], &index)],
                    "deliveries": [self.job_task(&model.nodes[pair.delivery], &index)],
                })
            })
            .collect();

        let vehicles: Vec<serde_json::Value> = model
            .starts
            .iter()
            .map(|start| {
                let node = &model.nodes[start.node];
                json!({
                    "typeId": format!("veh-{}", start.vehicle_id),
                    "vehicleIds": [&start.vehicle_id],
                    "profile": { "matrix": MATRIX_PROFILE },
                    "costs": { "fixed": 0.0, "distance": 1.0, "time": 1.0 },
                    "shifts": [{
                        "start": {
                            "earliest": self.format_minute(node.window.0),
                            "location": { "index": index.get(&node.location).copied().unwrap_or(0) },
                        }
                    }],
                    "capacity": [1],
                })
            })
            .collect();

        json!({
            "plan": { "jobs": jobs },
            "fleet": {
                "vehicles": vehicles,
                "profiles": [{ "name": MATRIX_PROFILE }],
            },
        })
    }

    fn build_matrix(&self, model: &RoutingModel, locations: &[LocationId]) -> Matrix {
        let n = locations.len();
        let mut travel_times = Vec::with_capacity(n * n);
        let mut distances = Vec::with_capacity(n * n);
        for &from in locations {
            for &to in locations {
                if from == to {
                    travel_times.push(0);
                    distances.push(0);
                    continue;
                }
                match model.oracle().lookup(from, to) {
                    Ok(d) => {
                        travel_times.push((d.minutes * 60.0) as i64);
                        distances.push((d.kilometers * 1000.0).round() as i64);
                    }
                    Err(_) => {
                        debug!("No distance between {} and {}, using the sentinel", from, to);
                        travel_times.push(UNKNOWN_DISTANCE_SENTINEL * 60);
                        distances.push(UNKNOWN_DISTANCE_SENTINEL * 1000);
                    }
                }
            }
        }
        Matrix {
            profile: Some(MATRIX_PROFILE.to_string()),
            timestamp: None,
            travel_times,
            distances,
            error_codes: None,
        }
    }

    fn build_solver_config(
        &self,
        problem: Arc<vrp_core::models::Problem>,
        budget: Duration,
    ) -> Result<
        vrp_core::rosomaxa::evolution::EvolutionConfig<
            vrp_core::solver::RefinementContext,
            vrp_core::models::GoalContext,
            vrp_core::construction::heuristics::InsertionContext,
        >,
    > {
        let config = Config {
            termination: Some(TerminationConfig {
                max_time: Some(budget.as_secs().max(1) as usize),
                max_generations: Some(self.max_generations),
                variation: None,
            }),
            evolution: None,
            hyper: None,
            environment: None,
            telemetry: None,
            output: None,
        };

        let builder = create_builder_from_config(problem, Vec::new(), &config)
            .context("Failed to create solver builder")?;

        builder.build().context("Failed to build solver configuration")
    }

    fn try_solve(&self, model: &RoutingModel, budget: Duration) -> Result<PragmaticSolution> {
        let locations = model.distinct_locations();
        let problem_json = self.build_problem(model, &locations);
        let problem: Problem = serde_json::from_value(problem_json)
            .context("Failed to deserialize pragmatic problem")?;

        let matrix = self.build_matrix(model, &locations);
        let core_problem = (problem, vec![matrix])
            .read_pragmatic()
            .context("Failed to build core problem from pragmatic format")?;

        let core_problem = Arc::new(core_problem);
        let solver_config = self.build_solver_config(core_problem.clone(), budget)?;

        let solution = Solver::new(core_problem.clone(), solver_config)
            .solve()
            .context("Failed to solve the routing model")?;

        write_pragmatic_solution(core_problem.as_ref(), &solution)
    }

    fn interpret(
        &self,
        model: &RoutingModel,
        solution: &PragmaticSolution,
        started: Instant,
        budget: Duration,
    ) -> EngineOutcome {
        let unassigned = solution.unassigned.as_ref().map(|u| u.len()).unwrap_or(0);
        if unassigned > 0 {
            for job in solution.unassigned.iter().flatten() {
                let reasons: Vec<&str> = job.reasons.iter().map(|r| r.code.as_str()).collect();
                debug!("Unassigned {}: {}", job.job_id, reasons.join(", "));
            }
            return if started.elapsed() >= budget {
                EngineOutcome::TimeLimit
            } else {
                EngineOutcome::NoSolution
            };
        }

        match self.map_solution(model, solution) {
            Ok(assignment) => EngineOutcome::Success(assignment),
            Err(e) => EngineOutcome::InvalidModel(e),
        }
    }

    fn map_solution(
        &self,
        model: &RoutingModel,
        solution: &PragmaticSolution,
    ) -> Result<Assignment, String> {
        let mut routes: HashMap<String, Vec<Visit>> = HashMap::new();
        for tour in &solution.tours {
            let vehicle = tour.vehicle_id.clone();
            let mut visits = Vec::new();
            for stop in &tour.stops {
                let schedule = stop.schedule();
                let arrival_minute = self.minute_of(&schedule.arrival)?;
                for activity in stop.activities() {
                    match activity.activity_type.as_str() {
                        "departure" => {
                            if let Some(node) = model.start_node_of(&vehicle) {
                                visits.push(Visit { node, arrival_minute });
                            }
                        }
                        "arrival" => {}
                        kind @ ("pickup" | "delivery") => {
                            let pair = pair_of(model, &activity.job_id)?;
                            let node = if kind == "pickup" { pair.pickup } else { pair.delivery };
                            visits.push(Visit { node, arrival_minute });
                        }
                        other => {
                            return Err(format!("unexpected activity type {other:?} in solution"))
                        }
                    }
                }
            }
            routes.insert(vehicle, visits);
        }
        Ok(Assignment { routes })
    }
}

impl RoutingEngine for PragmaticEngine {
    fn solve(&self, model: &RoutingModel, budget: Duration) -> EngineOutcome {
        let started = Instant::now();
        match self.try_solve(model, budget) {
            Ok(solution) => self.interpret(model, &solution, started, budget),
            Err(e) => EngineOutcome::InvalidModel(format!("{e:#}")),
        }
    }

    fn name(&self) -> &'static str {
        "vrp-pragmatic"
    }
}

/// Serviceable sub-ranges of a node's window once its blocked gaps are
/// carved out.
fn allowed_windows(node: &RoutingNode) -> Vec<(i64, i64)> {
    let (lower, upper) = node.window;
    if node.blocked.is_empty() {
        return vec![(lower, upper)];
    }

    let mut windows = Vec::with_capacity(node.blocked.len() + 1);
    let mut cursor = lower;
    for &(lo, hi) in &node.blocked {
        if lo > cursor {
            windows.push((cursor, lo - 1));
        }
        cursor = hi + 1;
    }
    if cursor <= upper {
        windows.push((cursor, upper));
    }
    windows
}

fn pair_of(model: &RoutingModel, job_id: &str) -> Result<PickupDeliveryPair, String> {
    job_id
        .strip_prefix("pair-")
        .and_then(|raw| raw.parse::<usize>().ok())
        .and_then(|i| model.pairs.get(i).copied())
        .ok_or_else(|| format!("solution references unknown job {job_id:?}"))
}

fn write_pragmatic_solution(
    problem: &vrp_core::models::Problem,
    solution: &vrp_core::models::Solution,
) -> Result<PragmaticSolution> {
    let mut writer = BufWriter::new(Vec::new());
    write_pragmatic(problem, solution, PragmaticOutputType::default(), &mut writer)
        .context("Failed to serialize pragmatic solution")?;

    let bytes = writer.into_inner().context("Failed to flush solution writer")?;
    let json = String::from_utf8(bytes).context("Solution is not valid UTF-8")?;
    let parsed: PragmaticSolution =
        serde_json::from_str(&json).context("Failed to parse pragmatic solution JSON")?;

    Ok(parsed)
}
