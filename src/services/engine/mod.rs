//! Routing engine seam

pub mod pragmatic;

use std::collections::HashMap;
use std::time::Duration;

use crate::services::model::RoutingModel;

/// One serviced node on a vehicle's route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    pub node: usize,
    pub arrival_minute: i64,
}

/// Ordered visit sequences per vehicle id.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    pub routes: HashMap<String, Vec<Visit>>,
}

/// Terminal outcomes of a solve. Anything but `Success` leaves the
/// fleet state untouched.
#[derive(Debug, Clone)]
pub enum EngineOutcome {
    Success(Assignment),
    NoSolution,
    TimeLimit,
    InvalidModel(String),
}

/// The opaque combinatorial search. Solves are blocking CPU work; the
/// scheduler runs them on a blocking thread.
pub trait RoutingEngine: Send + Sync {
    fn solve(&self, model: &RoutingModel, budget: Duration) -> EngineOutcome;
    fn name(&self) -> &'static str;
}

/// Scripted engine for scheduler tests. Records what it was asked to
/// solve and answers via the supplied closure.
#[cfg(test)]
pub struct MockEngine {
    respond: Box<dyn Fn(&RoutingModel) -> EngineOutcome + Send + Sync>,
    seen: parking_lot::Mutex<Vec<(String, usize)>>,
}

#[cfg(test)]
impl MockEngine {
    pub fn from_fn(
        respond: impl Fn(&RoutingModel) -> EngineOutcome + Send + Sync + 'static,
    ) -> Self {
        Self { respond: Box::new(respond), seen: parking_lot::Mutex::new(Vec::new()) }
    }

    pub fn fixed(outcome: EngineOutcome) -> Self {
        Self::from_fn(move |_| outcome.clone())
    }

    /// (truck type, node count) per solve call, in call order.
    pub fn seen(&self) -> Vec<(String, usize)> {
        self.seen.lock().clone()
    }
}

#[cfg(test)]
impl RoutingEngine for MockEngine {
    fn solve(&self, model: &RoutingModel, _budget: Duration) -> EngineOutcome {
        self.seen.lock().push((model.truck_type.clone(), model.nodes.len()));
        (self.respond)(model)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
