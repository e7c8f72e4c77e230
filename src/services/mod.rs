//! Service modules

pub mod deviation;
pub mod distance;
pub mod engine;
pub mod fleet_state;
pub mod geodistance;
pub mod locations;
pub mod model;
pub mod plausibility;
pub mod route_log;
pub mod scheduler;
pub mod store;
pub mod timeparse;
