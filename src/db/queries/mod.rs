//! Database query modules

pub mod distance;
pub mod location;
pub mod trip;
