//! Shared domain types

pub mod leg;
pub mod location;
pub mod trip;
pub mod vehicle;
pub mod window;
