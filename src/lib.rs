//! Re-plans saved transit trips on a schedule, tells riders what changed, and
//! guides them along the trip while they travel.

pub mod api;
pub mod config;
pub mod geo;
pub mod instruction;
pub mod logger;
pub mod monitor;
pub mod planner;
pub mod segment;
pub mod store;
pub mod tracking;

#[cfg(test)]
mod fixtures;
