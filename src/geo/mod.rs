pub mod proximity;

pub use proximity::{
    distance_between, distance_to_path, haversine_distance, point_to_segment_distance,
    segment_proximity,
};

use serde::{Deserialize, Serialize};

/// Within this distance of a reference point, on-track instructions use the
/// immediate prefix.
pub const TRIP_INSTRUCTION_IMMEDIATE_RADIUS: f64 = 2.0;
/// Beyond this distance of a reference point, no on-track instruction is given.
pub const TRIP_INSTRUCTION_UPCOMING_RADIUS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A straight stretch between two coordinates, in travel order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Coordinates,
    pub end: Coordinates,
}

impl Segment {
    pub fn new(start: Coordinates, end: Coordinates) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusThresholds {
    #[serde(default = "default_immediate_radius")]
    pub immediate_radius: f64,
    #[serde(default = "default_upcoming_radius")]
    pub upcoming_radius: f64,
}

fn default_immediate_radius() -> f64 {
    TRIP_INSTRUCTION_IMMEDIATE_RADIUS
}

fn default_upcoming_radius() -> f64 {
    TRIP_INSTRUCTION_UPCOMING_RADIUS
}

impl Default for RadiusThresholds {
    fn default() -> Self {
        Self {
            immediate_radius: default_immediate_radius(),
            upcoming_radius: default_upcoming_radius(),
        }
    }
}
