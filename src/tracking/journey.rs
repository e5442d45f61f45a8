use crate::geo::{Coordinates, Segment};
use crate::planner::Itinerary;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

const HISTORY_DURATION_MS: i64 = 10 * 60 * 1000;
const MAX_POSITION_HISTORY: usize = 600;

/// A traveler fix as reported by the rider's device. `timestamp` is epoch millis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelerPosition {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: i64,
}

impl TravelerPosition {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

/// Next walking step not yet reached, per leg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepCursor {
    pub leg: usize,
    pub step: usize,
}

/// Live state of one traveler following a monitored trip's itinerary.
#[derive(Debug, Clone)]
pub struct TrackedJourney {
    pub trip_id: String,
    pub user_id: String,
    pub itinerary: Arc<Itinerary>,
    pub position_history: VecDeque<TravelerPosition>,
    pub step_cursor: StepCursor,
    /// Segment actions already fired for this journey.
    pub notified_segments: HashSet<String>,
}

impl TrackedJourney {
    pub fn new(trip_id: &str, user_id: &str, itinerary: Arc<Itinerary>) -> Self {
        Self {
            trip_id: trip_id.to_string(),
            user_id: user_id.to_string(),
            itinerary,
            position_history: VecDeque::with_capacity(MAX_POSITION_HISTORY),
            step_cursor: StepCursor::default(),
            notified_segments: HashSet::new(),
        }
    }

    pub fn add_position(&mut self, position: TravelerPosition) {
        self.position_history.push_back(position);

        if self.position_history.len() > MAX_POSITION_HISTORY {
            self.position_history.pop_front();
        }

        let cutoff = position.timestamp.saturating_sub(HISTORY_DURATION_MS);
        while self
            .position_history
            .front()
            .map(|p| p.timestamp < cutoff)
            .unwrap_or(false)
        {
            self.position_history.pop_front();
        }
    }

    pub fn last_position(&self) -> Option<&TravelerPosition> {
        self.position_history.back()
    }

    /// No fix within the history window, or the itinerary ended longer ago
    /// than that window.
    pub fn is_stale(&self, now: i64) -> bool {
        let cutoff = now.saturating_sub(HISTORY_DURATION_MS);
        let idle = self
            .last_position()
            .map(|p| p.timestamp < cutoff)
            .unwrap_or(true);
        idle || self.itinerary.end_time < cutoff
    }

    /// Stretch covered between the last two fixes.
    pub fn movement_segment(&self) -> Option<Segment> {
        let mut recent = self.position_history.iter().rev();
        let current = recent.next()?;
        let previous = recent.next()?;
        Some(Segment::new(previous.coordinates(), current.coordinates()))
    }

    /// Index of the next unreached step on `leg`. Moving to another leg
    /// starts from its first step.
    pub fn step_for_leg(&mut self, leg: usize) -> usize {
        if self.step_cursor.leg != leg {
            self.step_cursor = StepCursor { leg, step: 0 };
        }
        self.step_cursor.step
    }

    pub fn advance_step(&mut self, leg: usize) {
        let step = self.step_for_leg(leg);
        self.step_cursor.step = step + 1;
    }
}

/// Journeys currently being tracked, keyed by monitored trip id.
#[derive(Debug, Default)]
pub struct TrackingRegistry {
    journeys: HashMap<String, TrackedJourney>,
}

impl TrackingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the journey for `trip_id`, starting over when the itinerary
    /// it follows has been replaced.
    pub fn get_or_start(
        &mut self,
        trip_id: &str,
        user_id: &str,
        itinerary: Arc<Itinerary>,
    ) -> &mut TrackedJourney {
        let journey = self
            .journeys
            .entry(trip_id.to_string())
            .or_insert_with(|| TrackedJourney::new(trip_id, user_id, itinerary.clone()));

        if !Arc::ptr_eq(&journey.itinerary, &itinerary) && *journey.itinerary != *itinerary {
            *journey = TrackedJourney::new(trip_id, user_id, itinerary);
        }
        journey
    }

    /// Drops every stale journey and returns how many were dropped.
    pub fn evict_stale(&mut self, now: i64) -> usize {
        let before = self.journeys.len();
        self.journeys.retain(|_, journey| !journey.is_stale(now));
        before - self.journeys.len()
    }

    pub fn len(&self) -> usize {
        self.journeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journeys.is_empty()
    }
}
