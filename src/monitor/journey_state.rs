use super::notify::NotificationKind;
use crate::planner::Itinerary;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    NoLongerPossible,
    NextTripNotPossible,
    TripUpcoming,
    TripActive,
}

impl TripStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoLongerPossible => "NO_LONGER_POSSIBLE",
            Self::NextTripNotPossible => "NEXT_TRIP_NOT_POSSIBLE",
            Self::TripUpcoming => "TRIP_UPCOMING",
            Self::TripActive => "TRIP_ACTIVE",
        }
    }

    pub fn is_possible(self) -> bool {
        matches!(self, Self::TripUpcoming | Self::TripActive)
    }
}

/// What the monitor last evaluated and told the user about one monitored trip.
/// Times are epoch millis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyState {
    pub trip_id: String,
    /// Last-notified estimates; the reference for the next delay comparison.
    #[serde(default)]
    pub baseline_arrival_time: Option<i64>,
    #[serde(default)]
    pub baseline_departure_time: Option<i64>,
    #[serde(default)]
    pub scheduled_arrival_time: Option<i64>,
    #[serde(default)]
    pub scheduled_departure_time: Option<i64>,
    #[serde(default)]
    pub last_checked_time: Option<i64>,
    #[serde(default)]
    pub matching_itinerary: Option<Arc<Itinerary>>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub trip_status: Option<TripStatus>,
    #[serde(default)]
    pub last_notifications: Vec<NotificationKind>,
}

impl JourneyState {
    pub fn new(trip_id: &str) -> Self {
        Self {
            trip_id: trip_id.to_string(),
            baseline_arrival_time: None,
            baseline_departure_time: None,
            scheduled_arrival_time: None,
            scheduled_departure_time: None,
            last_checked_time: None,
            matching_itinerary: None,
            target_date: None,
            trip_status: None,
            last_notifications: Vec::new(),
        }
    }

    /// Moves the state to `target_date`. Baselines belong to a single
    /// occurrence, so they are dropped when the date changes.
    /// Returns true when a rollover happened.
    pub fn roll_over(&mut self, target_date: NaiveDate) -> bool {
        if self.target_date == Some(target_date) {
            return false;
        }
        let rolled = self.target_date.is_some();
        self.target_date = Some(target_date);
        self.baseline_arrival_time = None;
        self.baseline_departure_time = None;
        self.scheduled_arrival_time = None;
        self.scheduled_departure_time = None;
        rolled
    }

    /// Replaces the matching itinerary wholesale and refreshes schedule times.
    pub fn record_itinerary(&mut self, itinerary: Arc<Itinerary>) {
        self.scheduled_departure_time = Some(itinerary.scheduled_departure_time());
        self.scheduled_arrival_time = Some(itinerary.scheduled_arrival_time());
        self.matching_itinerary = Some(itinerary);
    }
}
