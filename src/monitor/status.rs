use super::journey_state::TripStatus;
use super::trip::ActiveDays;
use crate::planner::Itinerary;

/// Status of a trip whose itinerary is known. An itinerary that has already
/// ended counts as upcoming: the next occurrence is what matters.
pub fn itinerary_status(now: i64, itinerary: &Itinerary) -> TripStatus {
    if itinerary.is_active_at(now) {
        TripStatus::TripActive
    } else {
        TripStatus::TripUpcoming
    }
}

/// Recomputed from scratch on every check; there is no transition table.
pub fn classify_trip_status(
    now: i64,
    itinerary: Option<&Itinerary>,
    days: &ActiveDays,
) -> TripStatus {
    match itinerary {
        Some(itinerary) => itinerary_status(now, itinerary),
        // other weekdays may still work out
        None if days.active_count() > 1 => TripStatus::NextTripNotPossible,
        None => TripStatus::NoLongerPossible,
    }
}
