use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("trip planner answered with status {status}")]
    Unavailable { status: u16 },

    #[error("trip planner request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Reasons the planner gives for not returning a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorKind {
    PathNotFound,
    NoTransitTimes,
    OutsideBounds,
    LocationNotAccessible,
    TooClose,
    UnderspecifiedTrip,
    SystemError,
    Unknown,
}

impl PlannerErrorKind {
    pub fn from_message(message: &str) -> Self {
        match message {
            "PATH_NOT_FOUND" | "NO_TRANSIT_CONNECTION" => Self::PathNotFound,
            "NO_TRANSIT_TIMES" => Self::NoTransitTimes,
            "OUTSIDE_BOUNDS" | "OUTSIDE_SERVICE_PERIOD" => Self::OutsideBounds,
            "LOCATION_NOT_ACCESSIBLE" => Self::LocationNotAccessible,
            "TOO_CLOSE" => Self::TooClose,
            "UNDERSPECIFIED_TRIP" => Self::UnderspecifiedTrip,
            "SYSTEM_ERROR" | "GRAPH_UNAVAILABLE" | "REQUEST_TIMEOUT" => Self::SystemError,
            _ => Self::Unknown,
        }
    }

    /// A service-side failure: the trip may well be possible, we just
    /// could not find out this time.
    pub fn is_service_failure(self) -> bool {
        matches!(self, Self::SystemError)
    }

    pub fn user_message(self) -> &'static str {
        match self {
            Self::PathNotFound => "No trip found for the requested origin and destination.",
            Self::NoTransitTimes => "No transit service is scheduled at the requested time.",
            Self::OutsideBounds => "The trip is outside the area or dates covered by the planner.",
            Self::LocationNotAccessible => "The origin or destination is not accessible.",
            Self::TooClose => "Origin and destination are too close to plan a trip.",
            Self::UnderspecifiedTrip => "The trip is missing an origin or destination.",
            Self::SystemError => "The trip planner is temporarily unavailable.",
            Self::Unknown => "The trip could not be planned.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_planner_messages() {
        assert_eq!(
            PlannerErrorKind::from_message("PATH_NOT_FOUND"),
            PlannerErrorKind::PathNotFound
        );
        assert!(PlannerErrorKind::from_message("SYSTEM_ERROR").is_service_failure());
        assert!(!PlannerErrorKind::from_message("NO_TRANSIT_TIMES").is_service_failure());
        assert_eq!(
            PlannerErrorKind::from_message("SOMETHING_NEW"),
            PlannerErrorKind::Unknown
        );
    }
}
