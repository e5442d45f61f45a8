use crate::planner::{PlannerError, PlannerErrorKind};
use crate::store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Why a check cycle was aborted. Journey state is never written when one of
/// these is returned.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("monitored trip {0} not found")]
    TripNotFound(String),

    #[error("user {user_id} of monitored trip {trip_id} not found")]
    UserNotFound { trip_id: String, user_id: String },

    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error("trip planner did not answer within {0:?}")]
    PlannerTimeout(Duration),

    #[error("trip planner failed: {}", .0.user_message())]
    PlannerFailure(PlannerErrorKind),

    #[error(transparent)]
    Store(#[from] StoreError),
}
