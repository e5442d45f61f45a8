pub mod client;
pub mod error;
pub mod types;

pub use client::{OtpPlanner, PlanRequest, TripPlanner};
pub use error::{PlannerError, PlannerErrorKind};
pub use types::*;
