//! Periodic re-evaluation of saved trips and the notifications it produces.

pub mod check;
pub mod diff;
pub mod error;
pub mod journey_state;
pub mod notify;
pub mod scheduler;
pub mod status;
pub mod trip;

pub use check::{should_skip_check, CheckMonitoredTrip, CheckOutcome};
pub use error::CheckError;
pub use journey_state::{JourneyState, TripStatus};
pub use notify::{
    dispatch_notifications, Attachment, LogNotificationSender, Notification, NotificationChannel,
    NotificationError, NotificationKind, NotificationSender,
};
pub use scheduler::{Scheduler, SingleFlight};
pub use status::classify_trip_status;
pub use trip::{ActiveDays, MonitoredTrip, NotificationPreferences, User};
