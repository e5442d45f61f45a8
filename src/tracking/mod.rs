pub mod journey;
pub mod locator;

pub use journey::{StepCursor, TrackedJourney, TrackingRegistry, TravelerPosition};
pub use locator::{
    select_instruction, Locator, LocatorSettings, TravelerResult,
    DEFAULT_DEVIATION_TOLERANCE_METERS,
};
