//! Rider-facing navigation instructions.
//!
//! One instruction is built per position update and rendered straight away.
//! Every builder here is a pure function of its inputs, so callers may rebuild
//! on every tick.

pub mod text;

pub use text::{minutes_phrase, Locale};

use crate::geo::RadiusThresholds;
use chrono::TimeZone;
use chrono_tz::Tz;

pub const NO_INSTRUCTION: &str = "NO_INSTRUCTION";

const ON_TIME_TOLERANCE_MS: i64 = 60_000;

/// Only `OnTrack` is suppressed to [`NO_INSTRUCTION`] beyond the upcoming
/// radius. Every other kind renders regardless of distance.
#[derive(Debug, Clone, PartialEq)]
pub enum TripInstruction {
    OnTrack(OnTrackInstruction),
    Deviated(DeviatedInstruction),
    WaitForTransit(WaitForTransitInstruction),
    TransitLegSummary(TransitLegSummaryInstruction),
    GetOff(GetOffInstruction),
}

impl TripInstruction {
    pub fn render(&self, locale: Locale) -> String {
        match self {
            Self::OnTrack(instruction) => instruction.render(locale),
            Self::Deviated(instruction) => instruction.render(locale),
            Self::WaitForTransit(instruction) => instruction.render(locale),
            Self::TransitLegSummary(instruction) => instruction.render(locale),
            Self::GetOff(instruction) => instruction.render(locale),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepDirections {
    pub relative_direction: String,
    pub absolute_direction: String,
    pub street_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OnTrackReference {
    Step(StepDirections),
    /// End of the current leg; `is_final` when it is the end of the whole trip.
    Destination { name: String, is_final: bool },
}

/// Turn-by-turn guidance while walking along the planned path.
#[derive(Debug, Clone, PartialEq)]
pub struct OnTrackInstruction {
    pub distance: f64,
    pub thresholds: RadiusThresholds,
    pub reference: OnTrackReference,
}

impl OnTrackInstruction {
    pub fn has_instruction(&self) -> bool {
        self.distance <= self.thresholds.upcoming_radius
    }

    fn prefix(&self) -> &'static str {
        if self.distance <= self.thresholds.immediate_radius {
            match self.reference {
                OnTrackReference::Destination { is_final: true, .. } => "ARRIVED:",
                _ => "IMMEDIATE:",
            }
        } else {
            "UPCOMING:"
        }
    }

    fn body(&self, locale: Locale) -> String {
        match &self.reference {
            OnTrackReference::Destination { name, .. } => name.clone(),
            OnTrackReference::Step(step) if step.relative_direction == "DEPART" => {
                let heading = text::absolute_direction(&step.absolute_direction, locale);
                match locale {
                    Locale::En => format!("Head {} on {}", heading, step.street_name),
                    Locale::Es => format!("Diríjase al {} por {}", heading, step.street_name),
                }
            }
            OnTrackReference::Step(step) => {
                let turn = text::relative_direction(&step.relative_direction, locale);
                match locale {
                    Locale::En => format!("{} on {}", turn, step.street_name),
                    Locale::Es => format!("{} en {}", turn, step.street_name),
                }
            }
        }
    }

    pub fn render(&self, locale: Locale) -> String {
        if !self.has_instruction() {
            return NO_INSTRUCTION.to_string();
        }
        format!("{} {}", self.prefix(), self.body(locale))
    }
}

/// The traveler has strayed off the planned path.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviatedInstruction {
    pub reference_location: String,
}

impl DeviatedInstruction {
    pub fn render(&self, locale: Locale) -> String {
        match locale {
            Locale::En => format!("Head to {}", self.reference_location),
            Locale::Es => format!("Diríjase a {}", self.reference_location),
        }
    }
}

/// Waiting at the boarding stop for a transit vehicle. Times are epoch millis.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitForTransitInstruction {
    pub route: String,
    pub scheduled_departure: i64,
    pub expected_departure: i64,
    pub now: i64,
    pub time_zone: Tz,
}

impl WaitForTransitInstruction {
    pub fn minutes_until_departure(&self) -> i64 {
        (self.scheduled_departure - self.now).div_euclid(60_000)
    }

    fn departure_status(&self, locale: Locale) -> String {
        let offset = self.expected_departure - self.scheduled_departure;
        let minutes = offset.abs() / 60_000;
        let phrase = match minutes_phrase(minutes, locale) {
            Some(phrase) if offset.abs() > ON_TIME_TOLERANCE_MS => phrase,
            _ => {
                return match locale {
                    Locale::En => "on time".to_string(),
                    Locale::Es => "a tiempo".to_string(),
                }
            }
        };
        match (locale, offset > 0) {
            (Locale::En, true) => format!("{phrase} late"),
            (Locale::En, false) => format!("{phrase} early"),
            (Locale::Es, true) => format!("{phrase} tarde"),
            (Locale::Es, false) => format!("{phrase} antes"),
        }
    }

    fn scheduled_clock_time(&self, locale: Locale) -> String {
        let pattern = match locale {
            Locale::En => "%-I:%M %p",
            Locale::Es => "%H:%M",
        };
        self.time_zone
            .timestamp_millis_opt(self.scheduled_departure)
            .single()
            .map(|time| time.format(pattern).to_string())
            .unwrap_or_default()
    }

    pub fn render(&self, locale: Locale) -> String {
        let wait = minutes_phrase(self.minutes_until_departure(), locale);
        let clock = self.scheduled_clock_time(locale);
        let status = self.departure_status(locale);

        match (locale, wait) {
            (Locale::En, Some(wait)) => format!(
                "Wait {wait} for your bus, route {}, scheduled at {clock}, {status}",
                self.route
            ),
            (Locale::En, None) => format!(
                "Wait for your bus, route {}, scheduled at {clock}, {status}",
                self.route
            ),
            (Locale::Es, Some(wait)) => format!(
                "Espere {wait} su autobús, ruta {}, programado a las {clock}, {status}",
                self.route
            ),
            (Locale::Es, None) => format!(
                "Espere su autobús, ruta {}, programado a las {clock}, {status}",
                self.route
            ),
        }
    }
}

/// Shown once aboard: how long and how many stops until alighting.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitLegSummaryInstruction {
    pub duration_secs: i64,
    pub intermediate_stop_count: usize,
    pub destination: String,
}

impl TransitLegSummaryInstruction {
    pub fn render(&self, locale: Locale) -> String {
        // floor, to agree with ride durations shown elsewhere
        let minutes = self.duration_secs.max(0) / 60;
        // the alighting stop counts as a stop
        let stops = self.intermediate_stop_count + 1;
        match locale {
            Locale::En => format!("Ride {minutes} min / {stops} stops to {}", self.destination),
            Locale::Es => format!(
                "Viaje {minutes} min / {stops} paradas hasta {}",
                self.destination
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetOffStage {
    Soon,
    NextStop,
    Here,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetOffInstruction {
    pub stage: GetOffStage,
    pub stop_name: String,
}

impl GetOffInstruction {
    pub fn render(&self, locale: Locale) -> String {
        let stop = &self.stop_name;
        match (locale, self.stage) {
            (Locale::En, GetOffStage::Here) => format!("Get off here ({stop})"),
            (Locale::En, GetOffStage::NextStop) => format!("Get off at the next stop ({stop})"),
            (Locale::En, GetOffStage::Soon) => format!("Get off soon ({stop})"),
            (Locale::Es, GetOffStage::Here) => format!("Bájese aquí ({stop})"),
            (Locale::Es, GetOffStage::NextStop) => format!("Bájese en la próxima parada ({stop})"),
            (Locale::Es, GetOffStage::Soon) => format!("Prepárese para bajar ({stop})"),
        }
    }
}
