use super::journey::{TrackedJourney, TravelerPosition};
use crate::geo::{distance_between, distance_to_path, Coordinates, RadiusThresholds};
use crate::instruction::{
    DeviatedInstruction, GetOffInstruction, GetOffStage, Locale, OnTrackInstruction,
    OnTrackReference, StepDirections, TransitLegSummaryInstruction, TripInstruction,
    WaitForTransitInstruction, NO_INSTRUCTION,
};
use crate::monitor::status::itinerary_status;
use crate::monitor::TripStatus;
use crate::planner::Leg;
use crate::segment::{trigger_segment_action, InteractionHandler, SegmentAction};
use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_DEVIATION_TOLERANCE_METERS: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatorSettings {
    pub thresholds: RadiusThresholds,
    /// Farther than this from the leg path counts as off track.
    pub deviation_tolerance: f64,
    pub segment_tolerance: f64,
    pub time_zone: Tz,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelerResult {
    pub instruction: String,
    pub trip_status: TripStatus,
}

/// First leg still running at `now`, or the last leg once the trip is over.
fn active_leg(legs: &[Leg], now: i64) -> Option<usize> {
    legs.iter()
        .position(|leg| leg.end_time >= now)
        .or_else(|| legs.len().checked_sub(1))
}

fn transit_instruction(
    leg: &Leg,
    position: &Coordinates,
    now: i64,
    settings: &LocatorSettings,
) -> Option<TripInstruction> {
    if now < leg.start_time {
        return Some(TripInstruction::WaitForTransit(WaitForTransitInstruction {
            route: leg.route_label().to_string(),
            scheduled_departure: leg.scheduled_start_time(),
            expected_departure: leg.start_time,
            now,
            time_zone: settings.time_zone,
        }));
    }

    let get_off = |stage| {
        Some(TripInstruction::GetOff(GetOffInstruction {
            stage,
            stop_name: leg.to.name.clone(),
        }))
    };

    if distance_between(position, &leg.to.coordinates()) <= settings.thresholds.upcoming_radius {
        return get_off(GetOffStage::Here);
    }

    let stops: Vec<Coordinates> = std::iter::once(&leg.from)
        .chain(leg.intermediate_stops.iter())
        .chain(std::iter::once(&leg.to))
        .map(|place| place.coordinates())
        .collect();
    let nearest = stops
        .iter()
        .enumerate()
        .map(|(index, stop)| (index, distance_between(position, stop)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)?;
    let remaining = stops.len() - 1 - nearest;

    match remaining {
        0 | 1 => get_off(GetOffStage::NextStop),
        2 => get_off(GetOffStage::Soon),
        _ if nearest == 0 => Some(TripInstruction::TransitLegSummary(
            TransitLegSummaryInstruction {
                duration_secs: leg.duration_secs(),
                intermediate_stop_count: leg.intermediate_stops.len(),
                destination: leg.to.name.clone(),
            },
        )),
        _ => None,
    }
}

fn street_instruction(
    journey: &mut TrackedJourney,
    leg_index: usize,
    position: &Coordinates,
    settings: &LocatorSettings,
) -> Option<TripInstruction> {
    let itinerary = journey.itinerary.clone();
    let leg = &itinerary.legs[leg_index];
    let is_final = leg_index + 1 == itinerary.legs.len();
    let next_step = leg.steps.get(journey.step_for_leg(leg_index));

    let off_path = distance_to_path(position, &leg.path())
        .map(|distance| distance > settings.deviation_tolerance)
        .unwrap_or(false);
    if off_path {
        let reference_location = next_step
            .map(|step| step.street_name.clone())
            .unwrap_or_else(|| leg.to.name.clone());
        return Some(TripInstruction::Deviated(DeviatedInstruction {
            reference_location,
        }));
    }

    let instruction = match next_step {
        Some(step) => {
            let distance = distance_between(position, &step.coordinates());
            if distance <= settings.thresholds.immediate_radius {
                journey.advance_step(leg_index);
            }
            OnTrackInstruction {
                distance,
                thresholds: settings.thresholds,
                reference: OnTrackReference::Step(StepDirections {
                    relative_direction: step.relative_direction.clone(),
                    absolute_direction: step.absolute_direction.clone(),
                    street_name: step.street_name.clone(),
                }),
            }
        }
        None => OnTrackInstruction {
            distance: distance_between(position, &leg.to.coordinates()),
            thresholds: settings.thresholds,
            reference: OnTrackReference::Destination {
                name: leg.to.name.clone(),
                is_final,
            },
        },
    };
    Some(TripInstruction::OnTrack(instruction))
}

/// Picks the instruction for a traveler at `position`, moving the journey's
/// step cursor as steps are reached.
pub fn select_instruction(
    journey: &mut TrackedJourney,
    position: &Coordinates,
    now: i64,
    settings: &LocatorSettings,
) -> Option<TripInstruction> {
    let leg_index = active_leg(&journey.itinerary.legs, now)?;
    let itinerary = journey.itinerary.clone();
    let leg = &itinerary.legs[leg_index];

    if leg.transit_leg {
        transit_instruction(leg, position, now, settings)
    } else {
        street_instruction(journey, leg_index, position, settings)
    }
}

/// Turns position updates into rider instructions and segment interactions.
pub struct Locator {
    settings: LocatorSettings,
    actions: Arc<Vec<SegmentAction>>,
    interactions: Arc<dyn InteractionHandler>,
}

impl Locator {
    pub fn new(
        settings: LocatorSettings,
        actions: Arc<Vec<SegmentAction>>,
        interactions: Arc<dyn InteractionHandler>,
    ) -> Self {
        Self {
            settings,
            actions,
            interactions,
        }
    }

    pub fn settings(&self) -> &LocatorSettings {
        &self.settings
    }

    pub fn locate(
        &self,
        journey: &mut TrackedJourney,
        position: TravelerPosition,
        locale: Locale,
    ) -> TravelerResult {
        journey.add_position(position);
        let now = position.timestamp;

        if let Some(movement) = journey.movement_segment() {
            let user_id = journey.user_id.clone();
            if let Some(action_id) = trigger_segment_action(
                &movement,
                &self.actions,
                self.settings.segment_tolerance,
                &mut journey.notified_segments,
                self.interactions.clone(),
                &user_id,
            ) {
                info!(trip_id = %journey.trip_id, %action_id, "segment action triggered");
            }
        }

        let instruction = select_instruction(journey, &position.coordinates(), now, &self.settings)
            .map(|instruction| instruction.render(locale))
            .unwrap_or_else(|| NO_INSTRUCTION.to_string());
        debug!(trip_id = %journey.trip_id, %instruction, "located traveler");

        TravelerResult {
            instruction,
            trip_status: itinerary_status(now, &journey.itinerary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{
        boarding_stop, home, new_york, office, sample_itinerary, RecordingInteractions, TRIP_ID,
        USER_ID,
    };
    use crate::geo::Segment;
    use crate::segment::Interaction;

    const MINUTE_MS: i64 = 60_000;

    fn settings() -> LocatorSettings {
        LocatorSettings {
            thresholds: RadiusThresholds::default(),
            deviation_tolerance: DEFAULT_DEVIATION_TOLERANCE_METERS,
            segment_tolerance: 20.0,
            time_zone: chrono_tz::America::New_York,
        }
    }

    fn start() -> i64 {
        new_york(2024, 6, 17, 8, 30).timestamp_millis()
    }

    fn journey() -> TrackedJourney {
        TrackedJourney::new(TRIP_ID, USER_ID, Arc::new(sample_itinerary(start())))
    }

    fn rendered(journey: &mut TrackedJourney, at: Coordinates, now: i64) -> String {
        select_instruction(journey, &at, now, &settings())
            .map(|instruction| instruction.render(Locale::En))
            .unwrap_or_else(|| NO_INSTRUCTION.to_string())
    }

    #[test]
    fn walking_from_home_starts_with_depart_step() {
        let mut journey = journey();
        let text = rendered(&mut journey, home().coordinates(), start());
        assert_eq!(text, "IMMEDIATE: Head North on Perry Street");
        assert_eq!(journey.step_cursor.step, 1);
    }

    #[test]
    fn next_step_is_announced_when_close() {
        let mut journey = journey();
        journey.advance_step(0);
        // about 5.5 m south of the turn onto Crogan Street
        let near_turn = Coordinates::new(33.95095, -83.9900);
        let text = rendered(&mut journey, near_turn, start() + MINUTE_MS);
        assert_eq!(text, "UPCOMING: Right on Crogan Street");
    }

    #[test]
    fn far_from_step_gives_no_instruction() {
        let mut journey = journey();
        journey.advance_step(0);
        // on Perry Street, roughly 55 m before the turn
        let midway = Coordinates::new(33.9505, -83.9900);
        assert_eq!(
            rendered(&mut journey, midway, start() + MINUTE_MS),
            NO_INSTRUCTION
        );
    }

    #[test]
    fn leaving_the_path_is_reported() {
        let mut journey = journey();
        journey.advance_step(0);
        // a block west of Perry Street
        let off_path = Coordinates::new(33.9505, -83.9920);
        assert_eq!(
            rendered(&mut journey, off_path, start() + MINUTE_MS),
            "Head to Crogan Street"
        );
    }

    #[test]
    fn waiting_at_the_stop_before_the_bus() {
        let mut itinerary = sample_itinerary(start());
        itinerary.legs[0].end_time = start() + 3 * MINUTE_MS;
        let mut journey = TrackedJourney::new(TRIP_ID, USER_ID, Arc::new(itinerary));

        let text = rendered(
            &mut journey,
            boarding_stop().coordinates(),
            start() + 4 * MINUTE_MS,
        );
        assert_eq!(
            text,
            "Wait 1 minute for your bus, route 10, scheduled at 8:35 AM, on time"
        );
    }

    #[test]
    fn riding_toward_the_alighting_stop_escalates() {
        let mut journey = journey();
        let riding = start() + 10 * MINUTE_MS;

        assert_eq!(
            rendered(&mut journey, boarding_stop().coordinates(), riding),
            "Ride 20 min / 4 stops to Lawrenceville Library"
        );
        assert_eq!(
            rendered(&mut journey, Coordinates::new(33.9535, -83.9865), riding),
            NO_INSTRUCTION
        );
        assert_eq!(
            rendered(&mut journey, Coordinates::new(33.9560, -83.9840), riding),
            "Get off soon (Lawrenceville Library)"
        );
        assert_eq!(
            rendered(&mut journey, Coordinates::new(33.9585, -83.9815), riding),
            "Get off at the next stop (Lawrenceville Library)"
        );
        assert_eq!(
            rendered(&mut journey, Coordinates::new(33.9610, -83.9790), riding),
            "Get off here (Lawrenceville Library)"
        );
    }

    #[test]
    fn arriving_at_the_final_destination() {
        let mut journey = journey();
        let last_walk = start() + 27 * MINUTE_MS;
        journey.advance_step(2);
        assert_eq!(
            rendered(&mut journey, office().coordinates(), last_walk),
            "ARRIVED: Office"
        );
    }

    #[tokio::test]
    async fn locate_triggers_segment_actions_and_reports_status() {
        let (handler, mut triggered) = RecordingInteractions::new(false);
        let perry_street = SegmentAction {
            id: "perry-signal".to_string(),
            segment: Segment::new(home().coordinates(), Coordinates::new(33.9505, -83.9900)),
            interaction: Interaction::PedestrianSignal {
                signal_id: "PS-1".to_string(),
            },
        };
        let locator = Locator::new(settings(), Arc::new(vec![perry_street]), Arc::new(handler));
        let mut journey = journey();

        let first = locator.locate(
            &mut journey,
            TravelerPosition {
                lat: 33.9500,
                lon: -83.9900,
                timestamp: start(),
            },
            Locale::En,
        );
        assert_eq!(first.trip_status, TripStatus::TripActive);
        assert_eq!(first.instruction, "IMMEDIATE: Head North on Perry Street");

        locator.locate(
            &mut journey,
            TravelerPosition {
                lat: 33.9505,
                lon: -83.9900,
                timestamp: start() + 30_000,
            },
            Locale::En,
        );
        assert_eq!(
            triggered.recv().await,
            Some(("perry-signal".to_string(), USER_ID.to_string()))
        );
        assert!(journey.notified_segments.contains("perry-signal"));
    }

    #[test]
    fn status_is_upcoming_before_departure() {
        let locator = Locator::new(
            settings(),
            Arc::new(Vec::new()),
            Arc::new(crate::segment::LogInteractionHandler),
        );
        let mut journey = journey();
        let result = locator.locate(
            &mut journey,
            TravelerPosition {
                lat: 33.9500,
                lon: -83.9900,
                timestamp: start() - 10 * MINUTE_MS,
            },
            Locale::En,
        );
        assert_eq!(result.trip_status, TripStatus::TripUpcoming);
    }
}
