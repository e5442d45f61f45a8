//! Shared builders and collaborator doubles for unit tests.

use crate::geo::Coordinates;
use crate::instruction::Locale;
use crate::monitor::{
    ActiveDays, Attachment, MonitoredTrip, NotificationError, NotificationPreferences,
    NotificationSender, User,
};
use crate::planner::{
    Alert, Itinerary, Leg, PlanRequest, PlanResponse, PlannerError, PlannerErrorBody, Place,
    Step, TripPlanner,
};
use crate::segment::{InteractionError, InteractionHandler, SegmentAction};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use chrono_tz::{America::New_York, Tz};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

pub const TRIP_ID: &str = "trip-1";
pub const USER_ID: &str = "user-1";

const MINUTE_MS: i64 = 60_000;

pub fn new_york(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Tz> {
    New_York
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .unwrap()
}

pub fn place(name: &str, lat: f64, lon: f64, stop_id: Option<&str>) -> Place {
    Place {
        name: name.to_string(),
        lat,
        lon,
        stop_id: stop_id.map(str::to_string),
    }
}

pub fn alert(header: &str) -> Alert {
    Alert {
        alert_header_text: Some(header.to_string()),
        alert_description_text: None,
        alert_url: None,
        effective_start_date: None,
    }
}

fn step(relative: &str, absolute: &str, street: &str, coordinates: Coordinates) -> Step {
    Step {
        distance: 0.0,
        relative_direction: relative.to_string(),
        absolute_direction: absolute.to_string(),
        street_name: street.to_string(),
        lat: coordinates.lat,
        lon: coordinates.lon,
    }
}

fn leg(mode: &str, from: Place, to: Place, start: i64, end: i64) -> Leg {
    Leg {
        mode: mode.to_string(),
        transit_leg: mode != "WALK",
        route: None,
        route_id: None,
        headsign: None,
        from,
        to,
        start_time: start,
        end_time: end,
        departure_delay: 0,
        arrival_delay: 0,
        real_time: false,
        intermediate_stops: vec![],
        steps: vec![],
        alerts: vec![],
    }
}

pub fn home() -> Place {
    place("Home", 33.9500, -83.9900, None)
}

pub fn boarding_stop() -> Place {
    place("Crogan St & Perry St", 33.9510, -83.9890, Some("GCT:100"))
}

pub fn alighting_stop() -> Place {
    place("Lawrenceville Library", 33.9610, -83.9790, Some("GCT:200"))
}

pub fn office() -> Place {
    place("Office", 33.9615, -83.9790, None)
}

/// Walk five minutes, ride route 10 for twenty, walk five more.
pub fn sample_itinerary(start: i64) -> Itinerary {
    let bus_start = start + 5 * MINUTE_MS;
    let bus_end = start + 25 * MINUTE_MS;
    let end = start + 30 * MINUTE_MS;

    let mut first_walk = leg("WALK", home(), boarding_stop(), start, bus_start);
    first_walk.steps = vec![
        step("DEPART", "NORTH", "Perry Street", home().coordinates()),
        step(
            "RIGHT",
            "EAST",
            "Crogan Street",
            Coordinates::new(33.9510, -83.9900),
        ),
    ];

    let mut bus = leg("BUS", boarding_stop(), alighting_stop(), bus_start, bus_end);
    bus.route = Some("10".to_string());
    bus.route_id = Some("GCT:10".to_string());
    bus.intermediate_stops = vec![
        place("Stop 1", 33.9535, -83.9865, Some("GCT:101")),
        place("Stop 2", 33.9560, -83.9840, Some("GCT:102")),
        place("Stop 3", 33.9585, -83.9815, Some("GCT:103")),
    ];

    let mut last_walk = leg("WALK", alighting_stop(), office(), bus_end, end);
    last_walk.steps = vec![step(
        "DEPART",
        "NORTH",
        "Clayton Street",
        alighting_stop().coordinates(),
    )];

    Itinerary {
        start_time: start,
        end_time: end,
        legs: vec![first_walk, bus, last_walk],
    }
}

/// Puts the given alerts on the transit leg.
pub fn with_alerts(mut itinerary: Itinerary, headers: &[&str]) -> Itinerary {
    itinerary.legs[1].alerts = headers.iter().map(|header| alert(header)).collect();
    itinerary
}

pub fn sample_trip() -> MonitoredTrip {
    MonitoredTrip {
        id: TRIP_ID.to_string(),
        user_id: USER_ID.to_string(),
        trip_name: None,
        is_active: true,
        from: home(),
        to: office(),
        trip_time: "08:30".to_string(),
        arrive_by: false,
        modes: vec!["WALK".to_string(), "TRANSIT".to_string()],
        days: ActiveDays::weekdays(),
        preferences: NotificationPreferences::default(),
        itinerary: None,
    }
}

pub fn sample_user(channel: &str) -> User {
    User {
        id: USER_ID.to_string(),
        email: Some("rider@example.com".to_string()),
        phone_number: Some("+14045550100".to_string()),
        notification_channel: channel.to_string(),
        locale: Locale::En,
    }
}

pub enum Scripted {
    Itineraries(Vec<Itinerary>),
    PlannerMessage(&'static str),
    Unavailable(u16),
    Hang,
}

/// Answers every plan request from a script that tests can swap.
pub struct StaticPlanner {
    script: Mutex<Scripted>,
    requests: Mutex<Vec<PlanRequest>>,
}

impl StaticPlanner {
    pub fn new(script: Scripted) -> Self {
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(itinerary: Itinerary) -> Self {
        Self::new(Scripted::Itineraries(vec![itinerary]))
    }

    pub fn set_script(&self, script: Scripted) {
        *self.script.lock().unwrap() = script;
    }

    pub fn requests(&self) -> Vec<PlanRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TripPlanner for StaticPlanner {
    async fn plan(&self, request: &PlanRequest) -> Result<PlanResponse, PlannerError> {
        self.requests.lock().unwrap().push(request.clone());
        let (answer, hang) = match &*self.script.lock().unwrap() {
            Scripted::Itineraries(itineraries) => (
                Ok(PlanResponse::with_itineraries(itineraries.clone())),
                false,
            ),
            Scripted::PlannerMessage(message) => (
                Ok(PlanResponse {
                    plan: None,
                    error: Some(PlannerErrorBody {
                        id: Some(404),
                        msg: None,
                        message: Some(message.to_string()),
                    }),
                }),
                false,
            ),
            Scripted::Unavailable(status) => {
                (Err(PlannerError::Unavailable { status: *status }), false)
            }
            Scripted::Hang => (Ok(PlanResponse::default()), true),
        };
        if hang {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        answer
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sms {
        phone_number: String,
        body: String,
    },
    Email {
        address: String,
        subject: String,
        body: String,
    },
}

/// Records deliveries. SMS always fails when built with `rejecting_sms`.
#[derive(Default)]
pub struct RecordingSender {
    deliveries: Mutex<Vec<Delivery>>,
    reject_sms: bool,
}

impl RecordingSender {
    pub fn rejecting_sms() -> Self {
        Self {
            reject_sms: true,
            ..Self::default()
        }
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send_sms(&self, phone_number: &str, body: &str) -> Result<(), NotificationError> {
        if self.reject_sms {
            return Err(NotificationError::Delivery {
                channel: "sms",
                reason: "carrier rejected the message".to_string(),
            });
        }
        self.deliveries.lock().unwrap().push(Delivery::Sms {
            phone_number: phone_number.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    async fn send_email(
        &self,
        address: &str,
        subject: &str,
        body: &str,
        _attachments: &[Attachment],
    ) -> Result<(), NotificationError> {
        self.deliveries.lock().unwrap().push(Delivery::Email {
            address: address.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Reports each triggered `(action id, user id)` on a channel.
pub struct RecordingInteractions {
    triggered: mpsc::UnboundedSender<(String, String)>,
    fail: bool,
}

impl RecordingInteractions {
    pub fn new(fail: bool) -> (Self, mpsc::UnboundedReceiver<(String, String)>) {
        let (triggered, receiver) = mpsc::unbounded_channel();
        (Self { triggered, fail }, receiver)
    }
}

#[async_trait]
impl InteractionHandler for RecordingInteractions {
    async fn trigger(&self, action: &SegmentAction, user_id: &str) -> Result<(), InteractionError> {
        let _ = self
            .triggered
            .send((action.id.clone(), user_id.to_string()));
        if self.fail {
            return Err(InteractionError::Rejected { status: 503 });
        }
        Ok(())
    }
}
