use super::diff::{check_alerts, check_delay, check_itinerary_shape, DelayKind};
use super::error::CheckError;
use super::journey_state::{JourneyState, TripStatus};
use super::notify::{dispatch_notifications, Notification, NotificationKind, NotificationSender};
use super::status::classify_trip_status;
use super::trip::MonitoredTrip;
use crate::planner::{Itinerary, PlanRequest, PlannerErrorKind, TripPlanner};
use crate::store::TripStore;
use chrono::{DateTime, Datelike};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Skipped,
    Checked {
        journey_state: JourneyState,
        notifications: Vec<Notification>,
    },
}

/// A check is pointless when the trip does not run today and today's trip
/// time is already behind us. An unreadable trip time never skips.
pub fn should_skip_check(trip: &MonitoredTrip, now: &DateTime<Tz>) -> bool {
    let trip_time = match trip.parsed_trip_time() {
        Ok(trip_time) => trip_time,
        Err(err) => {
            warn!(
                trip_id = %trip.id,
                trip_time = %trip.trip_time,
                error = %err,
                "could not parse trip time, checking anyway"
            );
            return false;
        }
    };

    !trip.days.is_active_on(now.weekday()) && now.time() > trip_time
}

pub struct CheckMonitoredTrip {
    planner: Arc<dyn TripPlanner>,
    store: Arc<dyn TripStore>,
    notifier: Arc<dyn NotificationSender>,
    planner_timeout: Duration,
}

impl CheckMonitoredTrip {
    pub fn new(
        planner: Arc<dyn TripPlanner>,
        store: Arc<dyn TripStore>,
        notifier: Arc<dyn NotificationSender>,
        planner_timeout: Duration,
    ) -> Self {
        Self {
            planner,
            store,
            notifier,
            planner_timeout,
        }
    }

    /// Evaluates `trip` against a fresh plan. Pure with respect to the store:
    /// the caller decides what to persist.
    pub async fn check(
        &self,
        trip: &MonitoredTrip,
        previous: Option<&JourneyState>,
        now: DateTime<Tz>,
    ) -> Result<CheckOutcome, CheckError> {
        if should_skip_check(trip, &now) {
            debug!(trip_id = %trip.id, "no occurrence left today, skipping");
            return Ok(CheckOutcome::Skipped);
        }
        self.evaluate(trip, previous, now).await
    }

    /// `check` once the skip decision has been made.
    async fn evaluate(
        &self,
        trip: &MonitoredTrip,
        previous: Option<&JourneyState>,
        now: DateTime<Tz>,
    ) -> Result<CheckOutcome, CheckError> {
        let now_ms = now.timestamp_millis();
        let mut state = previous
            .cloned()
            .unwrap_or_else(|| JourneyState::new(&trip.id));

        let Some(target_date) = trip.days.next_active_date(now.date_naive()) else {
            info!(trip_id = %trip.id, "trip has no active day");
            let notifications = record_not_possible(&mut state, trip, now_ms, None);
            return Ok(CheckOutcome::Checked {
                journey_state: state,
                notifications,
            });
        };

        if state.roll_over(target_date) {
            info!(trip_id = %trip.id, %target_date, "journey state moved to next occurrence");
        }

        let request = PlanRequest::for_trip(trip, target_date);
        let response = tokio::time::timeout(self.planner_timeout, self.planner.plan(&request))
            .await
            .map_err(|_| CheckError::PlannerTimeout(self.planner_timeout))??;

        let planner_error = response
            .error
            .as_ref()
            .and_then(|body| body.message.as_deref())
            .map(PlannerErrorKind::from_message);
        if let Some(kind) = planner_error.filter(|kind| kind.is_service_failure()) {
            return Err(CheckError::PlannerFailure(kind));
        }

        let Some(itinerary) = response.into_first_itinerary() else {
            let notifications = record_not_possible(&mut state, trip, now_ms, planner_error);
            return Ok(CheckOutcome::Checked {
                journey_state: state,
                notifications,
            });
        };

        let itinerary = Arc::new(itinerary);
        let previous_itinerary = state.matching_itinerary.clone();
        let notifications =
            collect_notifications(trip, &mut state, previous_itinerary.as_deref(), &itinerary);

        state.trip_status = Some(classify_trip_status(
            now_ms,
            Some(itinerary.as_ref()),
            &trip.days,
        ));
        state.record_itinerary(itinerary);
        state.last_checked_time = Some(now_ms);
        state.last_notifications = notifications.iter().map(|n| n.kind).collect();

        Ok(CheckOutcome::Checked {
            journey_state: state,
            notifications,
        })
    }

    /// Loads the trip, checks it, persists the new journey state and the
    /// itinerary snapshot, then notifies the user.
    pub async fn check_and_persist(
        &self,
        trip_id: &str,
        now: DateTime<Tz>,
    ) -> Result<CheckOutcome, CheckError> {
        let mut trip = self
            .store
            .get_trip(trip_id)
            .await?
            .ok_or_else(|| CheckError::TripNotFound(trip_id.to_string()))?;

        if should_skip_check(&trip, &now) {
            debug!(%trip_id, "no occurrence left today, skipping");
            return Ok(CheckOutcome::Skipped);
        }

        let user = self
            .store
            .get_user(&trip.user_id)
            .await?
            .ok_or_else(|| CheckError::UserNotFound {
                trip_id: trip.id.clone(),
                user_id: trip.user_id.clone(),
            })?;

        let previous = self.store.get_journey_state(trip_id).await?;
        let outcome = self.evaluate(&trip, previous.as_ref(), now).await?;

        if let CheckOutcome::Checked {
            journey_state,
            notifications,
        } = &outcome
        {
            self.store.replace_journey_state(journey_state.clone()).await?;

            if let Some(itinerary) = &journey_state.matching_itinerary {
                if trip.itinerary.as_ref() != Some(itinerary) {
                    trip.itinerary = Some(itinerary.clone());
                    self.store.replace_trip(trip.clone()).await?;
                }
            }

            info!(
                %trip_id,
                status = journey_state.trip_status.map(TripStatus::as_str).unwrap_or("UNKNOWN"),
                notifications = notifications.len(),
                "trip checked"
            );

            match dispatch_notifications(self.notifier.as_ref(), &user, &trip, notifications).await
            {
                Ok(0) => {}
                Ok(sent) => info!(%trip_id, sent, "notifications sent"),
                Err(err) => error!(%trip_id, error = %err, "failed to deliver notifications"),
            }
        }

        Ok(outcome)
    }
}

fn collect_notifications(
    trip: &MonitoredTrip,
    state: &mut JourneyState,
    previous: Option<&Itinerary>,
    current: &Itinerary,
) -> Vec<Notification> {
    let preferences = &trip.preferences;
    let mut notifications = Vec::new();

    if preferences.notify_on_alert {
        notifications.extend(check_alerts(previous, current));
    }

    if preferences.notify_on_delay {
        notifications.extend(check_delay(
            DelayKind::Departure,
            current.start_time,
            current.scheduled_departure_time(),
            &mut state.baseline_departure_time,
            preferences.departure_variance_minutes_threshold,
        ));
        notifications.extend(check_delay(
            DelayKind::Arrival,
            current.end_time,
            current.scheduled_arrival_time(),
            &mut state.baseline_arrival_time,
            preferences.arrival_variance_minutes_threshold,
        ));
    }

    if preferences.notify_on_itinerary_change {
        notifications.extend(check_itinerary_shape(previous, current));
    }

    notifications
}

/// The planner found nothing for the target date. The matching itinerary is
/// kept; the user hears about it only when the status changes.
fn record_not_possible(
    state: &mut JourneyState,
    trip: &MonitoredTrip,
    now_ms: i64,
    reason: Option<PlannerErrorKind>,
) -> Vec<Notification> {
    let status = classify_trip_status(now_ms, None, &trip.days);
    let changed = state.trip_status != Some(status);
    state.trip_status = Some(status);
    state.last_checked_time = Some(now_ms);

    let mut notifications = Vec::new();
    if changed {
        let mut body = match (status, state.target_date) {
            (TripStatus::NextTripNotPossible, Some(date)) => format!(
                "Your trip is not possible on {}.",
                date.format("%A, %B %-d")
            ),
            (TripStatus::NextTripNotPossible, None) => "Your next trip is not possible.".to_string(),
            _ => "Your trip is no longer possible.".to_string(),
        };
        if let Some(reason) = reason {
            body.push(' ');
            body.push_str(reason.user_message());
        }
        notifications.push(Notification::new(NotificationKind::TripNotPossible, body));
    }

    state.last_notifications = notifications.iter().map(|n| n.kind).collect();
    notifications
}
