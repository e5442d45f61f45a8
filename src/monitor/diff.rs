use super::notify::{Notification, NotificationKind};
use crate::instruction::{minutes_phrase, Locale};
use crate::planner::{Alert, Itinerary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayKind {
    Departure,
    Arrival,
}

impl DelayKind {
    fn verb(self) -> &'static str {
        match self {
            Self::Departure => "depart",
            Self::Arrival => "arrive",
        }
    }

    fn notification_kind(self) -> NotificationKind {
        match self {
            Self::Departure => NotificationKind::DepartureDelay,
            Self::Arrival => NotificationKind::ArrivalDelay,
        }
    }
}

/// Alerts in `current` that are not in `previous`, compared by value.
/// With no previous alerts, every current alert is unseen.
pub fn unseen_alerts<'a>(previous: &[&Alert], current: &[&'a Alert]) -> Vec<&'a Alert> {
    current
        .iter()
        .filter(|alert| !previous.contains(*alert))
        .copied()
        .collect()
}

pub fn check_alerts(previous: Option<&Itinerary>, current: &Itinerary) -> Option<Notification> {
    let previous_alerts = previous.map(Itinerary::alerts).unwrap_or_default();
    let current_alerts = current.alerts();
    let unseen = unseen_alerts(&previous_alerts, &current_alerts);

    if unseen.is_empty() {
        return None;
    }

    let mut body = String::from("New alerts for your trip:");
    for alert in unseen {
        body.push_str("\n- ");
        body.push_str(alert.summary());
    }
    Some(Notification::new(NotificationKind::Alert, body))
}

/// Compares `current` against the last-notified `baseline` (which starts at
/// the scheduled time). Notifies once the gap reaches `threshold_minutes` and
/// moves the baseline to `current`, so the same delay is only reported once.
pub fn check_delay(
    kind: DelayKind,
    current: i64,
    scheduled: i64,
    baseline: &mut Option<i64>,
    threshold_minutes: u32,
) -> Option<Notification> {
    let reference = *baseline.get_or_insert(scheduled);
    let deviation = (current - reference).abs();
    let threshold = i64::from(threshold_minutes) * 60_000;

    if deviation == 0 || deviation < threshold {
        return None;
    }

    *baseline = Some(current);

    let offset = current - scheduled;
    let variance = match minutes_phrase(offset.abs() / 60_000, Locale::En) {
        Some(phrase) if offset > 0 => format!("{phrase} late"),
        Some(phrase) => format!("{phrase} early"),
        None => "on time".to_string(),
    };
    Some(Notification::new(
        kind.notification_kind(),
        format!("Your trip is now predicted to {} {}.", kind.verb(), variance),
    ))
}

/// Detects a change of route or leg composition between two checks.
pub fn check_itinerary_shape(
    previous: Option<&Itinerary>,
    current: &Itinerary,
) -> Option<Notification> {
    let previous = previous?;
    if previous.leg_signatures() == current.leg_signatures() {
        return None;
    }

    let routes = current
        .legs
        .iter()
        .filter(|leg| leg.transit_leg)
        .map(|leg| leg.route_label())
        .collect::<Vec<_>>();
    let body = if routes.is_empty() {
        "Your itinerary has changed.".to_string()
    } else {
        format!("Your itinerary has changed. It now uses route {}.", routes.join(", "))
    };
    Some(Notification::new(NotificationKind::ItineraryChanged, body))
}
