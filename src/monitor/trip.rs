use crate::instruction::Locale;
use crate::planner::{Itinerary, Place};
use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_TRIP_NAME: &str = "Trip";

const DEFAULT_VARIANCE_MINUTES: u32 = 15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveDays {
    #[serde(default)]
    pub monday: bool,
    #[serde(default)]
    pub tuesday: bool,
    #[serde(default)]
    pub wednesday: bool,
    #[serde(default)]
    pub thursday: bool,
    #[serde(default)]
    pub friday: bool,
    #[serde(default)]
    pub saturday: bool,
    #[serde(default)]
    pub sunday: bool,
}

impl ActiveDays {
    pub fn weekdays() -> Self {
        Self {
            monday: true,
            tuesday: true,
            wednesday: true,
            thursday: true,
            friday: true,
            ..Self::default()
        }
    }

    pub fn is_active_on(&self, day: Weekday) -> bool {
        match day {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    pub fn active_count(&self) -> usize {
        [
            self.monday,
            self.tuesday,
            self.wednesday,
            self.thursday,
            self.friday,
            self.saturday,
            self.sunday,
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    /// First active date on or after `from`.
    pub fn next_active_date(&self, from: NaiveDate) -> Option<NaiveDate> {
        (0..7)
            .filter_map(|offset| from.checked_add_days(Days::new(offset)))
            .find(|date| self.is_active_on(date.weekday()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    #[serde(default = "default_true")]
    pub notify_on_alert: bool,
    #[serde(default = "default_true")]
    pub notify_on_delay: bool,
    #[serde(default = "default_true")]
    pub notify_on_itinerary_change: bool,
    #[serde(default = "default_variance_minutes")]
    pub departure_variance_minutes_threshold: u32,
    #[serde(default = "default_variance_minutes")]
    pub arrival_variance_minutes_threshold: u32,
}

fn default_true() -> bool {
    true
}

fn default_variance_minutes() -> u32 {
    DEFAULT_VARIANCE_MINUTES
}

fn default_modes() -> Vec<String> {
    vec!["WALK".to_string(), "TRANSIT".to_string()]
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            notify_on_alert: true,
            notify_on_delay: true,
            notify_on_itinerary_change: true,
            departure_variance_minutes_threshold: default_variance_minutes(),
            arrival_variance_minutes_threshold: default_variance_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoredTrip {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub trip_name: Option<String>,
    /// Paused trips are left alone by the scheduler.
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub from: Place,
    pub to: Place,
    /// Local time of day, `HH:MM`.
    pub trip_time: String,
    #[serde(default)]
    pub arrive_by: bool,
    #[serde(default = "default_modes")]
    pub modes: Vec<String>,
    pub days: ActiveDays,
    #[serde(flatten)]
    pub preferences: NotificationPreferences,
    /// Latest itinerary snapshot written by the check job.
    #[serde(default)]
    pub itinerary: Option<Arc<Itinerary>>,
}

impl MonitoredTrip {
    pub fn display_name(&self) -> &str {
        self.trip_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_TRIP_NAME)
    }

    pub fn parsed_trip_time(&self) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(self.trip_time.trim(), "%H:%M")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    /// `sms`, `email` or `all`; anything else means no delivery.
    #[serde(default)]
    pub notification_channel: String,
    #[serde(default)]
    pub locale: Locale,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_trip_rolls_over_weekend() {
        let days = ActiveDays::weekdays();
        let saturday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let wednesday = NaiveDate::from_ymd_opt(2024, 6, 19).unwrap();

        assert_eq!(
            days.next_active_date(saturday),
            NaiveDate::from_ymd_opt(2024, 6, 17)
        );
        assert_eq!(days.next_active_date(wednesday), Some(wednesday));
        assert_eq!(days.active_count(), 5);
        assert_eq!(ActiveDays::default().next_active_date(saturday), None);
    }

    #[test]
    fn reads_trip_with_default_preferences() {
        let json = r#"{
            "id": "trip-1",
            "user_id": "user-1",
            "from": {"name": "Home", "lat": 33.95, "lon": -83.98},
            "to": {"name": "Work", "lat": 33.96, "lon": -83.97},
            "trip_time": "08:30",
            "days": {"monday": true, "friday": true}
        }"#;
        let trip: MonitoredTrip = serde_json::from_str(json).unwrap();

        assert!(trip.is_active);
        assert_eq!(trip.display_name(), DEFAULT_TRIP_NAME);
        assert_eq!(trip.preferences, NotificationPreferences::default());
        assert_eq!(trip.parsed_trip_time().unwrap(), NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert!(trip.days.is_active_on(Weekday::Fri));
        assert!(!trip.days.is_active_on(Weekday::Sat));
    }
}
