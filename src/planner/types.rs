use crate::geo::Coordinates;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub stop_id: Option<String>,
}

impl Place {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

/// Alerts are compared by value: two alerts with the same text are the same alert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(default)]
    pub alert_header_text: Option<String>,
    #[serde(default)]
    pub alert_description_text: Option<String>,
    #[serde(default)]
    pub alert_url: Option<String>,
    #[serde(default)]
    pub effective_start_date: Option<i64>,
}

impl Alert {
    pub fn summary(&self) -> &str {
        self.alert_header_text
            .as_deref()
            .or(self.alert_description_text.as_deref())
            .unwrap_or("Service alert")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(default)]
    pub distance: f64,
    pub relative_direction: String,
    pub absolute_direction: String,
    pub street_name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Step {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    pub mode: String,
    #[serde(default)]
    pub transit_leg: bool,
    /// Route short name as shown to riders.
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub route_id: Option<String>,
    #[serde(default)]
    pub headsign: Option<String>,
    pub from: Place,
    pub to: Place,
    pub start_time: i64,
    pub end_time: i64,
    /// Realtime offsets in seconds; zero when running to schedule.
    #[serde(default)]
    pub departure_delay: i64,
    #[serde(default)]
    pub arrival_delay: i64,
    #[serde(default)]
    pub real_time: bool,
    #[serde(default)]
    pub intermediate_stops: Vec<Place>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

/// What makes two legs "the same leg" when comparing itinerary shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegSignature<'a> {
    pub mode: &'a str,
    pub route: Option<&'a str>,
    pub from: &'a str,
    pub to: &'a str,
}

impl Leg {
    pub fn duration_secs(&self) -> i64 {
        (self.end_time - self.start_time) / 1000
    }

    pub fn scheduled_start_time(&self) -> i64 {
        self.start_time - self.departure_delay * 1000
    }

    pub fn scheduled_end_time(&self) -> i64 {
        self.end_time - self.arrival_delay * 1000
    }

    pub fn route_label(&self) -> &str {
        self.route
            .as_deref()
            .or(self.route_id.as_deref())
            .unwrap_or(&self.mode)
    }

    /// Leg path as the planner describes it: origin, each step, destination.
    pub fn path(&self) -> Vec<Coordinates> {
        std::iter::once(self.from.coordinates())
            .chain(self.steps.iter().map(Step::coordinates))
            .chain(std::iter::once(self.to.coordinates()))
            .collect()
    }

    pub fn signature(&self) -> LegSignature<'_> {
        LegSignature {
            mode: &self.mode,
            route: self.route_id.as_deref().or(self.route.as_deref()),
            from: self.from.stop_id.as_deref().unwrap_or(&self.from.name),
            to: self.to.stop_id.as_deref().unwrap_or(&self.to.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub start_time: i64,
    pub end_time: i64,
    pub legs: Vec<Leg>,
}

impl Itinerary {
    /// Alerts across all legs, first occurrence kept.
    pub fn alerts(&self) -> Vec<&Alert> {
        let mut alerts: Vec<&Alert> = Vec::new();
        for alert in self.legs.iter().flat_map(|leg| leg.alerts.iter()) {
            if !alerts.contains(&alert) {
                alerts.push(alert);
            }
        }
        alerts
    }

    pub fn scheduled_departure_time(&self) -> i64 {
        self.legs
            .first()
            .map(|leg| self.start_time - leg.departure_delay * 1000)
            .unwrap_or(self.start_time)
    }

    pub fn scheduled_arrival_time(&self) -> i64 {
        self.legs
            .last()
            .map(|leg| self.end_time - leg.arrival_delay * 1000)
            .unwrap_or(self.end_time)
    }

    pub fn is_active_at(&self, timestamp: i64) -> bool {
        timestamp >= self.start_time && timestamp <= self.end_time
    }

    pub fn leg_signatures(&self) -> Vec<LegSignature<'_>> {
        self.legs.iter().map(Leg::signature).collect()
    }

    pub fn destination(&self) -> Option<&Place> {
        self.legs.last().map(|leg| &leg.to)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripPlan {
    #[serde(default)]
    pub itineraries: Vec<Itinerary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerErrorBody {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub msg: Option<String>,
    /// Machine-readable reason, e.g. `PATH_NOT_FOUND`.
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanResponse {
    #[serde(default)]
    pub plan: Option<TripPlan>,
    #[serde(default)]
    pub error: Option<PlannerErrorBody>,
}

impl PlanResponse {
    pub fn with_itineraries(itineraries: Vec<Itinerary>) -> Self {
        Self {
            plan: Some(TripPlan { itineraries }),
            error: None,
        }
    }

    /// Only the first candidate is ever evaluated.
    pub fn into_first_itinerary(self) -> Option<Itinerary> {
        self.plan
            .and_then(|plan| plan.itineraries.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_planner_json() {
        let json = r#"{
            "plan": {
                "itineraries": [{
                    "startTime": 1718445600000,
                    "endTime": 1718447400000,
                    "legs": [{
                        "mode": "BUS",
                        "transitLeg": true,
                        "route": "10",
                        "routeId": "GCT:10",
                        "from": {"name": "Main St", "lat": 33.95, "lon": -83.98, "stopId": "GCT:1"},
                        "to": {"name": "Library", "lat": 33.96, "lon": -83.97, "stopId": "GCT:9"},
                        "startTime": 1718445600000,
                        "endTime": 1718447400000,
                        "departureDelay": 120,
                        "alerts": [{"alertHeaderText": "Detour on Main St"}]
                    }]
                }]
            }
        }"#;

        let response: PlanResponse = serde_json::from_str(json).unwrap();
        let itinerary = response.into_first_itinerary().unwrap();
        assert_eq!(itinerary.legs[0].route_label(), "10");
        assert_eq!(itinerary.alerts().len(), 1);
        assert_eq!(
            itinerary.scheduled_departure_time(),
            1718445600000 - 120_000
        );
        assert_eq!(itinerary.legs[0].duration_secs(), 1800);
    }

    #[test]
    fn alerts_are_deduplicated_by_value() {
        let alert = Alert {
            alert_header_text: Some("Elevator out".to_string()),
            alert_description_text: None,
            alert_url: None,
            effective_start_date: None,
        };
        let leg = Leg {
            mode: "WALK".to_string(),
            transit_leg: false,
            route: None,
            route_id: None,
            headsign: None,
            from: Place { name: "A".to_string(), lat: 0.0, lon: 0.0, stop_id: None },
            to: Place { name: "B".to_string(), lat: 0.0, lon: 0.001, stop_id: None },
            start_time: 0,
            end_time: 60_000,
            departure_delay: 0,
            arrival_delay: 0,
            real_time: false,
            intermediate_stops: vec![],
            steps: vec![],
            alerts: vec![alert.clone()],
        };
        let itinerary = Itinerary {
            start_time: 0,
            end_time: 120_000,
            legs: vec![leg.clone(), leg],
        };
        assert_eq!(itinerary.alerts(), vec![&alert]);
    }
}
