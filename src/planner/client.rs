use super::{PlanResponse, PlannerError};
use crate::monitor::MonitoredTrip;
use crate::planner::Place;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub from: Place,
    pub to: Place,
    pub date: NaiveDate,
    /// Local time of day as configured on the trip, `HH:MM`.
    pub time: String,
    pub modes: Vec<String>,
    pub arrive_by: bool,
}

impl PlanRequest {
    pub fn for_trip(trip: &MonitoredTrip, date: NaiveDate) -> Self {
        Self {
            from: trip.from.clone(),
            to: trip.to.clone(),
            date,
            time: trip.trip_time.clone(),
            modes: trip.modes.clone(),
            arrive_by: trip.arrive_by,
        }
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("fromPlace", format!("{},{}", self.from.lat, self.from.lon)),
            ("toPlace", format!("{},{}", self.to.lat, self.to.lon)),
            ("date", self.date.format("%Y-%m-%d").to_string()),
            ("time", self.time.clone()),
            ("mode", self.modes.join(",")),
            ("arriveBy", self.arrive_by.to_string()),
        ]
    }
}

#[async_trait]
pub trait TripPlanner: Send + Sync {
    async fn plan(&self, request: &PlanRequest) -> Result<PlanResponse, PlannerError>;
}

/// Plans trips against an OpenTripPlanner-compatible `/plan` endpoint.
pub struct OtpPlanner {
    client: reqwest::Client,
    base_url: String,
}

impl OtpPlanner {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PlannerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TripPlanner for OtpPlanner {
    async fn plan(&self, request: &PlanRequest) -> Result<PlanResponse, PlannerError> {
        let url = format!("{}/plan", self.base_url);
        debug!(%url, date = %request.date, time = %request.time, "requesting plan");

        let response = self
            .client
            .get(&url)
            .query(&request.query_params())
            .send()
            .await?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(PlannerError::Unavailable { status });
        }

        Ok(response.json::<PlanResponse>().await?)
    }
}
