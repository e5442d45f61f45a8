use crate::monitor::{JourneyState, TripStatus};
use crate::planner::Itinerary;
use crate::store::{StoreError, TripStore};
use crate::tracking::{Locator, TrackingRegistry, TravelerPosition, TravelerResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TripStore>,
    pub registry: Arc<Mutex<TrackingRegistry>>,
    pub locator: Arc<Locator>,
}

impl AppState {
    pub fn new(store: Arc<dyn TripStore>, locator: Locator) -> Self {
        Self {
            store,
            registry: Arc::new(Mutex::new(TrackingRegistry::new())),
            locator: Arc::new(locator),
        }
    }
}

#[derive(Debug, Error)]
enum ApiError {
    #[error("monitored trip {0} not found")]
    TripNotFound(String),

    #[error("monitored trip {0} has not been checked yet")]
    NotChecked(String),

    #[error("monitored trip {0} has no itinerary to follow")]
    NoItinerary(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::TripNotFound(_) | Self::NotChecked(_) => StatusCode::NOT_FOUND,
            Self::NoItinerary(_) => StatusCode::CONFLICT,
            Self::Store(err) => {
                error!(error = %err, "store failure while serving request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TripStatusResponse {
    trip_id: String,
    trip_status: Option<TripStatus>,
    target_date: Option<NaiveDate>,
    last_checked_time: Option<i64>,
    matching_itinerary: Option<Arc<Itinerary>>,
}

impl From<JourneyState> for TripStatusResponse {
    fn from(state: JourneyState) -> Self {
        Self {
            trip_id: state.trip_id,
            trip_status: state.trip_status,
            target_date: state.target_date,
            last_checked_time: state.last_checked_time,
            matching_itinerary: state.matching_itinerary,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/monitored-trips/:trip_id/status", get(trip_status))
        .route("/monitored-trips/:trip_id/track", post(track_traveler))
        .with_state(state)
}

pub async fn run_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    info!(%addr, "starting http server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Last persisted evaluation of a trip. Never triggers a check.
async fn trip_status(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<Json<TripStatusResponse>, ApiError> {
    let journey_state = state
        .store
        .get_journey_state(&trip_id)
        .await?
        .ok_or(ApiError::NotChecked(trip_id))?;
    Ok(Json(journey_state.into()))
}

async fn track_traveler(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    Json(position): Json<TravelerPosition>,
) -> Result<Json<TravelerResult>, ApiError> {
    let trip = state
        .store
        .get_trip(&trip_id)
        .await?
        .ok_or_else(|| ApiError::TripNotFound(trip_id.clone()))?;

    let itinerary = match state.store.get_journey_state(&trip_id).await? {
        Some(JourneyState {
            matching_itinerary: Some(itinerary),
            ..
        }) => itinerary,
        _ => trip
            .itinerary
            .clone()
            .ok_or_else(|| ApiError::NoItinerary(trip_id.clone()))?,
    };

    let locale = state
        .store
        .get_user(&trip.user_id)
        .await?
        .map(|user| user.locale)
        .unwrap_or_default();

    let mut registry = state.registry.lock().await;
    let evicted = registry.evict_stale(Utc::now().timestamp_millis());
    if evicted > 0 {
        debug!(evicted, tracked = registry.len(), "evicted stale journeys");
    }
    let journey = registry.get_or_start(&trip.id, &trip.user_id, itinerary);
    Ok(Json(state.locator.locate(journey, position, locale)))
}
