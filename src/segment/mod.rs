//! Geofenced actions tied to short stretches of a route.

pub mod loader;
pub mod matcher;

pub use loader::{load_segment_actions, parse_segment_actions};
pub use matcher::{find_segment_action, trigger_segment_action, SEGMENT_MATCH_TOLERANCE_METERS};

use crate::geo::Segment;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// What happens when a traveler moves along an action's segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interaction {
    /// Request a walk phase from a connected pedestrian signal.
    PedestrianSignal { signal_id: String },
    /// Tell the operator of an approaching bus that a rider is waiting.
    BusOperator { route_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentAction {
    pub id: String,
    pub segment: Segment,
    pub interaction: Interaction,
}

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("interaction endpoint answered with status {status}")]
    Rejected { status: u16 },

    #[error("interaction request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait InteractionHandler: Send + Sync {
    async fn trigger(&self, action: &SegmentAction, user_id: &str) -> Result<(), InteractionError>;
}

/// Used when no interaction endpoint is configured.
pub struct LogInteractionHandler;

#[async_trait]
impl InteractionHandler for LogInteractionHandler {
    async fn trigger(&self, action: &SegmentAction, user_id: &str) -> Result<(), InteractionError> {
        info!(
            action_id = %action.id,
            %user_id,
            interaction = ?action.interaction,
            "segment interaction triggered"
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct InteractionPayload<'a> {
    action_id: &'a str,
    user_id: &'a str,
    #[serde(flatten)]
    interaction: &'a Interaction,
}

/// Posts each triggered interaction as JSON to an external endpoint.
pub struct WebhookInteractionHandler {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookInteractionHandler {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, InteractionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl InteractionHandler for WebhookInteractionHandler {
    async fn trigger(&self, action: &SegmentAction, user_id: &str) -> Result<(), InteractionError> {
        let payload = InteractionPayload {
            action_id: &action.id,
            user_id,
            interaction: &action.interaction,
        };
        debug!(endpoint = %self.endpoint, action_id = %action.id, "posting interaction");

        let response = self.client.post(&self.endpoint).json(&payload).send().await?;
        let status = response.status().as_u16();
        if status >= 400 {
            return Err(InteractionError::Rejected { status });
        }
        Ok(())
    }
}
