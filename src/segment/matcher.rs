use super::{InteractionHandler, SegmentAction};
use crate::geo::{segment_proximity, Segment};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error};

pub const SEGMENT_MATCH_TOLERANCE_METERS: f64 = 20.0;

/// Nearest action whose segment lies within `tolerance` metres of `segment`.
pub fn find_segment_action<'a>(
    segment: &Segment,
    actions: &'a [SegmentAction],
    tolerance: f64,
) -> Option<&'a SegmentAction> {
    actions
        .iter()
        .map(|action| (action, segment_proximity(segment, &action.segment)))
        .filter(|(_, distance)| *distance <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(action, _)| action)
}

/// Fires the matching action at most once per `notified` set. The interaction
/// runs on its own task. Returns the id of the action that was fired.
pub fn trigger_segment_action(
    segment: &Segment,
    actions: &[SegmentAction],
    tolerance: f64,
    notified: &mut HashSet<String>,
    handler: Arc<dyn InteractionHandler>,
    user_id: &str,
) -> Option<String> {
    let action = find_segment_action(segment, actions, tolerance)?;
    if !notified.insert(action.id.clone()) {
        debug!(action_id = %action.id, "segment action already triggered");
        return None;
    }

    let action = action.clone();
    let action_id = action.id.clone();
    let user_id = user_id.to_string();
    tokio::spawn(async move {
        if let Err(err) = handler.trigger(&action, &user_id).await {
            error!(action_id = %action.id, %user_id, error = %err, "segment interaction failed");
        }
    });

    Some(action_id)
}
