use super::{Interaction, SegmentAction};
use crate::geo::{Coordinates, Segment};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SegmentLoadError {
    #[error("could not read segment actions: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed segment action row: {0}")]
    Csv(#[from] csv::Error),

    #[error("segment action {id} has unknown interaction {interaction:?}")]
    UnknownInteraction { id: String, interaction: String },
}

#[derive(Debug, Deserialize)]
struct SegmentActionRow {
    id: String,
    start_lat: f64,
    start_lon: f64,
    end_lat: f64,
    end_lon: f64,
    interaction: String,
    target: String,
}

impl TryFrom<SegmentActionRow> for SegmentAction {
    type Error = SegmentLoadError;

    fn try_from(row: SegmentActionRow) -> Result<Self, Self::Error> {
        let interaction = match row.interaction.as_str() {
            "pedestrian_signal" => Interaction::PedestrianSignal {
                signal_id: row.target,
            },
            "bus_operator" => Interaction::BusOperator {
                route_id: row.target,
            },
            _ => {
                return Err(SegmentLoadError::UnknownInteraction {
                    id: row.id,
                    interaction: row.interaction,
                })
            }
        };

        Ok(SegmentAction {
            id: row.id,
            segment: Segment::new(
                Coordinates::new(row.start_lat, row.start_lon),
                Coordinates::new(row.end_lat, row.end_lon),
            ),
            interaction,
        })
    }
}

/// Reads actions from CSV with the header
/// `id,start_lat,start_lon,end_lat,end_lon,interaction,target`.
pub fn parse_segment_actions<R: Read>(reader: R) -> Result<Vec<SegmentAction>, SegmentLoadError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    reader
        .deserialize::<SegmentActionRow>()
        .map(|row| SegmentAction::try_from(row?))
        .collect()
}

pub fn load_segment_actions(path: &Path) -> Result<Vec<SegmentAction>, SegmentLoadError> {
    let file = File::open(path)?;
    let actions = parse_segment_actions(file)?;
    info!(path = %path.display(), count = actions.len(), "loaded segment actions");
    Ok(actions)
}
