use crate::geo::RadiusThresholds;
use crate::segment::SEGMENT_MATCH_TOLERANCE_METERS;
use crate::tracking::{LocatorSettings, DEFAULT_DEVIATION_TOLERANCE_METERS};
use anyhow::Context;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Base url of the trip planner, `/plan` is appended.
    #[serde(default = "default_planner_url")]
    pub planner_url: String,

    #[serde(default = "default_planner_timeout_secs")]
    pub planner_timeout_secs: u64,

    /// How often every active trip is re-checked.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Zone trip times and day-of-week patterns are expressed in.
    #[serde(default = "default_time_zone")]
    pub time_zone: Tz,

    #[serde(default)]
    pub thresholds: RadiusThresholds,

    #[serde(default = "default_deviation_tolerance_meters")]
    pub deviation_tolerance_meters: f64,

    #[serde(default = "default_segment_match_tolerance_meters")]
    pub segment_match_tolerance_meters: f64,

    /// CSV of segment actions; none are loaded when absent.
    #[serde(default)]
    pub segment_actions_path: Option<PathBuf>,

    /// Interactions are posted here; they are only logged when absent.
    #[serde(default)]
    pub interaction_endpoint: Option<String>,
}

pub fn default_planner_url() -> String {
    "http://localhost:8080/otp/routers/default".to_string()
}

pub fn default_planner_timeout_secs() -> u64 {
    10
}

pub fn default_check_interval_secs() -> u64 {
    60
}

pub fn default_time_zone() -> Tz {
    chrono_tz::America::New_York
}

pub fn default_deviation_tolerance_meters() -> f64 {
    DEFAULT_DEVIATION_TOLERANCE_METERS
}

pub fn default_segment_match_tolerance_meters() -> f64 {
    SEGMENT_MATCH_TOLERANCE_METERS
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            planner_url: default_planner_url(),
            planner_timeout_secs: default_planner_timeout_secs(),
            check_interval_secs: default_check_interval_secs(),
            time_zone: default_time_zone(),
            thresholds: RadiusThresholds::default(),
            deviation_tolerance_meters: default_deviation_tolerance_meters(),
            segment_match_tolerance_meters: default_segment_match_tolerance_meters(),
            segment_actions_path: None,
            interaction_endpoint: None,
        }
    }
}

impl MonitorConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("could not open config file {}", path.display()))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("could not parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn planner_timeout(&self) -> Duration {
        Duration::from_secs(self.planner_timeout_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn locator_settings(&self) -> LocatorSettings {
        LocatorSettings {
            thresholds: self.thresholds,
            deviation_tolerance: self.deviation_tolerance_meters,
            segment_tolerance: self.segment_match_tolerance_meters,
            time_zone: self.time_zone,
        }
    }
}
