use super::check::{CheckMonitoredTrip, CheckOutcome};
use super::error::CheckError;
use crate::store::{StoreError, TripStore};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Result of one spawned trip check.
pub type TripCheckResult = (String, Result<CheckOutcome, CheckError>);

/// Tracks keys with work in progress. A key stays taken until its guard drops.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl SingleFlight {
    pub fn try_acquire(&self, key: &str) -> Option<FlightGuard> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(key.to_string()) {
            return None;
        }
        Some(FlightGuard {
            key: key.to_string(),
            in_flight: self.in_flight.clone(),
        })
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

pub struct FlightGuard {
    key: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Runs the check job for every active trip on a fixed interval.
pub struct Scheduler {
    job: Arc<CheckMonitoredTrip>,
    store: Arc<dyn TripStore>,
    interval: Duration,
    time_zone: Tz,
    in_flight: SingleFlight,
}

impl Scheduler {
    pub fn new(
        job: Arc<CheckMonitoredTrip>,
        store: Arc<dyn TripStore>,
        interval: Duration,
        time_zone: Tz,
    ) -> Self {
        Self {
            job,
            store,
            interval,
            time_zone,
            in_flight: SingleFlight::default(),
        }
    }

    pub async fn run(&self) {
        info!(
            interval_secs = self.interval.as_secs(),
            time_zone = %self.time_zone,
            "starting trip monitor scheduler"
        );
        let mut tasks = JoinSet::new();

        loop {
            while let Some(finished) = tasks.try_join_next() {
                if let Err(err) = finished {
                    error!(error = %err, "trip check task panicked");
                }
            }

            let now = Utc::now().with_timezone(&self.time_zone);
            match self.spawn_checks(&mut tasks, now).await {
                Ok(spawned) => debug!(spawned, "scheduled trip checks"),
                Err(err) => error!(error = %err, "failed to list active trips"),
            }

            if let Err(err) = self.store.flush().await {
                error!(error = %err, "failed to flush trip store");
            }

            tokio::time::sleep(self.interval).await;
        }
    }

    /// Spawns one check per active trip onto `tasks`. Trips whose previous
    /// check has not finished are left out. Returns the number spawned.
    pub async fn spawn_checks(
        &self,
        tasks: &mut JoinSet<TripCheckResult>,
        now: DateTime<Tz>,
    ) -> Result<usize, StoreError> {
        let trip_ids = self.store.active_trip_ids().await?;
        let mut spawned = 0;

        for trip_id in trip_ids {
            let Some(guard) = self.in_flight.try_acquire(&trip_id) else {
                warn!(%trip_id, "previous check still running, skipping");
                continue;
            };

            let job = self.job.clone();
            tasks.spawn(async move {
                let _guard = guard;
                let result = job.check_and_persist(&trip_id, now).await;
                if let Err(err) = &result {
                    error!(%trip_id, error = %err, "trip check failed");
                }
                (trip_id, result)
            });
            spawned += 1;
        }

        Ok(spawned)
    }

    pub fn in_flight(&self) -> &SingleFlight {
        &self.in_flight
    }
}
