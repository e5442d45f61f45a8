//! Keyed persistence of monitored trips, users and journey states.

use crate::monitor::{JourneyState, MonitoredTrip, User};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store file i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store file is not valid json: {0}")]
    Serde(#[from] serde_json::Error),
}

#[async_trait]
pub trait TripStore: Send + Sync {
    async fn get_trip(&self, trip_id: &str) -> Result<Option<MonitoredTrip>, StoreError>;

    async fn replace_trip(&self, trip: MonitoredTrip) -> Result<(), StoreError>;

    /// Ids of trips the scheduler should check.
    async fn active_trip_ids(&self) -> Result<Vec<String>, StoreError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    async fn get_journey_state(&self, trip_id: &str) -> Result<Option<JourneyState>, StoreError>;

    async fn replace_journey_state(&self, state: JourneyState) -> Result<(), StoreError>;

    /// Makes pending writes durable.
    async fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    trips: HashMap<String, MonitoredTrip>,
    #[serde(default)]
    users: HashMap<String, User>,
    #[serde(default)]
    journey_states: HashMap<String, JourneyState>,
}

/// In-memory store, optionally backed by a JSON file written on `flush`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
    path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let data = serde_json::from_reader(reader)?;
        Ok(Self {
            data: RwLock::new(data),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn load_or_default(path: &Path) -> Result<Self, StoreError> {
        if path.exists() {
            return Self::load(path);
        }
        Ok(Self {
            data: RwLock::default(),
            path: Some(path.to_path_buf()),
        })
    }

    pub async fn insert_trip(&self, trip: MonitoredTrip) {
        self.data.write().await.trips.insert(trip.id.clone(), trip);
    }

    pub async fn insert_user(&self, user: User) {
        self.data.write().await.users.insert(user.id.clone(), user);
    }

    pub async fn trip_count(&self) -> usize {
        self.data.read().await.trips.len()
    }
}

#[async_trait]
impl TripStore for MemoryStore {
    async fn get_trip(&self, trip_id: &str) -> Result<Option<MonitoredTrip>, StoreError> {
        Ok(self.data.read().await.trips.get(trip_id).cloned())
    }

    async fn replace_trip(&self, trip: MonitoredTrip) -> Result<(), StoreError> {
        self.data.write().await.trips.insert(trip.id.clone(), trip);
        Ok(())
    }

    async fn active_trip_ids(&self) -> Result<Vec<String>, StoreError> {
        let data = self.data.read().await;
        let mut ids: Vec<String> = data
            .trips
            .values()
            .filter(|trip| trip.is_active)
            .map(|trip| trip.id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.data.read().await.users.get(user_id).cloned())
    }

    async fn get_journey_state(&self, trip_id: &str) -> Result<Option<JourneyState>, StoreError> {
        Ok(self.data.read().await.journey_states.get(trip_id).cloned())
    }

    async fn replace_journey_state(&self, state: JourneyState) -> Result<(), StoreError> {
        self.data
            .write()
            .await
            .journey_states
            .insert(state.trip_id.clone(), state);
        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let data = self.data.read().await;
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer(writer, &*data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{sample_trip, sample_user};

    #[tokio::test]
    async fn flushes_and_reloads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = MemoryStore::load_or_default(&path).unwrap();
        store.insert_trip(sample_trip()).await;
        store.insert_user(sample_user("sms")).await;
        let mut state = JourneyState::new("trip-1");
        state.last_checked_time = Some(1234);
        store.replace_journey_state(state.clone()).await.unwrap();
        store.flush().await.unwrap();

        let reloaded = MemoryStore::load(&path).unwrap();
        assert_eq!(reloaded.active_trip_ids().await.unwrap(), vec!["trip-1"]);
        assert!(reloaded.get_user("user-1").await.unwrap().is_some());
        assert_eq!(reloaded.get_journey_state("trip-1").await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn paused_trips_are_not_listed() {
        let store = MemoryStore::new();
        let mut paused = sample_trip();
        paused.id = "trip-2".to_string();
        paused.is_active = false;
        store.insert_trip(sample_trip()).await;
        store.insert_trip(paused).await;

        assert_eq!(store.active_trip_ids().await.unwrap(), vec!["trip-1"]);
        assert_eq!(store.trip_count().await, 2);
    }
}
