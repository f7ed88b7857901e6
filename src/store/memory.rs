//! Scripted in-memory store for tests.
//!
//! Each object holds a queue of metadata snapshots. `head_metadata` pops the
//! front snapshot until only one is left, which then repeats forever.
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Mutex;

use super::{HeadMetadata, ObjectLocation, ObjectStore, RestoreOutcome, SpeedTier};
use crate::errors::{AppError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct RestoreCall {
    pub location: ObjectLocation,
    pub days: i32,
    pub tier: SpeedTier,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<ObjectLocation, VecDeque<HeadMetadata>>,
    failing_heads: HashSet<ObjectLocation>,
    failing_restores: HashSet<ObjectLocation>,
    list_calls: Vec<ObjectLocation>,
    head_calls: Vec<ObjectLocation>,
    restore_calls: Vec<RestoreCall>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

pub fn archived(storage_class: &str, size_bytes: u64) -> HeadMetadata {
    HeadMetadata {
        storage_class: Some(storage_class.to_string()),
        size_bytes: Some(size_bytes),
        ..HeadMetadata::default()
    }
}

pub fn restoring(storage_class: &str, size_bytes: u64) -> HeadMetadata {
    HeadMetadata {
        restore_present: true,
        restore_ongoing: Some(true),
        ..archived(storage_class, size_bytes)
    }
}

pub fn restored(storage_class: &str, size_bytes: u64) -> HeadMetadata {
    HeadMetadata {
        restore_present: true,
        restore_ongoing: Some(false),
        ..archived(storage_class, size_bytes)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, uri: &str, metadata: HeadMetadata) -> Self {
        self.with_sequence(uri, vec![metadata])
    }

    pub fn with_sequence(self, uri: &str, snapshots: Vec<HeadMetadata>) -> Self {
        let location = ObjectLocation::parse(uri).expect("test uri");
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(location, snapshots.into());
        self
    }

    pub fn failing_head(self, uri: &str) -> Self {
        let location = ObjectLocation::parse(uri).expect("test uri");
        self.state.lock().unwrap().failing_heads.insert(location);
        self
    }

    pub fn failing_restore(self, uri: &str) -> Self {
        let location = ObjectLocation::parse(uri).expect("test uri");
        self.state.lock().unwrap().failing_restores.insert(location);
        self
    }

    /// Prefix listings made, as bucket + prefix.
    pub fn list_calls(&self) -> Vec<ObjectLocation> {
        self.state.lock().unwrap().list_calls.clone()
    }

    pub fn head_calls(&self) -> Vec<ObjectLocation> {
        self.state.lock().unwrap().head_calls.clone()
    }

    pub fn restore_calls(&self) -> Vec<RestoreCall> {
        self.state.lock().unwrap().restore_calls.clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_by_prefix(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectLocation>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls.push(ObjectLocation::new(bucket, prefix));
        Ok(state
            .objects
            .keys()
            .filter(|loc| loc.bucket == bucket && loc.key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn head_metadata(&self, location: &ObjectLocation) -> Result<HeadMetadata> {
        let mut state = self.state.lock().unwrap();
        state.head_calls.push(location.clone());
        if state.failing_heads.contains(location) {
            return Err(AppError::store(location, "403 Forbidden"));
        }
        let snapshots = state
            .objects
            .get_mut(location)
            .ok_or_else(|| AppError::NotFound(location.to_string()))?;
        if snapshots.len() > 1 {
            Ok(snapshots.pop_front().unwrap_or_default())
        } else {
            Ok(snapshots.front().cloned().unwrap_or_default())
        }
    }

    async fn request_restore(
        &self,
        location: &ObjectLocation,
        days: i32,
        tier: SpeedTier,
    ) -> Result<RestoreOutcome> {
        let mut state = self.state.lock().unwrap();
        state.restore_calls.push(RestoreCall {
            location: location.clone(),
            days,
            tier,
        });
        if state.failing_restores.contains(location) {
            return Err(AppError::store(location, "503 Slow Down"));
        }
        let snapshots = state
            .objects
            .get_mut(location)
            .ok_or_else(|| AppError::store(location, "404 Not Found"))?;
        // Scripted sequences already describe what happens next.
        if snapshots.len() > 1 {
            return Ok(RestoreOutcome::Initiated);
        }
        let current = snapshots.front().cloned().unwrap_or_default();
        if current.restore_ongoing == Some(true) {
            return Ok(RestoreOutcome::AlreadyInProgress);
        }
        *snapshots = VecDeque::from([HeadMetadata {
            restore_present: true,
            restore_ongoing: Some(true),
            ..current
        }]);
        Ok(RestoreOutcome::Initiated)
    }
}
