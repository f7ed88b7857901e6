// glrestore/src/classify/mod.rs
//! Storage tier and restore status of each object.
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::config::ClassifyErrorPolicy;
use crate::errors::Result;
use crate::store::{HeadMetadata, ObjectLocation, ObjectStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageClass {
    Standard,
    Glacier,
    DeepArchive,
    /// Any other class, by its store name (e.g. `GLACIER_IR`).
    Other(String),
}

impl StorageClass {
    /// A missing class means the store default, `STANDARD`.
    pub fn from_store(name: Option<&str>) -> Self {
        match name {
            None | Some("STANDARD") => StorageClass::Standard,
            Some("GLACIER") => StorageClass::Glacier,
            Some("DEEP_ARCHIVE") => StorageClass::DeepArchive,
            Some(other) => StorageClass::Other(other.to_string()),
        }
    }

    pub fn is_archival(&self) -> bool {
        matches!(self, StorageClass::Glacier | StorageClass::DeepArchive)
    }

    pub fn as_str(&self) -> &str {
        match self {
            StorageClass::Standard => "STANDARD",
            StorageClass::Glacier => "GLACIER",
            StorageClass::DeepArchive => "DEEP_ARCHIVE",
            StorageClass::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreState {
    NotRequested,
    Restoring,
    Restored,
}

impl RestoreState {
    pub fn from_store(present: bool, ongoing: Option<bool>) -> Self {
        match (present, ongoing) {
            (_, Some(true)) => RestoreState::Restoring,
            (true, _) => RestoreState::Restored,
            (false, _) => RestoreState::NotRequested,
        }
    }
}

/// Display-only combination of storage class and restore state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatusTag {
    NoGlacier,
    GlacierNoRestore,
    DeepGlacierNoRestore,
    GlacierRestoring,
    GlacierRestored,
}

impl StatusTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTag::NoGlacier => "no-glacier",
            StatusTag::GlacierNoRestore => "glacier-no-restore",
            StatusTag::DeepGlacierNoRestore => "deep-glacier-no-restore",
            StatusTag::GlacierRestoring => "glacier-restoring",
            StatusTag::GlacierRestored => "glacier-restored",
        }
    }
}

impl fmt::Display for StatusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub location: ObjectLocation,
    pub storage_class: StorageClass,
    pub restore_state: RestoreState,
    pub size_bytes: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectRecord {
    pub fn from_metadata(location: ObjectLocation, head: HeadMetadata) -> Self {
        Self {
            location,
            storage_class: StorageClass::from_store(head.storage_class.as_deref()),
            restore_state: RestoreState::from_store(head.restore_present, head.restore_ongoing),
            size_bytes: head.size_bytes,
            last_modified: head.last_modified,
        }
    }

    /// Archived and with no restore requested yet.
    pub fn is_actionable(&self) -> bool {
        self.storage_class.is_archival() && self.restore_state == RestoreState::NotRequested
    }

    pub fn is_restoring(&self) -> bool {
        self.restore_state == RestoreState::Restoring
    }

    pub fn status(&self) -> StatusTag {
        match (&self.storage_class, self.restore_state) {
            (class, _) if !class.is_archival() => StatusTag::NoGlacier,
            (_, RestoreState::Restoring) => StatusTag::GlacierRestoring,
            (_, RestoreState::Restored) => StatusTag::GlacierRestored,
            (StorageClass::DeepArchive, RestoreState::NotRequested) => StatusTag::DeepGlacierNoRestore,
            _ => StatusTag::GlacierNoRestore,
        }
    }
}

/// Records in resolution order, one per classified location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationTable {
    records: Vec<ObjectRecord>,
}

impl ClassificationTable {
    pub fn records(&self) -> &[ObjectRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn actionable(&self) -> impl Iterator<Item = &ObjectRecord> {
        self.records.iter().filter(|r| r.is_actionable())
    }

    pub fn restoring(&self) -> impl Iterator<Item = &ObjectRecord> {
        self.records.iter().filter(|r| r.is_restoring())
    }

    pub fn status_counts(&self) -> BTreeMap<StatusTag, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.status()).or_insert(0) += 1;
        }
        counts
    }
}

impl FromIterator<ObjectRecord> for ClassificationTable {
    fn from_iter<I: IntoIterator<Item = ObjectRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

pub struct ObjectClassifier<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    on_error: ClassifyErrorPolicy,
}

impl<'a, S: ObjectStore + ?Sized> ObjectClassifier<'a, S> {
    pub fn new(store: &'a S, on_error: ClassifyErrorPolicy) -> Self {
        Self { store, on_error }
    }

    /// One metadata query per location, sequentially.
    pub async fn classify(&self, locations: &[ObjectLocation]) -> Result<ClassificationTable> {
        let mut records = Vec::with_capacity(locations.len());
        for location in locations {
            match self.store.head_metadata(location).await {
                Ok(head) => {
                    let record = ObjectRecord::from_metadata(location.clone(), head);
                    debug!("{} -> {}", location, record.status());
                    records.push(record);
                }
                Err(e) if self.on_error == ClassifyErrorPolicy::Skip => {
                    warn!("Skipping {}: {}", location, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records.into_iter().collect())
    }
}
