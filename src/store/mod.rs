//! The object storage capability the rest of the tool is written against.
//!
//! `S3Store` talks to AWS (or an S3-compatible endpoint); tests use the
//! scripted in-memory store instead.

pub(crate) mod s3;
#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use std::fmt;

use crate::errors::{AppError, Result};

pub const S3_URI_PREFIX: &str = "s3://";

/// One addressable object: bucket plus key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parses an S3 URI (s3://bucket/key) into bucket and key.
    ///
    /// The key may be empty, which names the whole bucket as a prefix.
    pub fn parse(s3_uri: &str) -> Result<Self> {
        let rest = s3_uri
            .strip_prefix(S3_URI_PREFIX)
            .ok_or_else(|| AppError::Format(format!("{} is not a properly formatted S3 URI", s3_uri)))?;
        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(AppError::Format(format!("{} is missing a bucket name", s3_uri)));
        }
        Ok(Self::new(bucket, key))
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", S3_URI_PREFIX, self.bucket, self.key)
    }
}

/// Restore priority. Trades cost against completion latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum SpeedTier {
    Expedited,
    Standard,
    Bulk,
}

impl SpeedTier {
    pub const ALL: [SpeedTier; 3] = [SpeedTier::Expedited, SpeedTier::Standard, SpeedTier::Bulk];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedTier::Expedited => "Expedited",
            SpeedTier::Standard => "Standard",
            SpeedTier::Bulk => "Bulk",
        }
    }
}

impl fmt::Display for SpeedTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw answer to a metadata (HEAD) query. Every field is optional because
/// the store omits them for plain objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadMetadata {
    pub storage_class: Option<String>,
    pub restore_present: bool,
    pub restore_ongoing: Option<bool>,
    pub size_bytes: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Initiated,
    AlreadyInProgress,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Every key in `bucket` starting with `prefix`, in listing order.
    async fn list_by_prefix(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectLocation>>;

    async fn head_metadata(&self, location: &ObjectLocation) -> Result<HeadMetadata>;

    async fn request_restore(
        &self,
        location: &ObjectLocation,
        days: i32,
        tier: SpeedTier,
    ) -> Result<RestoreOutcome>;
}
