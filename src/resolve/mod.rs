// glrestore/src/resolve/mod.rs
//! Expands user inputs (URIs, prefixes, wildcards, list-files) into concrete
//! object locations. Only listing and metadata lookups are made against
//! the store.
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::errors::{AppError, Result};
use crate::store::{ObjectLocation, ObjectStore, S3_URI_PREFIX};

const WILDCARDS: &[char] = &['*', '?'];

/// A list-file line that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFileWarning {
    pub file: String,
    pub line_number: usize,
    pub line: String,
}

#[derive(Debug, Default)]
pub struct Resolution {
    pub locations: Vec<ObjectLocation>,
    pub warnings: Vec<ListFileWarning>,
}

pub struct PathResolver<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ObjectStore + ?Sized> PathResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolves every input in order. Duplicates are dropped, keeping the
    /// first occurrence. Any input that is neither an S3 URI nor a readable
    /// file aborts the whole resolution before listing anything.
    pub async fn resolve(&self, inputs: &[String]) -> Result<Resolution> {
        let mut uris = Vec::new();
        let mut warnings = Vec::new();
        for input in inputs {
            if input.starts_with(S3_URI_PREFIX) {
                uris.push(input.clone());
            } else {
                let (lines, skipped) = read_list_file(input)?;
                uris.extend(lines);
                warnings.extend(skipped);
            }
        }

        let mut locations = Vec::new();
        for uri in &uris {
            locations.extend(self.expand(uri).await?);
        }

        Ok(Resolution {
            locations: dedup_preserving_order(locations),
            warnings,
        })
    }

    async fn expand(&self, uri: &str) -> Result<Vec<ObjectLocation>> {
        let location = ObjectLocation::parse(uri)?;

        if let Some(idx) = location.key.find(WILDCARDS) {
            let pattern = glob_to_regex(&location.key)?;
            let listed = self
                .store
                .list_by_prefix(&location.bucket, &location.key[..idx])
                .await?;
            let matched: Vec<_> = listed
                .into_iter()
                .filter(|candidate| pattern.is_match(&candidate.key))
                .collect();
            debug!("{} matched {} object(s)", uri, matched.len());
            return Ok(matched);
        }

        if location.key.is_empty() || location.key.ends_with('/') {
            let listed = self.store.list_by_prefix(&location.bucket, &location.key).await?;
            debug!("Prefix {} expanded to {} object(s)", uri, listed.len());
            return Ok(listed);
        }

        // An exact key wins; otherwise the path is treated as a prefix.
        match self.store.head_metadata(&location).await {
            Ok(_) => return Ok(vec![location]),
            Err(AppError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        let listed = self.store.list_by_prefix(&location.bucket, &location.key).await?;
        if listed.is_empty() {
            warn!("No objects found at {}", uri);
        } else {
            debug!("{} is not an object; expanded as prefix to {} object(s)", uri, listed.len());
        }
        Ok(listed)
    }
}

/// Reads a list-file, keeping `s3://` lines and collecting warnings for the rest.
fn read_list_file(path: &str) -> Result<(Vec<String>, Vec<ListFileWarning>)> {
    if !Path::new(path).is_file() {
        return Err(AppError::Format(format!(
            "{} is neither an s3:// URI nor a readable file",
            path
        )));
    }
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::Format(format!("{} could not be read: {}", path, e)))?;

    let mut uris = Vec::new();
    let mut warnings = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with(S3_URI_PREFIX) {
            uris.push(line.to_string());
        } else {
            warnings.push(ListFileWarning {
                file: path.to_string(),
                line_number: idx + 1,
                line: line.to_string(),
            });
        }
    }
    debug!("Read {} S3 URI(s) from {}", uris.len(), path);
    Ok((uris, warnings))
}

/// `*` matches any run of characters (including `/`), `?` exactly one.
fn glob_to_regex(glob: &str) -> Result<Regex> {
    let mut pattern = String::from("^");
    for c in glob.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).map_err(|e| AppError::Format(format!("bad wildcard pattern {}: {}", glob, e)))
}

fn dedup_preserving_order(locations: Vec<ObjectLocation>) -> Vec<ObjectLocation> {
    let mut seen = HashSet::new();
    locations
        .into_iter()
        .filter(|loc| {
            let fresh = seen.insert(loc.clone());
            if !fresh {
                debug!("Dropping duplicate {}", loc);
            }
            fresh
        })
        .collect()
}
