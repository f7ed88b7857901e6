// glrestore/src/store/s3.rs
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use chrono::{DateTime, Utc};
use s3::config::Region;
use s3::types::{GlacierJobParameters, RestoreRequest, Tier};
use tracing::debug;

use super::{HeadMetadata, ObjectLocation, ObjectStore, RestoreOutcome, SpeedTier};
use crate::config::StoreSettings;
use crate::errors::{AppError, Result};

/// `ObjectStore` backed by the AWS SDK. The session (profile, region,
/// endpoint) is resolved once at construction.
pub struct S3Store {
    client: s3::Client,
}

impl S3Store {
    pub async fn connect(settings: &StoreSettings) -> Self {
        let mut loader = aws_config::defaults(s3::config::BehaviorVersion::latest());
        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut builder = s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &settings.endpoint_url {
            debug!("Using custom S3 endpoint {}", endpoint);
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: s3::Client::from_conf(builder.build()),
        }
    }
}

fn to_tier(tier: SpeedTier) -> Tier {
    match tier {
        SpeedTier::Expedited => Tier::Expedited,
        SpeedTier::Standard => Tier::Standard,
        SpeedTier::Bulk => Tier::Bulk,
    }
}

/// Reads the `x-amz-restore` header, e.g.
/// `ongoing-request="false", expiry-date="Fri, 21 Dec 2012 00:00:00 GMT"`.
/// Returns `(present, ongoing)`.
pub(crate) fn parse_restore_header(header: Option<&str>) -> (bool, Option<bool>) {
    let Some(header) = header else {
        return (false, None);
    };
    let ongoing = header.split(',').find_map(|part| {
        let (name, value) = part.trim().split_once('=')?;
        (name.trim() == "ongoing-request").then(|| value.trim().trim_matches('"') == "true")
    });
    (true, ongoing)
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_by_prefix(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectLocation>> {
        let mut found = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| {
                    AppError::store(
                        ObjectLocation::new(bucket, prefix),
                        format!("listing failed: {}", DisplayErrorContext(&e)),
                    )
                })?;

            found.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(|key| ObjectLocation::new(bucket, key)),
            );

            match (page.is_truncated(), page.next_continuation_token()) {
                (Some(true), Some(token)) => continuation_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!("Listed {} object(s) under s3://{}/{}", found.len(), bucket, prefix);
        Ok(found)
    }

    async fn head_metadata(&self, location: &ObjectLocation) -> Result<HeadMetadata> {
        let head = self
            .client
            .head_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    AppError::NotFound(location.to_string())
                } else {
                    AppError::store(location, format!("head request failed: {}", DisplayErrorContext(&e)))
                }
            })?;

        let (restore_present, restore_ongoing) = parse_restore_header(head.restore());
        let last_modified = head
            .last_modified()
            .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos()));

        Ok(HeadMetadata {
            storage_class: head.storage_class().map(|c| c.as_str().to_string()),
            restore_present,
            restore_ongoing,
            size_bytes: head.content_length().and_then(|len| u64::try_from(len).ok()),
            last_modified,
        })
    }

    async fn request_restore(
        &self,
        location: &ObjectLocation,
        days: i32,
        tier: SpeedTier,
    ) -> Result<RestoreOutcome> {
        let job_parameters = GlacierJobParameters::builder()
            .tier(to_tier(tier))
            .build()
            .map_err(|e| AppError::store(location, format!("invalid restore parameters: {}", e)))?;
        let restore_request = RestoreRequest::builder()
            .days(days)
            .glacier_job_parameters(job_parameters)
            .build();

        let result = self
            .client
            .restore_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .restore_request(restore_request)
            .send()
            .await;

        match result {
            Ok(_) => Ok(RestoreOutcome::Initiated),
            Err(e) if e.code() == Some("RestoreAlreadyInProgress") => {
                Ok(RestoreOutcome::AlreadyInProgress)
            }
            Err(e) => Err(AppError::store(
                location,
                format!("restore request failed: {}", DisplayErrorContext(&e)),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_header_absent() {
        assert_eq!(parse_restore_header(None), (false, None));
    }

    #[test]
    fn test_restore_header_ongoing() {
        assert_eq!(
            parse_restore_header(Some("ongoing-request=\"true\"")),
            (true, Some(true))
        );
    }

    #[test]
    fn test_restore_header_completed() {
        let header = "ongoing-request=\"false\", expiry-date=\"Fri, 21 Dec 2012 00:00:00 GMT\"";
        assert_eq!(parse_restore_header(Some(header)), (true, Some(false)));
    }

    #[test]
    fn test_restore_header_without_ongoing_flag() {
        assert_eq!(
            parse_restore_header(Some("expiry-date=\"Fri, 21 Dec 2012 00:00:00 GMT\"")),
            (true, None)
        );
    }
}
