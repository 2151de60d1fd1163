//! S3-compatible object storage backend.
//!
//! Credentials and region come from the standard AWS provider chain
//! (environment, profile, instance metadata). An endpoint override enables
//! MinIO and other S3-compatible services; path-style addressing is forced
//! in that case.

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use dumpster_core::naming::{validate_key, DUMP_PREFIX};
use dumpster_core::retention::{classify_key, KeyVerdict};
use dumpster_core::types::Timestamp;

use crate::error::StorageError;
use crate::metrics::StorageMetrics;
use crate::Storage;

const BACKEND: &str = "s3";

/// Connection settings for [`S3Storage`].
#[derive(Debug, Clone, Default)]
pub struct S3Config {
    pub bucket: String,
    /// Custom endpoint URL, e.g. `http://localhost:9000` for MinIO.
    pub endpoint: Option<String>,
}

/// Storage backend backed by an S3 bucket.
pub struct S3Storage {
    client: Client,
    bucket: String,
    metrics: Arc<StorageMetrics>,
}

impl S3Storage {
    /// Build a client from the ambient AWS configuration and verify that the
    /// bucket is reachable.
    pub async fn connect(
        config: &S3Config,
        metrics: Arc<StorageMetrics>,
    ) -> Result<Self, StorageError> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::Connection("no bucket name provided".into()));
        }

        let shared = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let storage = Self::new(
            Client::from_conf(builder.build()),
            config.bucket.clone(),
            metrics,
        );
        storage.verify_bucket().await?;

        tracing::info!(
            bucket = %storage.bucket,
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            "Connected to S3 bucket"
        );
        Ok(storage)
    }

    /// Wrap an existing client without contacting the service.
    pub fn new(client: Client, bucket: String, metrics: Arc<StorageMetrics>) -> Self {
        Self {
            client,
            bucket,
            metrics,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn verify_bucket(&self) -> Result<(), StorageError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                StorageError::Connection(format!(
                    "bucket '{}' is not accessible: {}",
                    self.bucket,
                    DisplayErrorContext(e)
                ))
            })?;
        Ok(())
    }

    /// Every key under the `dumps/` prefix, across all result pages.
    async fn list_dump_keys(&self) -> Result<Vec<String>, StorageError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(DUMP_PREFIX)
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| remote("list_objects_v2", e))?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
        }
        Ok(keys)
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| remote("delete_object", e))?;
        Ok(())
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn save(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let _timer = self.metrics.start_timer(BACKEND, "save");
        validate_key(key)?;

        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/sql")
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| remote("put_object", e))?;

        tracing::debug!(bucket = %self.bucket, key = %key, bytes = size, "Uploaded object");
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let _timer = self.metrics.start_timer(BACKEND, "load");
        validate_key(key)?;

        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Err(StorageError::not_found(key));
            }
            Err(e) => return Err(remote("get_object", e)),
        };

        let data = output.body.collect().await.map_err(|e| StorageError::Remote {
            operation: "get_object",
            message: e.to_string(),
        })?;
        Ok(data.into_bytes().to_vec())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let _timer = self.metrics.start_timer(BACKEND, "delete");
        validate_key(key)?;

        // S3 deletes succeed for absent keys, so check existence first.
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => {}
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => {
                return Err(StorageError::not_found(key));
            }
            Err(e) => return Err(remote("head_object", e)),
        }

        self.delete_object(key).await?;
        tracing::debug!(bucket = %self.bucket, key = %key, "Deleted object");
        Ok(())
    }

    async fn purge(&self, cutoff: Timestamp) -> Result<usize, StorageError> {
        let _timer = self.metrics.start_timer(BACKEND, "purge");

        let keys = self.list_dump_keys().await?;
        let expired = select_expired(&keys, cutoff);

        for key in &expired {
            self.delete_object(key).await?;
            tracing::info!(bucket = %self.bucket, key = %key, "Purged expired dump");
        }

        Ok(expired.len())
    }
}

/// Keys from a bucket listing that are dumps dated strictly before `cutoff`.
fn select_expired(keys: &[String], cutoff: Timestamp) -> Vec<String> {
    keys.iter()
        .filter(|key| match classify_key(key, cutoff) {
            KeyVerdict::Expired(_) => true,
            KeyVerdict::Unparsable => {
                tracing::warn!(key = %key, "Skipping dump with unparsable timestamp");
                false
            }
            KeyVerdict::NotDump => {
                tracing::warn!(key = %key, "Skipping non-dump object");
                false
            }
            KeyVerdict::Retained(_) => false,
        })
        .cloned()
        .collect()
}

fn remote<E>(operation: &'static str, err: E) -> StorageError
where
    E: std::error::Error + 'static,
{
    StorageError::Remote {
        operation,
        message: DisplayErrorContext(err).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn only_older_dumps_are_selected() {
        let listing = keys(&[
            "dumps/shop/2023-01-01T00-00-00Z.sql",
            "dumps/shop/2024-06-01T00-00-00Z.sql",
            "dumps/readme.txt",
        ]);
        let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(
            select_expired(&listing, cutoff),
            vec!["dumps/shop/2023-01-01T00-00-00Z.sql"]
        );
    }

    #[test]
    fn object_exactly_at_cutoff_is_kept() {
        let listing = keys(&["dumps/shop/2024-01-01T00-00-00Z.sql"]);
        let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(select_expired(&listing, cutoff).is_empty());
    }

    #[test]
    fn unparsable_names_are_skipped() {
        let listing = keys(&["dumps/shop/latest.sql", "dumps/shop/2020-13-45.sql"]);
        let cutoff = Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap();
        assert!(select_expired(&listing, cutoff).is_empty());
    }
}
