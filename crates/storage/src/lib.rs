//! Storage backends for dump artifacts and the retention purger.
//!
//! ## Backends
//!
//! - **[`LocalStorage`]**: files under a root directory.
//! - **[`S3Storage`]**: objects in an S3-compatible bucket.
//!
//! Both implement [`Storage`] and age objects identically: by the timestamp
//! embedded in the key (see [`dumpster_core::naming`]). Callers hold an
//! `Arc<dyn Storage>` and never depend on the concrete backend.

use async_trait::async_trait;
use dumpster_core::types::Timestamp;

mod error;
pub mod local;
pub mod metrics;
pub mod retention;
pub mod s3;

pub use error::StorageError;
pub use local::LocalStorage;
pub use metrics::StorageMetrics;
pub use retention::{PurgeReport, RetentionPurger};
pub use s3::{S3Config, S3Storage};

/// Capability set shared by every storage backend.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `bytes` under `key`, replacing any existing object and creating
    /// missing parent path segments.
    async fn save(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError>;

    /// Fetch the object stored under `key`.
    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Remove the object stored under `key`.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Delete every dump under the `dumps/` namespace whose key timestamp is
    /// strictly before `cutoff`. Returns how many objects were removed.
    async fn purge(&self, cutoff: Timestamp) -> Result<usize, StorageError>;
}
