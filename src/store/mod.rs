//! # External Collaborators
//!
//! The pipeline talks to two outside systems, both behind traits so the
//! orchestrator can run against production services, local fixtures
//! ([`local`]) or in-process doubles ([`memory`]):
//!
//! - [`AlbumStore`]: the relational store holding families, posts and the
//!   render job table.
//! - [`ObjectStorage`]: buckets serving image bytes and receiving finished
//!   albums.
//!
//! Rows come back as the loosely-shaped `*Record` types below. Turning them
//! into [`crate::model`] types is the content fetcher's job.

pub mod local;
pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StoreError};
use crate::model::{Family, JobOutcome, NewRenderJob, Period, RenderJob};

/// Relational store: job table writes, family and post reads.
pub trait AlbumStore: Send + Sync {
    /// Insert a job with status `running` and return the stored row.
    fn create_job(&self, job: NewRenderJob) -> Result<RenderJob, StoreError>;

    /// Write the terminal status of a job.
    fn finish_job(
        &self,
        job_id: &str,
        outcome: &JobOutcome,
        finished_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    fn family(&self, family_id: &str) -> Result<Option<Family>, StoreError>;

    /// Posts created inside the period (inclusive on both dates).
    fn posts_in_period(
        &self,
        family_id: &str,
        period: &Period,
    ) -> Result<Vec<PostRecord>, StoreError>;
}

/// Object storage: bucket lookups, byte fetches and uploads.
pub trait ObjectStorage: Send + Sync {
    /// Durable retrieval URL for an existing object.
    fn locate(&self, bucket: &str, path: &str) -> Result<String, StorageError>;

    /// Raw bytes behind a URL returned by [`locate`](Self::locate) or an
    /// absolute remote URL.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError>;

    fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError>;
}

/// A post row with its joined author and images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub family_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub author: AuthorRecord,
    #[serde(default)]
    pub images: Vec<ImageRecord>,
}

/// Author profile columns. Older rows fill different name columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorRecord {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    /// Data URI, absolute URL, or bucket object path.
    pub src: String,
    #[serde(default)]
    pub alt_text: Option<String>,
}

/// Whether a post falls inside the period, by UTC calendar date.
pub(crate) fn in_period(created_at: &DateTime<Utc>, period: &Period) -> bool {
    let day = created_at.date_naive();
    day >= period.start && day <= period.end
}
