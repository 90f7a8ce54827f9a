//! Filesystem-backed collaborators for the CLI.
//!
//! [`LocalStore`] reads families and posts from a JSON fixture and keeps the
//! job table in `jobs.json` next to it. [`LocalStorage`] maps each bucket to
//! a directory under one root and hands out `file://` URLs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{in_period, AlbumStore, ObjectStorage, PostRecord};
use crate::error::{StorageError, StoreError};
use crate::model::{Family, JobOutcome, JobStatus, NewRenderJob, Period, RenderJob};

const FILE_SCHEME: &str = "file://";

/// Contents of a fixture file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub families: Vec<Family>,
    #[serde(default)]
    pub posts: Vec<PostRecord>,
}

pub struct LocalStore {
    fixture: Fixture,
    jobs_path: PathBuf,
    // Serializes read-modify-write of the jobs file.
    jobs_lock: Mutex<()>,
}

impl LocalStore {
    /// Load a fixture. Jobs are written to `jobs.json` in the same directory.
    pub fn open(fixture_path: &Path) -> Result<Self, StoreError> {
        let raw = fs::read_to_string(fixture_path)?;
        let fixture: Fixture = serde_json::from_str(&raw)?;
        let jobs_path = fixture_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("jobs.json");
        Ok(Self {
            fixture,
            jobs_path,
            jobs_lock: Mutex::new(()),
        })
    }

    pub fn jobs(&self) -> Result<Vec<RenderJob>, StoreError> {
        if !self.jobs_path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.jobs_path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save_jobs(&self, jobs: &[RenderJob]) -> Result<(), StoreError> {
        fs::write(&self.jobs_path, serde_json::to_string_pretty(jobs)?)?;
        Ok(())
    }
}

impl AlbumStore for LocalStore {
    fn create_job(&self, job: NewRenderJob) -> Result<RenderJob, StoreError> {
        let _guard = self.jobs_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut jobs = self.jobs()?;
        let row = RenderJob {
            id: format!("job-{}", jobs.len() + 1),
            family_id: job.family_id,
            period_start: job.period.start,
            period_end: job.period.end,
            status: JobStatus::Running,
            requested_by: job.requested_by,
            requested_at: job.requested_at,
            finished_at: None,
            pdf_url: None,
            page_count: None,
            error_message: None,
        };
        jobs.push(row.clone());
        self.save_jobs(&jobs)?;
        Ok(row)
    }

    fn finish_job(
        &self,
        job_id: &str,
        outcome: &JobOutcome,
        finished_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let _guard = self.jobs_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut jobs = self.jobs()?;
        let job = jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or_else(|| StoreError::Missing(format!("job {}", job_id)))?;
        job.finish(outcome, finished_at);
        self.save_jobs(&jobs)
    }

    fn family(&self, family_id: &str) -> Result<Option<Family>, StoreError> {
        Ok(self
            .fixture
            .families
            .iter()
            .find(|f| f.id == family_id)
            .cloned())
    }

    fn posts_in_period(
        &self,
        family_id: &str,
        period: &Period,
    ) -> Result<Vec<PostRecord>, StoreError> {
        let mut posts: Vec<PostRecord> = self
            .fixture
            .posts
            .iter()
            .filter(|p| p.family_id == family_id && in_period(&p.created_at, period))
            .cloned()
            .collect();
        posts.sort_by_key(|p| p.created_at);
        Ok(posts)
    }
}

pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, path: &str) -> PathBuf {
        self.root.join(bucket).join(path)
    }
}

impl ObjectStorage for LocalStorage {
    fn locate(&self, bucket: &str, path: &str) -> Result<String, StorageError> {
        let full = self.object_path(bucket, path);
        if !full.is_file() {
            return Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            });
        }
        let full = full.canonicalize()?;
        Ok(format!("{}{}", FILE_SCHEME, full.display()))
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        let path = url.strip_prefix(FILE_SCHEME).ok_or_else(|| {
            StorageError::Fetch(url.to_string(), "only file:// URLs are served locally".into())
        })?;
        fs::read(path).map_err(|e| StorageError::Fetch(url.to_string(), e.to_string()))
    }

    fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let full = self.object_path(bucket, path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(full, bytes)?;
        Ok(())
    }
}
