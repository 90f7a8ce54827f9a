//! In-process collaborators.
//!
//! Both types keep every row and object behind a `Mutex` and record the
//! calls they receive, so tests can assert lookup order and job writes.
//! Failure switches simulate upstream outages.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::{in_period, AlbumStore, ObjectStorage, PostRecord};
use crate::error::{StorageError, StoreError};
use crate::model::{Family, JobOutcome, JobStatus, NewRenderJob, Period, RenderJob};

const MEMORY_SCHEME: &str = "memory://";

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Default)]
pub struct MemoryStore {
    families: Mutex<HashMap<String, Family>>,
    posts: Mutex<Vec<PostRecord>>,
    jobs: Mutex<Vec<RenderJob>>,
    next_job: AtomicUsize,
    fail_job_create: AtomicBool,
    fail_job_finish: AtomicBool,
    fail_success_finish: AtomicBool,
    fail_family: AtomicBool,
    fail_posts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_family(&self, family: Family) {
        lock(&self.families).insert(family.id.clone(), family);
    }

    pub fn add_post(&self, post: PostRecord) {
        lock(&self.posts).push(post);
    }

    /// Snapshot of the job table.
    pub fn jobs(&self) -> Vec<RenderJob> {
        lock(&self.jobs).clone()
    }

    pub fn fail_job_create(&self, fail: bool) {
        self.fail_job_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_job_finish(&self, fail: bool) {
        self.fail_job_finish.store(fail, Ordering::SeqCst);
    }

    /// Reject only the `Succeeded` write; failure writes still land.
    pub fn fail_success_finish(&self, fail: bool) {
        self.fail_success_finish.store(fail, Ordering::SeqCst);
    }

    pub fn fail_family(&self, fail: bool) {
        self.fail_family.store(fail, Ordering::SeqCst);
    }

    pub fn fail_posts(&self, fail: bool) {
        self.fail_posts.store(fail, Ordering::SeqCst);
    }
}

impl AlbumStore for MemoryStore {
    fn create_job(&self, job: NewRenderJob) -> Result<RenderJob, StoreError> {
        if self.fail_job_create.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("job insert rejected".into()));
        }
        let n = self.next_job.fetch_add(1, Ordering::SeqCst) + 1;
        let row = RenderJob {
            id: format!("job-{}", n),
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
        lock(&self.jobs).push(row.clone());
        Ok(row)
    }

    fn finish_job(
        &self,
        job_id: &str,
        outcome: &JobOutcome,
        finished_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if self.fail_job_finish.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("job update rejected".into()));
        }
        if matches!(outcome, JobOutcome::Succeeded { .. })
            && self.fail_success_finish.load(Ordering::SeqCst)
        {
            return Err(StoreError::Unavailable("job update rejected".into()));
        }
        let mut jobs = lock(&self.jobs);
        let job = jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or_else(|| StoreError::Missing(format!("job {}", job_id)))?;
        job.finish(outcome, finished_at);
        Ok(())
    }

    fn family(&self, family_id: &str) -> Result<Option<Family>, StoreError> {
        if self.fail_family.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("family lookup failed".into()));
        }
        Ok(lock(&self.families).get(family_id).cloned())
    }

    fn posts_in_period(
        &self,
        family_id: &str,
        period: &Period,
    ) -> Result<Vec<PostRecord>, StoreError> {
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("post query failed".into()));
        }
        let mut posts: Vec<PostRecord> = lock(&self.posts)
            .iter()
            .filter(|p| p.family_id == family_id && in_period(&p.created_at, period))
            .cloned()
            .collect();
        posts.sort_by_key(|p| p.created_at);
        Ok(posts)
    }
}

/// Buckets as nested maps. URLs look like `memory://bucket/path`.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    remote: Mutex<HashMap<String, Vec<u8>>>,
    content_types: Mutex<HashMap<(String, String), String>>,
    locate_calls: Mutex<Vec<(String, String)>>,
    fail_uploads: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, bucket: &str, path: &str, bytes: Vec<u8>) {
        lock(&self.objects).insert((bucket.to_string(), path.to_string()), bytes);
    }

    /// Serve bytes for an absolute remote URL.
    pub fn put_remote(&self, url: &str, bytes: Vec<u8>) {
        lock(&self.remote).insert(url.to_string(), bytes);
    }

    pub fn get(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        lock(&self.objects)
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    pub fn content_type(&self, bucket: &str, path: &str) -> Option<String> {
        lock(&self.content_types)
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    /// Every object key stored under a bucket, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.objects)
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, p)| p.clone())
            .collect();
        keys.sort();
        keys
    }

    /// `(bucket, path)` pairs passed to `locate`, in call order.
    pub fn locate_calls(&self) -> Vec<(String, String)> {
        lock(&self.locate_calls).clone()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }
}

impl ObjectStorage for MemoryStorage {
    fn locate(&self, bucket: &str, path: &str) -> Result<String, StorageError> {
        lock(&self.locate_calls).push((bucket.to_string(), path.to_string()));
        if lock(&self.objects).contains_key(&(bucket.to_string(), path.to_string())) {
            Ok(format!("{}{}/{}", MEMORY_SCHEME, bucket, path))
        } else {
            Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            })
        }
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        if let Some(rest) = url.strip_prefix(MEMORY_SCHEME) {
            let (bucket, path) = rest
                .split_once('/')
                .ok_or_else(|| StorageError::Fetch(url.to_string(), "malformed URL".into()))?;
            return self
                .get(bucket, path)
                .ok_or_else(|| StorageError::Fetch(url.to_string(), "no such object".into()));
        }
        lock(&self.remote)
            .get(url)
            .cloned()
            .ok_or_else(|| StorageError::Fetch(url.to_string(), "unreachable".into()))
    }

    fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("upload rejected".into()));
        }
        let key = (bucket.to_string(), path.to_string());
        lock(&self.content_types).insert(key.clone(), content_type.to_string());
        lock(&self.objects).insert(key, bytes.to_vec());
        Ok(())
    }
}
