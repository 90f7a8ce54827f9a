//! # Album Model
//!
//! The typed records the pipeline works on. Store rows are loosely shaped
//! (see [`crate::store`]); the content fetcher normalizes them once into the
//! types below so nothing downstream has to guess at field names.
//!
//! A [`Post`] owns its [`Image`]s in display order. Each image carries the
//! location it was resolved to; an image that could not be resolved stays in
//! the post as [`ImageLocation::Unresolved`] and later renders as a
//! placeholder, so frame counts never change because of a storage miss.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive date range an album covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Human-readable label, e.g. "March 1, 2026 – March 31, 2026".
    pub fn label(&self) -> String {
        let fmt = "%B %-d, %Y";
        if self.start == self.end {
            return self.start.format(fmt).to_string();
        }
        format!("{} – {}", self.start.format(fmt), self.end.format(fmt))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Succeeded,
    Failed,
}

/// One album-generation request as persisted in the job table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    pub id: String,
    pub family_id: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub status: JobStatus,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub pdf_url: Option<String>,
    pub page_count: Option<u32>,
    pub error_message: Option<String>,
}

impl RenderJob {
    /// Apply the single terminal update a job ever receives.
    pub fn finish(&mut self, outcome: &JobOutcome, at: DateTime<Utc>) {
        self.finished_at = Some(at);
        match outcome {
            JobOutcome::Succeeded {
                pdf_url,
                page_count,
            } => {
                self.status = JobStatus::Succeeded;
                self.pdf_url = Some(pdf_url.clone());
                self.page_count = Some(*page_count);
                self.error_message = None;
            }
            JobOutcome::Failed { error_message } => {
                self.status = JobStatus::Failed;
                self.error_message = Some(error_message.clone());
            }
        }
    }
}

/// Insert payload for a new job. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewRenderJob {
    pub family_id: String,
    pub period: Period,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
}

/// Terminal state written to a job row.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Succeeded { pdf_url: String, page_count: u32 },
    Failed { error_message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Normalized post author.
#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub caption: Option<String>,
    pub images: Vec<Image>,
}

#[derive(Debug, Clone)]
pub struct Image {
    pub id: String,
    pub reference: ImageRef,
    pub alt_text: Option<String>,
    pub location: ImageLocation,
}

/// Where an image's bytes come from, as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// A `data:image/...;base64,` URI. Never fetched over the network.
    Inline(String),
    /// An absolute `http(s)` URL, used as-is.
    Remote(String),
    /// An object path inside the image buckets.
    Stored(String),
}

impl ImageRef {
    /// Classify a raw reference string from the store.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("data:image/") {
            ImageRef::Inline(raw.to_string())
        } else if raw.starts_with("http://") || raw.starts_with("https://") {
            ImageRef::Remote(raw.to_string())
        } else {
            ImageRef::Stored(raw.trim_start_matches('/').to_string())
        }
    }
}

/// Fetchable location after bucket resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLocation {
    Inline(String),
    Url(String),
    Unresolved,
}

impl ImageLocation {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, ImageLocation::Unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn period_label() {
        let p = Period::new(date(2026, 3, 1), date(2026, 3, 31));
        assert_eq!(p.label(), "March 1, 2026 – March 31, 2026");
        let single = Period::new(date(2026, 7, 4), date(2026, 7, 4));
        assert_eq!(single.label(), "July 4, 2026");
    }

    #[test]
    fn image_ref_classification() {
        assert!(matches!(
            ImageRef::parse("data:image/png;base64,AAAA"),
            ImageRef::Inline(_)
        ));
        assert_eq!(
            ImageRef::parse("https://cdn.example.com/a.jpg"),
            ImageRef::Remote("https://cdn.example.com/a.jpg".to_string())
        );
        assert_eq!(
            ImageRef::parse("/fam-1/post-2/a.jpg"),
            ImageRef::Stored("fam-1/post-2/a.jpg".to_string())
        );
    }

    #[test]
    fn job_status_serializes_lowercase() {
        let json = serde_json::to_string(&JobStatus::Succeeded).unwrap();
        assert_eq!(json, "\"succeeded\"");
    }

    #[test]
    fn finish_failed_keeps_url_empty() {
        let mut job = RenderJob {
            id: "job-1".into(),
            family_id: "fam".into(),
            period_start: date(2026, 1, 1),
            period_end: date(2026, 1, 31),
            status: JobStatus::Running,
            requested_by: "user".into(),
            requested_at: Utc::now(),
            finished_at: None,
            pdf_url: None,
            page_count: None,
            error_message: None,
        };
        job.finish(
            &JobOutcome::Failed {
                error_message: "Family not found".into(),
            },
            Utc::now(),
        );
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.finished_at.is_some());
        assert!(job.pdf_url.is_none());
        assert_eq!(job.error_message.as_deref(), Some("Family not found"));
    }
}
