//! # Job Orchestrator
//!
//! Owns one render request end to end:
//!
//! ```text
//! create job ─► family ─► posts ─► locations ─► images ─► document
//!                                                            │
//!            job succeeded ◄─ locate ◄─ upload ◄─────────────┘
//! ```
//!
//! The job row is written exactly twice: once when it is created as
//! `running`, and once with its terminal status. Every failure after the
//! job exists is recorded on it (best effort) before it reaches the caller.
//! The only things other systems ever see are that row and the uploaded
//! document; nothing is uploaded unless the whole document was built.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::AlbumConfig;
use crate::content::ContentFetcher;
use crate::document::{AlbumContent, DocumentBuilder};
use crate::error::AlbumError;
use crate::font::AlbumFonts;
use crate::image_loader::ImageEmbedder;
use crate::model::{ImageRef, JobOutcome, NewRenderJob, Period, RenderJob};
use crate::store::{AlbumStore, ObjectStorage};

/// Content type of uploaded albums.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Trigger payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderRequest {
    pub family_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub requested_by: String,
}

/// Response body: `{ok, pdf_url, page_count}` or `{ok: false, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A finished album.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    pub job_id: String,
    pub pdf_url: String,
    pub page_count: u32,
}

pub struct AlbumService {
    store: Arc<dyn AlbumStore>,
    storage: Arc<dyn ObjectStorage>,
    config: AlbumConfig,
    fonts: AlbumFonts,
}

/// Object key of an uploaded album.
pub fn output_key(family_id: &str, period: &Period, generated_at: DateTime<Utc>) -> String {
    format!(
        "{}/{}_{}_{}.pdf",
        family_id,
        period.start,
        period.end,
        generated_at.timestamp_millis()
    )
}

impl AlbumService {
    pub fn new(
        store: Arc<dyn AlbumStore>,
        storage: Arc<dyn ObjectStorage>,
        config: AlbumConfig,
        fonts: AlbumFonts,
    ) -> Self {
        Self {
            store,
            storage,
            config,
            fonts,
        }
    }

    /// Run a request and shape the result for the caller.
    pub fn handle(&self, request: &RenderRequest) -> (u16, RenderResponse) {
        match self.render(request) {
            Ok(output) => (
                200,
                RenderResponse {
                    ok: true,
                    pdf_url: Some(output.pdf_url),
                    page_count: Some(output.page_count),
                    error: None,
                },
            ),
            Err(e) => (
                e.status_code(),
                RenderResponse {
                    ok: false,
                    pdf_url: None,
                    page_count: None,
                    error: Some(e.to_string()),
                },
            ),
        }
    }

    #[tracing::instrument(skip(self), fields(family_id = %request.family_id))]
    pub fn render(&self, request: &RenderRequest) -> Result<RenderOutput, AlbumError> {
        let period = Period::new(request.start, request.end);
        let job = self
            .store
            .create_job(NewRenderJob {
                family_id: request.family_id.clone(),
                period,
                requested_by: request.requested_by.clone(),
                requested_at: Utc::now(),
            })
            .map_err(|e| {
                error!(error = %e, "could not create render job");
                AlbumError::JobCreate(e)
            })?;
        info!(job_id = %job.id, "render job created");

        let result = self.run(&job, &period).and_then(|(pdf_url, page_count)| {
            let outcome = JobOutcome::Succeeded {
                pdf_url: pdf_url.clone(),
                page_count,
            };
            self.store
                .finish_job(&job.id, &outcome, Utc::now())
                .map_err(AlbumError::JobUpdate)?;
            Ok(RenderOutput {
                job_id: job.id.clone(),
                pdf_url,
                page_count,
            })
        });

        match result {
            Ok(output) => {
                info!(job_id = %job.id, pages = output.page_count, url = %output.pdf_url, "album rendered");
                Ok(output)
            }
            Err(e) => {
                let detail = std::error::Error::source(&e).map(ToString::to_string);
                warn!(job_id = %job.id, error = %e, detail = ?detail, "render failed");
                let outcome = JobOutcome::Failed {
                    error_message: e.to_string(),
                };
                if let Err(update) = self.store.finish_job(&job.id, &outcome, Utc::now()) {
                    error!(job_id = %job.id, error = %update, "could not record job failure");
                }
                Err(e)
            }
        }
    }

    /// Steps between job creation and the terminal update.
    fn run(&self, job: &RenderJob, period: &Period) -> Result<(String, u32), AlbumError> {
        let family = self
            .store
            .family(&job.family_id)
            .map_err(AlbumError::FamilyLookup)?
            .ok_or(AlbumError::FamilyNotFound)?;

        let fetcher = ContentFetcher::new(
            self.store.as_ref(),
            self.storage.as_ref(),
            &self.config.storage,
        );
        let mut posts = fetcher
            .fetch_posts(&family.id, period)
            .map_err(AlbumError::FetchPosts)?;
        if posts.is_empty() {
            return Err(AlbumError::NoPosts);
        }

        fetcher.resolve_locations(&mut posts);

        let embedder = ImageEmbedder::new(self.storage.as_ref());
        let images = embedder.embed_posts(&posts);
        let avatar = family
            .avatar
            .as_deref()
            .map(|raw| embedder.embed(&fetcher.resolve(&ImageRef::parse(raw))));

        let generated_at = Utc::now();
        let album = DocumentBuilder::new(&self.config, &self.fonts).build(&AlbumContent {
            family: &family,
            period,
            posts: &posts,
            images: &images,
            avatar: avatar.as_ref(),
            generated_at,
        })?;

        let bucket = &self.config.storage.output_bucket;
        let key = output_key(&family.id, period, generated_at);
        self.storage
            .upload(bucket, &key, &album.bytes, PDF_CONTENT_TYPE)
            .map_err(AlbumError::Upload)?;
        let url = self
            .storage
            .locate(bucket, &key)
            .map_err(AlbumError::Upload)?;

        Ok((url, album.page_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn output_key_has_family_period_and_timestamp() {
        let period = Period::new(
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        );
        let at = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap();
        assert_eq!(
            output_key("fam-1", &period, at),
            format!("fam-1/2026-03-01_2026-03-31_{}.pdf", at.timestamp_millis())
        );
    }

    #[test]
    fn failure_response_omits_success_fields() {
        let body = RenderResponse {
            ok: false,
            pdf_url: None,
            page_count: None,
            error: Some("Family not found".into()),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"ok":false,"error":"Family not found"}"#
        );
    }

    #[test]
    fn request_parses_iso_dates() {
        let req: RenderRequest = serde_json::from_str(
            r#"{"family_id":"f","start":"2026-03-01","end":"2026-03-31","requested_by":"u"}"#,
        )
        .unwrap();
        assert_eq!(req.start, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }
}
