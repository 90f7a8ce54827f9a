//! # Content Fetcher
//!
//! Loads a family's posts for a period and turns image references into
//! fetchable locations.
//!
//! Stored references go through a two-bucket fallback: the high-fidelity
//! primary bucket first, then the lower-fidelity bucket under the same
//! path. Each bucket is asked exactly once. When both miss, the image keeps
//! its slot as [`ImageLocation::Unresolved`] and the embedder draws a
//! placeholder for it.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::StorageConfig;
use crate::error::StoreError;
use crate::model::{Author, Image, ImageLocation, ImageRef, Period, Post};
use crate::store::{AlbumStore, AuthorRecord, ObjectStorage, PostRecord};

/// Name shown when no profile column has a usable value.
pub const UNKNOWN_AUTHOR: &str = "Family member";

pub struct ContentFetcher<'a> {
    store: &'a dyn AlbumStore,
    storage: &'a dyn ObjectStorage,
    buckets: &'a StorageConfig,
}

impl<'a> ContentFetcher<'a> {
    pub fn new(
        store: &'a dyn AlbumStore,
        storage: &'a dyn ObjectStorage,
        buckets: &'a StorageConfig,
    ) -> Self {
        Self {
            store,
            storage,
            buckets,
        }
    }

    /// Posts in chronological order, normalized. Locations are not resolved
    /// yet; call [`resolve_locations`](Self::resolve_locations) next.
    pub fn fetch_posts(&self, family_id: &str, period: &Period) -> Result<Vec<Post>, StoreError> {
        let mut records = self.store.posts_in_period(family_id, period)?;
        records.sort_by_key(|r| r.created_at);
        debug!(family_id, posts = records.len(), "fetched posts");
        Ok(records.into_iter().map(normalize_post).collect())
    }

    /// Resolve every image of every post. Lookups are issued concurrently;
    /// each image keeps its position.
    pub fn resolve_locations(&self, posts: &mut [Post]) {
        posts
            .par_iter_mut()
            .flat_map(|post| post.images.par_iter_mut())
            .for_each(|image| {
                image.location = self.resolve(&image.reference);
            });

        let unresolved = posts
            .iter()
            .flat_map(|p| &p.images)
            .filter(|i| !i.location.is_resolved())
            .count();
        if unresolved > 0 {
            warn!(unresolved, "images without a storage location");
        }
    }

    /// Resolve one reference.
    pub fn resolve(&self, reference: &ImageRef) -> ImageLocation {
        match reference {
            ImageRef::Inline(data) => ImageLocation::Inline(data.clone()),
            ImageRef::Remote(url) => ImageLocation::Url(url.clone()),
            ImageRef::Stored(path) => {
                for bucket in [&self.buckets.primary_bucket, &self.buckets.fallback_bucket] {
                    match self.storage.locate(bucket, path) {
                        Ok(url) => return ImageLocation::Url(url),
                        Err(e) => debug!(bucket = %bucket, path = %path, error = %e, "bucket miss"),
                    }
                }
                warn!(path = %path, "image missing from all buckets");
                ImageLocation::Unresolved
            }
        }
    }
}

fn normalize_post(record: PostRecord) -> Post {
    let caption = record
        .caption
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let images = record
        .images
        .into_iter()
        .map(|img| Image {
            id: img.id,
            reference: ImageRef::parse(&img.src),
            alt_text: img
                .alt_text
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
            location: ImageLocation::Unresolved,
        })
        .collect();

    Post {
        id: record.id,
        author: normalize_author(&record.author),
        created_at: record.created_at,
        caption,
        images,
    }
}

/// Pick the author's name from whichever profile column is filled.
pub fn normalize_author(record: &AuthorRecord) -> Author {
    let name = [&record.display_name, &record.full_name, &record.username]
        .into_iter()
        .flatten()
        .map(|n| n.trim())
        .find(|n| !n.is_empty())
        .unwrap_or(UNKNOWN_AUTHOR)
        .to_string();

    Author {
        name,
        avatar: record.avatar_url.clone().filter(|a| !a.is_empty()),
    }
}
