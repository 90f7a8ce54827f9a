//! Structured error types for the album pipeline.
//!
//! Only lookup failures (family missing, empty period) and upstream I/O
//! failures abort a render. Image and font problems have their own error
//! types here, but those are caught at the component boundary and turned
//! into placeholders or built-in fonts.

use thiserror::Error;

/// Failure reported by the relational store (jobs, families, posts).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Record not found: {0}")]
    Missing(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by object storage (image buckets, album uploads).
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {bucket}/{path}")]
    NotFound { bucket: String, path: String },
    #[error("Fetch failed for '{0}': {1}")]
    Fetch(String, String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A font candidate could not be loaded or embedded.
#[derive(Error, Debug)]
pub enum FontError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse font: {0}")]
    Parse(String),
    #[error("Custom font embedding is not available")]
    Unsupported,
}

/// Why an image ended up as a placeholder.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Image location could not be resolved")]
    Unresolved,
    #[error("Fetch failed: {0}")]
    Fetch(#[from] StorageError),
    #[error("Base64 decode error: {0}")]
    Base64(String),
    #[error("Image data too short")]
    TooShort,
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Decode failed: {0}")]
    Decode(String),
}

/// The unified error type returned by the render pipeline.
///
/// The `Display` text is shown verbatim to callers and persisted as the
/// job's `error_message`, so backend detail stays in `source()` and the logs.
#[derive(Error, Debug)]
pub enum AlbumError {
    #[error("Failed to create render job")]
    JobCreate(#[source] StoreError),
    #[error("Family not found")]
    FamilyNotFound,
    #[error("Failed to load family")]
    FamilyLookup(#[source] StoreError),
    #[error("Failed to fetch posts")]
    FetchPosts(#[source] StoreError),
    #[error("No posts found for the specified period")]
    NoPosts,
    #[error("Failed to upload album")]
    Upload(#[source] StorageError),
    #[error("Failed to update render job")]
    JobUpdate(#[source] StoreError),
    #[error("Render error: {0}")]
    Render(String),
}

impl AlbumError {
    /// HTTP status code reported by the request handler.
    pub fn status_code(&self) -> u16 {
        match self {
            AlbumError::FamilyNotFound => 404,
            AlbumError::NoPosts => 400,
            _ => 500,
        }
    }
}
