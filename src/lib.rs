//! # Folio
//!
//! Turns a family's timeline of posts over a date range into a printable
//! photo album: a cover, one page per group of up to four photos with the
//! post's caption underneath, and a closing footer page.
//!
//! Every page is one of a handful of fixed designs on a half-letter sheet.
//! Layout is deterministic: the same posts and images always produce the
//! same frames, and a photo that cannot be fetched or decoded still keeps
//! its frame as a grey placeholder. Only missing families, empty periods
//! and storage outages stop an album.
//!
//! ## Architecture
//!
//! ```text
//! RenderRequest
//!       ↓
//!   [job]           — job row lifecycle, upload, response shaping
//!       ↓
//!   [content]       — posts for the period, bucket-fallback locations
//!       ↓
//!   [image_loader]  — fetch + decode, placeholder on failure
//!       ↓
//!   [document]      — cover, image-group pages, footer
//!       ├─ [layout]   frames and crop-to-fill placement
//!       └─ [text]     captions and author/date lines
//!       ↓
//!   [pdf]           — serialize to PDF bytes
//! ```
//!
//! External systems sit behind the traits in [`store`]; fonts are resolved
//! once per service by [`font::FontResolver`].

pub mod config;
pub mod content;
pub mod document;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod job;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod store;
pub mod text;

pub use config::AlbumConfig;
pub use error::AlbumError;
pub use job::{AlbumService, RenderRequest, RenderResponse};
