//! # Album Configuration
//!
//! Page geometry, layout paddings, typography and storage names live in one
//! immutable [`AlbumConfig`] value that is handed to the layout, font and
//! document components. None of these are request parameters: the defaults
//! are the production constants, and a JSON file can override them for
//! local runs.
//!
//! All lengths are PDF points (1/72 inch), measured from the top-left corner
//! of the page.

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable holding title font candidate path(s).
pub const TITLE_FONT_ENV: &str = "FOLIO_TITLE_FONT";
/// Environment variable holding caption font candidate path(s).
pub const CAPTION_FONT_ENV: &str = "FOLIO_CAPTION_FONT";

const DEFAULT_TITLE_FONT: &str = "assets/fonts/title.ttf";
const DEFAULT_CAPTION_FONT: &str = "assets/fonts/caption.ttf";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AlbumConfig {
    pub page: PageGeometry,
    pub layout: LayoutConfig,
    pub text: TextConfig,
    pub fonts: FontConfig,
    pub storage: StorageConfig,
}

impl AlbumConfig {
    /// Load a config file, filling anything it omits with defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, crate::error::StoreError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Fixed page canvas: a half-letter sheet.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    /// Outer padding used by the cover, footer and caption block.
    pub margin: f64,
    /// Space between neighbouring frames, in both axes.
    pub gutter: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: 396.0,
            height: 612.0,
            margin: 24.0,
            gutter: 10.0,
        }
    }
}

/// Padding around the content area of an image page.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Insets {
    /// Left and right padding.
    pub side: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Insets {
    pub const fn new(side: f64, top: f64, bottom: f64) -> Self {
        Self { side, top, bottom }
    }
}

/// Per-arrangement paddings. Each image page picks exactly one of these.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub single_landscape: Insets,
    pub single_portrait: Insets,
    pub pair_stacked: Insets,
    pub pair_side_by_side: Insets,
    pub triple: Insets,
    pub grid: Insets,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            single_landscape: Insets::new(40.0, 110.0, 190.0),
            single_portrait: Insets::new(24.0, 48.0, 120.0),
            pair_stacked: Insets::new(36.0, 40.0, 110.0),
            pair_side_by_side: Insets::new(24.0, 100.0, 170.0),
            triple: Insets::new(24.0, 60.0, 140.0),
            grid: Insets::new(24.0, 60.0, 140.0),
        }
    }
}

/// Typography sizes and caption placement.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub title_size: f64,
    pub subtitle_size: f64,
    pub caption_size: f64,
    pub meta_size: f64,
    /// Line height as a multiple of font size.
    pub line_height: f64,
    /// Vertical distance between the image block and the first caption line.
    pub caption_gap: f64,
    /// Distance from the right page edge where caption lines must stop.
    pub caption_right_margin: f64,
    /// Joins alt texts when a post has no caption of its own.
    pub alt_separator: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            title_size: 28.0,
            subtitle_size: 13.0,
            caption_size: 11.0,
            meta_size: 8.5,
            line_height: 1.3,
            caption_gap: 14.0,
            caption_right_margin: 24.0,
            alt_separator: " · ".to_string(),
        }
    }
}

/// Ordered font candidate chains.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub title_candidates: Vec<PathBuf>,
    pub caption_candidates: Vec<PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            title_candidates: vec![PathBuf::from(DEFAULT_TITLE_FONT)],
            caption_candidates: vec![PathBuf::from(DEFAULT_CAPTION_FONT)],
        }
    }
}

impl FontConfig {
    /// Put the environment's candidates in front of this chain, so they win
    /// over both a config file and the defaults.
    pub fn with_env(self) -> Self {
        self.prepend_paths(
            env::var_os(TITLE_FONT_ENV).as_deref(),
            env::var_os(CAPTION_FONT_ENV).as_deref(),
        )
    }

    fn prepend_paths(
        mut self,
        title: Option<&std::ffi::OsStr>,
        caption: Option<&std::ffi::OsStr>,
    ) -> Self {
        fn prepend(chain: &mut Vec<PathBuf>, var: Option<&std::ffi::OsStr>) {
            let Some(var) = var else { return };
            let mut paths: Vec<PathBuf> = env::split_paths(var)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            paths.append(chain);
            *chain = paths;
        }

        prepend(&mut self.title_candidates, title);
        prepend(&mut self.caption_candidates, caption);
        self
    }
}

/// Bucket names in object storage.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// High-fidelity originals.
    pub primary_bucket: String,
    /// Lower-fidelity copies, same object paths.
    pub fallback_bucket: String,
    /// Where finished albums are uploaded.
    pub output_bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            primary_bucket: "post-images".to_string(),
            fallback_bucket: "post-images-compressed".to_string(),
            output_bucket: "albums".to_string(),
        }
    }
}
