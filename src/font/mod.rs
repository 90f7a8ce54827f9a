//! # Font Resolution
//!
//! Titles and captions each have an ordered chain of candidate font files.
//! The resolver walks a chain and keeps the first candidate that loads and
//! embeds; if none does, that text role uses a built-in PDF font (Helvetica
//! family), which needs no embedding. A missing or broken font file only
//! changes typography, it never stops a render.
//!
//! Embedding custom fonts is a capability ([`FontEmbedder`]). The default
//! [`StandardFontsOnly`] refuses every candidate, so the built-in fonts are
//! used; [`TrueTypeEmbedder`] parses TrueType/OpenType files with
//! ttf-parser.

#[cfg(test)]
pub(crate) mod fixtures;
pub mod metrics;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::FontConfig;
use crate::error::FontError;
pub use metrics::StandardFontMetrics;

/// The built-in fonts the album uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica => &metrics::HELVETICA,
            Self::HelveticaBold => &metrics::HELVETICA_BOLD,
        }
    }
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
    /// Maps characters to their glyph IDs in the font.
    pub glyph_ids: HashMap<char, u16>,
}

impl CustomFontMetrics {
    /// Get the advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Result<Self, FontError> {
        let face =
            ttf_parser::Face::parse(data, 0).map_err(|e| FontError::Parse(e.to_string()))?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut glyph_ids = HashMap::new();
        let mut default_advance = 0u16;

        for code in 32u32..=0xFFFF {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advance_widths.insert(ch, advance);
                    glyph_ids.insert(ch, glyph_id.0);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }

        if glyph_ids.is_empty() {
            return Err(FontError::Parse("font maps no characters".into()));
        }
        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Ok(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            glyph_ids,
        })
    }
}

/// A font file accepted by a [`FontEmbedder`].
#[derive(Debug)]
pub struct CustomFont {
    /// PDF-safe base font name.
    pub name: String,
    pub data: Vec<u8>,
    pub metrics: CustomFontMetrics,
}

/// The font a text role ends up with.
#[derive(Debug, Clone)]
pub enum ResolvedFont {
    Standard(StandardFont),
    Custom(Arc<CustomFont>),
}

impl ResolvedFont {
    /// Measure the width of a string in points.
    pub fn measure(&self, text: &str, font_size: f64) -> f64 {
        match self {
            ResolvedFont::Standard(f) => f.metrics().measure_string(text, font_size, 0.0),
            ResolvedFont::Custom(f) => text
                .chars()
                .map(|ch| f.metrics.char_width(ch, font_size))
                .sum(),
        }
    }

    pub fn base_name(&self) -> &str {
        match self {
            ResolvedFont::Standard(f) => f.pdf_name(),
            ResolvedFont::Custom(f) => &f.name,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_custom(&self) -> bool {
        matches!(self, ResolvedFont::Custom(_))
    }
}

/// Fonts for the two text roles of an album.
#[derive(Debug, Clone)]
pub struct AlbumFonts {
    pub title: ResolvedFont,
    pub caption: ResolvedFont,
}

impl Default for AlbumFonts {
    fn default() -> Self {
        Self {
            title: ResolvedFont::Standard(StandardFont::HelveticaBold),
            caption: ResolvedFont::Standard(StandardFont::Helvetica),
        }
    }
}

/// Turns font file bytes into an embeddable font.
pub trait FontEmbedder: Send + Sync {
    fn embed(&self, name: &str, data: Vec<u8>) -> Result<CustomFont, FontError>;
}

/// Accepts nothing; every role falls back to its built-in font.
pub struct StandardFontsOnly;

impl FontEmbedder for StandardFontsOnly {
    fn embed(&self, _name: &str, _data: Vec<u8>) -> Result<CustomFont, FontError> {
        Err(FontError::Unsupported)
    }
}

/// Embeds TrueType/OpenType outlines as CID fonts.
pub struct TrueTypeEmbedder;

impl FontEmbedder for TrueTypeEmbedder {
    fn embed(&self, name: &str, data: Vec<u8>) -> Result<CustomFont, FontError> {
        let metrics = CustomFontMetrics::from_font_data(&data)?;
        Ok(CustomFont {
            name: sanitize_font_name(name),
            data,
            metrics,
        })
    }
}

pub struct FontResolver {
    embedder: Box<dyn FontEmbedder>,
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::new(Box::new(StandardFontsOnly))
    }
}

impl FontResolver {
    pub fn new(embedder: Box<dyn FontEmbedder>) -> Self {
        Self { embedder }
    }

    /// Resolve both roles.
    pub fn resolve(&self, config: &FontConfig) -> AlbumFonts {
        AlbumFonts {
            title: self.resolve_chain(&config.title_candidates, StandardFont::HelveticaBold),
            caption: self.resolve_chain(&config.caption_candidates, StandardFont::Helvetica),
        }
    }

    /// First candidate that loads and embeds, else `fallback`.
    pub fn resolve_chain(&self, candidates: &[PathBuf], fallback: StandardFont) -> ResolvedFont {
        for path in candidates {
            match self.load(path) {
                Ok(font) => {
                    debug!(path = %path.display(), font = %font.name, "custom font loaded");
                    return ResolvedFont::Custom(Arc::new(font));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "font candidate rejected"),
            }
        }
        debug!(font = fallback.pdf_name(), "using built-in font");
        ResolvedFont::Standard(fallback)
    }

    fn load(&self, path: &Path) -> Result<CustomFont, FontError> {
        let data = std::fs::read(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("CustomFont");
        self.embedder.embed(name, data)
    }
}

/// Sanitize a font name for use as a PDF name object.
fn sanitize_font_name(family: &str) -> String {
    let name: String = family
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if name.is_empty() {
        "CustomFont".to_string()
    } else {
        name
    }
}
