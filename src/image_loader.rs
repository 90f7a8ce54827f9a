//! # Image Loading and Decoding
//!
//! Fetches the bytes behind an [`ImageLocation`] and prepares them for PDF
//! embedding. JPEG images pass through without re-encoding (the PDF format
//! supports DCTDecode natively). PNG, WebP and GIF images are decoded to RGB
//! pixels with a separate alpha channel for SMask transparency.
//!
//! Nothing here fails a render. Any problem (no location, fetch error,
//! unknown format, corrupt data) produces [`EmbeddedImage::Placeholder`],
//! which the layout engine draws as a neutral block of the same frame size.

use std::io::Cursor;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::warn;

use crate::error::ImageError;
use crate::model::{ImageLocation, Post};
use crate::store::ObjectStorage;

/// A fully decoded/loaded image ready for PDF embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

/// The pixel data in a format the PDF serializer can consume directly.
#[derive(Debug, Clone)]
pub enum ImagePixelData {
    /// Raw JPEG bytes — embed directly with DCTDecode.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// Decoded RGB pixels + optional alpha channel.
    Decoded {
        /// width * height * 3 bytes (RGB)
        rgb: Vec<u8>,
        /// width * height bytes (grayscale alpha). None if fully opaque.
        alpha: Option<Vec<u8>>,
    },
}

/// JPEG color space for the PDF /ColorSpace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

/// An image slot after embedding: real pixels or a placeholder.
#[derive(Debug, Clone)]
pub enum EmbeddedImage {
    Loaded(Arc<LoadedImage>),
    Placeholder,
}

impl EmbeddedImage {
    /// Pixel size, if the image decoded.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            EmbeddedImage::Loaded(img) => Some((img.width_px, img.height_px)),
            EmbeddedImage::Placeholder => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, EmbeddedImage::Placeholder)
    }
}

pub struct ImageEmbedder<'a> {
    storage: &'a dyn ObjectStorage,
}

impl<'a> ImageEmbedder<'a> {
    pub fn new(storage: &'a dyn ObjectStorage) -> Self {
        Self { storage }
    }

    /// Load one image, degrading to a placeholder on any failure.
    pub fn embed(&self, location: &ImageLocation) -> EmbeddedImage {
        match self.load(location) {
            Ok(img) => EmbeddedImage::Loaded(Arc::new(img)),
            Err(e) => {
                warn!(error = %e, "image replaced by placeholder");
                EmbeddedImage::Placeholder
            }
        }
    }

    /// Load every image of every post concurrently. The result mirrors the
    /// post/image structure exactly.
    pub fn embed_posts(&self, posts: &[Post]) -> Vec<Vec<EmbeddedImage>> {
        posts
            .par_iter()
            .map(|post| {
                post.images
                    .par_iter()
                    .map(|image| self.embed(&image.location))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn load(&self, location: &ImageLocation) -> Result<LoadedImage, ImageError> {
        let raw_bytes = match location {
            ImageLocation::Inline(src) => read_inline_bytes(src)?,
            ImageLocation::Url(url) => self.storage.fetch(url)?,
            ImageLocation::Unresolved => return Err(ImageError::Unresolved),
        };
        decode_image_bytes(&raw_bytes)
    }
}

/// Decode a `data:image/...;base64,` URI or bare base64 payload.
fn read_inline_bytes(src: &str) -> Result<Vec<u8>, ImageError> {
    let b64_data = if src.starts_with("data:") {
        let comma_pos = src
            .find(',')
            .ok_or_else(|| ImageError::Base64("Invalid data URI: missing comma".into()))?;
        &src[comma_pos + 1..]
    } else {
        src
    };
    base64_decode(b64_data)
}

fn base64_decode(input: &str) -> Result<Vec<u8>, ImageError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| ImageError::Base64(e.to_string()))
}

/// Detect image format from magic bytes and decode accordingly.
pub fn decode_image_bytes(data: &[u8]) -> Result<LoadedImage, ImageError> {
    if data.len() < 4 {
        return Err(ImageError::TooShort);
    }

    if is_jpeg(data) {
        decode_jpeg(data)
    } else if is_png(data) || is_webp(data) || is_gif(data) {
        decode_raster(data)
    } else {
        Err(ImageError::UnsupportedFormat)
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}

fn is_webp(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
}

fn is_gif(data: &[u8]) -> bool {
    data.starts_with(b"GIF8")
}

/// JPEG: read dimensions and color space without decoding pixels.
fn decode_jpeg(data: &[u8]) -> Result<LoadedImage, ImageError> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            color_space: detect_jpeg_color_space(data),
        },
        width_px: width,
        height_px: height,
    })
}

/// Scan JPEG markers to find the SOF (Start of Frame) segment and read
/// the number of components to determine color space.
fn detect_jpeg_color_space(data: &[u8]) -> JpegColorSpace {
    let mut i = 2; // skip SOI marker (FF D8)
    while i + 1 < data.len() {
        if data[i] != 0xFF {
            break;
        }
        let marker = data[i + 1];
        // SOF markers: C0-C3, C5-C7, C9-CB, CD-CF
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof && i + 9 < data.len() {
            // length(2) + precision(1) + height(2) + width(2) + num_components(1)
            return if data[i + 9] == 1 {
                JpegColorSpace::DeviceGray
            } else {
                JpegColorSpace::DeviceRGB
            };
        }
        if i + 3 < data.len() {
            let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            i += 2 + seg_len;
        } else {
            break;
        }
    }
    JpegColorSpace::DeviceRGB
}

/// Everything else: decode to RGBA, split into RGB + alpha.
fn decode_raster(data: &[u8]) -> Result<LoadedImage, ImageError> {
    let img = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let pixel_count = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    let mut has_transparency = false;

    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel[3]);
        if pixel[3] != 255 {
            has_transparency = true;
        }
    }

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: has_transparency.then_some(alpha),
        },
        width_px: width,
        height_px: height,
    })
}
