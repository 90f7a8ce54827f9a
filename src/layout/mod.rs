//! # Page Layout
//!
//! Pages are built directly as lists of positioned draw commands. There is
//! no flow layout: every page of an album is one of a few fixed designs,
//! so each element gets absolute coordinates (top-left origin, points) and
//! the PDF writer only has to translate them.
//!
//! [`frames`] holds the geometry for image pages. This module turns a
//! group's frames plus its embedded images into draw commands, including
//! the clipped crop-to-fill placement and the placeholder fallback.

pub mod frames;

use std::sync::Arc;

pub use frames::{cover_fit, layout_group, Arrangement, Frame, GroupLayout, Orientation, Placement};

use crate::image_loader::{EmbeddedImage, LoadedImage};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const INK: Color = Color::rgb(0.13, 0.13, 0.15);
    pub const MUTED: Color = Color::rgb(0.45, 0.45, 0.48);
    /// Neutral fill for images that could not be embedded.
    pub const PLACEHOLDER: Color = Color::rgb(0.9, 0.9, 0.9);
    pub const PAPER: Color = Color::rgb(0.97, 0.96, 0.93);

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

/// Which resolved font a text element uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontRole {
    Title,
    Caption,
}

/// A fully laid-out page ready for PDF serialization.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<LayoutElement>,
}

impl LayoutPage {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
        }
    }

    /// Frames drawn as placeholders on this page.
    pub fn placeholder_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e.draw, DrawCommand::ImagePlaceholder))
            .count()
    }

    pub fn image_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e.draw, DrawCommand::Image { .. }))
            .count()
    }

    /// All text on the page, one entry per line, in drawing order.
    pub fn text_lines(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|e| match &e.draw {
                DrawCommand::Text { lines, .. } => Some(lines),
                _ => None,
            })
            .flatten()
            .map(|l| l.text.as_str())
            .collect()
    }
}

/// A positioned element on a page.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    /// Bounding box; images and placeholders are clipped to it.
    pub frame: Frame,
    pub draw: DrawCommand,
}

/// What to actually draw for this element.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Solid rectangle filling the frame.
    Fill { color: Color },
    /// Draw an image at `placement`, clipped to the element frame.
    Image {
        image: Arc<LoadedImage>,
        placement: Placement,
    },
    /// Draw a grey placeholder rectangle (fallback when image loading fails).
    ImagePlaceholder,
    /// Draw text lines.
    Text {
        lines: Vec<TextLine>,
        role: FontRole,
        font_size: f64,
        color: Color,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub x: f64,
    /// Baseline position.
    pub y: f64,
    pub text: String,
}

/// Draw commands for the images of one group, one per frame.
///
/// `images` and `layout.frames` are matched by position.
pub fn place_images(layout: &GroupLayout, images: &[&EmbeddedImage]) -> Vec<LayoutElement> {
    layout
        .frames
        .iter()
        .zip(images)
        .map(|(frame, image)| image_element(*frame, image))
        .collect()
}

/// One image cropped to fill `frame`, or a placeholder of the same size.
pub fn image_element(frame: Frame, image: &EmbeddedImage) -> LayoutElement {
    let draw = match image {
        EmbeddedImage::Loaded(img) => DrawCommand::Image {
            placement: cover_fit(&frame, img.width_px, img.height_px),
            image: Arc::clone(img),
        },
        EmbeddedImage::Placeholder => DrawCommand::ImagePlaceholder,
    };
    LayoutElement { frame, draw }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LayoutConfig, PageGeometry};
    use crate::image_loader::ImagePixelData;

    fn loaded(w: u32, h: u32) -> EmbeddedImage {
        EmbeddedImage::Loaded(Arc::new(LoadedImage {
            pixel_data: ImagePixelData::Decoded {
                rgb: vec![0; (w * h * 3) as usize],
                alpha: None,
            },
            width_px: w,
            height_px: h,
        }))
    }

    #[test]
    fn placeholders_keep_frame_dimensions() {
        let imgs = [loaded(40, 30), EmbeddedImage::Placeholder, loaded(30, 40)];
        let dims: Vec<_> = imgs.iter().map(|i| i.dimensions()).collect();
        let layout = layout_group(&dims, &PageGeometry::default(), &LayoutConfig::default())
            .unwrap();
        let refs: Vec<&EmbeddedImage> = imgs.iter().collect();
        let elements = place_images(&layout, &refs);

        assert_eq!(elements.len(), 3);
        for (el, frame) in elements.iter().zip(&layout.frames) {
            assert_eq!(el.frame, *frame);
        }
        assert!(matches!(elements[1].draw, DrawCommand::ImagePlaceholder));

        let mut page = LayoutPage::new(396.0, 612.0);
        page.elements = elements;
        assert_eq!(page.placeholder_count(), 1);
        assert_eq!(page.image_count(), 2);
    }

    #[test]
    fn image_placement_covers_its_frame() {
        let frame = Frame::new(10.0, 10.0, 100.0, 100.0);
        let el = image_element(frame, &loaded(200, 100));
        match el.draw {
            DrawCommand::Image { placement, .. } => {
                assert_eq!(placement.height, 100.0);
                assert_eq!(placement.width, 200.0);
                assert_eq!(placement.x, -40.0);
            }
            _ => panic!("expected image"),
        }
    }
}
