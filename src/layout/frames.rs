//! # Image Frame Geometry
//!
//! Computes where the 1–4 photos of an image page go. Every arrangement
//! starts from a padded content area (padding depends on the arrangement)
//! and splits it into frames separated by the page gutter:
//!
//! ```text
//!  1 image        2 stacked      2 side-by-side   3 images        4 images
//! ┌────────┐     ┌────────┐     ┌───┐ ┌───┐     ┌───┐ ┌───┐    ┌───┐ ┌───┐
//! │        │     │        │     │   │ │   │     │   │ │   │    │   │ │   │
//! │        │     └────────┘     │   │ │   │     │   │ └───┘    └───┘ └───┘
//! │        │     ┌────────┐     │   │ │   │     │   │ ┌───┐    ┌───┐ ┌───┐
//! │        │     │        │     │   │ │   │     │   │ │   │    │   │ │   │
//! └────────┘     └────────┘     └───┘ └───┘     └───┘ └───┘    └───┘ └───┘
//! ```
//!
//! The three- and four-image arrangements live in a square container
//! centered in the content area. Photos are then cropped to fill their
//! frame ([`cover_fit`]); rendering clips to the frame.

use crate::config::{Insets, LayoutConfig, PageGeometry};

/// Tolerance for floating point edge comparisons.
const EPSILON: f64 = 1e-6;

/// Aspect used for images whose size is unknown (not decoded).
pub const FALLBACK_DIMENSIONS: (u32, u32) = (1, 1);

/// A rectangle in page coordinates, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// True if the interiors intersect. Shared edges do not count.
    pub fn overlaps(&self, other: &Frame) -> bool {
        self.x < other.right() - EPSILON
            && other.x < self.right() - EPSILON
            && self.y < other.bottom() - EPSILON
            && other.y < self.bottom() - EPSILON
    }

    pub fn contains(&self, other: &Frame) -> bool {
        other.x >= self.x - EPSILON
            && other.y >= self.y - EPSILON
            && other.right() <= self.right() + EPSILON
            && other.bottom() <= self.bottom() + EPSILON
    }

    /// Padded content area of the page.
    fn inset(page: &PageGeometry, insets: &Insets) -> Frame {
        Frame::new(
            insets.side,
            insets.top,
            (page.width - 2.0 * insets.side).max(0.0),
            (page.height - insets.top - insets.bottom).max(0.0),
        )
    }

    /// Largest square centered inside this frame.
    fn centered_square(&self) -> Frame {
        let side = self.width.min(self.height);
        Frame::new(
            self.x + (self.width - side) / 2.0,
            self.y + (self.height - side) / 2.0,
            side,
            side,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    /// Square images count as portrait.
    pub fn of(width: u32, height: u32) -> Self {
        if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Which rule placed the frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrangement {
    Single(Orientation),
    PairStacked,
    PairSideBySide,
    /// `tall` is the group index of the image in the full-height frame.
    Triple { tall: usize },
    Grid,
}

/// Frames for one image page.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupLayout {
    pub arrangement: Arrangement,
    /// Padded area every frame must stay inside.
    pub content_area: Frame,
    /// One frame per image, in the group's image order.
    pub frames: Vec<Frame>,
}

impl GroupLayout {
    /// The lowest frame, left-most among equally low ones. Captions hang
    /// off this frame.
    pub fn caption_anchor(&self) -> Option<Frame> {
        self.frames.iter().copied().reduce(|best, f| {
            if f.bottom() > best.bottom() + EPSILON
                || ((f.bottom() - best.bottom()).abs() <= EPSILON && f.x < best.x)
            {
                f
            } else {
                best
            }
        })
    }
}

/// Lay out a group of images given their pixel sizes (`None` when unknown).
///
/// Returns `None` for an empty group or one with more than four images;
/// callers split posts into groups of at most four first.
pub fn layout_group(
    dimensions: &[Option<(u32, u32)>],
    page: &PageGeometry,
    config: &LayoutConfig,
) -> Option<GroupLayout> {
    let orientations: Vec<Orientation> = dimensions
        .iter()
        .map(|d| {
            let (w, h) = d.unwrap_or(FALLBACK_DIMENSIONS);
            Orientation::of(w, h)
        })
        .collect();
    let gutter = page.gutter;

    let layout = match orientations.as_slice() {
        [single] => {
            let insets = match single {
                Orientation::Landscape => &config.single_landscape,
                Orientation::Portrait => &config.single_portrait,
            };
            let area = Frame::inset(page, insets);
            GroupLayout {
                arrangement: Arrangement::Single(*single),
                content_area: area,
                frames: vec![area],
            }
        }
        [Orientation::Portrait, Orientation::Portrait] => {
            let area = Frame::inset(page, &config.pair_side_by_side);
            let w = (area.width - gutter) / 2.0;
            GroupLayout {
                arrangement: Arrangement::PairSideBySide,
                content_area: area,
                frames: vec![
                    Frame::new(area.x, area.y, w, area.height),
                    Frame::new(area.x + w + gutter, area.y, w, area.height),
                ],
            }
        }
        [_, _] => {
            let area = Frame::inset(page, &config.pair_stacked);
            let h = (area.height - gutter) / 2.0;
            GroupLayout {
                arrangement: Arrangement::PairStacked,
                content_area: area,
                frames: vec![
                    Frame::new(area.x, area.y, area.width, h),
                    Frame::new(area.x, area.y + h + gutter, area.width, h),
                ],
            }
        }
        [_, _, _] => {
            let tall = orientations
                .iter()
                .position(|o| *o == Orientation::Portrait)
                .unwrap_or(0);
            let area = Frame::inset(page, &config.triple);
            let square = area.centered_square();
            let cell = (square.width - gutter) / 2.0;
            let right_x = square.x + cell + gutter;

            let mut right = [
                Frame::new(right_x, square.y, cell, cell),
                Frame::new(right_x, square.y + cell + gutter, cell, cell),
            ]
            .into_iter();
            let frames = (0..3)
                .map(|i| {
                    if i == tall {
                        Some(Frame::new(square.x, square.y, cell, square.height))
                    } else {
                        right.next()
                    }
                })
                .collect::<Option<Vec<Frame>>>()?;

            GroupLayout {
                arrangement: Arrangement::Triple { tall },
                content_area: area,
                frames,
            }
        }
        [_, _, _, _] => {
            let area = Frame::inset(page, &config.grid);
            let square = area.centered_square();
            let cell = (square.width - gutter) / 2.0;
            let frames = (0..4)
                .map(|i| {
                    let col = (i % 2) as f64;
                    let row = (i / 2) as f64;
                    Frame::new(
                        square.x + col * (cell + gutter),
                        square.y + row * (cell + gutter),
                        cell,
                        cell,
                    )
                })
                .collect();
            GroupLayout {
                arrangement: Arrangement::Grid,
                content_area: area,
                frames,
            }
        }
        _ => return None,
    };

    Some(layout)
}

/// Where a cropped-to-fill image is drawn. May extend past its frame;
/// rendering clips to the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

/// Scale an image to cover the frame, centered, preserving aspect ratio.
pub fn cover_fit(frame: &Frame, image_width: u32, image_height: u32) -> Placement {
    let (iw, ih) = if image_width == 0 || image_height == 0 {
        FALLBACK_DIMENSIONS
    } else {
        (image_width, image_height)
    };
    let (iw, ih) = (iw as f64, ih as f64);

    let scale = (frame.width / iw).max(frame.height / ih);
    let width = iw * scale;
    let height = ih * scale;

    Placement {
        x: frame.x + (frame.width - width) / 2.0,
        y: frame.y + (frame.height - height) / 2.0,
        width,
        height,
        scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANDSCAPE: Option<(u32, u32)> = Some((1600, 1200));
    const PORTRAIT: Option<(u32, u32)> = Some((1200, 1600));

    fn layout(dims: &[Option<(u32, u32)>]) -> GroupLayout {
        layout_group(dims, &PageGeometry::default(), &LayoutConfig::default()).unwrap()
    }

    fn assert_valid(layout: &GroupLayout, n: usize) {
        let page = PageGeometry::default();
        let page_frame = Frame::new(0.0, 0.0, page.width, page.height);
        assert_eq!(layout.frames.len(), n);
        assert!(page_frame.contains(&layout.content_area));
        for (i, a) in layout.frames.iter().enumerate() {
            assert!(a.width > 0.0 && a.height > 0.0);
            assert!(
                layout.content_area.contains(a),
                "frame {} {:?} escapes {:?}",
                i,
                a,
                layout.content_area
            );
            for b in &layout.frames[i + 1..] {
                assert!(!a.overlaps(b), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn every_orientation_mix_is_valid() {
        let options = [LANDSCAPE, PORTRAIT, None];
        for n in 1..=4usize {
            // every combination of orientations for n images
            for combo in 0..options.len().pow(n as u32) {
                let dims: Vec<Option<(u32, u32)>> = (0..n)
                    .map(|i| options[(combo / options.len().pow(i as u32)) % options.len()])
                    .collect();
                assert_valid(&layout(&dims), n);
            }
        }
    }

    #[test]
    fn empty_and_oversized_groups_rejected() {
        let page = PageGeometry::default();
        let cfg = LayoutConfig::default();
        assert!(layout_group(&[], &page, &cfg).is_none());
        assert!(layout_group(&[LANDSCAPE; 5], &page, &cfg).is_none());
    }

    #[test]
    fn single_landscape_uses_landscape_padding() {
        let cfg = LayoutConfig::default();
        let l = layout(&[LANDSCAPE]);
        assert_eq!(l.arrangement, Arrangement::Single(Orientation::Landscape));
        let f = l.frames[0];
        assert_eq!(f.x, cfg.single_landscape.side);
        assert_eq!(f.y, cfg.single_landscape.top);
        assert_eq!(f.width, 396.0 - 2.0 * cfg.single_landscape.side);
        assert_eq!(f.bottom(), 612.0 - cfg.single_landscape.bottom);
    }

    #[test]
    fn single_portrait_has_narrower_sides_and_smaller_vertical_padding() {
        let cfg = LayoutConfig::default();
        let l = layout(&[PORTRAIT]);
        assert_eq!(l.arrangement, Arrangement::Single(Orientation::Portrait));
        let landscape = layout(&[LANDSCAPE]);
        assert!(cfg.single_landscape.side > cfg.single_portrait.side);
        assert!(
            cfg.single_landscape.top + cfg.single_landscape.bottom
                > cfg.single_portrait.top + cfg.single_portrait.bottom
        );
        assert_eq!(l.frames[0].x, cfg.single_portrait.side);
        assert!(l.frames[0].x < landscape.frames[0].x);
        assert!(l.frames[0].width > landscape.frames[0].width);
        assert!(l.frames[0].height > landscape.frames[0].height);
    }

    #[test]
    fn unknown_size_treated_as_square_portrait() {
        let l = layout(&[None]);
        assert_eq!(l.arrangement, Arrangement::Single(Orientation::Portrait));
    }

    #[test]
    fn pairs() {
        assert_eq!(layout(&[LANDSCAPE, LANDSCAPE]).arrangement, Arrangement::PairStacked);
        assert_eq!(layout(&[LANDSCAPE, PORTRAIT]).arrangement, Arrangement::PairStacked);
        assert_eq!(layout(&[PORTRAIT, LANDSCAPE]).arrangement, Arrangement::PairStacked);

        let side = layout(&[PORTRAIT, PORTRAIT]);
        assert_eq!(side.arrangement, Arrangement::PairSideBySide);
        let [a, b] = [side.frames[0], side.frames[1]];
        assert_eq!(a.width, b.width);
        assert_eq!(a.height, b.height);
        assert!((b.x - a.right() - 10.0).abs() < 1e-9);

        let stacked = layout(&[LANDSCAPE, LANDSCAPE]);
        let [a, b] = [stacked.frames[0], stacked.frames[1]];
        assert_eq!(a.height, b.height);
        assert!((b.y - a.bottom() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn triple_prefers_portrait_for_tall_frame() {
        let l = layout(&[LANDSCAPE, PORTRAIT, LANDSCAPE]);
        assert_eq!(l.arrangement, Arrangement::Triple { tall: 1 });
        let tall = l.frames[1];
        assert!(tall.height > tall.width);
        // the other two are squares on the right, first above second
        for f in [l.frames[0], l.frames[2]] {
            assert!((f.width - f.height).abs() < 1e-9);
            assert!(f.x > tall.right());
        }
        assert!(l.frames[0].y < l.frames[2].y);
        assert!((l.frames[2].bottom() - tall.bottom()).abs() < 1e-9);
    }

    #[test]
    fn triple_without_portrait_uses_first() {
        let l = layout(&[LANDSCAPE, LANDSCAPE, LANDSCAPE]);
        assert_eq!(l.arrangement, Arrangement::Triple { tall: 0 });
    }

    #[test]
    fn grid_is_centered_equal_squares() {
        let l = layout(&[LANDSCAPE, PORTRAIT, None, LANDSCAPE]);
        assert_eq!(l.arrangement, Arrangement::Grid);
        let cell = l.frames[0].width;
        for f in &l.frames {
            assert!((f.width - cell).abs() < 1e-9 && (f.height - cell).abs() < 1e-9);
        }
        let left_gap = l.frames[0].x - l.content_area.x;
        let right_gap = l.content_area.right() - l.frames[1].right();
        assert!((left_gap - right_gap).abs() < 1e-9);
        let top_gap = l.frames[0].y - l.content_area.y;
        let bottom_gap = l.content_area.bottom() - l.frames[3].bottom();
        assert!((top_gap - bottom_gap).abs() < 1e-9);
    }

    #[test]
    fn cover_fit_scale_is_max_ratio_and_covers_frame() {
        let frame = Frame::new(20.0, 30.0, 300.0, 200.0);
        for (iw, ih) in [(1600, 1200), (1200, 1600), (500, 500), (3000, 100), (7, 9000)] {
            let p = cover_fit(&frame, iw, ih);
            let expected = (300.0 / iw as f64).max(200.0 / ih as f64);
            assert!((p.scale - expected).abs() < 1e-12);
            assert!(p.x <= frame.x + 1e-9 && p.y <= frame.y + 1e-9);
            assert!(p.x + p.width >= frame.right() - 1e-9);
            assert!(p.y + p.height >= frame.bottom() - 1e-9);
            // centered
            assert!(((p.x + p.width / 2.0) - (frame.x + 150.0)).abs() < 1e-9);
            assert!(((p.y + p.height / 2.0) - (frame.y + 100.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn cover_fit_zero_size_falls_back_to_square() {
        let frame = Frame::new(0.0, 0.0, 100.0, 50.0);
        let p = cover_fit(&frame, 0, 10);
        assert_eq!(p.width, 100.0);
        assert_eq!(p.height, 100.0);
    }

    #[test]
    fn caption_anchor_is_lowest_then_leftmost() {
        let grid = layout(&[LANDSCAPE; 4]);
        assert_eq!(grid.caption_anchor(), Some(grid.frames[2]));
        let side = layout(&[PORTRAIT, PORTRAIT]);
        assert_eq!(side.caption_anchor(), Some(side.frames[0]));
        let stacked = layout(&[LANDSCAPE, LANDSCAPE]);
        assert_eq!(stacked.caption_anchor(), Some(stacked.frames[1]));
    }
}
