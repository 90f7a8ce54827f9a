//! # Document Builder
//!
//! Assembles an album out of three kinds of page:
//!
//! ```text
//! cover          family name, period label, optional avatar
//! image pages    one per group of up to 4 images, per post, in order
//! footer         family name, post/photo totals, generation date
//! ```
//!
//! Composition ([`DocumentBuilder::compose`]) is pure and returns the laid
//! out pages; [`DocumentBuilder::build`] serializes them with the PDF
//! writer and reports the page count.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::AlbumConfig;
use crate::error::AlbumError;
use crate::font::{AlbumFonts, ResolvedFont};
use crate::image_loader::EmbeddedImage;
use crate::layout::{
    image_element, layout_group, place_images, Color, DrawCommand, FontRole, Frame, LayoutElement,
    LayoutPage, TextLine,
};
use crate::model::{Family, Image, Period, Post};
use crate::pdf::{DocumentInfo, PdfWriter};
use crate::text::{caption_block, caption_text, metadata_line, wrap_text};

/// Images per page.
pub const GROUP_SIZE: usize = 4;

const AVATAR_SIZE: f64 = 120.0;
const AVATAR_TOP: f64 = 120.0;
const FOOTER_TITLE_SIZE: f64 = 18.0;

/// Everything an album is made of, after content resolution and image
/// embedding.
pub struct AlbumContent<'a> {
    pub family: &'a Family,
    pub period: &'a Period,
    pub posts: &'a [Post],
    /// Embedded images per post, mirroring `posts[i].images`.
    pub images: &'a [Vec<EmbeddedImage>],
    pub avatar: Option<&'a EmbeddedImage>,
    pub generated_at: DateTime<Utc>,
}

/// A serialized album.
#[derive(Debug, Clone)]
pub struct RenderedAlbum {
    pub bytes: Vec<u8>,
    pub page_count: u32,
}

pub struct DocumentBuilder<'a> {
    config: &'a AlbumConfig,
    fonts: &'a AlbumFonts,
}

/// Cover + one page per group of [`GROUP_SIZE`] images + footer.
pub fn expected_page_count(posts: &[Post]) -> u32 {
    let image_pages: usize = posts
        .iter()
        .map(|p| p.images.len().div_ceil(GROUP_SIZE))
        .sum();
    image_pages as u32 + 2
}

impl<'a> DocumentBuilder<'a> {
    pub fn new(config: &'a AlbumConfig, fonts: &'a AlbumFonts) -> Self {
        Self { config, fonts }
    }

    pub fn build(&self, content: &AlbumContent<'_>) -> Result<RenderedAlbum, AlbumError> {
        let pages = self.compose(content);
        debug_assert_eq!(pages.len() as u32, expected_page_count(content.posts));
        let info = DocumentInfo {
            title: Some(format!("{} — {}", content.family.name, content.period.label())),
            author: Some(content.family.name.clone()),
        };
        let bytes = PdfWriter::new().write(&pages, &info, self.fonts)?;
        Ok(RenderedAlbum {
            bytes,
            page_count: pages.len() as u32,
        })
    }

    /// Lay out every page of the album.
    pub fn compose(&self, content: &AlbumContent<'_>) -> Vec<LayoutPage> {
        let mut pages = vec![self.cover_page(content)];

        for (post, embedded) in content.posts.iter().zip(content.images) {
            let post_pages = self.post_pages(post, embedded);
            debug!(post = %post.id, pages = post_pages.len(), "post laid out");
            pages.extend(post_pages);
        }

        pages.push(self.footer_page(content));
        pages
    }

    fn blank_page(&self) -> LayoutPage {
        let geometry = &self.config.page;
        let mut page = LayoutPage::new(geometry.width, geometry.height);
        page.elements.push(LayoutElement {
            frame: Frame::new(0.0, 0.0, geometry.width, geometry.height),
            draw: DrawCommand::Fill {
                color: Color::PAPER,
            },
        });
        page
    }

    fn cover_page(&self, content: &AlbumContent<'_>) -> LayoutPage {
        let geometry = &self.config.page;
        let text = &self.config.text;
        let mut page = self.blank_page();

        let mut y = AVATAR_TOP;
        if let Some(avatar) = content.avatar.filter(|a| !a.is_placeholder()) {
            let frame = Frame::new(
                (geometry.width - AVATAR_SIZE) / 2.0,
                AVATAR_TOP,
                AVATAR_SIZE,
                AVATAR_SIZE,
            );
            page.elements.push(image_element(frame, avatar));
            y = frame.bottom() + 48.0;
        } else {
            y += AVATAR_SIZE / 2.0;
        }

        let title = self.centered_text(
            &content.family.name,
            &self.fonts.title,
            FontRole::Title,
            text.title_size,
            y,
            Color::INK,
        );
        y = title.frame.bottom() + text.subtitle_size;
        page.elements.push(title);

        page.elements.push(self.centered_text(
            &content.period.label(),
            &self.fonts.caption,
            FontRole::Caption,
            text.subtitle_size,
            y,
            Color::MUTED,
        ));

        page
    }

    /// ⌈n/4⌉ pages for a post with n images; none for a post without.
    fn post_pages(&self, post: &Post, embedded: &[EmbeddedImage]) -> Vec<LayoutPage> {
        post.images
            .chunks(GROUP_SIZE)
            .zip(embedded.chunks(GROUP_SIZE))
            .filter_map(|(images, group)| self.group_page(post, images, group))
            .collect()
    }

    fn group_page(
        &self,
        post: &Post,
        images: &[Image],
        group: &[EmbeddedImage],
    ) -> Option<LayoutPage> {
        let dims: Vec<Option<(u32, u32)>> = group.iter().map(EmbeddedImage::dimensions).collect();
        let layout = layout_group(&dims, &self.config.page, &self.config.layout)?;
        let anchor = layout.caption_anchor()?;

        let mut page = self.blank_page();
        let refs: Vec<&EmbeddedImage> = group.iter().collect();
        page.elements.extend(place_images(&layout, &refs));

        let page_images: Vec<&Image> = images.iter().collect();
        let caption = caption_text(post, &page_images, &self.config.text.alt_separator);
        page.elements.extend(caption_block(
            &anchor,
            caption.as_deref(),
            &metadata_line(&post.author, &post.created_at),
            self.fonts,
            &self.config.page,
            &self.config.text,
        ));
        Some(page)
    }

    fn footer_page(&self, content: &AlbumContent<'_>) -> LayoutPage {
        let text = &self.config.text;
        let mut page = self.blank_page();

        let photos: usize = content.posts.iter().map(|p| p.images.len()).sum();
        let summary = format!(
            "{} {} · {} {}",
            content.posts.len(),
            if content.posts.len() == 1 { "post" } else { "posts" },
            photos,
            if photos == 1 { "photo" } else { "photos" },
        );
        let generated = format!("Printed {}", content.generated_at.format("%B %-d, %Y"));

        let mut y = self.config.page.height * 0.4;
        let name = self.centered_text(
            &content.family.name,
            &self.fonts.title,
            FontRole::Title,
            FOOTER_TITLE_SIZE,
            y,
            Color::INK,
        );
        y = name.frame.bottom() + text.caption_size;
        page.elements.push(name);

        let summary = self.centered_text(
            &summary,
            &self.fonts.caption,
            FontRole::Caption,
            text.caption_size,
            y,
            Color::INK,
        );
        y = summary.frame.bottom() + text.meta_size;
        page.elements.push(summary);

        page.elements.push(self.centered_text(
            &generated,
            &self.fonts.caption,
            FontRole::Caption,
            text.meta_size,
            y,
            Color::MUTED,
        ));

        page
    }

    /// Wrapped text centered horizontally, with its box starting at `top`.
    fn centered_text(
        &self,
        content: &str,
        font: &ResolvedFont,
        role: FontRole,
        size: f64,
        top: f64,
        color: Color,
    ) -> LayoutElement {
        let geometry = &self.config.page;
        let max_width = geometry.width - 2.0 * geometry.margin;
        let step = size * self.config.text.line_height;

        let lines: Vec<TextLine> = wrap_text(content, font, size, max_width)
            .into_iter()
            .enumerate()
            .map(|(i, line)| TextLine {
                x: ((geometry.width - font.measure(&line, size)) / 2.0).max(geometry.margin),
                y: top + size + i as f64 * step,
                text: line,
            })
            .collect();

        LayoutElement {
            frame: Frame::new(geometry.margin, top, max_width, lines.len() as f64 * step),
            draw: DrawCommand::Text {
                lines,
                role,
                font_size: size,
                color,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::{ImagePixelData, LoadedImage};
    use crate::layout::Arrangement;
    use crate::model::{Author, ImageLocation, ImageRef};
    use chrono::{NaiveDate, TimeZone};
    use std::sync::Arc;

    fn loaded(w: u32, h: u32) -> EmbeddedImage {
        EmbeddedImage::Loaded(Arc::new(LoadedImage {
            pixel_data: ImagePixelData::Decoded {
                rgb: vec![128; (w * h * 3) as usize],
                alpha: None,
            },
            width_px: w,
            height_px: h,
        }))
    }

    fn post(id: &str, caption: Option<&str>, n: usize) -> Post {
        Post {
            id: id.into(),
            author: Author {
                name: "Ana".into(),
                avatar: None,
            },
            created_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            caption: caption.map(String::from),
            images: (0..n)
                .map(|i| Image {
                    id: format!("{}-{}", id, i),
                    reference: ImageRef::Stored(format!("{}.jpg", i)),
                    alt_text: None,
                    location: ImageLocation::Unresolved,
                })
                .collect(),
        }
    }

    fn family() -> Family {
        Family {
            id: "fam".into(),
            name: "The Silvas".into(),
            avatar: None,
        }
    }

    fn period() -> Period {
        Period::new(
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        )
    }

    fn compose(posts: &[Post], images: &[Vec<EmbeddedImage>]) -> Vec<LayoutPage> {
        let config = AlbumConfig::default();
        let fonts = AlbumFonts::default();
        let (family, period) = (family(), period());
        let content = AlbumContent {
            family: &family,
            period: &period,
            posts,
            images,
            avatar: None,
            generated_at: Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap(),
        };
        DocumentBuilder::new(&config, &fonts).compose(&content)
    }

    #[test]
    fn page_count_follows_groups_of_four() {
        let posts = vec![post("a", None, 5), post("b", None, 0), post("c", None, 4)];
        let images: Vec<Vec<EmbeddedImage>> = posts
            .iter()
            .map(|p| p.images.iter().map(|_| loaded(4, 3)).collect())
            .collect();
        let pages = compose(&posts, &images);
        assert_eq!(pages.len(), 5);
        assert_eq!(expected_page_count(&posts), 5);

        let counts: Vec<usize> = pages[1..4].iter().map(|p| p.image_count()).collect();
        assert_eq!(counts, vec![4, 1, 4]);
    }

    #[test]
    fn cover_and_footer_text() {
        let posts = vec![post("a", None, 2)];
        let images = vec![vec![loaded(4, 3), loaded(4, 3)]];
        let pages = compose(&posts, &images);

        assert_eq!(
            pages[0].text_lines(),
            vec!["The Silvas", "March 1, 2026 – March 31, 2026"]
        );
        assert_eq!(
            pages.last().unwrap().text_lines(),
            vec!["The Silvas", "1 post · 2 photos", "Printed April 1, 2026"]
        );
    }

    #[test]
    fn caption_repeats_on_every_page_of_a_post() {
        let posts = vec![post("a", Some("Beach day"), 6)];
        let images = vec![(0..6).map(|_| loaded(3, 4)).collect()];
        let pages = compose(&posts, &images);
        for page in &pages[1..3] {
            assert_eq!(page.text_lines(), vec!["Beach day", "Ana · Mar 2, 2026"]);
        }
    }

    #[test]
    fn remaining_image_uses_single_layout() {
        let posts = vec![post("a", None, 5)];
        let images = vec![(0..5).map(|_| loaded(400, 300)).collect::<Vec<_>>()];
        let config = AlbumConfig::default();
        let last_page = &compose(&posts, &images)[2];

        let dims = [images[0][4].dimensions()];
        let single = layout_group(&dims, &config.page, &config.layout).unwrap();
        assert!(matches!(single.arrangement, Arrangement::Single(_)));
        let image_frames: Vec<Frame> = last_page
            .elements
            .iter()
            .filter(|e| matches!(e.draw, DrawCommand::Image { .. }))
            .map(|e| e.frame)
            .collect();
        assert_eq!(image_frames, single.frames);
    }

    #[test]
    fn placeholders_match_failed_images() {
        let posts = vec![post("a", None, 3)];
        let images = vec![vec![loaded(4, 3), EmbeddedImage::Placeholder, EmbeddedImage::Placeholder]];
        let pages = compose(&posts, &images);
        assert_eq!(pages[1].placeholder_count(), 2);
        assert_eq!(pages[1].image_count(), 1);
    }

    #[test]
    fn avatar_only_drawn_when_loaded() {
        let config = AlbumConfig::default();
        let fonts = AlbumFonts::default();
        let (family, period) = (family(), period());
        let builder = DocumentBuilder::new(&config, &fonts);
        let avatar = loaded(10, 10);
        let placeholder = EmbeddedImage::Placeholder;

        for (avatar, images) in [(Some(&avatar), 1), (Some(&placeholder), 0), (None, 0)] {
            let content = AlbumContent {
                family: &family,
                period: &period,
                posts: &[],
                images: &[],
                avatar,
                generated_at: Utc::now(),
            };
            let cover = &builder.compose(&content)[0];
            assert_eq!(cover.image_count(), images);
            assert_eq!(cover.placeholder_count(), 0);
        }
    }

    #[test]
    fn build_serializes_every_page() {
        let config = AlbumConfig::default();
        let fonts = AlbumFonts::default();
        let (family, period) = (family(), period());
        let posts = vec![post("a", Some("Beach day"), 1)];
        let images = vec![vec![loaded(4, 3)]];
        let album = DocumentBuilder::new(&config, &fonts)
            .build(&AlbumContent {
                family: &family,
                period: &period,
                posts: &posts,
                images: &images,
                avatar: None,
                generated_at: Utc::now(),
            })
            .unwrap();
        assert_eq!(album.page_count, 3);
        assert_eq!(crate::pdf::count_pages(&album.bytes), Some(3));
    }
}
