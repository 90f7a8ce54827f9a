//! # Captions
//!
//! Chooses the caption for an image page, wraps it to the space right of
//! the page's caption anchor (the lowest, left-most frame) and stacks the
//! caption lines plus a smaller author/date line underneath the photos.
//!
//! Line breaking is greedy and width-aware: words are added to the current
//! line while the measured width stays within the limit. A word wider than
//! the limit gets a line of its own rather than being split.

use chrono::{DateTime, Utc};

use crate::config::{PageGeometry, TextConfig};
use crate::font::{AlbumFonts, ResolvedFont};
use crate::layout::{Color, DrawCommand, FontRole, Frame, LayoutElement, TextLine};
use crate::model::{Author, Image, Post};

const ELLIPSIS: char = '…';

/// The post's own text, else the alt texts of the images on this page,
/// else nothing.
pub fn caption_text(post: &Post, page_images: &[&Image], separator: &str) -> Option<String> {
    if let Some(caption) = post.caption.as_deref().map(str::trim) {
        if !caption.is_empty() {
            return Some(caption.to_string());
        }
    }

    let alts: Vec<&str> = page_images
        .iter()
        .filter_map(|i| i.alt_text.as_deref())
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .collect();
    if alts.is_empty() {
        None
    } else {
        Some(alts.join(separator))
    }
}

/// "Ana · Mar 2, 2026"
pub fn metadata_line(author: &Author, created_at: &DateTime<Utc>) -> String {
    format!("{} · {}", author.name, created_at.format("%b %-d, %Y"))
}

/// Greedy word wrap. Explicit newlines start a new paragraph; blank
/// paragraphs are dropped.
pub fn wrap_text(text: &str, font: &ResolvedFont, font_size: f64, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{} {}", current, word);
            if font.measure(&candidate, font_size) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Caption and metadata text positioned below `anchor`.
pub fn caption_block(
    anchor: &Frame,
    caption: Option<&str>,
    metadata: &str,
    fonts: &AlbumFonts,
    page: &PageGeometry,
    text: &TextConfig,
) -> Vec<LayoutElement> {
    let x = anchor.x;
    let max_width = (page.width - text.caption_right_margin - x).max(0.0);
    let caption_step = text.caption_size * text.line_height;
    let meta_step = text.meta_size * text.line_height;
    // distance from the last caption baseline to the metadata baseline
    let meta_gap = meta_step + text.meta_size * 0.5;
    let floor = page.height - page.margin;
    let first_baseline = anchor.bottom() + text.caption_gap + text.caption_size;

    let mut elements = Vec::new();
    let mut meta_baseline = anchor.bottom() + text.caption_gap + text.meta_size;

    if let Some(caption) = caption {
        let mut wrapped = wrap_text(caption, &fonts.caption, text.caption_size, max_width);

        let room = (floor - meta_gap - first_baseline) / caption_step;
        let max_lines = if room < 0.0 { 0 } else { room.floor() as usize + 1 };
        if wrapped.len() > max_lines {
            wrapped.truncate(max_lines);
            if let Some(last) = wrapped.last_mut() {
                truncate_with_ellipsis(last, &fonts.caption, text.caption_size, max_width);
            }
        }

        if !wrapped.is_empty() {
            let lines: Vec<TextLine> = wrapped
                .into_iter()
                .enumerate()
                .map(|(i, line)| TextLine {
                    x,
                    y: first_baseline + i as f64 * caption_step,
                    text: line,
                })
                .collect();
            let last_baseline = first_baseline + (lines.len() - 1) as f64 * caption_step;
            meta_baseline = last_baseline + meta_gap;
            elements.push(LayoutElement {
                frame: Frame::new(
                    x,
                    anchor.bottom() + text.caption_gap,
                    max_width,
                    lines.len() as f64 * caption_step,
                ),
                draw: DrawCommand::Text {
                    lines,
                    role: FontRole::Caption,
                    font_size: text.caption_size,
                    color: Color::INK,
                },
            });
        }
    }

    elements.push(LayoutElement {
        frame: Frame::new(x, meta_baseline - text.meta_size, max_width, meta_step),
        draw: DrawCommand::Text {
            lines: vec![TextLine {
                x,
                y: meta_baseline,
                text: metadata.to_string(),
            }],
            role: FontRole::Caption,
            font_size: text.meta_size,
            color: Color::MUTED,
        },
    });

    elements
}

/// Shorten `line` until it fits with a trailing ellipsis.
fn truncate_with_ellipsis(line: &mut String, font: &ResolvedFont, size: f64, max_width: f64) {
    loop {
        let candidate = format!("{}{}", line.trim_end(), ELLIPSIS);
        if font.measure(&candidate, size) <= max_width || line.is_empty() {
            *line = candidate;
            return;
        }
        line.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::StandardFont;
    use crate::model::{ImageLocation, ImageRef};
    use chrono::TimeZone;

    fn helvetica() -> ResolvedFont {
        ResolvedFont::Standard(StandardFont::Helvetica)
    }

    fn image(alt: Option<&str>) -> Image {
        Image {
            id: "i".into(),
            reference: ImageRef::Stored("x.jpg".into()),
            alt_text: alt.map(String::from),
            location: ImageLocation::Unresolved,
        }
    }

    fn post(caption: Option<&str>) -> Post {
        Post {
            id: "p".into(),
            author: Author {
                name: "Ana".into(),
                avatar: None,
            },
            created_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            caption: caption.map(String::from),
            images: vec![],
        }
    }

    const LOREM: &str = "We drove to the coast before sunrise and spent the whole \
        morning building an enormous sandcastle that the tide took back by noon";

    #[test]
    fn caption_prefers_post_text() {
        let a = image(Some("Dog"));
        assert_eq!(
            caption_text(&post(Some(" Beach day ")), &[&a], " · ").as_deref(),
            Some("Beach day")
        );
    }

    #[test]
    fn caption_falls_back_to_alt_texts() {
        let (a, b, c) = (image(Some("Dog")), image(None), image(Some("  Sand ")));
        assert_eq!(
            caption_text(&post(Some("   ")), &[&a, &b, &c], " · ").as_deref(),
            Some("Dog · Sand")
        );
        assert_eq!(caption_text(&post(None), &[&b], " · "), None);
    }

    #[test]
    fn metadata_has_author_and_short_date() {
        let p = post(None);
        assert_eq!(metadata_line(&p.author, &p.created_at), "Ana · Mar 2, 2026");
    }

    #[test]
    fn wrap_respects_max_width() {
        let font = helvetica();
        let lines = wrap_text(LOREM, &font, 11.0, 200.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(font.measure(line, 11.0) <= 200.0, "too wide: {}", line);
        }
        assert_eq!(lines.join(" "), LOREM.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn wrap_is_idempotent() {
        let font = helvetica();
        let lines = wrap_text(LOREM, &font, 11.0, 180.0);
        assert_eq!(wrap_text(&lines.join("\n"), &font, 11.0, 180.0), lines);
        for line in &lines {
            assert_eq!(wrap_text(line, &font, 11.0, 180.0), vec![line.clone()]);
        }
    }

    #[test]
    fn overlong_word_gets_own_line() {
        let font = helvetica();
        let lines = wrap_text("a Pneumonoultramicroscopic b", &font, 11.0, 40.0);
        assert_eq!(lines, vec!["a", "Pneumonoultramicroscopic", "b"]);
    }

    #[test]
    fn block_starts_below_anchor_at_its_left_edge() {
        let anchor = Frame::new(40.0, 110.0, 316.0, 312.0);
        let fonts = AlbumFonts::default();
        let page = PageGeometry::default();
        let cfg = TextConfig::default();
        let els = caption_block(&anchor, Some("Beach day"), "Ana · Mar 2, 2026", &fonts, &page, &cfg);

        assert_eq!(els.len(), 2);
        let lines: Vec<&TextLine> = els
            .iter()
            .flat_map(|e| match &e.draw {
                DrawCommand::Text { lines, .. } => lines.iter(),
                _ => [].iter(),
            })
            .collect();
        assert_eq!(lines[0].text, "Beach day");
        assert_eq!(lines[1].text, "Ana · Mar 2, 2026");
        assert!(lines[0].y > anchor.bottom());
        assert!(lines[1].y > lines[0].y);
        assert!(lines.iter().all(|l| l.x == anchor.x));
    }

    #[test]
    fn long_captions_stop_above_the_page_margin() {
        let anchor = Frame::new(24.0, 48.0, 348.0, 444.0);
        let fonts = AlbumFonts::default();
        let page = PageGeometry::default();
        let cfg = TextConfig::default();
        let long = LOREM.repeat(6);
        let els = caption_block(&anchor, Some(&long), "meta", &fonts, &page, &cfg);

        for el in &els {
            if let DrawCommand::Text { lines, .. } = &el.draw {
                for l in lines {
                    assert!(l.y <= page.height - page.margin + 1e-9);
                }
            }
        }
        if let DrawCommand::Text { lines, .. } = &els[0].draw {
            assert!(lines.last().unwrap().text.ends_with(ELLIPSIS));
        }
    }

    #[test]
    fn metadata_only_when_no_caption() {
        let anchor = Frame::new(40.0, 110.0, 316.0, 312.0);
        let els = caption_block(
            &anchor,
            None,
            "Ana · Mar 2, 2026",
            &AlbumFonts::default(),
            &PageGeometry::default(),
            &TextConfig::default(),
        );
        assert_eq!(els.len(), 1);
    }
}
