//! # PDF Serializer
//!
//! Takes laid-out album pages and writes a valid PDF file.
//!
//! This is a from-scratch PDF 1.7 writer. The album only needs a small
//! subset of the format: filled rectangles, clipped image XObjects and
//! single-font text lines, so we write the raw bytes ourselves.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (fonts, images, pages, content streams)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! ## Fonts
//!
//! Each text role (title, caption) gets one font resource: `/F0` for the
//! title font, `/F1` for the caption font. Built-in fonts are simple Type1
//! references with WinAnsiEncoding. Custom TrueType fonts are embedded as
//! CIDFontType2 with Identity-H encoding, producing 5 PDF objects per font:
//! FontFile2, FontDescriptor, CIDFont, ToUnicode CMap, and the root Type0
//! dictionary.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>
use std::sync::Arc;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::AlbumError;
use crate::font::{AlbumFonts, CustomFont, ResolvedFont};
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::layout::{DrawCommand, FontRole, LayoutElement, LayoutPage};

/// Document information dictionary entries.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
}

pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Font object ID per role, indexed by [`role_index`].
    font_objects: [usize; 2],
    /// Glyph IDs for roles using an embedded font.
    custom_glyphs: [Option<HashMap<char, u16>>; 2],
    /// XObject IDs for images, referenced as /Im0, /Im1, ...
    image_objects: Vec<usize>,
    /// Maps (page_index, element_index) to an index in `image_objects`.
    image_index_map: HashMap<(usize, usize), usize>,
}

struct PdfObject {
    data: Vec<u8>,
}

fn role_index(role: FontRole) -> usize {
    match role {
        FontRole::Title => 0,
        FontRole::Caption => 1,
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(
        &self,
        pages: &[LayoutPage],
        info: &DocumentInfo,
        fonts: &AlbumFonts,
    ) -> Result<Vec<u8>, AlbumError> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: [0; 2],
            custom_glyphs: [None, None],
            image_objects: Vec::new(),
            image_index_map: HashMap::new(),
        };

        // Reserve object IDs:
        // 0 = placeholder (PDF objects are 1-indexed)
        // 1 = Catalog
        // 2 = Pages (page tree root)
        // 3+ = fonts, images, then page objects and content streams
        for _ in 0..3 {
            builder.objects.push(PdfObject { data: vec![] });
        }

        self.register_fonts(&mut builder, pages, fonts)?;
        self.register_images(&mut builder, pages);

        let mut page_obj_ids: Vec<usize> = Vec::new();

        for (page_idx, page) in pages.iter().enumerate() {
            let content = self.build_content_stream(page, page_idx, &builder);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);

            let content_obj_id = builder.objects.len();
            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            builder.objects.push(PdfObject { data: content_data });

            let page_obj_id = builder.objects.len();
            let font_resources = format!(
                "/F0 {} 0 R /F1 {} 0 R",
                builder.font_objects[0], builder.font_objects[1]
            );
            let xobject_resources = self.build_xobject_resource_dict(page_idx, &builder);
            let resources = if xobject_resources.is_empty() {
                format!("/Font << {} >>", font_resources)
            } else {
                format!(
                    "/Font << {} >> /XObject << {} >>",
                    font_resources, xobject_resources
                )
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.width, page.height, content_obj_id, resources
            );
            builder.objects.push(PdfObject {
                data: page_dict.into_bytes(),
            });
            page_obj_ids.push(page_obj_id);
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = builder.objects.len();
        let mut info_dict = String::from("<< ");
        if let Some(ref title) = info.title {
            let _ = write!(info_dict, "/Title {} ", Self::text_string(title));
        }
        if let Some(ref author) = info.author {
            let _ = write!(info_dict, "/Author {} ", Self::text_string(author));
        }
        info_dict.push_str("/Producer (folio) /Creator (folio) >>");
        builder.objects.push(PdfObject {
            data: info_dict.into_bytes(),
        });

        Ok(self.serialize(&builder, info_obj_id))
    }

    /// Build the PDF content stream for a single page.
    fn build_content_stream(&self, page: &LayoutPage, page_idx: usize, builder: &PdfBuilder) -> String {
        let mut stream = String::new();
        for (elem_idx, element) in page.elements.iter().enumerate() {
            self.write_element(&mut stream, element, page.height, builder, page_idx, elem_idx);
        }
        stream
    }

    /// Write a single layout element as PDF operators.
    fn write_element(
        &self,
        stream: &mut String,
        element: &LayoutElement,
        page_height: f64,
        builder: &PdfBuilder,
        page_idx: usize,
        elem_idx: usize,
    ) {
        let frame = &element.frame;
        // PDF user space has its origin bottom-left.
        let x = frame.x;
        let y = page_height - frame.y - frame.height;
        let w = frame.width;
        let h = frame.height;

        match &element.draw {
            DrawCommand::Fill { color } => {
                let _ = write!(
                    stream,
                    "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                    color.r, color.g, color.b, x, y, w, h
                );
            }

            DrawCommand::Image { placement, .. } => {
                match builder.image_index_map.get(&(page_idx, elem_idx)) {
                    Some(&img_idx) => {
                        let px = placement.x;
                        let py = page_height - placement.y - placement.height;
                        // clip to the frame, then draw the unit-square image scaled
                        let _ = write!(
                            stream,
                            "q\n{:.2} {:.2} {:.2} {:.2} re\nW n\n\
                             {:.4} 0 0 {:.4} {:.4} {:.4} cm\n/Im{} Do\nQ\n",
                            x, y, w, h, placement.width, placement.height, px, py, img_idx
                        );
                    }
                    None => Self::write_placeholder(stream, x, y, w, h),
                }
            }

            DrawCommand::ImagePlaceholder => Self::write_placeholder(stream, x, y, w, h),

            DrawCommand::Text {
                lines,
                role,
                font_size,
                color,
            } => {
                let idx = role_index(*role);
                let _ = write!(
                    stream,
                    "BT\n/F{} {:.1} Tf\n{:.3} {:.3} {:.3} rg\n",
                    idx, font_size, color.r, color.g, color.b
                );
                for line in lines {
                    let _ = write!(
                        stream,
                        "1 0 0 1 {:.2} {:.2} Tm\n",
                        line.x,
                        page_height - line.y
                    );
                    match &builder.custom_glyphs[idx] {
                        Some(char_to_gid) => {
                            let mut hex = String::new();
                            for ch in line.text.chars() {
                                let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
                                let _ = write!(hex, "{:04X}", gid);
                            }
                            let _ = writeln!(stream, "<{}> Tj", hex);
                        }
                        None => {
                            let _ = writeln!(stream, "({}) Tj", Self::encode_winansi(&line.text));
                        }
                    }
                }
                stream.push_str("ET\n");
            }
        }
    }

    fn write_placeholder(stream: &mut String, x: f64, y: f64, w: f64, h: f64) {
        let c = crate::layout::Color::PLACEHOLDER;
        let _ = write!(
            stream,
            "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
            c.r, c.g, c.b, x, y, w, h
        );
    }

    /// Register one font object (or object group) per text role.
    fn register_fonts(
        &self,
        builder: &mut PdfBuilder,
        pages: &[LayoutPage],
        fonts: &AlbumFonts,
    ) -> Result<(), AlbumError> {
        let mut used_chars: [BTreeSet<char>; 2] = [BTreeSet::new(), BTreeSet::new()];
        for page in pages {
            for element in &page.elements {
                if let DrawCommand::Text { lines, role, .. } = &element.draw {
                    let set = &mut used_chars[role_index(*role)];
                    for line in lines {
                        set.extend(line.text.chars());
                    }
                }
            }
        }

        // one embedded copy when both roles landed on the same font file
        let shared = match (&fonts.title, &fonts.caption) {
            (ResolvedFont::Custom(a), ResolvedFont::Custom(b)) => {
                Arc::ptr_eq(a, b) || (a.name == b.name && a.data == b.data)
            }
            _ => false,
        };
        if shared {
            let caption_chars = std::mem::take(&mut used_chars[1]);
            used_chars[0].extend(caption_chars);
        }

        for (idx, font) in [&fonts.title, &fonts.caption].into_iter().enumerate() {
            if idx == 1 && shared {
                builder.font_objects[1] = builder.font_objects[0];
                builder.custom_glyphs[1] = builder.custom_glyphs[0].clone();
                continue;
            }
            let obj_id = match font {
                ResolvedFont::Standard(std_font) => {
                    let obj_id = builder.objects.len();
                    let font_dict = format!(
                        "<< /Type /Font /Subtype /Type1 /BaseFont /{} \
                         /Encoding /WinAnsiEncoding >>",
                        std_font.pdf_name()
                    );
                    builder.objects.push(PdfObject {
                        data: font_dict.into_bytes(),
                    });
                    obj_id
                }
                ResolvedFont::Custom(custom) => {
                    let (type0_id, char_to_gid) =
                        Self::write_custom_font_objects(builder, custom, &used_chars[idx])?;
                    builder.custom_glyphs[idx] = Some(char_to_gid);
                    type0_id
                }
            };
            builder.font_objects[idx] = obj_id;
        }

        Ok(())
    }

    /// Walk all pages, create XObject PDF objects for each image,
    /// and populate the image_index_map for content stream reference.
    fn register_images(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        for (page_idx, page) in pages.iter().enumerate() {
            for (elem_idx, element) in page.elements.iter().enumerate() {
                if let DrawCommand::Image { image, .. } = &element.draw {
                    let img_idx = builder.image_objects.len();
                    let xobj_id = Self::write_image_xobject(builder, image);
                    builder.image_objects.push(xobj_id);
                    builder.image_index_map.insert((page_idx, elem_idx), img_idx);
                }
            }
        }
    }

    /// Write a single image as one or two XObject PDF objects.
    /// Returns the main XObject ID.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space_str = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };

                let obj_id = builder.objects.len();
                let mut obj_data: Vec<u8> = Vec::new();
                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image \
                     /Width {} /Height {} \
                     /ColorSpace {} \
                     /BitsPerComponent 8 \
                     /Filter /DCTDecode \
                     /Length {} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    color_space_str,
                    data.len()
                );
                obj_data.extend_from_slice(data);
                obj_data.extend_from_slice(b"\nendstream");
                builder.objects.push(PdfObject { data: obj_data });
                obj_id
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                let smask_id = alpha.as_ref().map(|alpha_data| {
                    let compressed_alpha = compress_to_vec_zlib(alpha_data, 6);
                    let smask_obj_id = builder.objects.len();
                    let mut smask_data: Vec<u8> = Vec::new();
                    let _ = write!(
                        smask_data,
                        "<< /Type /XObject /Subtype /Image \
                         /Width {} /Height {} \
                         /ColorSpace /DeviceGray \
                         /BitsPerComponent 8 \
                         /Filter /FlateDecode \
                         /Length {} >>\nstream\n",
                        image.width_px,
                        image.height_px,
                        compressed_alpha.len()
                    );
                    smask_data.extend_from_slice(&compressed_alpha);
                    smask_data.extend_from_slice(b"\nendstream");
                    builder.objects.push(PdfObject { data: smask_data });
                    smask_obj_id
                });

                let compressed_rgb = compress_to_vec_zlib(rgb, 6);
                let obj_id = builder.objects.len();
                let smask_ref = smask_id
                    .map(|id| format!(" /SMask {} 0 R", id))
                    .unwrap_or_default();

                let mut obj_data: Vec<u8> = Vec::new();
                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image \
                     /Width {} /Height {} \
                     /ColorSpace /DeviceRGB \
                     /BitsPerComponent 8 \
                     /Filter /FlateDecode \
                     /Length {}{} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    compressed_rgb.len(),
                    smask_ref
                );
                obj_data.extend_from_slice(&compressed_rgb);
                obj_data.extend_from_slice(b"\nendstream");
                builder.objects.push(PdfObject { data: obj_data });
                obj_id
            }
        }
    }

    /// Build the /XObject resource dict entries for a specific page.
    fn build_xobject_resource_dict(&self, page_idx: usize, builder: &PdfBuilder) -> String {
        let mut entries: Vec<(usize, usize)> = builder
            .image_index_map
            .iter()
            .filter(|((pidx, _), _)| *pidx == page_idx)
            .map(|(_, &img_idx)| (img_idx, builder.image_objects[img_idx]))
            .collect();
        entries.sort_by_key(|(idx, _)| *idx);
        entries
            .iter()
            .map(|(idx, obj_id)| format!("/Im{} {} 0 R", idx, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Write the 5 CIDFont PDF objects for an embedded TrueType font.
    /// Returns the Type0 object ID and the char → glyph mapping for the
    /// characters the pages use.
    fn write_custom_font_objects(
        builder: &mut PdfBuilder,
        font: &CustomFont,
        used_chars: &BTreeSet<char>,
    ) -> Result<(usize, HashMap<char, u16>), AlbumError> {
        let face = ttf_parser::Face::parse(&font.data, 0).map_err(|e| {
            AlbumError::Render(format!("Failed to parse TTF data for font '{}': {}", font.name, e))
        })?;
        let metrics = &font.metrics;
        let scale = 1000.0 / metrics.units_per_em as f64;

        let char_to_gid: HashMap<char, u16> = used_chars
            .iter()
            .filter_map(|ch| metrics.glyph_ids.get(ch).map(|&gid| (*ch, gid)))
            .collect();

        // 1. FontFile2 stream — compressed TTF bytes
        let compressed_ttf = compress_to_vec_zlib(&font.data, 6);
        let fontfile2_id = builder.objects.len();
        let mut fontfile2_data: Vec<u8> = Vec::new();
        let _ = write!(
            fontfile2_data,
            "<< /Length {} /Length1 {} /Filter /FlateDecode >>\nstream\n",
            compressed_ttf.len(),
            font.data.len()
        );
        fontfile2_data.extend_from_slice(&compressed_ttf);
        fontfile2_data.extend_from_slice(b"\nendstream");
        builder.objects.push(PdfObject {
            data: fontfile2_data,
        });

        // 2. FontDescriptor
        let font_descriptor_id = builder.objects.len();
        let bbox = face.global_bounding_box();
        let cap_height = face.capital_height().unwrap_or(metrics.ascender) as f64 * scale;
        let font_descriptor_dict = format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags 4 \
             /FontBBox [{} {} {} {}] /ItalicAngle 0 \
             /Ascent {} /Descent {} /CapHeight {} /StemV 80 \
             /FontFile2 {} 0 R >>",
            font.name,
            (bbox.x_min as f64 * scale) as i32,
            (bbox.y_min as f64 * scale) as i32,
            (bbox.x_max as f64 * scale) as i32,
            (bbox.y_max as f64 * scale) as i32,
            (metrics.ascender as f64 * scale) as i32,
            (metrics.descender as f64 * scale) as i32,
            cap_height as i32,
            fontfile2_id,
        );
        builder.objects.push(PdfObject {
            data: font_descriptor_dict.into_bytes(),
        });

        // 3. CIDFont dictionary (DescendantFont)
        let cidfont_id = builder.objects.len();
        let default_width = (metrics.default_advance as f64 * scale) as u32;
        let cidfont_dict = format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {} 0 R /DW {} /W {} \
             /CIDToGIDMap /Identity >>",
            font.name,
            font_descriptor_id,
            default_width,
            Self::build_w_array(&char_to_gid, font),
        );
        builder.objects.push(PdfObject {
            data: cidfont_dict.into_bytes(),
        });

        // 4. ToUnicode CMap
        let tounicode_id = builder.objects.len();
        let cmap_content = Self::build_tounicode_cmap(&char_to_gid, &font.name);
        let compressed_cmap = compress_to_vec_zlib(cmap_content.as_bytes(), 6);
        let mut tounicode_data: Vec<u8> = Vec::new();
        let _ = write!(
            tounicode_data,
            "<< /Length {} /Filter /FlateDecode >>\nstream\n",
            compressed_cmap.len()
        );
        tounicode_data.extend_from_slice(&compressed_cmap);
        tounicode_data.extend_from_slice(b"\nendstream");
        builder.objects.push(PdfObject {
            data: tounicode_data,
        });

        // 5. Type0 font dictionary (the root, referenced by /Resources)
        let type0_id = builder.objects.len();
        let type0_dict = format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{} \
             /Encoding /Identity-H \
             /DescendantFonts [{} 0 R] \
             /ToUnicode {} 0 R >>",
            font.name, cidfont_id, tounicode_id,
        );
        builder.objects.push(PdfObject {
            data: type0_dict.into_bytes(),
        });

        Ok((type0_id, char_to_gid))
    }

    /// Build the /W array for per-glyph widths in CIDFont.
    /// Format: [gid [width] gid [width] ...]
    fn build_w_array(char_to_gid: &HashMap<char, u16>, font: &CustomFont) -> String {
        let scale = 1000.0 / font.metrics.units_per_em as f64;
        let widths: BTreeMap<u16, u32> = char_to_gid
            .iter()
            .map(|(ch, &gid)| {
                let advance = font
                    .metrics
                    .advance_widths
                    .get(ch)
                    .copied()
                    .unwrap_or(font.metrics.default_advance);
                (gid, (advance as f64 * scale) as u32)
            })
            .collect();

        let mut result = String::from("[");
        for (gid, width) in &widths {
            let _ = write!(result, " {} [{}]", gid, width);
        }
        result.push_str(" ]");
        result
    }

    /// Build a ToUnicode CMap for text extraction/copy-paste support.
    fn build_tounicode_cmap(char_to_gid: &HashMap<char, u16>, font_name: &str) -> String {
        let gid_to_unicode: BTreeMap<u16, u32> = char_to_gid
            .iter()
            .map(|(&ch, &gid)| (gid, ch as u32))
            .collect();
        let entries: Vec<(u16, u32)> = gid_to_unicode.into_iter().collect();

        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo\n");
        cmap.push_str("<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

        // beginbfchar blocks hold at most 100 entries
        for chunk in entries.chunks(100) {
            let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
            for &(gid, unicode) in chunk {
                let _ = writeln!(cmap, "<{:04X}> <{}>", gid, Self::utf16_hex(unicode));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\nend\n");
        cmap
    }

    fn utf16_hex(code: u32) -> String {
        char::from_u32(code)
            .map(|ch| {
                let mut buf = [0u16; 2];
                ch.encode_utf16(&mut buf)
                    .iter()
                    .map(|u| format!("{:04X}", u))
                    .collect()
            })
            .unwrap_or_else(|| "FFFD".to_string())
    }

    /// Encode a text string for the Info dictionary as UTF-16BE with BOM.
    fn text_string(s: &str) -> String {
        let mut hex = String::from("<FEFF");
        for unit in s.encode_utf16() {
            let _ = write!(hex, "{:04X}", unit);
        }
        hex.push('>');
        hex
    }

    /// Encode text for a WinAnsi font as the inside of a PDF literal string.
    fn encode_winansi(text: &str) -> String {
        let mut out = String::new();
        for ch in text.chars() {
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding byte value.
    ///
    /// WinAnsiEncoding is based on Windows-1252. Most codepoints in
    /// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
    /// contains special mappings for smart quotes, bullets, dashes, etc.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80), // Euro sign
            0x201A => Some(0x82), // Single low-9 quotation mark
            0x0192 => Some(0x83), // Latin small letter f with hook
            0x201E => Some(0x84), // Double low-9 quotation mark
            0x2026 => Some(0x85), // Horizontal ellipsis
            0x2020 => Some(0x86), // Dagger
            0x2021 => Some(0x87), // Double dagger
            0x02C6 => Some(0x88), // Modifier letter circumflex accent
            0x2030 => Some(0x89), // Per mille sign
            0x0160 => Some(0x8A), // Latin capital letter S with caron
            0x2039 => Some(0x8B), // Single left-pointing angle quotation
            0x0152 => Some(0x8C), // Latin capital ligature OE
            0x017D => Some(0x8E), // Latin capital letter Z with caron
            0x2018 => Some(0x91), // Left single quotation mark
            0x2019 => Some(0x92), // Right single quotation mark
            0x201C => Some(0x93), // Left double quotation mark
            0x201D => Some(0x94), // Right double quotation mark
            0x2022 => Some(0x95), // Bullet
            0x2013 => Some(0x96), // En dash
            0x2014 => Some(0x97), // Em dash
            0x02DC => Some(0x98), // Small tilde
            0x2122 => Some(0x99), // Trade mark sign
            0x0161 => Some(0x9A), // Latin small letter s with caron
            0x203A => Some(0x9B), // Single right-pointing angle quotation
            0x0153 => Some(0x9C), // Latin small ligature oe
            0x017E => Some(0x9E), // Latin small letter z with caron
            0x0178 => Some(0x9F), // Latin capital letter Y with diaeresis
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}

/// Number of pages in a serialized document, read from the page tree root.
pub fn count_pages(pdf: &[u8]) -> Option<u32> {
    let text = String::from_utf8_lossy(pdf);
    let tree = text.find("/Type /Pages")?;
    let rest = &text[tree..];
    let count = rest.find("/Count ")? + "/Count ".len();
    rest[count..]
        .split(|c: char| !c.is_ascii_digit())
        .next()?
        .parse()
        .ok()
}
