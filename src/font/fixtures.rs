//! A minimal TrueType font for tests.
//!
//! Three glyphs (.notdef, `A`, `B`), no outlines. Just enough tables for
//! ttf-parser to read metrics and a format 0 cmap.

const UNITS_PER_EM: u16 = 1000;

/// Advance widths for .notdef, `A` and `B`, in font units.
pub(crate) const ADVANCES: [u16; 3] = [500, 600, 550];

fn u16be(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn i16be(out: &mut Vec<u8>, v: i16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn u32be(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn head() -> Vec<u8> {
    let mut t = Vec::new();
    u32be(&mut t, 0x0001_0000); // version
    u32be(&mut t, 0x0001_0000); // font revision
    u32be(&mut t, 0); // checksum adjustment
    u32be(&mut t, 0x5F0F_3CF5); // magic
    u16be(&mut t, 0); // flags
    u16be(&mut t, UNITS_PER_EM);
    t.extend_from_slice(&[0; 16]); // created, modified
    for v in [0, -200, 1000, 800] {
        i16be(&mut t, v); // bbox
    }
    u16be(&mut t, 0); // mac style
    u16be(&mut t, 8); // lowest rec ppem
    i16be(&mut t, 2); // direction hint
    i16be(&mut t, 0); // short loca
    i16be(&mut t, 0); // glyph data format
    t
}

fn hhea() -> Vec<u8> {
    let mut t = Vec::new();
    u32be(&mut t, 0x0001_0000);
    i16be(&mut t, 800); // ascender
    i16be(&mut t, -200); // descender
    i16be(&mut t, 0); // line gap
    u16be(&mut t, 600); // advance width max
    for v in [0, 0, 600, 1, 0, 0, 0, 0, 0, 0, 0] {
        i16be(&mut t, v);
    }
    u16be(&mut t, ADVANCES.len() as u16); // h metrics
    t
}

fn maxp() -> Vec<u8> {
    let mut t = Vec::new();
    u32be(&mut t, 0x0000_5000);
    u16be(&mut t, ADVANCES.len() as u16);
    t
}

fn hmtx() -> Vec<u8> {
    let mut t = Vec::new();
    for advance in ADVANCES {
        u16be(&mut t, advance);
        i16be(&mut t, 0);
    }
    t
}

fn cmap() -> Vec<u8> {
    let mut t = Vec::new();
    u16be(&mut t, 0); // version
    u16be(&mut t, 1); // subtables
    u16be(&mut t, 0); // platform: Unicode
    u16be(&mut t, 3); // encoding: BMP
    u32be(&mut t, 12); // subtable offset
    u16be(&mut t, 0); // format 0
    u16be(&mut t, 262);
    u16be(&mut t, 0); // language
    let mut glyphs = [0u8; 256];
    glyphs[b'A' as usize] = 1;
    glyphs[b'B' as usize] = 2;
    t.extend_from_slice(&glyphs);
    t
}

/// Bytes of a parseable `.ttf` file.
pub(crate) fn tiny_ttf() -> Vec<u8> {
    // table records must be sorted by tag
    let tables: [(&[u8; 4], Vec<u8>); 5] = [
        (b"cmap", cmap()),
        (b"head", head()),
        (b"hhea", hhea()),
        (b"hmtx", hmtx()),
        (b"maxp", maxp()),
    ];

    let mut out = Vec::new();
    u32be(&mut out, 0x0001_0000);
    u16be(&mut out, tables.len() as u16);
    u16be(&mut out, 64); // search range
    u16be(&mut out, 2); // entry selector
    u16be(&mut out, 16); // range shift

    let mut offset = 12 + 16 * tables.len();
    let mut body = Vec::new();
    for (tag, data) in &tables {
        out.extend_from_slice(*tag);
        u32be(&mut out, 0); // checksum
        u32be(&mut out, offset as u32);
        u32be(&mut out, data.len() as u32);

        body.extend_from_slice(data);
        while body.len() % 4 != 0 {
            body.push(0);
        }
        offset = 12 + 16 * tables.len() + body.len();
    }
    out.extend_from_slice(&body);
    out
}
