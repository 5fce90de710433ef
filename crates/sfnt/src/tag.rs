//! Four-byte table and format identifiers.

use std::fmt;

/// A 4-byte identifier, compared as a 32-bit big-endian integer.
///
/// Tags name the tables of a font (`head`, `glyf`, ...) as well as the
/// sfnt version of the container itself (`OTTO`, `true`, ...).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag([u8; 4]);

impl Tag {
    pub const fn new(bytes: &[u8; 4]) -> Self {
        Tag(*bytes)
    }

    pub const fn from_u32(value: u32) -> Self {
        Tag(value.to_be_bytes())
    }

    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

pub const HEAD: Tag = Tag::new(b"head");
pub const NAME: Tag = Tag::new(b"name");
pub const HHEA: Tag = Tag::new(b"hhea");
pub const MAXP: Tag = Tag::new(b"maxp");
pub const HMTX: Tag = Tag::new(b"hmtx");
pub const GLYF: Tag = Tag::new(b"glyf");
pub const LOCA: Tag = Tag::new(b"loca");
pub const CMAP: Tag = Tag::new(b"cmap");
pub const GPOS: Tag = Tag::new(b"GPOS");
pub const GSUB: Tag = Tag::new(b"GSUB");

/// The WOFF2 known-tag table. A directory flag byte with a low-6-bit
/// value below 63 indexes into this array instead of carrying an
/// explicit tag.
pub(crate) const WOFF2_KNOWN_TAGS: [Tag; 63] = [
    Tag::new(b"cmap"),
    Tag::new(b"head"),
    Tag::new(b"hhea"),
    Tag::new(b"hmtx"),
    Tag::new(b"maxp"),
    Tag::new(b"name"),
    Tag::new(b"OS/2"),
    Tag::new(b"post"),
    Tag::new(b"cvt "),
    Tag::new(b"fpgm"),
    Tag::new(b"glyf"),
    Tag::new(b"loca"),
    Tag::new(b"prep"),
    Tag::new(b"CFF "),
    Tag::new(b"VORG"),
    Tag::new(b"EBDT"),
    Tag::new(b"EBLC"),
    Tag::new(b"gasp"),
    Tag::new(b"hdmx"),
    Tag::new(b"kern"),
    Tag::new(b"LTSH"),
    Tag::new(b"PCLT"),
    Tag::new(b"VDMX"),
    Tag::new(b"vhea"),
    Tag::new(b"vmtx"),
    Tag::new(b"BASE"),
    Tag::new(b"GDEF"),
    Tag::new(b"GPOS"),
    Tag::new(b"GSUB"),
    Tag::new(b"EBSC"),
    Tag::new(b"JSTF"),
    Tag::new(b"MATH"),
    Tag::new(b"CBDT"),
    Tag::new(b"CBLC"),
    Tag::new(b"COLR"),
    Tag::new(b"CPAL"),
    Tag::new(b"SVG "),
    Tag::new(b"sbix"),
    Tag::new(b"acnt"),
    Tag::new(b"avar"),
    Tag::new(b"bdat"),
    Tag::new(b"bloc"),
    Tag::new(b"bsln"),
    Tag::new(b"cvar"),
    Tag::new(b"fdsc"),
    Tag::new(b"feat"),
    Tag::new(b"fmtx"),
    Tag::new(b"fvar"),
    Tag::new(b"gvar"),
    Tag::new(b"hsty"),
    Tag::new(b"just"),
    Tag::new(b"lcar"),
    Tag::new(b"mort"),
    Tag::new(b"morx"),
    Tag::new(b"opbd"),
    Tag::new(b"prop"),
    Tag::new(b"trak"),
    Tag::new(b"Zapf"),
    Tag::new(b"Silf"),
    Tag::new(b"Glat"),
    Tag::new(b"Gloc"),
    Tag::new(b"Feat"),
    Tag::new(b"Sill"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_orders_as_big_endian_u32() {
        assert!(GPOS < GSUB);
        assert!(CMAP < HEAD);
        assert_eq!(HEAD.to_u32(), 0x68656164);
        assert_eq!(Tag::from_u32(0x676c7966), GLYF);
    }

    #[test]
    fn display_escapes_non_ascii() {
        assert_eq!(Tag::new(b"OS/2").to_string(), "OS/2");
        assert_eq!(Tag::new(b"cvt ").to_string(), "cvt ");
        assert_eq!(Tag::new(&[0x00, 0x01, 0x00, 0x00]).to_string(), "\\x00\\x01\\x00\\x00");
    }
}
