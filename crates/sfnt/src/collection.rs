//! TrueType/OpenType collections: one file, many SFNT directories.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::font::Font;
use crate::parse::{parse_sfnt, Mode, MAGIC_TTCF};
use crate::reader::Reader;

const VERSION_1: u32 = 0x0001_0000;
const VERSION_2: u32 = 0x0002_0000;

/// The `ttcf` header: absolute offsets of the member fonts' offset
/// tables. Version 2 appends a DSIG locator which we read and discard.
struct Directory {
    offsets: Vec<u32>,
}

fn read_directory(source: &[u8]) -> Result<Directory> {
    let mut r = Reader::new(source);
    if r.read_u32()? != MAGIC_TTCF {
        return Err(Error::MalformedHeader("not a font collection"));
    }
    let version = r.read_u32()?;
    if version != VERSION_1 && version != VERSION_2 {
        return Err(Error::MalformedHeader("unsupported collection version"));
    }
    let num_fonts = r.read_u32()? as usize;
    if num_fonts.checked_mul(4).map_or(true, |n| n > r.remaining()) {
        return Err(Error::TruncatedInput);
    }
    let mut offsets = Vec::with_capacity(num_fonts);
    for _ in 0..num_fonts {
        offsets.push(r.read_u32()?);
    }
    if version == VERSION_2 {
        let _dsig_tag = r.read_u32()?;
        let _dsig_length = r.read_u32()?;
        let _dsig_offset = r.read_u32()?;
    }
    Ok(Directory { offsets })
}

/// Parse every font in the collection. All fonts alias the same input
/// buffer, so tables recorded at the same offset share their bytes.
pub(crate) fn parse_all(source: Arc<[u8]>, mode: Mode) -> Result<Vec<Font>> {
    let directory = read_directory(&source)?;
    directory
        .offsets
        .iter()
        .map(|&offset| parse_sfnt(source.clone(), offset as usize, mode))
        .collect()
}

/// Parse the `index`-th font of the collection.
pub(crate) fn parse_index(source: Arc<[u8]>, index: u32, mode: Mode) -> Result<Font> {
    let directory = read_directory(&source)?;
    let count = directory.offsets.len() as u32;
    match directory.offsets.get(index as usize) {
        Some(&offset) => parse_sfnt(source, offset as usize, mode),
        None => Err(Error::IndexOutOfRange { index, count }),
    }
}
