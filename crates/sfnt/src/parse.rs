//! Container format dispatch and the plain SFNT path.

use std::sync::Arc;

use log::warn;

use crate::error::{Error, Result};
use crate::font::{self, Font, Payload};
use crate::reader::Reader;
use crate::tag::{self, Tag};
use crate::writer::search_params;
use crate::{collection, woff, woff2, CancelToken};

pub(crate) const MAGIC_TRUETYPE: u32 = 0x0001_0000;
pub(crate) const MAGIC_OTTO: u32 = 0x4F54_544F; // 'OTTO'
pub(crate) const MAGIC_TRUE: u32 = 0x7472_7565; // 'true'
pub(crate) const MAGIC_TYP1: u32 = 0x7479_7031; // 'typ1'
pub(crate) const MAGIC_TTCF: u32 = 0x7474_6366; // 'ttcf'
pub(crate) const MAGIC_WOFF: u32 = 0x774F_4646; // 'wOFF'
pub(crate) const MAGIC_WOFF2: u32 = 0x774F_4632; // 'wOF2'

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Lenient,
    Strict,
}

pub(crate) fn is_sfnt_flavor(magic: u32) -> bool {
    matches!(magic, MAGIC_TRUETYPE | MAGIC_OTTO | MAGIC_TRUE | MAGIC_TYP1)
}

/// Classify the input by its magic number and decode a single font.
///
/// A collection decodes to its first font; `parse_collection` is the
/// way to get at the rest.
pub(crate) fn parse_buffer(source: Arc<[u8]>, mode: Mode, cancel: &CancelToken) -> Result<Font> {
    let magic = Reader::new(&source).read_u32()?;
    if is_sfnt_flavor(magic) {
        return parse_sfnt(source, 0, mode);
    }
    match magic {
        MAGIC_TTCF => collection::parse_index(source, 0, mode),
        MAGIC_WOFF => woff::parse_woff(source, mode),
        MAGIC_WOFF2 => woff2::parse_woff2(source, mode, cancel),
        other => Err(Error::UnknownFormat(other)),
    }
}

/// Parse an SFNT offset table and directory starting at `offset`.
///
/// Payloads become lazy regions of the shared input; strict mode
/// additionally verifies every recorded table checksum.
pub(crate) fn parse_sfnt(source: Arc<[u8]>, offset: usize, mode: Mode) -> Result<Font> {
    let mut r = Reader::new(&source);
    r.seek(offset)?;

    let flavor = r.read_u32()?;
    if !is_sfnt_flavor(flavor) {
        return Err(Error::MalformedHeader("offset table has no sfnt version tag"));
    }

    let num_tables = r.read_u16()?;
    let search_range = r.read_u16()?;
    let entry_selector = r.read_u16()?;
    let range_shift = r.read_u16()?;
    let expected = search_params(num_tables);
    if (search_range, entry_selector, range_shift) != expected {
        if mode == Mode::Strict {
            return Err(Error::MalformedHeader("search parameters do not match numTables"));
        }
        warn!(
            "lenient parse: searchRange/entrySelector/rangeShift ({search_range}, \
             {entry_selector}, {range_shift}) do not match numTables {num_tables}"
        );
    }

    let mut records = Vec::with_capacity(num_tables as usize);
    for _ in 0..num_tables {
        let tag = Tag::from_u32(r.read_u32()?);
        let checksum = r.read_u32()?;
        let table_offset = r.read_u32()? as usize;
        let length = r.read_u32()? as usize;
        let end = table_offset.checked_add(length).ok_or(Error::TruncatedInput)?;
        if end > source.len() {
            return Err(Error::TruncatedInput);
        }
        records.push((tag, checksum, table_offset, length));
    }

    // Keep tables in physical order so a rewrite places payloads where
    // the input did; the writer re-sorts the directory by tag anyway.
    records.sort_by_key(|&(_, _, table_offset, _)| table_offset);

    let mut font = Font::with_source(Tag::from_u32(flavor), source.clone());
    for (tag, checksum, table_offset, length) in records {
        if mode == Mode::Strict && tag != tag::HEAD {
            let computed = font::checksum(&source[table_offset..table_offset + length]);
            if computed != checksum {
                return Err(Error::BadTableChecksum { tag, recorded: checksum, computed });
            }
        }
        debug_assert!(font.region_in_bounds(table_offset, length));
        font.insert(tag, Payload::Region { offset: table_offset, len: length });
    }
    Ok(font)
}
