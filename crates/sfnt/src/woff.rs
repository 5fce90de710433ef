//! WOFF 1.0: an SFNT wrapper with per-table zlib compression.

use std::sync::Arc;

use flate2::{Decompress, FlushDecompress, Status};
use log::warn;

use crate::error::{Error, Result};
use crate::font::{self, Font, Payload};
use crate::parse::Mode;
use crate::reader::Reader;
use crate::tag::{self, Tag};

/// Decode a WOFF file. Every table is materialized (inflated where
/// compressed), so the resulting font no longer references the input.
pub(crate) fn parse_woff(source: Arc<[u8]>, mode: Mode) -> Result<Font> {
    let mut r = Reader::new(&source);
    let _signature = r.read_u32()?;
    let flavor = Tag::from_u32(r.read_u32()?);
    let _length = r.read_u32()?;
    let num_tables = r.read_u16()?;
    let reserved = r.read_u16()?;
    if reserved != 0 {
        if mode == Mode::Strict {
            return Err(Error::MalformedHeader("reserved WOFF header field is nonzero"));
        }
        warn!("lenient parse: reserved WOFF header field is {reserved}, expected 0");
    }
    let _total_sfnt_size = r.read_u32()?;
    let _major_version = r.read_u16()?;
    let _minor_version = r.read_u16()?;
    let _meta_offset = r.read_u32()?;
    let _meta_length = r.read_u32()?;
    let _meta_orig_length = r.read_u32()?;
    let _priv_offset = r.read_u32()?;
    let _priv_length = r.read_u32()?;

    let mut font = Font::with_source(flavor, source.clone());
    for _ in 0..num_tables {
        let tag = Tag::from_u32(r.read_u32()?);
        let offset = r.read_u32()? as usize;
        let comp_length = r.read_u32()? as usize;
        let orig_length = r.read_u32()? as usize;
        let orig_checksum = r.read_u32()?;

        let end = offset.checked_add(comp_length).ok_or(Error::TruncatedInput)?;
        if end > source.len() {
            return Err(Error::TruncatedInput);
        }
        let stored = &source[offset..end];

        let data = if comp_length == orig_length {
            stored.to_vec()
        } else if comp_length > orig_length {
            return Err(Error::CorruptCompressedTable { tag });
        } else {
            inflate(tag, stored, orig_length)?
        };

        if mode == Mode::Strict && tag != tag::HEAD {
            let computed = font::checksum(&data);
            if computed != orig_checksum {
                return Err(Error::BadTableChecksum { tag, recorded: orig_checksum, computed });
            }
        }
        font.insert(tag, Payload::Raw(data));
    }
    Ok(font)
}

/// zlib-inflate `data` to exactly `orig_length` bytes.
fn inflate(tag: Tag, data: &[u8], orig_length: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(orig_length);
    let mut z = Decompress::new(true);
    match z.decompress_vec(data, &mut out, FlushDecompress::Finish) {
        Ok(Status::StreamEnd) => {}
        Ok(_) | Err(_) => return Err(Error::CorruptCompressedTable { tag }),
    }
    if out.len() != orig_length {
        return Err(Error::CorruptCompressedTable { tag });
    }
    Ok(out)
}
