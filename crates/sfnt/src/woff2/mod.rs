//! WOFF2: a packed table directory over one Brotli-compressed block,
//! with table-specific transforms for `glyf` and `loca`.

mod glyf;
mod varint;

use std::io::Read;
use std::sync::Arc;

use brotli_decompressor::Decompressor;
use log::debug;

use crate::error::{Error, Result};
use crate::font::{Font, Payload};
use crate::parse::{Mode, MAGIC_TTCF};
use crate::reader::Reader;
use crate::tag::{self, Tag, WOFF2_KNOWN_TAGS};
use crate::CancelToken;

/// Cancellation is checked once per this much decompressed output.
const CANCEL_CHECK_INTERVAL: usize = 64 * 1024;

#[derive(Debug)]
struct DirectoryEntry {
    tag: Tag,
    transformed: bool,
    orig_length: u32,
    /// Offset and length of this table's body within the decompressed
    /// block (`transformLength` when a transform is in effect).
    src_offset: usize,
    src_length: u32,
}

impl DirectoryEntry {
    fn src_range(&self) -> std::ops::Range<usize> {
        self.src_offset..self.src_offset + self.src_length as usize
    }
}

/// Decode a WOFF2 file. The result is always a plain font: transformed
/// `glyf`/`loca` are reconstructed, everything is materialized.
pub(crate) fn parse_woff2(source: Arc<[u8]>, _mode: Mode, cancel: &CancelToken) -> Result<Font> {
    let mut r = Reader::new(&source);
    let _signature = r.read_u32()?;
    let flavor = Tag::from_u32(r.read_u32()?);
    if flavor.to_u32() == MAGIC_TTCF {
        return Err(Error::MalformedHeader("WOFF2 collections are not supported"));
    }
    let _length = r.read_u32()?;
    let num_tables = r.read_u16()?;
    let _reserved = r.read_u16()?;
    let _total_sfnt_size = r.read_u32()?;
    let total_compressed_size = r.read_u32()? as usize;
    let _major_version = r.read_u16()?;
    let _minor_version = r.read_u16()?;
    let _meta_offset = r.read_u32()?;
    let _meta_length = r.read_u32()?;
    let _meta_orig_length = r.read_u32()?;
    let _priv_offset = r.read_u32()?;
    let _priv_length = r.read_u32()?;

    let entries = read_directory(&mut r, num_tables)?;
    let src_total = entries.last().map_or(0, |e| e.src_offset + e.src_length as usize);

    let compressed = r.read_bytes(total_compressed_size)?;
    let block = inflate_brotli(compressed, src_total, &entries, cancel)?;
    debug!("WOFF2: inflated {} tables into {} bytes", entries.len(), block.len());

    let mut font = Font::with_source(flavor, source.clone());
    let mut i = 0;
    while i < entries.len() {
        let entry = &entries[i];
        match entry.tag {
            t if t == tag::GLYF && entry.transformed => {
                // A transformed glyf must be paired with a transformed,
                // zero-length loca record immediately after it.
                let loca = entries.get(i + 1).ok_or(Error::MalformedHeader(
                    "transformed glyf is not followed by loca",
                ))?;
                if loca.tag != tag::LOCA || !loca.transformed {
                    return Err(Error::MalformedHeader("transformed glyf is not followed by loca"));
                }
                if loca.src_length != 0 {
                    return Err(Error::MalformedHeader("transformed loca has a nonzero length"));
                }
                let rebuilt = glyf::reconstruct(&block[entry.src_range()], cancel)?;
                if rebuilt.loca.len() != loca.orig_length as usize {
                    return Err(Error::MalformedGlyfStream);
                }
                font.insert(tag::GLYF, Payload::Raw(rebuilt.glyf));
                font.insert(tag::LOCA, Payload::Raw(rebuilt.loca));
                i += 2;
            }
            t if t == tag::LOCA && entry.transformed => {
                return Err(Error::MalformedHeader("transformed loca is not preceded by glyf"));
            }
            _ => {
                font.insert(entry.tag, Payload::Raw(block[entry.src_range()].to_vec()));
                i += 1;
            }
        }
    }
    Ok(font)
}

/// Read the packed directory: a flag byte (low 6 bits known-tag index
/// or 63 for an explicit tag, high 2 bits transform version) followed
/// by Base-128 lengths.
fn read_directory(r: &mut Reader, num_tables: u16) -> Result<Vec<DirectoryEntry>> {
    let mut entries = Vec::with_capacity(num_tables as usize);
    let mut src_offset: usize = 0;
    for _ in 0..num_tables {
        let flags = r.read_u8()?;
        let transform = flags >> 6;
        let tag = match flags & 0x3F {
            0x3F => Tag::from_u32(r.read_u32()?),
            index => WOFF2_KNOWN_TAGS[index as usize],
        };

        let orig_length = varint::read_base128(r)?;
        // The null transform is version 3 for glyf/loca and version 0
        // for everything else.
        let transformed = if tag == tag::GLYF || tag == tag::LOCA {
            transform != 3
        } else {
            transform != 0
        };
        // Only the glyf/loca version-0 transform is decodable.
        if transformed && transform != 0 {
            return Err(Error::UnsupportedTransform { tag, version: transform });
        }
        let src_length = if transformed { varint::read_base128(r)? } else { orig_length };

        entries.push(DirectoryEntry { tag, transformed, orig_length, src_offset, src_length });
        src_offset = src_offset.checked_add(src_length as usize).ok_or(Error::TruncatedInput)?;
    }
    Ok(entries)
}

/// Brotli-inflate the table block to exactly `expected` bytes, checking
/// for cancellation every 64 KiB of output.
fn inflate_brotli(
    compressed: &[u8],
    expected: usize,
    entries: &[DirectoryEntry],
    cancel: &CancelToken,
) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected);
    let mut decompressor = Decompressor::new(compressed, 4096);
    let mut chunk = vec![0u8; CANCEL_CHECK_INTERVAL];
    loop {
        cancel.check()?;
        match decompressor.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                out.extend_from_slice(&chunk[..n]);
                if out.len() > expected {
                    return Err(corrupt_entry(entries, expected));
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => return Err(corrupt_entry(entries, out.len())),
        }
    }
    if out.len() != expected {
        return Err(corrupt_entry(entries, out.len()));
    }
    Ok(out)
}

/// Attribute a bad compressed block to the first table whose body is
/// not fully covered by the `covered` decompressed bytes.
fn corrupt_entry(entries: &[DirectoryEntry], covered: usize) -> Error {
    let tag = entries
        .iter()
        .find(|e| e.src_offset + e.src_length as usize > covered)
        .or_else(|| entries.last())
        .map(|e| e.tag);
    match tag {
        Some(tag) => Error::CorruptCompressedTable { tag },
        None => Error::MalformedHeader("empty WOFF2 table directory"),
    }
}
