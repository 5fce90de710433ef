//! The in-memory font model.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::name::NameTable;
use crate::tag::{self, Tag};

/// Where a table's bytes come from.
///
/// Kept as a plain enum rather than a trait object so that the lazy
/// `Region` path stays allocation-free.
#[derive(Debug)]
pub(crate) enum Payload {
    /// Materialized contents (decompressed WOFF tables, user edits).
    Raw(Vec<u8>),
    /// A window into the original input buffer, resolved at read time.
    Region { offset: usize, len: usize },
    /// Produced by a table codec rather than read from the input.
    Synthesized(Vec<u8>),
}

/// A parsed font: an ordered set of tables over a shared input buffer.
///
/// Fonts parsed from one collection share the same underlying buffer;
/// tables are exposed as immutable byte views, and any replacement
/// stores new bytes instead of mutating the shared input.
#[derive(Debug)]
pub struct Font {
    flavor: Tag,
    source: Arc<[u8]>,
    tables: Vec<(Tag, Payload)>,
}

impl Font {
    /// An empty font with the given sfnt version tag.
    pub fn new(flavor: Tag) -> Self {
        Font { flavor, source: Arc::from(Vec::new()), tables: Vec::new() }
    }

    pub(crate) fn with_source(flavor: Tag, source: Arc<[u8]>) -> Self {
        Font { flavor, source, tables: Vec::new() }
    }

    /// The sfnt version of the container (`00 01 00 00`, `OTTO`, ...).
    pub fn flavor(&self) -> Tag {
        self.flavor
    }

    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    pub fn has_table(&self, tag: Tag) -> bool {
        self.tables.iter().any(|(t, _)| *t == tag)
    }

    /// The table's bytes, or [`Error::NotFound`].
    pub fn get_table(&self, tag: Tag) -> Result<&[u8]> {
        self.tables
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, payload)| self.payload_bytes(payload))
            .ok_or(Error::NotFound(tag))
    }

    /// Ordered `(tag, bytes)` views over every table.
    pub fn tables(&self) -> impl Iterator<Item = (Tag, &[u8])> {
        self.tables.iter().map(|(t, payload)| (*t, self.payload_bytes(payload)))
    }

    /// Install a table. Replaces an existing table in place (keeping its
    /// position in the order) or appends a new one.
    pub fn add_table(&mut self, tag: Tag, data: impl Into<Vec<u8>>) {
        self.insert(tag, Payload::Raw(data.into()));
    }

    /// Remove a table. Removing an absent tag is a no-op.
    pub fn remove_table(&mut self, tag: Tag) {
        self.tables.retain(|(t, _)| *t != tag);
    }

    /// Parse the `name` table.
    pub fn name_table(&self) -> Result<NameTable> {
        NameTable::parse(self.get_table(tag::NAME)?)
    }

    /// Install a serialized `name` table built by the codec.
    pub fn set_name_table(&mut self, table: &NameTable) {
        self.insert(tag::NAME, Payload::Synthesized(table.to_bytes()));
    }

    /// Serialize as an uncompressed SFNT. Returns the number of bytes
    /// written.
    pub fn write_otf(&self, sink: &mut impl std::io::Write) -> Result<usize> {
        crate::writer::write_otf(self, sink)
    }

    pub(crate) fn insert(&mut self, tag: Tag, payload: Payload) {
        match self.tables.iter_mut().find(|(t, _)| *t == tag) {
            Some(entry) => entry.1 = payload,
            None => self.tables.push((tag, payload)),
        }
    }

    /// Validated at insertion time by the decoders; a Region always lies
    /// within `source`.
    pub(crate) fn region_in_bounds(&self, offset: usize, len: usize) -> bool {
        offset.checked_add(len).is_some_and(|end| end <= self.source.len())
    }

    fn payload_bytes<'a>(&'a self, payload: &'a Payload) -> &'a [u8] {
        match payload {
            Payload::Raw(bytes) | Payload::Synthesized(bytes) => bytes,
            Payload::Region { offset, len } => &self.source[*offset..*offset + *len],
        }
    }
}

/// The SFNT table checksum: a wrapping sum of big-endian 32-bit words
/// over the zero-padded data.
pub(crate) fn checksum(data: &[u8]) -> u32 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        sum = sum.wrapping_add(u32::from_be_bytes(chunk.try_into().unwrap()));
    }
    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut last = [0u8; 4];
        last[..tail.len()].copy_from_slice(tail);
        sum = sum.wrapping_add(u32::from_be_bytes(last));
    }
    sum
}

/// Table checksum with the `head` exception: bytes 8..12 (the
/// `checkSumAdjustment` field) are treated as zero.
pub(crate) fn table_checksum(tag: Tag, data: &[u8]) -> u32 {
    let mut sum = checksum(data);
    if tag == tag::HEAD && data.len() >= 12 {
        sum = sum.wrapping_sub(u32::from_be_bytes(data[8..12].try_into().unwrap()));
    }
    sum
}
