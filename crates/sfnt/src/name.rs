//! The `name` table: parsing, serialization, and entry display.

use crate::encoding;
use crate::error::{Error, Result};
use crate::reader::Reader;

/// One naming-table record. `value` holds the raw storage bytes in the
/// encoding declared by the platform/encoding/language triple.
#[derive(Clone, Debug)]
pub struct NameEntry {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
    pub value: Vec<u8>,
}

impl NameEntry {
    /// Best-effort decode of the value for display. Entries whose
    /// encoding has no mapping are shown as their raw bytes, with
    /// non-ASCII octets replaced.
    pub fn decode(&self) -> String {
        match encoding::lookup(self.platform_id, self.encoding_id, self.language_id) {
            Some(enc) => enc.decode_without_bom_handling(&self.value).0.into_owned(),
            None => self
                .value
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
                .collect(),
        }
    }

    /// The standard label for this entry's name ID, if it has one.
    pub fn label(&self) -> Option<&'static str> {
        Some(match self.name_id {
            0 => "Copyright",
            1 => "Font Family",
            2 => "Font Subfamily",
            3 => "Unique ID",
            4 => "Full Name",
            5 => "Version",
            6 => "PostScript Name",
            7 => "Trademark",
            8 => "Manufacturer",
            9 => "Designer",
            10 => "Description",
            11 => "Vendor URL",
            12 => "Designer URL",
            13 => "License",
            14 => "License URL",
            16 => "Typographic Family",
            17 => "Typographic Subfamily",
            18 => "Compatible Full Name",
            19 => "Sample Text",
            20 => "PostScript CID Name",
            21 => "WWS Family",
            22 => "WWS Subfamily",
            25 => "Variations PostScript Prefix",
            _ => return None,
        })
    }

    fn sort_key(&self) -> (u16, u16, u16, u16) {
        (self.platform_id, self.encoding_id, self.language_id, self.name_id)
    }
}

/// A parsed (or freshly built) `name` table.
#[derive(Clone, Debug, Default)]
pub struct NameTable {
    format: u16,
    entries: Vec<NameEntry>,
    /// Raw UTF-16BE language tags (format 1 only).
    lang_tags: Vec<Vec<u8>>,
}

impl NameTable {
    /// An empty table. Serializes to the minimum valid form:
    /// `format 0, count 0, stringOffset 6`.
    pub fn new() -> Self {
        NameTable::default()
    }

    pub fn format(&self) -> u16 {
        self.format
    }

    pub fn entries(&self) -> &[NameEntry] {
        &self.entries
    }

    pub fn add(&mut self, entry: NameEntry) {
        self.entries.push(entry);
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        let format = r.read_u16()?;
        if format > 1 {
            return Err(Error::MalformedHeader("unsupported name table format"));
        }
        let count = r.read_u16()?;
        let string_offset = r.read_u16()? as usize;

        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let platform_id = r.read_u16()?;
            let encoding_id = r.read_u16()?;
            let language_id = r.read_u16()?;
            let name_id = r.read_u16()?;
            let length = r.read_u16()? as usize;
            let offset = r.read_u16()? as usize;
            let value = storage_slice(data, string_offset, offset, length)?.to_vec();
            entries.push(NameEntry { platform_id, encoding_id, language_id, name_id, value });
        }

        let mut lang_tags = Vec::new();
        if format == 1 {
            let lang_tag_count = r.read_u16()?;
            for _ in 0..lang_tag_count {
                let length = r.read_u16()? as usize;
                let offset = r.read_u16()? as usize;
                lang_tags.push(storage_slice(data, string_offset, offset, length)?.to_vec());
            }
        }

        Ok(NameTable { format, entries, lang_tags })
    }

    /// Serialize. Records are emitted in (platform, encoding,
    /// language, name) order; format 0 unless language tags exist.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by_key(|&i| self.entries[i].sort_key());

        let format: u16 = if self.lang_tags.is_empty() { 0 } else { 1 };
        let mut header_len = 6 + 12 * self.entries.len();
        if format == 1 {
            header_len += 2 + 4 * self.lang_tags.len();
        }

        let mut storage: Vec<u8> = Vec::new();
        let mut out = Vec::with_capacity(header_len);
        out.extend_from_slice(&format.to_be_bytes());
        out.extend_from_slice(&(self.entries.len() as u16).to_be_bytes());
        out.extend_from_slice(&(header_len as u16).to_be_bytes());
        for &i in &order {
            let entry = &self.entries[i];
            out.extend_from_slice(&entry.platform_id.to_be_bytes());
            out.extend_from_slice(&entry.encoding_id.to_be_bytes());
            out.extend_from_slice(&entry.language_id.to_be_bytes());
            out.extend_from_slice(&entry.name_id.to_be_bytes());
            out.extend_from_slice(&(entry.value.len() as u16).to_be_bytes());
            out.extend_from_slice(&(storage.len() as u16).to_be_bytes());
            storage.extend_from_slice(&entry.value);
        }
        if format == 1 {
            out.extend_from_slice(&(self.lang_tags.len() as u16).to_be_bytes());
            for lang_tag in &self.lang_tags {
                out.extend_from_slice(&(lang_tag.len() as u16).to_be_bytes());
                out.extend_from_slice(&(storage.len() as u16).to_be_bytes());
                storage.extend_from_slice(lang_tag);
            }
        }
        out.extend_from_slice(&storage);
        out
    }
}

fn storage_slice(data: &[u8], string_offset: usize, offset: usize, length: usize) -> Result<&[u8]> {
    let start = string_offset.checked_add(offset).ok_or(Error::TruncatedInput)?;
    let end = start.checked_add(length).ok_or(Error::TruncatedInput)?;
    if end > data.len() {
        return Err(Error::TruncatedInput);
    }
    Ok(&data[start..end])
}
