//! Serialization to an uncompressed SFNT.

use std::io::Write;

use crate::error::Result;
use crate::font::{checksum, table_checksum, Font};
use crate::tag::{self, Tag};

/// The whole-font checksum constant: `head.checkSumAdjustment` is
/// chosen so the file sums to 0xB1B0AFBA.
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

/// Canonical `(searchRange, entrySelector, rangeShift)` for a table
/// count.
pub(crate) fn search_params(num_tables: u16) -> (u16, u16, u16) {
    if num_tables == 0 {
        return (0, 0, 0);
    }
    let entry_selector = num_tables.ilog2() as u16;
    let search_range = ((1u32 << entry_selector) * 16) as u16;
    let range_shift = (u32::from(num_tables) * 16).wrapping_sub(u32::from(search_range)) as u16;
    (search_range, entry_selector, range_shift)
}

/// Emit the font as an uncompressed SFNT.
///
/// Two passes: the stream is assembled in memory with the `head`
/// adjustment field zeroed, then the adjustment is patched from the
/// whole-stream checksum and the buffer is written to the sink once.
pub(crate) fn write_otf(font: &Font, sink: &mut impl Write) -> Result<usize> {
    let tables: Vec<(Tag, &[u8])> = font.tables().collect();
    let num_tables = tables.len();

    // Directory records are sorted by tag; payloads keep the font's
    // own order so a parsed font writes back in its input layout.
    let mut directory_order: Vec<usize> = (0..num_tables).collect();
    directory_order.sort_by_key(|&i| tables[i].0);

    let mut offsets = vec![0u32; num_tables];
    let mut cursor = 12 + 16 * num_tables;
    for (i, (_, data)) in tables.iter().enumerate() {
        cursor = align4(cursor);
        offsets[i] = cursor as u32;
        cursor += data.len();
    }
    let mut out = Vec::with_capacity(align4(cursor));

    let (search_range, entry_selector, range_shift) = search_params(num_tables as u16);
    out.extend_from_slice(font.flavor().as_bytes());
    out.extend_from_slice(&(num_tables as u16).to_be_bytes());
    out.extend_from_slice(&search_range.to_be_bytes());
    out.extend_from_slice(&entry_selector.to_be_bytes());
    out.extend_from_slice(&range_shift.to_be_bytes());

    for &i in &directory_order {
        let (table_tag, data) = tables[i];
        out.extend_from_slice(table_tag.as_bytes());
        out.extend_from_slice(&table_checksum(table_tag, data).to_be_bytes());
        out.extend_from_slice(&offsets[i].to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    }

    let mut head_offset = None;
    for (i, (table_tag, data)) in tables.iter().enumerate() {
        out.resize(offsets[i] as usize, 0);
        if *table_tag == tag::HEAD {
            head_offset = Some(out.len());
        }
        out.extend_from_slice(data);
    }
    out.resize(align4(out.len()), 0);

    // Patch head.checkSumAdjustment from the checksum of the stream
    // with the field itself zeroed. Fonts without a head table (or
    // with a runt one) are written as-is.
    if let Some(head) = head_offset {
        if out.len() >= head + 12 {
            out[head + 8..head + 12].fill(0);
            let adjustment = CHECKSUM_MAGIC.wrapping_sub(checksum(&out));
            out[head + 8..head + 12].copy_from_slice(&adjustment.to_be_bytes());
        }
    }

    sink.write_all(&out)?;
    Ok(out.len())
}

fn align4(n: usize) -> usize {
    (n + 3) & !3
}
