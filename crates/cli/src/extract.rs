//! Bounds-checked field extraction over raw table bytes.

use anyhow::{bail, Result};

pub fn be_u16(data: &[u8], offset: usize) -> Result<u16> {
    match data.get(offset..offset + 2) {
        Some(bytes) => Ok(u16::from_be_bytes(bytes.try_into().unwrap())),
        None => bail!("table truncated at offset {offset}"),
    }
}

pub fn be_i16(data: &[u8], offset: usize) -> Result<i16> {
    be_u16(data, offset).map(|v| v as i16)
}

pub fn be_u32(data: &[u8], offset: usize) -> Result<u32> {
    match data.get(offset..offset + 4) {
        Some(bytes) => Ok(u32::from_be_bytes(bytes.try_into().unwrap())),
        None => bail!("table truncated at offset {offset}"),
    }
}
