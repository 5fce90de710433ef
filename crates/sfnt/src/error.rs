use std::{io, result};

use thiserror::Error;

use crate::tag::Tag;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unexpected end of input")]
    TruncatedInput,

    #[error("unrecognized font format: magic {0:#010x}")]
    UnknownFormat(u32),

    #[error("malformed header: {0}")]
    MalformedHeader(&'static str),

    #[error("checksum mismatch for table '{tag}': recorded {recorded:#010x}, computed {computed:#010x}")]
    BadTableChecksum { tag: Tag, recorded: u32, computed: u32 },

    #[error("corrupt compressed data for table '{tag}'")]
    CorruptCompressedTable { tag: Tag },

    #[error("unsupported transform version {version} for table '{tag}'")]
    UnsupportedTransform { tag: Tag, version: u8 },

    #[error("malformed transformed glyf stream")]
    MalformedGlyfStream,

    #[error("invalid loca index format {0}")]
    InvalidIndexFormat(u16),

    #[error("font index {index} out of range for collection of {count} fonts")]
    IndexOutOfRange { index: u32, count: u32 },

    #[error("table '{0}' not found")]
    NotFound(Tag),

    #[error("operation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = result::Result<T, Error>;
