//! Reader and writer for SFNT font containers.
//!
//! Decodes TrueType and OpenType fonts (TTF/OTF), TrueType Collections
//! (TTC/OTC), WOFF, and WOFF2 into one in-memory [`Font`] model, and
//! serializes any of them back out as an uncompressed SFNT. WOFF2 is
//! read-only: its Brotli block is inflated and the `glyf`/`loca`
//! transforms are inverted on the way in.
//!
//! ```no_run
//! use std::fs::File;
//!
//! let file = File::open("font.woff")?;
//! let font = sfnt::parse(file)?;
//! let mut out = Vec::new();
//! font.write_otf(&mut out)?;
//! # Ok::<(), sfnt::Error>(())
//! ```

mod collection;
mod encoding;
mod error;
mod font;
mod name;
mod parse;
mod reader;
pub mod tag;
mod woff;
mod woff2;
mod writer;

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use error::{Error, Result};
pub use font::Font;
pub use name::{NameEntry, NameTable};
pub use tag::Tag;

use parse::Mode;

/// A cooperative cancellation signal for long decodes.
///
/// Cloning is cheap; all clones observe the same flag. Brotli
/// inflation checks it every 64 KiB of output and the WOFF2 glyf
/// rebuild between glyphs, failing with [`Error::Cancelled`] without
/// producing partial output.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

/// Whether the input is a TrueType/OpenType collection.
pub fn is_collection(mut source: impl Read) -> Result<bool> {
    let mut magic = [0u8; 4];
    source.read_exact(&mut magic).map_err(truncation)?;
    Ok(u32::from_be_bytes(magic) == parse::MAGIC_TTCF)
}

/// Parse a font leniently: the table directory is validated for
/// structure, checksums are not verified, and table payloads stay lazy
/// views of the input wherever the format allows.
pub fn parse(source: impl Read) -> Result<Font> {
    parse::parse_buffer(read_source(source)?, Mode::Lenient, &CancelToken::new())
}

/// Parse a font and verify every recorded table checksum.
pub fn strict_parse(source: impl Read) -> Result<Font> {
    parse::parse_buffer(read_source(source)?, Mode::Strict, &CancelToken::new())
}

/// [`parse`] with a cancellation token.
pub fn parse_with_cancel(source: impl Read, cancel: &CancelToken) -> Result<Font> {
    parse::parse_buffer(read_source(source)?, Mode::Lenient, cancel)
}

/// [`strict_parse`] with a cancellation token.
pub fn strict_parse_with_cancel(source: impl Read, cancel: &CancelToken) -> Result<Font> {
    parse::parse_buffer(read_source(source)?, Mode::Strict, cancel)
}

/// Parse every font in a collection. A non-collection input yields a
/// single-element vector. All returned fonts share one input buffer.
pub fn parse_collection(source: impl Read) -> Result<Vec<Font>> {
    let buffer = read_source(source)?;
    let magic = reader::Reader::new(&buffer).read_u32()?;
    if magic == parse::MAGIC_TTCF {
        collection::parse_all(buffer, Mode::Lenient)
    } else {
        Ok(vec![parse::parse_buffer(buffer, Mode::Lenient, &CancelToken::new())?])
    }
}

/// Parse the `index`-th font of a collection.
pub fn parse_collection_index(source: impl Read, index: u32) -> Result<Font> {
    collection::parse_index(read_source(source)?, index, Mode::Lenient)
}

/// Materialize the source into one shared buffer; everything after
/// this works against in-memory regions of it.
fn read_source(mut source: impl Read) -> Result<Arc<[u8]>> {
    let mut buffer = Vec::new();
    source.read_to_end(&mut buffer)?;
    Ok(Arc::from(buffer))
}

fn truncation(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::TruncatedInput
    } else {
        Error::Io(e)
    }
}
