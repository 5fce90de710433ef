//! Text encodings for `name` entries.
//!
//! The (platform, encoding, language) buckets and their nominal
//! charsets are fixed by the TrueType and OpenType specifications.
//! This is a best-effort mapping onto the encodings the ecosystem
//! registry provides; a `None` return means the bytes are already
//! UTF-8 compatible (ASCII) or the charset has no registry entry, and
//! display falls back to the raw byte sequence.

use encoding_rs::{
    Encoding, BIG5, EUC_KR, GBK, MACINTOSH, SHIFT_JIS, UTF_16BE, WINDOWS_1252, X_MAC_CYRILLIC,
};

const PLATFORM_UNICODE: u16 = 0;
const PLATFORM_MAC: u16 = 1;
const PLATFORM_ISO: u16 = 2;
const PLATFORM_MICROSOFT: u16 = 3;

pub(crate) fn lookup(
    platform_id: u16,
    encoding_id: u16,
    language_id: u16,
) -> Option<&'static Encoding> {
    match platform_id {
        PLATFORM_UNICODE => Some(UTF_16BE),
        PLATFORM_MAC => mac_encoding(encoding_id, language_id),
        PLATFORM_ISO => iso_encoding(encoding_id),
        PLATFORM_MICROSOFT => microsoft_encoding(encoding_id),
        _ => None,
    }
}

fn mac_encoding(encoding_id: u16, _language_id: u16) -> Option<&'static Encoding> {
    // The regional Roman variants (Icelandic, Turkish, Croatian, ...)
    // selected by language ID have no registry entries; plain Mac
    // Roman is the closest charset for all of them.
    match encoding_id {
        0 => Some(MACINTOSH),
        1 => Some(SHIFT_JIS),
        2 => Some(BIG5),
        3 => Some(EUC_KR),
        7 => Some(X_MAC_CYRILLIC),
        25 => Some(GBK),
        _ => None,
    }
}

fn iso_encoding(encoding_id: u16) -> Option<&'static Encoding> {
    match encoding_id {
        0 => None, // 7-bit ASCII is valid UTF-8
        1 => Some(UTF_16BE), // ISO 10646
        2 => Some(WINDOWS_1252), // ISO 8859-1
        _ => None,
    }
}

fn microsoft_encoding(encoding_id: u16) -> Option<&'static Encoding> {
    match encoding_id {
        0 => Some(UTF_16BE), // Symbol
        1 => Some(UTF_16BE), // Unicode BMP
        2 => Some(SHIFT_JIS),
        3 => Some(GBK),
        4 => Some(BIG5),
        5 => Some(EUC_KR),
        10 => Some(UTF_16BE), // Unicode full repertoire
        _ => None, // 6 (Johab) has no registry entry
    }
}
