//! WOFF and WOFF2 decoding against hand-assembled containers.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use sfnt::{tag, CancelToken, Error, Tag};

/// A well-formed 54-byte head table.
fn head_table() -> Vec<u8> {
    let mut head = Vec::with_capacity(54);
    head.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // version
    head.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // fontRevision
    head.extend_from_slice(&0u32.to_be_bytes()); // checkSumAdjustment
    head.extend_from_slice(&0x5F0F_3CF5u32.to_be_bytes()); // magicNumber
    head.extend_from_slice(&0u16.to_be_bytes()); // flags
    head.extend_from_slice(&1000u16.to_be_bytes()); // unitsPerEm
    head.extend_from_slice(&[0; 16]); // created, modified
    for value in [0i16, 0, 1000, 1000] {
        head.extend_from_slice(&value.to_be_bytes());
    }
    head.extend_from_slice(&0u16.to_be_bytes()); // macStyle
    head.extend_from_slice(&8u16.to_be_bytes()); // lowestRecPPEM
    head.extend_from_slice(&2i16.to_be_bytes()); // fontDirectionHint
    head.extend_from_slice(&0i16.to_be_bytes()); // indexToLocFormat
    head.extend_from_slice(&0i16.to_be_bytes()); // glyphDataFormat
    head
}

fn reference_checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

fn zlib_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Assemble a WOFF container. Tables are compressed where that
/// actually saves bytes, stored otherwise, as the format requires.
fn build_woff(tables: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
    let header_len = 44 + 20 * tables.len();
    let mut directory = Vec::new();
    let mut bodies = Vec::new();
    for (table_tag, data) in tables {
        let compressed = zlib_compress(data);
        let stored: &[u8] = if compressed.len() < data.len() { &compressed } else { data };
        directory.extend_from_slice(*table_tag);
        directory.extend_from_slice(&((header_len + bodies.len()) as u32).to_be_bytes());
        directory.extend_from_slice(&(stored.len() as u32).to_be_bytes());
        directory.extend_from_slice(&(data.len() as u32).to_be_bytes());
        directory.extend_from_slice(&reference_checksum(data).to_be_bytes());
        bodies.extend_from_slice(stored);
        while bodies.len() % 4 != 0 {
            bodies.push(0);
        }
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"wOFF");
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // flavor
    out.extend_from_slice(&((header_len + bodies.len()) as u32).to_be_bytes());
    out.extend_from_slice(&(tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // reserved
    out.extend_from_slice(&0u32.to_be_bytes()); // totalSfntSize
    out.extend_from_slice(&0u32.to_be_bytes()); // version pair
    out.extend_from_slice(&[0; 20]); // metadata and private blocks
    out.extend_from_slice(&directory);
    out.extend_from_slice(&bodies);
    out
}

#[test]
fn woff_payloads_match_their_sources() {
    let head = head_table();
    let glyf: Vec<u8> = (0..1000u32).flat_map(|i| [(i % 7) as u8, 0x20]).take(1000).collect();
    let cmap = vec![0xAB; 13]; // too small to compress, stays stored
    let woff = build_woff(&[(b"head", &head), (b"glyf", &glyf), (b"cmap", &cmap)]);

    let font = sfnt::parse(&woff[..]).expect("parse WOFF");
    assert_eq!(font.get_table(tag::HEAD).unwrap(), &head[..]);
    assert_eq!(font.get_table(tag::GLYF).unwrap(), &glyf[..]);
    assert_eq!(font.get_table(tag::CMAP).unwrap(), &cmap[..]);

    let mut out = Vec::new();
    font.write_otf(&mut out).expect("write OTF");
    assert_eq!(&out[0..4], &[0x00, 0x01, 0x00, 0x00]);
    let reparsed = sfnt::strict_parse(&out[..]).expect("output verifies");
    assert_eq!(reparsed.get_table(tag::GLYF).unwrap(), &glyf[..]);
}

#[test]
fn woff_strict_mode_verifies_original_checksums() {
    let head = head_table();
    let glyf = vec![0x55; 400];
    let mut woff = build_woff(&[(b"head", &head), (b"glyf", &glyf)]);
    sfnt::strict_parse(&woff[..]).expect("checksums hold");

    // corrupt the recorded glyf checksum (second directory entry)
    let record = 44 + 20;
    woff[record + 16] ^= 0xFF;
    match sfnt::strict_parse(&woff[..]) {
        Err(Error::BadTableChecksum { tag, .. }) => assert_eq!(tag, tag::GLYF),
        other => panic!("expected BadTableChecksum, got {other:?}"),
    }
    sfnt::parse(&woff[..]).expect("lenient mode does not verify");
}

#[test]
fn woff_inflate_must_hit_declared_length() {
    let glyf = vec![0x55; 400];
    let mut woff = build_woff(&[(b"glyf", &glyf)]);
    // shrink the declared original length under the real inflate size
    let record = 44;
    woff[record + 12..record + 16].copy_from_slice(&399u32.to_be_bytes());
    match sfnt::parse(&woff[..]) {
        Err(Error::CorruptCompressedTable { tag }) => assert_eq!(tag, tag::GLYF),
        other => panic!("expected CorruptCompressedTable, got {other:?}"),
    }
}

/// The WOFF2 transformed glyf stream for two glyphs: an empty one and
/// a simple triangle.
fn transformed_glyf_stream() -> Vec<u8> {
    let substreams: [&[u8]; 7] = [
        &[0x00, 0x00, 0x00, 0x01],     // nContour
        &[3],                          // nPoints
        &[0x00, 0x0B, 0x2A],           // triplet flags
        &[0x00, 50, 0x88, 0x00],       // triplet data + instruction length
        &[],                           // composite
        &[0x00, 0x00, 0x00, 0x00],     // bbox bitmap, no explicit boxes
        &[],                           // instructions
    ];
    let mut stream = Vec::new();
    stream.extend_from_slice(&0u16.to_be_bytes()); // reserved
    stream.extend_from_slice(&0u16.to_be_bytes()); // option flags
    stream.extend_from_slice(&2u16.to_be_bytes()); // numGlyphs
    stream.extend_from_slice(&0u16.to_be_bytes()); // indexFormat
    for substream in &substreams {
        stream.extend_from_slice(&(substream.len() as u32).to_be_bytes());
    }
    for substream in &substreams {
        stream.extend_from_slice(substream);
    }
    stream
}

fn brotli_compress(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut writer = brotli::CompressorWriter::new(&mut out, 4096, 5, 22);
        writer.write_all(data).unwrap();
    }
    out
}

/// Assemble a WOFF2 container with head stored plainly and a
/// transformed glyf/loca pair.
fn build_woff2() -> Vec<u8> {
    let head = head_table();
    let glyf_stream = transformed_glyf_stream();

    let mut directory = Vec::new();
    // head: known-tag index 1, identity transform
    directory.push(0x01);
    directory.push(head.len() as u8);
    // glyf: known-tag index 10, transform version 0 (= transformed)
    directory.push(0x0A);
    directory.push(20); // reconstructed length
    directory.push(glyf_stream.len() as u8);
    // loca: known-tag index 11, transformed, rebuilt alongside glyf
    directory.push(0x0B);
    directory.push(6); // (numGlyphs + 1) * 2
    directory.push(0); // transformLength must be zero

    let mut block = Vec::new();
    block.extend_from_slice(&head);
    block.extend_from_slice(&glyf_stream);
    let compressed = brotli_compress(&block);

    let mut out = Vec::new();
    out.extend_from_slice(b"wOF2");
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // flavor
    out.extend_from_slice(&0u32.to_be_bytes()); // length (unchecked)
    out.extend_from_slice(&3u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // reserved
    out.extend_from_slice(&0u32.to_be_bytes()); // totalSfntSize
    out.extend_from_slice(&(compressed.len() as u32).to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes()); // version pair
    out.extend_from_slice(&[0; 20]); // metadata and private blocks
    out.extend_from_slice(&directory);
    out.extend_from_slice(&compressed);
    out
}

#[test]
fn woff2_reconstructs_glyf_and_loca() {
    let woff2 = build_woff2();
    let font = sfnt::parse(&woff2[..]).expect("parse WOFF2");

    assert_eq!(font.get_table(tag::HEAD).unwrap(), &head_table()[..]);

    let glyf = font.get_table(tag::GLYF).expect("glyf");
    let loca = font.get_table(tag::LOCA).expect("loca");

    // short-format loca: numGlyphs + 1 entries of halved offsets
    assert_eq!(loca.len(), (2 + 1) * 2);
    let offsets: Vec<usize> = loca
        .chunks(2)
        .map(|pair| 2 * u16::from_be_bytes(pair.try_into().unwrap()) as usize)
        .collect();
    assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*offsets.last().unwrap(), glyf.len());

    // glyph 0 is empty; glyph 1 is a one-contour outline with the
    // computed bounding box
    assert_eq!(offsets[0], offsets[1]);
    let simple = &glyf[offsets[1]..offsets[2]];
    assert_eq!(&simple[0..2], &[0x00, 0x01]);
    assert_eq!(&simple[2..10], &[0, 0, 0, 0, 0, 50, 0, 25]);

    let mut out = Vec::new();
    font.write_otf(&mut out).expect("write OTF");
    sfnt::strict_parse(&out[..]).expect("output verifies");
}

#[test]
fn woff2_unknown_transform_is_rejected() {
    let mut out = Vec::new();
    out.extend_from_slice(b"wOF2");
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&[0; 20]);
    // hmtx (known-tag index 3) declaring transform version 1
    out.push(0x43);
    out.push(8);
    match sfnt::parse(&out[..]) {
        Err(Error::UnsupportedTransform { tag, version: 1 }) => assert_eq!(tag, tag::HMTX),
        other => panic!("expected UnsupportedTransform, got {other:?}"),
    }
}

#[test]
fn woff2_truncated_brotli_block_is_corrupt() {
    let woff2 = build_woff2();
    let truncated = &woff2[..woff2.len() - 8];
    // the shortened block is structural truncation at the container
    // level, not a decode error
    assert!(matches!(sfnt::parse(truncated), Err(Error::TruncatedInput)));

    // keep the declared size but damage the stream itself
    let mut damaged = woff2.clone();
    let len = damaged.len();
    damaged[len - 4..].fill(0xFF);
    assert!(matches!(
        sfnt::parse(&damaged[..]),
        Err(Error::CorruptCompressedTable { .. }) | Err(Error::TruncatedInput)
    ));
}

#[test]
fn woff2_parse_respects_cancellation() {
    let woff2 = build_woff2();
    let cancel = CancelToken::new();
    cancel.cancel();
    match sfnt::parse_with_cancel(&woff2[..], &cancel) {
        Err(Error::Cancelled) => {}
        other => panic!("expected Cancelled, got {other:?}"),
    }
}

#[test]
fn woff2_collections_are_not_supported() {
    let mut out = Vec::new();
    out.extend_from_slice(b"wOF2");
    out.extend_from_slice(&u32::from_be_bytes(*b"ttcf").to_be_bytes());
    out.extend_from_slice(&[0; 40]);
    assert!(matches!(sfnt::parse(&out[..]), Err(Error::MalformedHeader(_))));
}

#[test]
fn unknown_magic_reports_the_magic() {
    let data = b"abcd\x00\x00\x00\x00";
    match sfnt::parse(&data[..]) {
        Err(Error::UnknownFormat(magic)) => assert_eq!(magic, u32::from_be_bytes(*b"abcd")),
        other => panic!("expected UnknownFormat, got {other:?}"),
    }
}

// keep Tag in the public API exercised from an external crate's view
#[test]
fn tags_display_as_ascii() {
    assert_eq!(Tag::new(b"GSUB").to_string(), "GSUB");
    assert_eq!(tag::GLYF.to_string(), "glyf");
}
