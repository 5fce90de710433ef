//! Reconstruction of the classic `glyf` and `loca` tables from the
//! WOFF2 transformed `glyf` encoding.

use crate::error::{Error, Result};
use crate::reader::Reader;
use crate::CancelToken;

use super::varint::read_255_u16;

// simple-glyph flag bits
const ON_CURVE: u8 = 1 << 0;
const X_SHORT: u8 = 1 << 1;
const Y_SHORT: u8 = 1 << 2;
const REPEAT: u8 = 1 << 3;
const X_SAME_OR_POSITIVE: u8 = 1 << 4;
const Y_SAME_OR_POSITIVE: u8 = 1 << 5;
const OVERLAP_SIMPLE: u8 = 1 << 6;

// composite-glyph flag bits
const ARG_1_AND_2_ARE_WORDS: u16 = 1 << 0;
const WE_HAVE_A_SCALE: u16 = 1 << 3;
const MORE_COMPONENTS: u16 = 1 << 5;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 1 << 6;
const WE_HAVE_A_TWO_BY_TWO: u16 = 1 << 7;
const WE_HAVE_INSTRUCTIONS: u16 = 1 << 8;

const OPTION_OVERLAP_SIMPLE_BITMAP: u16 = 1 << 0;

#[derive(Debug)]
pub(crate) struct GlyfLoca {
    pub glyf: Vec<u8>,
    pub loca: Vec<u8>,
}

struct Point {
    x: i32,
    y: i32,
    on_curve: bool,
}

pub(crate) fn reconstruct(data: &[u8], cancel: &CancelToken) -> Result<GlyfLoca> {
    match reconstruct_inner(data, cancel) {
        // a substream running dry is a property of the transformed
        // stream, not of the outer container
        Err(Error::TruncatedInput) => Err(Error::MalformedGlyfStream),
        other => other,
    }
}

fn reconstruct_inner(data: &[u8], cancel: &CancelToken) -> Result<GlyfLoca> {
    let mut r = Reader::new(data);
    let _reserved = r.read_u16()?;
    let option_flags = r.read_u16()?;
    let num_glyphs = r.read_u16()? as usize;
    let index_format = r.read_u16()?;
    if index_format > 1 {
        return Err(Error::InvalidIndexFormat(index_format));
    }

    let mut sizes = [0usize; 7];
    for size in &mut sizes {
        *size = r.read_u32()? as usize;
    }

    let mut n_contour = Reader::new(r.read_bytes(sizes[0])?);
    let mut n_points = Reader::new(r.read_bytes(sizes[1])?);
    let mut flag_stream = Reader::new(r.read_bytes(sizes[2])?);
    let mut glyph = Reader::new(r.read_bytes(sizes[3])?);
    let mut composite = Reader::new(r.read_bytes(sizes[4])?);
    let bbox_substream = r.read_bytes(sizes[5])?;
    let mut instructions = Reader::new(r.read_bytes(sizes[6])?);

    let bitmap_len = ((num_glyphs + 31) >> 5) << 2;
    if bitmap_len > bbox_substream.len() {
        return Err(Error::MalformedGlyfStream);
    }
    let (bbox_bitmap, bbox_values) = bbox_substream.split_at(bitmap_len);
    let mut bbox = Reader::new(bbox_values);

    let overlap_bitmap = if option_flags & OPTION_OVERLAP_SIMPLE_BITMAP != 0 {
        Some(r.read_bytes((num_glyphs + 7) >> 3)?)
    } else {
        None
    };

    let mut glyf = Vec::new();
    let mut loca_values = Vec::with_capacity(num_glyphs + 1);
    for i in 0..num_glyphs {
        cancel.check()?;
        loca_values.push(glyf.len());

        let contours = n_contour.read_i16()?;
        let has_bbox = bitmap_bit(bbox_bitmap, i);
        if contours == 0 {
            // empty glyph; an explicit bbox here is invalid
            if has_bbox {
                return Err(Error::MalformedGlyfStream);
            }
        } else if contours > 0 {
            let overlap = overlap_bitmap.map_or(false, |bitmap| bitmap_bit(bitmap, i));
            simple_glyph(
                contours,
                has_bbox,
                overlap,
                &mut n_points,
                &mut flag_stream,
                &mut glyph,
                &mut bbox,
                &mut instructions,
                &mut glyf,
            )?;
        } else {
            composite_glyph(
                has_bbox,
                &mut composite,
                &mut glyph,
                &mut bbox,
                &mut instructions,
                &mut glyf,
            )?;
        }

        // short loca offsets are stored halved, so keep them even
        if index_format == 0 && glyf.len() % 2 == 1 {
            glyf.push(0);
        }
    }
    loca_values.push(glyf.len());

    let loca = build_loca(&loca_values, index_format)?;
    Ok(GlyfLoca { glyf, loca })
}

#[allow(clippy::too_many_arguments)]
fn simple_glyph(
    contours: i16,
    has_bbox: bool,
    overlap: bool,
    n_points: &mut Reader,
    flag_stream: &mut Reader,
    glyph: &mut Reader,
    bbox: &mut Reader,
    instructions: &mut Reader,
    out: &mut Vec<u8>,
) -> Result<()> {
    let mut end_points = Vec::with_capacity(contours as usize);
    let mut end_point: i32 = -1;
    for _ in 0..contours {
        end_point += i32::from(read_255_u16(n_points)?);
        if end_point > 0xFFFF {
            return Err(Error::MalformedGlyfStream);
        }
        end_points.push(end_point as u16);
    }
    let total_points = (end_point + 1) as usize;

    let flags = flag_stream.read_bytes(total_points)?;
    let points = decode_triplets(flags, glyph)?;
    let instruction_len = read_255_u16(glyph)? as usize;
    let instruction_bytes = instructions.read_bytes(instruction_len)?;

    put_i16(out, contours);
    if has_bbox {
        out.extend_from_slice(bbox.read_bytes(8)?);
    } else {
        write_bbox(&points, out);
    }
    for end in end_points {
        put_u16(out, end);
    }
    put_u16(out, instruction_len as u16);
    out.extend_from_slice(instruction_bytes);
    encode_points(&points, overlap, out);
    Ok(())
}

fn composite_glyph(
    has_bbox: bool,
    composite: &mut Reader,
    glyph: &mut Reader,
    bbox: &mut Reader,
    instructions: &mut Reader,
    out: &mut Vec<u8>,
) -> Result<()> {
    // composite glyphs always carry an explicit bbox
    if !has_bbox {
        return Err(Error::MalformedGlyfStream);
    }

    // size the component records before copying them verbatim
    let mut scan = composite.clone();
    let mut have_instructions = false;
    let mut size = 0usize;
    let mut flags = MORE_COMPONENTS;
    while flags & MORE_COMPONENTS != 0 {
        flags = scan.read_u16()?;
        if flags & WE_HAVE_INSTRUCTIONS != 0 {
            have_instructions = true;
        }
        let mut arg_size = 2; // component glyph index
        arg_size += if flags & ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };
        if flags & WE_HAVE_A_SCALE != 0 {
            arg_size += 2;
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            arg_size += 4;
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            arg_size += 8;
        }
        scan.skip(arg_size)?;
        size += 2 + arg_size;
    }

    put_i16(out, -1);
    out.extend_from_slice(bbox.read_bytes(8)?);
    out.extend_from_slice(composite.read_bytes(size)?);
    if have_instructions {
        let instruction_len = read_255_u16(glyph)? as usize;
        put_u16(out, instruction_len as u16);
        out.extend_from_slice(instructions.read_bytes(instruction_len)?);
    }
    Ok(())
}

/// Decode one triplet-encoded point delta per flag byte. The flag's
/// high bit marks an off-curve point; the low seven bits select the
/// byte count, magnitude range, and signs.
fn decode_triplets(flags: &[u8], glyph: &mut Reader) -> Result<Vec<Point>> {
    fn with_sign(flag: i32, base: i32) -> i32 {
        if flag & 1 != 0 {
            base
        } else {
            -base
        }
    }

    let mut x = 0i32;
    let mut y = 0i32;
    let mut points = Vec::with_capacity(flags.len());
    for &flag_byte in flags {
        let on_curve = flag_byte & 0x80 == 0;
        let flag = i32::from(flag_byte & 0x7F);
        let n_bytes = if flag < 84 {
            1
        } else if flag < 120 {
            2
        } else if flag < 124 {
            3
        } else {
            4
        };
        let b = glyph.read_bytes(n_bytes)?;
        let b = |i: usize| i32::from(b[i]);

        let (dx, dy) = if flag < 10 {
            (0, with_sign(flag, ((flag & 14) << 7) + b(0)))
        } else if flag < 20 {
            (with_sign(flag, (((flag - 10) & 14) << 7) + b(0)), 0)
        } else if flag < 84 {
            let b0 = flag - 20;
            (
                with_sign(flag, 1 + (b0 & 0x30) + (b(0) >> 4)),
                with_sign(flag >> 1, 1 + ((b0 & 0x0C) << 2) + (b(0) & 0x0F)),
            )
        } else if flag < 120 {
            let b0 = flag - 84;
            (
                with_sign(flag, 1 + ((b0 / 12) << 8) + b(0)),
                with_sign(flag >> 1, 1 + (((b0 % 12) >> 2) << 8) + b(1)),
            )
        } else if flag < 124 {
            (
                with_sign(flag, (b(0) << 4) + (b(1) >> 4)),
                with_sign(flag >> 1, ((b(1) & 0x0F) << 8) + b(2)),
            )
        } else {
            (
                with_sign(flag, (b(0) << 8) + b(1)),
                with_sign(flag >> 1, (b(2) << 8) + b(3)),
            )
        };

        x = x.checked_add(dx).ok_or(Error::MalformedGlyfStream)?;
        y = y.checked_add(dy).ok_or(Error::MalformedGlyfStream)?;
        points.push(Point { x, y, on_curve });
    }
    Ok(points)
}

/// Emit the on-disk point arrays: run-length-compressed flags, then x
/// deltas, then y deltas.
fn encode_points(points: &[Point], overlap: bool, out: &mut Vec<u8>) {
    let mut flags = Vec::with_capacity(points.len());
    let mut deltas = Vec::with_capacity(points.len());
    let (mut last_x, mut last_y) = (0i32, 0i32);
    for (i, point) in points.iter().enumerate() {
        let dx = point.x - last_x;
        let dy = point.y - last_y;
        last_x = point.x;
        last_y = point.y;

        let mut flag = 0u8;
        if point.on_curve {
            flag |= ON_CURVE;
        }
        if overlap && i == 0 {
            flag |= OVERLAP_SIMPLE;
        }
        if dx == 0 {
            flag |= X_SAME_OR_POSITIVE;
        } else if (-255..=255).contains(&dx) {
            flag |= X_SHORT;
            if dx > 0 {
                flag |= X_SAME_OR_POSITIVE;
            }
        }
        if dy == 0 {
            flag |= Y_SAME_OR_POSITIVE;
        } else if (-255..=255).contains(&dy) {
            flag |= Y_SHORT;
            if dy > 0 {
                flag |= Y_SAME_OR_POSITIVE;
            }
        }
        flags.push(flag);
        deltas.push((dx, dy));
    }

    // flags, with the repeat count packed into one extra byte
    let mut i = 0;
    while i < flags.len() {
        let flag = flags[i];
        let mut run = 0usize;
        while run < 255 && i + 1 + run < flags.len() && flags[i + 1 + run] == flag {
            run += 1;
        }
        if run > 0 {
            out.push(flag | REPEAT);
            out.push(run as u8);
        } else {
            out.push(flag);
        }
        i += 1 + run;
    }

    for (&flag, &(dx, _)) in flags.iter().zip(&deltas) {
        if flag & X_SHORT != 0 {
            out.push(dx.unsigned_abs() as u8);
        } else if dx != 0 {
            put_i16(out, dx as i16);
        }
    }
    for (&flag, &(_, dy)) in flags.iter().zip(&deltas) {
        if flag & Y_SHORT != 0 {
            out.push(dy.unsigned_abs() as u8);
        } else if dy != 0 {
            put_i16(out, dy as i16);
        }
    }
}

/// Bounding box of the decoded points, as four FWords.
fn write_bbox(points: &[Point], out: &mut Vec<u8>) {
    let (mut x_min, mut y_min, mut x_max, mut y_max) = (0i32, 0i32, 0i32, 0i32);
    if let Some(first) = points.first() {
        x_min = first.x;
        x_max = first.x;
        y_min = first.y;
        y_max = first.y;
    }
    for point in points.iter().skip(1) {
        x_min = x_min.min(point.x);
        x_max = x_max.max(point.x);
        y_min = y_min.min(point.y);
        y_max = y_max.max(point.y);
    }
    put_i16(out, x_min as i16);
    put_i16(out, y_min as i16);
    put_i16(out, x_max as i16);
    put_i16(out, y_max as i16);
}

fn build_loca(values: &[usize], index_format: u16) -> Result<Vec<u8>> {
    let entry_size = if index_format == 0 { 2 } else { 4 };
    let mut loca = Vec::with_capacity(values.len() * entry_size);
    for &value in values {
        if index_format == 0 {
            // short offsets store offset/2 and must fit sixteen bits
            if value % 2 != 0 || value / 2 > usize::from(u16::MAX) {
                return Err(Error::MalformedGlyfStream);
            }
            put_u16(&mut loca, (value / 2) as u16);
        } else {
            if value > u32::MAX as usize {
                return Err(Error::MalformedGlyfStream);
            }
            loca.extend_from_slice(&(value as u32).to_be_bytes());
        }
    }
    Ok(loca)
}

fn bitmap_bit(bitmap: &[u8], i: usize) -> bool {
    bitmap[i >> 3] & (0x80 >> (i & 7)) != 0
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_i16(out: &mut Vec<u8>, value: i16) {
    out.extend_from_slice(&value.to_be_bytes());
}
