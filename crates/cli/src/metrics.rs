use anyhow::Result;
use sfnt::{tag, Font};

use crate::extract::{be_i16, be_u16, be_u32};

/// Print the horizontal header (hhea) fields.
pub fn metrics(font: &Font) -> Result<()> {
    if !font.has_table(tag::HHEA) {
        println!("no hhea table");
        return Ok(());
    }

    let hhea = font.get_table(tag::HHEA)?;
    let version = be_u32(hhea, 0)?;
    println!("version:             {}.{}", version >> 16, version & 0xFFFF);
    println!("ascender:            {}", be_i16(hhea, 4)?);
    println!("descender:           {}", be_i16(hhea, 6)?);
    println!("lineGap:             {}", be_i16(hhea, 8)?);
    println!("advanceWidthMax:     {}", be_u16(hhea, 10)?);
    println!("minLeftSideBearing:  {}", be_i16(hhea, 12)?);
    println!("minRightSideBearing: {}", be_i16(hhea, 14)?);
    println!("xMaxExtent:          {}", be_i16(hhea, 16)?);
    println!("caretSlopeRise:      {}", be_i16(hhea, 18)?);
    println!("caretSlopeRun:       {}", be_i16(hhea, 20)?);
    println!("caretOffset:         {}", be_i16(hhea, 22)?);
    println!("metricDataFormat:    {}", be_i16(hhea, 32)?);
    println!("numberOfHMetrics:    {}", be_u16(hhea, 34)?);
    Ok(())
}
