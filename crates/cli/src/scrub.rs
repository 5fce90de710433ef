use std::io::{self, Write};

use anyhow::{Context, Result};
use sfnt::{tag, Font, NameTable};

/// Replace the name table with an empty one and write the font to
/// stdout as an uncompressed SFNT.
pub fn scrub(font: &mut Font) -> Result<()> {
    if font.has_table(tag::NAME) {
        font.set_name_table(&NameTable::new());
    }

    let stdout = io::stdout();
    let mut sink = stdout.lock();
    font.write_otf(&mut sink).context("Failed to write font to stdout")?;
    sink.flush()?;
    Ok(())
}
