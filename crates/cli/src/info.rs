use anyhow::Result;
use sfnt::{tag, Font};

/// Print the name table entries, decoded where the encoding is known.
pub fn info(font: &Font) -> Result<()> {
    if !font.has_table(tag::NAME) {
        println!("no name table");
        return Ok(());
    }

    let name = font.name_table()?;
    for entry in name.entries() {
        let label = match entry.label() {
            Some(label) => label.to_string(),
            None => format!("Name ID {}", entry.name_id),
        };
        println!(
            "[{} {} {:#06x}] {}: {}",
            entry.platform_id,
            entry.encoding_id,
            entry.language_id,
            label,
            entry.decode()
        );
    }
    Ok(())
}
