use anyhow::Result;
use sfnt::Font;

/// Print each table's size and share of the total payload.
pub fn stats(font: &Font) -> Result<()> {
    let total: usize = font.tables().map(|(_, data)| data.len()).sum();
    for (tag, data) in font.tables() {
        let percent = if total == 0 { 0.0 } else { 100.0 * data.len() as f64 / total as f64 };
        println!("{tag}  {:>9} bytes  {percent:5.1}%", data.len());
    }
    println!("{} tables, {total} bytes", font.num_tables());
    Ok(())
}
