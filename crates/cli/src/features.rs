use std::collections::BTreeMap;

use anyhow::Result;
use sfnt::{tag, Font, Tag};

use crate::extract::{be_u16, be_u32};

/// Friendly labels for common OpenType feature tags.
const FEATURE_LABELS: &[(&[u8; 4], &str)] = &[
    (b"aalt", "Access All Alternates"),
    (b"calt", "Contextual Alternates"),
    (b"case", "Case-Sensitive Forms"),
    (b"ccmp", "Glyph Composition/Decomposition"),
    (b"dlig", "Discretionary Ligatures"),
    (b"dnom", "Denominators"),
    (b"frac", "Fractions"),
    (b"kern", "Kerning"),
    (b"liga", "Standard Ligatures"),
    (b"lnum", "Lining Figures"),
    (b"locl", "Localized Forms"),
    (b"mark", "Mark Positioning"),
    (b"mkmk", "Mark to Mark Positioning"),
    (b"numr", "Numerators"),
    (b"onum", "Oldstyle Figures"),
    (b"ordn", "Ordinals"),
    (b"pnum", "Proportional Figures"),
    (b"rlig", "Required Ligatures"),
    (b"salt", "Stylistic Alternates"),
    (b"sinf", "Scientific Inferiors"),
    (b"smcp", "Small Capitals"),
    (b"subs", "Subscript"),
    (b"sups", "Superscript"),
    (b"swsh", "Swash"),
    (b"tnum", "Tabular Figures"),
    (b"zero", "Slashed Zero"),
];

/// Print the feature records of the GSUB and GPOS tables.
pub fn features(font: &Font) -> Result<()> {
    let mut printed = false;
    for table_tag in [tag::GSUB, tag::GPOS] {
        if !font.has_table(table_tag) {
            continue;
        }
        printed = true;
        let data = font.get_table(table_tag)?;
        let counts = feature_counts(data)?;
        println!("{table_tag}: {} features", counts.values().sum::<u32>());
        for (feature, count) in counts {
            let label = label_for(feature).unwrap_or("");
            println!("  {feature} x{count}  {label}");
        }
    }
    if !printed {
        println!("no layout tables (GSUB/GPOS) present");
    }
    Ok(())
}

/// Walk the FeatureList: a count followed by (tag, offset) records.
fn feature_counts(data: &[u8]) -> Result<BTreeMap<Tag, u32>> {
    let feature_list = be_u16(data, 6)? as usize;
    let count = be_u16(data, feature_list)? as usize;
    let mut counts = BTreeMap::new();
    for i in 0..count {
        let record = feature_list + 2 + i * 6;
        let feature = Tag::from_u32(be_u32(data, record)?);
        *counts.entry(feature).or_insert(0) += 1;
    }
    Ok(counts)
}

fn label_for(feature: Tag) -> Option<&'static str> {
    FEATURE_LABELS
        .iter()
        .find(|(bytes, _)| Tag::new(bytes) == feature)
        .map(|(_, label)| *label)
}
