use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod extract;
mod features;
mod info;
mod metrics;
mod scrub;
mod stats;

#[derive(Parser)]
#[command(name = "font")]
#[command(about = "Parse and print information about font files")]
struct Cli {
    /// Select font-index for TrueType Collections (.ttc/.otc), starting from 0
    #[arg(short = 'i', long, global = true, value_name = "font-index")]
    font_index: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the GSUB/GPOS feature lists (font features)
    Features {
        /// Font files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the name table (font metadata)
    Info {
        /// Font files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the hhea table (font metrics)
    Metrics {
        /// Font files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Remove the name table and write the font to stdout (saves significant space)
    Scrub {
        /// Font file to scrub
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print each table and the amount of space used
    Stats {
        /// Font files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

impl Commands {
    fn files(&self) -> &[PathBuf] {
        match self {
            Commands::Features { files }
            | Commands::Info { files }
            | Commands::Metrics { files }
            | Commands::Scrub { files }
            | Commands::Stats { files } => files,
        }
    }

    fn run(&self, font: &mut sfnt::Font) -> Result<()> {
        match self {
            Commands::Features { .. } => features::features(font),
            Commands::Info { .. } => info::info(font),
            Commands::Metrics { .. } => metrics::metrics(font),
            Commands::Scrub { .. } => scrub::scrub(font),
            Commands::Stats { .. } => stats::stats(font),
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let files = cli.command.files();
    // Scrubbed fonts go to one stdout stream, so only a single font
    // can be written per invocation.
    if matches!(cli.command, Commands::Scrub { .. }) && files.len() > 1 {
        eprintln!("scrub writes a single font to stdout; pass one file at a time");
        std::process::exit(2);
    }

    let mut exit_code = 0;
    for path in files {
        if files.len() > 1 {
            println!("==> {} <==", path.display());
        }
        if let Err(e) = process_file(path, &cli) {
            eprintln!("{e:#}");
            exit_code = 1;
        }
    }
    std::process::exit(exit_code);
}

fn process_file(path: &Path, cli: &Cli) -> Result<()> {
    let data =
        fs::read(path).with_context(|| format!("Failed to read font: {}", path.display()))?;

    if !sfnt::is_collection(&data[..])? {
        let mut font = sfnt::parse(&data[..])
            .with_context(|| format!("Failed to parse font: {}", path.display()))?;
        return cli.command.run(&mut font);
    }

    if let Some(index) = cli.font_index {
        let mut font = sfnt::parse_collection_index(&data[..], index)
            .with_context(|| format!("Failed to parse font {index} from: {}", path.display()))?;
        return cli.command.run(&mut font);
    }

    if matches!(cli.command, Commands::Scrub { .. }) {
        anyhow::bail!(
            "{} is a collection; scrub one font from it with --font-index",
            path.display()
        );
    }

    let fonts = sfnt::parse_collection(&data[..])
        .with_context(|| format!("Failed to parse collection: {}", path.display()))?;
    for (index, mut font) in fonts.into_iter().enumerate() {
        println!("==>font index: {index}<==");
        cli.command.run(&mut font)?;
    }
    Ok(())
}
