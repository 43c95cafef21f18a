use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use lzw_huffman::config::CodecConfig;
use lzw_huffman::files::{self, FileReport};
use lzw_huffman::{CompressionMethod, Compressor};

/// Huffman, LZW and LZW + Huffman file compression
#[derive(Parser, Debug)]
#[clap(name = "lzwh", version, about)]
struct Cli {
    /// JSON codec configuration
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short, long, global = true, parse(from_occurrences))]
    verbose: u64,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress a file to <stem>.bin (or <stem>.lzw.bin)
    Compress {
        path: PathBuf,
        #[clap(short, long, default_value = "huffman")]
        method: CompressionMethod,
    },
    /// Decompress a .bin file to <stem>_decompressed.txt
    Decompress { path: PathBuf },
    /// Compress, decompress and compare, timing both phases
    Roundtrip {
        path: PathBuf,
        #[clap(short, long, default_value = "huffman")]
        method: CompressionMethod,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)
        .context("failed to initialise logging")?;

    let config = match &cli.config {
        Some(path) => CodecConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CodecConfig::default(),
    };
    let compressor = Compressor::new(config);

    match cli.command {
        Command::Compress { path, method } => {
            let report = files::compress_file(&compressor, &path, method)
                .with_context(|| format!("compressing {}", path.display()))?;
            print_report("Compressed", &report);
        }
        Command::Decompress { path } => {
            let report = files::decompress_file(&compressor, &path)
                .with_context(|| format!("decompressing {}", path.display()))?;
            print_report("Decompressed", &report);
        }
        Command::Roundtrip { path, method } => roundtrip(&compressor, &path, method)?,
    }
    Ok(())
}

fn roundtrip(compressor: &Compressor, path: &Path, method: CompressionMethod) -> Result<()> {
    let start = Instant::now();
    let packed = files::compress_file(compressor, path, method)
        .with_context(|| format!("compressing {}", path.display()))?;
    print_report("Compressed", &packed);
    println!("--- {:.3} seconds ---\n", start.elapsed().as_secs_f64());

    let start = Instant::now();
    let unpacked = files::decompress_file(compressor, &packed.output)
        .with_context(|| format!("decompressing {}", packed.output.display()))?;
    print_report("Decompressed", &unpacked);
    println!("--- {:.3} seconds ---\n", start.elapsed().as_secs_f64());

    let identical = files::files_identical(path, &unpacked.output)?;
    println!("Before-After:");
    println!("{}", if identical { "Identical files !" } else { "Not identical files!" });
    if !identical {
        anyhow::bail!("round trip of {} did not reproduce the input", path.display());
    }
    Ok(())
}

fn print_report(action: &str, report: &FileReport) {
    println!("{} to {}", action, report.output.display());
    println!("Before: {}", report.input_size);
    println!("After:  {}", report.output_size);
}
