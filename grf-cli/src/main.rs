use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use grf_core::GrfFile;
use serde::Serialize;

mod unpack;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Read entries through per-read file handles instead of a memory map
    #[arg(long, global = true)]
    no_mmap: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the archive header
    Info(InfoCommand),
    /// List archive entries
    List(ListCommand),
    /// Unpack a GRF file
    Unpack(UnpackCommand),
}

#[derive(Debug, Args)]
struct InfoCommand {
    /// Input GRF file path
    input: PathBuf,
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ListCommand {
    /// Input GRF file path
    input: PathBuf,
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub(crate) struct UnpackCommand {
    /// Input GRF file path
    input: PathBuf,
    /// Output directory path, defaults to a directory named after the input
    output: Option<PathBuf>,
    /// Only unpack entries whose path matches this regex
    #[arg(short, long)]
    filter: Option<String>,
    /// Overwrite existing files
    #[arg(long)]
    r#override: bool,
    /// Keep going when an entry fails
    #[arg(long)]
    ignore_error: bool,
    /// Number of worker threads
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

#[derive(Debug, Serialize)]
struct InfoOutput<'a> {
    path: String,
    signature: &'a str,
    version: String,
    table_offset: u32,
    seed: u32,
    file_count: u32,
    entries: usize,
}

fn open(path: &Path, no_mmap: bool) -> anyhow::Result<GrfFile> {
    GrfFile::builder()
        .mmap(!no_mmap)
        .open(path)
        .with_context(|| format!("Failed to open GRF file `{}`", path.display()))
}

fn info(cmd: &InfoCommand, no_mmap: bool) -> anyhow::Result<()> {
    let grf = open(&cmd.input, no_mmap)?;
    let header = grf.header().context("archive is not loaded")?;
    let output = InfoOutput {
        path: cmd.input.display().to_string(),
        signature: header.signature(),
        version: format!("0x{:X}", header.version() as u32),
        table_offset: header.table_offset(),
        seed: header.seed(),
        file_count: header.file_count(),
        entries: grf.count(),
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Path:         {}", output.path);
    println!("Signature:    {}", output.signature);
    println!("Version:      {}", output.version);
    println!("Table offset: 0x{:08X}", output.table_offset);
    println!("Seed:         {}", output.seed);
    println!("File count:   {}", output.file_count);
    println!("Entries:      {}", output.entries);
    Ok(())
}

fn list(cmd: &ListCommand, no_mmap: bool) -> anyhow::Result<()> {
    let grf = open(&cmd.input, no_mmap)?;

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    if cmd.json {
        let entries: Vec<_> = grf.entries().map(|e| e.entry()).collect();
        serde_json::to_writer_pretty(&mut out, &entries)?;
        writeln!(out)?;
    } else {
        for entry in grf.entries() {
            writeln!(
                out,
                "{:>10} {:>10} {:?} {}",
                entry.size(),
                entry.compressed_size(),
                entry.flags(),
                entry.path()
            )?;
        }
    }
    out.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Info(cmd) => info(cmd, cli.no_mmap),
        Command::List(cmd) => list(cmd, cli.no_mmap),
        Command::Unpack(cmd) => unpack::unpack(cmd, cli.no_mmap),
    }
}
