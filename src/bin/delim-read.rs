//! CLI tool to read a delimited file and print its records as JSON lines.
//!
//! Usage:
//!   delim-read <input.csv>
//!   delim-read <input.data> -d '|' --columns id,name -o out.jsonl
//!   cat input.tsv | delim-read -d tab

use clap::Parser;
use delimited_reader::{Config, Error, Reader};
use std::fs::{self, File};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Read a delimited file (.csv, .tsv, .tab, .pipe) as JSON-lines records.
///
/// Each output line holds the record number, the input line number and the
/// row's values keyed by column name.
#[derive(Parser)]
#[command(name = "delim-read", version)]
struct Cli {
    /// Input file; reads stdin when omitted
    path: Option<PathBuf>,

    /// Field delimiter: one ASCII character, `\t` or `tab`
    #[arg(short, long, value_parser = parse_delimiter)]
    delimiter: Option<u8>,

    /// Header line to use instead of the input's first line
    #[arg(long)]
    header: Option<String>,

    /// Comma-separated column names; the input's first line is read as data
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log malformed rows and keep reading instead of stopping
    #[arg(long)]
    skip_invalid: bool,

    /// Show paths and record counts on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "tab" | "\\t" => Ok(b'\t'),
        _ => match s.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(format!("delimiter must be a single ASCII character, got '{s}'")),
        },
    }
}

/// Records written and rows skipped.
#[derive(Debug, Default)]
struct Totals {
    written: u64,
    skipped: u64,
}

fn copy_records<R: BufRead>(
    reader: &mut Reader<R>,
    out: &mut impl Write,
    skip_invalid: bool,
) -> Result<Totals, Error> {
    let mut totals = Totals::default();
    loop {
        let record = match reader.read_next() {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(totals),
            Err(e) if skip_invalid && e.is_row_error() => {
                warn!(error = %e, "skipping row");
                totals.skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };
        serde_json::to_writer(&mut *out, &record).map_err(io::Error::from)?;
        out.write_all(b"\n")?;
        totals.written += 1;
    }
}

fn run<R: BufRead>(mut reader: Reader<R>, cli: &Cli) -> Result<Totals, Error> {
    let mut out: BufWriter<Box<dyn Write>> = match &cli.output {
        Some(out_path) => {
            if let Some(parent) = out_path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            BufWriter::new(Box::new(File::create(out_path)?))
        }
        None => BufWriter::new(Box::new(io::stdout().lock())),
    };

    let totals = copy_records(&mut reader, &mut out, cli.skip_invalid);
    out.flush()?;
    let totals = totals?;

    info!(
        records = totals.written,
        skipped = totals.skipped,
        lines = reader.line_number(),
        "finished reading"
    );
    Ok(totals)
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = Config {
        path: cli.path.clone(),
        delimiter: cli.delimiter,
        header: cli.header.clone(),
        columns: cli.columns.clone(),
    };

    let result = match &config.path {
        Some(_) => delimited_reader::open(&config).and_then(|reader| run(reader, &cli)),
        None => delimited_reader::open_with(&config, io::stdin().lock())
            .and_then(|reader| run(reader, &cli)),
    };

    match result {
        Ok(totals) => {
            if cli.verbose {
                let input = cli.path.as_deref().unwrap_or(Path::new("(stdin)"));
                let output = cli.output.as_deref().unwrap_or(Path::new("(stdout)"));
                eprintln!("Input:    {}", input.display());
                eprintln!("Output:   {}", output.display());
                eprintln!("Records:  {} written, {} skipped", totals.written, totals.skipped);
            }
        }
        Err(e) => {
            eprintln!("Read error: {e}");
            process::exit(1);
        }
    }
}
