//! sheetmelt: Flatten nested JSON records into a spreadsheet grid
//!
//! Usage:
//!   # Read a JSON array from a file, print the grid as TSV
//!   sheetmelt orders.json
//!
//!   # Read NDJSON from stdin, write the worksheet model as JSON
//!   cat orders.jsonl | sheetmelt --ndjson --format json -o orders.sheet.json
//!
//!   # Name array columns too, and show debug logs
//!   sheetmelt --observed-headers -vv orders.json

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use log::{LevelFilter, Metadata};
use serde_json::Value;
use sheetmelt::export::{BoolCells, DelimitedWriter, JsonWriter, ScalarFallback};
use sheetmelt::{decode_records, export_json, DecodeOptions, ExportConfig, Exporter, HeaderMode, Worksheet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Tab-separated display text
    Tsv,
    /// Comma-separated display text
    Csv,
    /// The worksheet model: headers, range, strings and typed cells
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "sheetmelt")]
#[command(about = "Flatten nested JSON records into a spreadsheet grid", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Process newline-delimited JSON (one JSON object per line)
    #[arg(long)]
    ndjson: bool,

    /// Output file (stdout if omitted)
    #[arg(long, short = 'o')]
    output: Option<String>,

    #[arg(long, value_enum, default_value_t = Format::Tsv)]
    format: Format,

    /// Sheet name carried in the worksheet model
    #[arg(long, default_value = "Data")]
    sheet_name: String,

    /// Delimiter between parent and child names in column names
    #[arg(long, default_value = "_")]
    delimiter: String,

    /// Append every string to the string pool instead of deduplicating
    #[arg(long)]
    no_dedup: bool,

    /// Write booleans as "true"/"false" text instead of 1/0
    #[arg(long)]
    bool_as_string: bool,

    /// Write values without a cell kind (times of day) as text instead of failing
    #[arg(long)]
    stringify_unknown: bool,

    /// Name every written column, including array columns, in the header row
    #[arg(long)]
    observed_headers: bool,

    /// Keep ISO date strings as plain text
    #[arg(long)]
    no_detect_dates: bool,

    /// Recognize HH:MM:SS strings as times of day
    #[arg(long)]
    detect_times: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Plain stderr logger behind the `log` facade
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    log::set_logger(&LOGGER).map_err(|e| anyhow!("Failed to install logger: {}", e))?;
    log::set_max_level(level);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    // Build config
    let mut config = ExportConfig::default()
        .with_sheet_name(args.sheet_name.clone())
        .with_delimiter(args.delimiter.clone());
    config.dedup_strings = !args.no_dedup;
    if args.bool_as_string {
        config.bool_cells = BoolCells::String;
    }
    if args.stringify_unknown {
        config.scalar_fallback = ScalarFallback::Stringify;
    }
    if args.observed_headers {
        config.header_mode = HeaderMode::Observed;
    }

    let options = DecodeOptions {
        detect_dates: !args.no_detect_dates,
        detect_times: args.detect_times,
    };

    let reader = if let Some(file_path) = &args.input {
        let file = File::open(file_path).with_context(|| format!("Failed to open {}", file_path))?;
        Box::new(BufReader::new(file)) as Box<dyn Read>
    } else {
        Box::new(std::io::stdin()) as Box<dyn Read>
    };

    let sheet = read_sheet(reader, args.ndjson, config, &options)?;

    log::info!(
        "sheet `{}`: {} rows, {} columns, {} shared strings",
        sheet.name,
        sheet.range.rows,
        sheet.range.columns,
        sheet.strings.len()
    );
    if sheet.is_empty() {
        eprintln!("Warning: No JSON records found in input");
    }

    if let Some(path) = &args.output {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path))?;
        write_sheet(BufWriter::new(file), args.format, &sheet)?;
    } else {
        write_sheet(std::io::stdout().lock(), args.format, &sheet)?;
    }

    Ok(())
}

/// Parse the whole input and export it, using SIMD parsing when possible
fn read_sheet(
    reader: Box<dyn Read>,
    ndjson: bool,
    config: ExportConfig,
    options: &DecodeOptions,
) -> Result<Worksheet> {
    let mut content = Vec::new();
    let mut buf_reader = BufReader::new(reader);
    buf_reader.read_to_end(&mut content).context("Failed to read input")?;

    if !ndjson {
        // simd-json parses in place, so keep the original bytes for the fallback
        let mut scratch = content.clone();
        match simd_json::serde::from_slice::<Value>(&mut scratch) {
            Ok(value) => {
                let records = decode_records(value, options)?;
                return Ok(Exporter::new(config).export(&records)?);
            }
            Err(e) => log::debug!("SIMD parse failed ({}), falling back to streaming parser", e),
        }
    }

    export_json(content.as_slice(), config, options)
}

fn write_sheet<W: Write>(writer: W, format: Format, sheet: &Worksheet) -> Result<()> {
    match format {
        Format::Json => {
            let mut out = JsonWriter::new(writer).pretty(true);
            out.write_sheet(sheet)?;
            out.flush()
        }
        Format::Tsv => {
            let mut out = DelimitedWriter::new(writer);
            out.write_sheet(sheet)?;
            out.flush()
        }
        Format::Csv => {
            let mut out = DelimitedWriter::with_separator(writer, ',');
            out.write_sheet(sheet)?;
            out.flush()
        }
    }
}
