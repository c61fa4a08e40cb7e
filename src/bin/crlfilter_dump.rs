use clap::Parser;
use crlfilter::{
    io_utils::{filter_cli_error, io_cli_error, simple_cli_error},
    logging, scan_reader, Config, DuplicatePolicy,
};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// List the issuer records of a revocation filter without keeping payloads.
#[derive(Parser)]
struct Args {
    /// Filter file to read
    input: PathBuf,
    /// Bytes read per chunk
    #[arg(long, default_value_t = crlfilter::config::DEFAULT_READ_CHUNK_SIZE)]
    chunk_size: usize,
    /// Accept repeated issuer ids
    #[arg(long)]
    allow_duplicates: bool,
    /// Only print summary totals
    #[arg(long)]
    summary: bool,
    /// Optional CSV output path for per-record results
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Optional JSON output path for per-record results
    #[arg(long)]
    json: Option<PathBuf>,
    /// Increase log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct RecordRow {
    issuer: String,
    offset: u64,
    payload_length: u32,
    preview: String,
}

#[derive(Serialize)]
struct Report {
    version: u32,
    log_p: u8,
    records: Vec<RecordRow>,
    bytes: u64,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::setup_logging(logging::directives_for(args.verbose));

    if args.chunk_size == 0 {
        return Err(simple_cli_error("chunk size must be positive").into());
    }
    let config = Config {
        duplicate_policy: if args.allow_duplicates {
            DuplicatePolicy::Overwrite
        } else {
            DuplicatePolicy::Reject
        },
        read_chunk_size: args.chunk_size,
    };

    let file =
        File::open(&args.input).map_err(|e| io_cli_error("reading input file", &args.input, e))?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut rows = Vec::new();
    let mut write_err = None;
    let scanned = scan_reader(file, &config, |record| {
        let row = RecordRow {
            issuer: record.issuer.to_hex(),
            offset: record.offset,
            payload_length: record.payload_length,
            preview: record.payload.bits(),
        };
        if !args.summary && write_err.is_none() {
            if let Err(e) = writeln!(
                out,
                "{} [{}] {} ...",
                row.issuer, row.payload_length, row.preview
            ) {
                write_err = Some(e);
            }
        }
        rows.push(row);
    });
    // Records seen before a parse error are still reported.
    out.flush()?;
    if let Some(e) = write_err {
        return Err(e.into());
    }
    let summary = scanned.map_err(|e| filter_cli_error("scanning filter", e))?;

    writeln!(out, "version = {}", summary.header.version)?;
    writeln!(out, "logp = {}", summary.header.log_p)?;
    writeln!(out, "#records: {}", summary.records)?;
    writeln!(out, "#bytes: {}", summary.bytes_consumed)?;
    out.flush()?;

    if let Some(path) = &args.csv {
        let f = File::create(path).map_err(|e| io_cli_error("creating csv", path, e))?;
        let mut wtr = csv::Writer::from_writer(f);
        wtr.write_record(["issuer", "offset", "payload_length", "preview"])?;
        for row in &rows {
            wtr.write_record(&[
                row.issuer.clone(),
                row.offset.to_string(),
                row.payload_length.to_string(),
                row.preview.clone(),
            ])?;
        }
        wtr.flush()?;
    }
    if let Some(path) = &args.json {
        let mut f = File::create(path).map_err(|e| io_cli_error("creating json", path, e))?;
        let report = Report {
            version: summary.header.version,
            log_p: summary.header.log_p,
            records: rows,
            bytes: summary.bytes_consumed,
        };
        serde_json::to_writer_pretty(&mut f, &report)?;
        f.write_all(b"\n")?;
    }

    Ok(())
}
