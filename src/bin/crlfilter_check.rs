use clap::{Parser, ValueEnum};
use crlfilter::{
    hash_bits,
    io_utils::{filter_cli_error, io_cli_error, simple_cli_error},
    logging, Config, CrlFilter, DuplicatePolicy, IssuerId, TruncatedDigest,
};
use sha1::Sha1;
use sha2::Sha256;
use std::fs::File;
use std::path::PathBuf;

#[derive(Clone, Copy, ValueEnum)]
enum DigestKind {
    Sha1,
    Sha256,
}

/// Decode issuer sets of a revocation filter and check serials against them.
#[derive(Parser)]
struct Args {
    /// Filter file to read
    input: PathBuf,
    /// Issuer id (40 hex digits); every issuer when omitted
    #[arg(long)]
    issuer: Option<String>,
    /// Certificate serial in hex to check
    #[arg(long)]
    serial: Vec<String>,
    /// Already hashed candidate value to check
    #[arg(long)]
    candidate: Vec<u64>,
    /// Digest used to hash serials
    #[arg(long, value_enum, default_value_t = DigestKind::Sha1)]
    digest: DigestKind,
    /// Number of decoded values to print per issuer
    #[arg(long, default_value_t = 2)]
    head: usize,
    /// Accept repeated issuer ids, keeping the last record
    #[arg(long)]
    allow_duplicates: bool,
    /// Increase log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
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

    let config = Config {
        duplicate_policy: if args.allow_duplicates {
            DuplicatePolicy::Overwrite
        } else {
            DuplicatePolicy::Reject
        },
        ..Config::default()
    };
    let file =
        File::open(&args.input).map_err(|e| io_cli_error("reading input file", &args.input, e))?;
    let filter = CrlFilter::from_reader(file, &config)
        .map_err(|e| filter_cli_error("parsing filter", e))?;

    println!("version = {}", filter.version());
    println!("logp = {}", filter.log_p());

    let issuers: Vec<IssuerId> = match &args.issuer {
        Some(hex) => vec![hex
            .parse()
            .map_err(|e| filter_cli_error("parsing --issuer", e))?],
        None => filter.issuers().copied().collect(),
    };

    let serials = args
        .serial
        .iter()
        .map(|s| {
            let s = s.trim_start_matches("0x");
            let padded = if s.len() % 2 == 1 {
                format!("0{s}")
            } else {
                s.to_string()
            };
            hex::decode(&padded)
                .map(|bytes| (s.to_string(), bytes))
                .map_err(|_| simple_cli_error(&format!("invalid serial '{s}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    for issuer in &issuers {
        let Some(set) = filter
            .decode(issuer)
            .map_err(|e| filter_cli_error(&format!("decoding issuer {issuer}"), e))?
        else {
            println!("{issuer}: unknown issuer");
            continue;
        };
        let head: Vec<String> = set.iter().take(args.head).map(u64::to_string).collect();
        println!("{issuer}: {} entries [{}]", set.len(), head.join(", "));

        for candidate in &args.candidate {
            println!("  candidate {candidate}: {}", describe(set.contains(*candidate)));
        }
        if set.is_empty() {
            for (text, _) in &serials {
                println!("  serial {text}: {}", describe(false));
            }
            continue;
        }
        let nbits = hash_bits(set.len(), filter.log_p());
        for (text, bytes) in &serials {
            let candidate = match args.digest {
                DigestKind::Sha1 => {
                    TruncatedDigest::<Sha1>::new(nbits).map(|h| h.hash_serial(bytes))
                }
                DigestKind::Sha256 => {
                    TruncatedDigest::<Sha256>::new(nbits).map(|h| h.hash_serial(bytes))
                }
            }
            .map_err(|e| filter_cli_error("checking serial", e))?;
            println!("  serial {text}: {}", describe(set.contains(candidate)));
        }
    }

    Ok(())
}

fn describe(revoked: bool) -> &'static str {
    if revoked {
        "revoked"
    } else {
        "not revoked"
    }
}
