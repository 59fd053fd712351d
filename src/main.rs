//! # Main — CLI Entry Point
//!
//! Parses arguments, loads `.env` and the optional TOML settings, initializes
//! logging and hands off to the per-subcommand functions in `cli.rs`.
//!
//! ## Global Options
//!
//! - `--sieve` / `COPRIME_SIEVE`: sieve artifact path.
//! - `--config` / `COPRIME_CONFIG`: TOML settings file.
//! - `--fast`: skip the closed form's internal consistency checks.
//!
//! Logging goes to stderr; `LOG_FORMAT=json` switches to JSON lines and
//! `RUST_LOG` filters (default `info`).

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(
    name = "coprime",
    version,
    about = "Count pairs h + k = 2n coprime to 6p, in closed form and by brute force"
)]
struct Cli {
    /// Sieve artifact path (overrides sieve_path from the config file)
    #[arg(long, global = true, env = "COPRIME_SIEVE")]
    sieve: Option<PathBuf>,

    /// TOML settings file
    #[arg(long, global = true, env = "COPRIME_CONFIG")]
    config: Option<PathBuf>,

    /// Skip the closed form's internal consistency checks
    #[arg(long, global = true)]
    fast: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sieve the primes up to a bound and write the artifact
    BuildSieve {
        /// Upper bound (inclusive); defaults to sieve_limit from the config
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Classify an integer with the sieve-backed oracle
    IsPrime {
        #[arg(allow_hyphen_values = true)]
        n: String,
    },
    /// Closed-form count g(2n, p)
    G {
        #[arg(allow_hyphen_values = true)]
        two_n: String,
        #[arg(allow_hyphen_values = true)]
        p: String,
    },
    /// Brute-force count by enumeration
    Brute {
        #[arg(allow_hyphen_values = true)]
        two_n: String,
        #[arg(allow_hyphen_values = true)]
        p: String,
    },
    /// Compare closed form and brute force for one pair
    Check {
        #[arg(allow_hyphen_values = true)]
        two_n: String,
        #[arg(allow_hyphen_values = true)]
        p: String,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare closed form and brute force over a range
    Sweep {
        /// Largest 2n checked; defaults to max_two_n from the config
        #[arg(long)]
        max_two_n: Option<i64>,
        /// Smallest 2n checked
        #[arg(long, default_value_t = 2)]
        min_two_n: i64,
        /// Comma-separated primes; defaults to primes from the config
        #[arg(long, value_delimiter = ',')]
        primes: Option<Vec<i64>>,
        /// Stop at the first mismatch
        #[arg(long)]
        stop_on_mismatch: bool,
        /// Progress log interval in pairs (0 = off)
        #[arg(long, default_value_t = 100_000)]
        log_every: u64,
    },
    /// Write g(2n, p) for a range as CSV
    Export {
        #[arg(long)]
        max_two_n: Option<i64>,
        #[arg(long, value_delimiter = ',')]
        primes: Option<Vec<i64>>,
        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    let settings = cli::resolve_settings(&cli)?;

    match &cli.command {
        Commands::BuildSieve { limit } => {
            cli::run_build_sieve(&settings, limit.unwrap_or(settings.sieve_limit))
        }
        Commands::IsPrime { n } => cli::run_is_prime(&settings, n),
        Commands::G { two_n, p } => cli::run_g(&settings, two_n, p),
        Commands::Brute { two_n, p } => cli::run_brute(&settings, two_n, p),
        Commands::Check { two_n, p, json } => cli::run_check(&settings, two_n, p, *json),
        Commands::Sweep {
            max_two_n,
            min_two_n,
            primes,
            stop_on_mismatch,
            log_every,
        } => cli::run_sweep(
            &settings,
            coprime_pairs::SweepConfig {
                min_two_n: *min_two_n,
                max_two_n: max_two_n.unwrap_or(settings.max_two_n),
                primes: primes.clone().unwrap_or_else(|| settings.primes.clone()),
                stop_on_mismatch: *stop_on_mismatch,
                log_every: *log_every,
            },
        ),
        Commands::Export {
            max_two_n,
            primes,
            output,
        } => cli::run_export(
            &settings,
            max_two_n.unwrap_or(settings.max_two_n),
            primes.as_deref().unwrap_or(&settings.primes[..]),
            output.as_deref(),
        ),
    }
}
