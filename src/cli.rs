//! # CLI Execution Functions
//!
//! One function per subcommand. Each builds the oracle and engine from the
//! resolved settings, runs the library call and prints the result on stdout.
//! Library errors are wrapped in `anyhow` with the inputs attached; a
//! non-zero exit comes from `main` returning `Err`.

use anyhow::{Context, Result};
use coprime_pairs::config::Settings;
use coprime_pairs::error::parse_integer;
use coprime_pairs::{export, sieve, verify, CountingEngine, EvalMode, PrimalityOracle};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::Cli;

/// Config file first, then `--sieve` / `COPRIME_SIEVE` and `--fast` on top.
pub fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(path) = &cli.sieve {
        settings.sieve_path = path.clone();
    }
    if cli.fast {
        settings.strict = false;
    }
    Ok(settings)
}

fn engine(settings: &Settings) -> CountingEngine {
    let oracle = Arc::new(PrimalityOracle::from_path(&settings.sieve_path));
    let mode = if settings.strict {
        EvalMode::Strict
    } else {
        EvalMode::Fast
    };
    CountingEngine::new(oracle).with_mode(mode)
}

fn parse_pair(two_n: &str, p: &str) -> Result<(i64, i64)> {
    Ok((parse_integer("2n", two_n)?, parse_integer("p", p)?))
}

pub fn run_build_sieve(settings: &Settings, limit: u64) -> Result<()> {
    if limit < 2 {
        anyhow::bail!("sieve limit must be at least 2, got {}", limit);
    }
    let start = Instant::now();
    let table = sieve::build_sieve(limit);
    let primes = table.count_ones();
    sieve::save(&settings.sieve_path, &table)
        .with_context(|| format!("writing {}", settings.sieve_path.display()))?;
    info!(
        limit,
        primes,
        path = %settings.sieve_path.display(),
        elapsed = format_args!("{:.2}s", start.elapsed().as_secs_f64()),
        "sieve built"
    );
    println!(
        "{} primes up to {} written to {}",
        primes,
        limit,
        settings.sieve_path.display()
    );
    Ok(())
}

pub fn run_is_prime(settings: &Settings, n: &str) -> Result<()> {
    let n = parse_integer("n", n)?;
    let oracle = PrimalityOracle::from_path(&settings.sieve_path);
    println!("{}", oracle.is_prime(n)?);
    Ok(())
}

pub fn run_g(settings: &Settings, two_n: &str, p: &str) -> Result<()> {
    let (two_n, p) = parse_pair(two_n, p)?;
    let g = engine(settings)
        .g(two_n, p)
        .with_context(|| format!("g({}, {})", two_n, p))?;
    println!("{}", g);
    Ok(())
}

pub fn run_brute(settings: &Settings, two_n: &str, p: &str) -> Result<()> {
    let (two_n, p) = parse_pair(two_n, p)?;
    let count = engine(settings)
        .count_bruteforce(two_n, p)
        .with_context(|| format!("brute force ({}, {})", two_n, p))?;
    println!("{}", count);
    Ok(())
}

pub fn run_check(settings: &Settings, two_n: &str, p: &str, json: bool) -> Result<()> {
    let (two_n, p) = parse_pair(two_n, p)?;
    let check = verify::check_theorem(&engine(settings), two_n, p)
        .with_context(|| format!("check ({}, {})", two_n, p))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&check)?);
    } else {
        println!("{}", check);
    }
    if !check.matched {
        anyhow::bail!(
            "closed form {} disagrees with brute force {} at 2n = {}, p = {}",
            check.theorem,
            check.brute_force,
            two_n,
            p
        );
    }
    Ok(())
}

pub fn run_sweep(settings: &Settings, config: verify::SweepConfig) -> Result<()> {
    let report = verify::sweep(&engine(settings), &config);
    println!("{}", report);
    if !report.all_passed() {
        anyhow::bail!("{} of {} pairs failed", report.failed, report.checked);
    }
    Ok(())
}

pub fn run_export(
    settings: &Settings,
    max_two_n: i64,
    primes: &[i64],
    output: Option<&Path>,
) -> Result<()> {
    let engine = engine(settings);
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            let rows =
                export::write_csv(&engine, std::io::BufWriter::new(file), max_two_n, primes)?;
            eprintln!("{} rows written to {}", rows, path.display());
        }
        None => {
            let stdout = std::io::stdout();
            export::write_csv(&engine, stdout.lock(), max_two_n, primes)?;
        }
    }
    Ok(())
}
