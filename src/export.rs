//! # Export — CSV Table of `g(2n, p)`
//!
//! One row per even `2n` in `[2, max_two_n]` per prime, with the breakdown
//! values alongside the count so an external plotter can colour by residue
//! case. Any evaluation error aborts the export.

use std::io::Write;
use tracing::info;

use crate::engine::{Breakdown, CountingEngine};
use crate::error::Result;

pub const CSV_HEADER: &str = "two_n,n,p,g,residue_case,m,delta_p_m";

/// Write the table to `writer` and return the number of data rows.
pub fn write_csv<W: Write>(
    engine: &CountingEngine,
    mut writer: W,
    max_two_n: i64,
    primes: &[i64],
) -> Result<u64> {
    writeln!(writer, "{}", CSV_HEADER)?;
    let mut rows = 0u64;
    for &p in primes {
        let mut next = Some(2i64);
        while let Some(two_n) = next.filter(|&t| t <= max_two_n) {
            let g = engine.g(two_n, p)?;
            let b = Breakdown::of(two_n / 2, p);
            writeln!(
                writer,
                "{},{},{},{},{},{},{}",
                two_n, b.n, p, g, b.case, b.m, b.r
            )?;
            rows += 1;
            next = two_n.checked_add(2);
        }
    }
    writer.flush()?;
    info!(rows, max_two_n, primes = ?primes, "csv export complete");
    Ok(rows)
}
