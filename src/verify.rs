//! # Verify — Closed Form Against Brute Force
//!
//! Two drivers:
//!
//! - [`check_theorem`]: one `(2n, p)` pair, both counts plus the intermediate
//!   values of the closed form. `Display` renders the human-readable report.
//! - [`sweep`]: every even `2n` in a range for each prime in a list. Errors on
//!   individual pairs are recorded and the sweep moves on; this is the only
//!   place in the crate where a failure does not abort the call.
//!
//! Progress is logged every [`SweepConfig::log_every`] pairs.

use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

use crate::engine::{half_of, Breakdown, CountingEngine, EvalMode};
use crate::error::Result;
use crate::formula::ResidueCase;

/// Outcome of comparing `g(2n, p)` with the brute-force count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TheoremCheck {
    pub two_n: i64,
    pub n: i64,
    pub p: i64,
    pub case: ResidueCase,
    pub m: i64,
    pub delta_p_m: i64,
    pub a: i64,
    pub b: i64,
    pub theorem: i64,
    pub brute_force: i64,
    pub difference: i64,
    pub matched: bool,
    pub mode: EvalMode,
}

impl TheoremCheck {
    /// `(theorem, brute_force, matched)`
    pub fn summary(&self) -> (i64, i64, bool) {
        (self.theorem, self.brute_force, self.matched)
    }
}

impl std::fmt::Display for TheoremCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "2n = {},  p = {}", self.two_n, self.p)?;
        writeln!(
            f,
            "case: n mod 3 = {},  m = {},  m mod p = {}",
            self.case, self.m, self.delta_p_m
        )?;
        writeln!(f, "a(p) = {},  b(p) = {}", self.a, self.b)?;
        writeln!(f, "theorem:     {}", self.theorem)?;
        writeln!(f, "brute force: {}", self.brute_force)?;
        write!(f, "{}", if self.matched { "OK" } else { "MISMATCH" })
    }
}

/// Evaluate both counts for one pair.
pub fn check_theorem(engine: &CountingEngine, two_n: i64, p: i64) -> Result<TheoremCheck> {
    let n = half_of(two_n)?;
    let params = engine.params(p)?;
    let theorem = engine.q_total_core(n, &params)?;
    let brute_force = engine.count_bruteforce(two_n, p)?;
    let breakdown = Breakdown::of(n, p);

    Ok(TheoremCheck {
        two_n,
        n,
        p,
        case: breakdown.case,
        m: breakdown.m,
        delta_p_m: breakdown.r,
        a: params.a,
        b: params.b,
        theorem,
        brute_force,
        difference: theorem - brute_force,
        matched: theorem == brute_force,
        mode: engine.mode(),
    })
}

#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Smallest `2n` (rounded up to even, at least 2).
    pub min_two_n: i64,
    /// Largest `2n`, inclusive.
    pub max_two_n: i64,
    pub primes: Vec<i64>,
    /// Stop at the first mismatch instead of finishing the range.
    pub stop_on_mismatch: bool,
    /// Progress log interval in pairs; 0 disables progress logging.
    pub log_every: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            min_two_n: 2,
            max_two_n: 10_000,
            primes: vec![5, 7, 11, 13],
            stop_on_mismatch: false,
            log_every: 100_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub two_n: i64,
    pub p: i64,
    pub theorem: i64,
    pub brute_force: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairFailure {
    pub two_n: i64,
    pub p: i64,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub checked: u64,
    pub passed: u64,
    pub failed: u64,
    pub mismatches: Vec<Mismatch>,
    pub errors: Vec<PairFailure>,
    /// True if `stop_on_mismatch` cut the sweep short.
    pub stopped_early: bool,
}

impl SweepReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl std::fmt::Display for SweepReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "checked {} pairs: {} passed, {} failed ({} mismatches, {} errors)",
            self.checked,
            self.passed,
            self.failed,
            self.mismatches.len(),
            self.errors.len()
        )?;
        for m in &self.mismatches {
            write!(
                f,
                "\n  mismatch 2n = {}, p = {}: g = {}, brute = {}, diff = {}",
                m.two_n,
                m.p,
                m.theorem,
                m.brute_force,
                m.theorem - m.brute_force
            )?;
        }
        for e in &self.errors {
            write!(f, "\n  error 2n = {}, p = {}: {}", e.two_n, e.p, e.error)?;
        }
        Ok(())
    }
}

/// Compare closed form and brute force across a range of `2n` and primes.
pub fn sweep(engine: &CountingEngine, config: &SweepConfig) -> SweepReport {
    let mut report = SweepReport::default();
    let start = Instant::now();
    let first = config.min_two_n.max(2);
    // i64::MAX is odd and has no even successor.
    let first = first.checked_add(first % 2);

    info!(
        min_two_n = ?first,
        max_two_n = config.max_two_n,
        primes = ?config.primes,
        mode = %engine.mode(),
        "sweep starting"
    );

    'outer: for &p in &config.primes {
        let mut next = first;
        while let Some(two_n) = next.filter(|&t| t <= config.max_two_n) {
            report.checked += 1;
            match check_theorem(engine, two_n, p) {
                Ok(check) if check.matched => report.passed += 1,
                Ok(check) => {
                    report.failed += 1;
                    warn!(
                        two_n,
                        p,
                        theorem = check.theorem,
                        brute_force = check.brute_force,
                        "closed form disagrees with brute force"
                    );
                    report.mismatches.push(Mismatch {
                        two_n,
                        p,
                        theorem: check.theorem,
                        brute_force: check.brute_force,
                    });
                    if config.stop_on_mismatch {
                        report.stopped_early = true;
                        break 'outer;
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(two_n, p, error = %e, "pair could not be evaluated");
                    report.errors.push(PairFailure {
                        two_n,
                        p,
                        error: e.to_string(),
                    });
                }
            }
            if config.log_every > 0 && report.checked % config.log_every == 0 {
                info!(
                    checked = report.checked,
                    failed = report.failed,
                    current_p = p,
                    current_two_n = two_n,
                    "sweep progress"
                );
            }
            next = two_n.checked_add(2);
        }
    }

    info!(
        checked = report.checked,
        passed = report.passed,
        failed = report.failed,
        elapsed = format_args!("{:.2}s", start.elapsed().as_secs_f64()),
        "sweep complete"
    );
    report
}
