//! # Oracle — Sieve-Backed Primality Classification
//!
//! Answers "is `n` prime?" for every modulus handed to the counting engine.
//!
//! - `n <= N` (the sieve bound): one bit lookup.
//! - `n > N` with `⌊√n⌋ <= N`: trial division by the sieve-resident primes in
//!   ascending order, stopping at the first prime above `⌊√n⌋`.
//! - `⌊√n⌋ > N`: [`CountError::BeyondSieve`]. The table cannot certify `n`
//!   and the oracle does not guess.
//!
//! ## Lazy State
//!
//! The table and the derived prime index list are each populated at most once
//! through a [`OnceLock`]. [`PrimalityOracle::ensure_loaded`] is the explicit
//! entry point; every query calls it. Reading the artifact happens under a
//! load gate: concurrent first queries queue on it, the first one reads the
//! file and the rest find the table already resident. A failed load is not
//! cached, so a later query can succeed once the artifact exists.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};
use tracing::info;

use crate::error::{CountError, Result};
use crate::sieve::{self, BitSieve};

enum Source {
    File(PathBuf),
    Memory,
}

pub struct PrimalityOracle {
    source: Source,
    table: OnceLock<BitSieve>,
    primes: OnceLock<Vec<u64>>,
    load_gate: Mutex<()>,
    loads: AtomicUsize,
}

impl PrimalityOracle {
    /// Oracle backed by the artifact at `path`. Nothing is read until the
    /// first query.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        PrimalityOracle {
            source: Source::File(path.into()),
            table: OnceLock::new(),
            primes: OnceLock::new(),
            load_gate: Mutex::new(()),
            loads: AtomicUsize::new(0),
        }
    }

    /// Oracle over an in-memory table.
    pub fn from_sieve(table: BitSieve) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(table);
        PrimalityOracle {
            source: Source::Memory,
            table: cell,
            primes: OnceLock::new(),
            load_gate: Mutex::new(()),
            loads: AtomicUsize::new(0),
        }
    }

    /// Oracle over a freshly built table for `0..=limit`.
    pub fn with_limit(limit: u64) -> Self {
        Self::from_sieve(sieve::build_sieve(limit))
    }

    /// Artifact path, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            Source::File(p) => Some(p),
            Source::Memory => None,
        }
    }

    /// Number of artifact reads attempted, successful or not.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// Load the table if it is not resident yet.
    pub fn ensure_loaded(&self) -> Result<&BitSieve> {
        if let Some(table) = self.table.get() {
            return Ok(table);
        }
        let _gate = self.load_gate.lock().unwrap_or_else(|e| e.into_inner());
        // Another caller may have finished the load while we waited.
        if let Some(table) = self.table.get() {
            return Ok(table);
        }
        let path = match &self.source {
            Source::File(p) => p,
            // from_sieve always fills the cell.
            Source::Memory => unreachable!("in-memory oracle without a table"),
        };
        self.loads.fetch_add(1, Ordering::Relaxed);
        let loaded = sieve::load(path)?;
        info!(
            path = %path.display(),
            bound = loaded.len().saturating_sub(1),
            "sieve loaded"
        );
        Ok(self.table.get_or_init(|| loaded))
    }

    /// Ascending primes of the table, built on first use.
    pub fn primes(&self) -> Result<&[u64]> {
        let table = self.ensure_loaded()?;
        Ok(self
            .primes
            .get_or_init(|| table.iter_set_bits().map(|i| i as u64).collect()))
    }

    /// Iterate the sieve-resident primes in ascending order.
    pub fn iter_primes(&self) -> Result<impl Iterator<Item = u64> + '_> {
        Ok(self.primes()?.iter().copied())
    }

    /// Largest index covered by the table.
    pub fn bound(&self) -> Result<u64> {
        Ok(self.ensure_loaded()?.len().saturating_sub(1) as u64)
    }

    pub fn prime_count(&self) -> Result<usize> {
        Ok(self.primes()?.len())
    }

    /// Classify `n`.
    pub fn is_prime(&self, n: i64) -> Result<bool> {
        let table = self.ensure_loaded()?;
        if n < 2 {
            return Ok(false);
        }
        let n = n as u64;
        let bound = table.len().saturating_sub(1) as u64;
        if n <= bound {
            return Ok(table.get(n as usize));
        }

        let limit = sieve::isqrt(n);
        if limit > bound {
            return Err(CountError::BeyondSieve {
                n: n as i64,
                needed: limit,
                bound,
            });
        }
        for &p in self.primes()? {
            if p > limit {
                break;
            }
            if n % p == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
