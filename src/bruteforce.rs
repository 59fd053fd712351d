//! # Brute Force — Reference Count by Enumeration
//!
//! Walks `h = 1..=n`, sets `k = 2n - h` and counts the `h` for which both
//! `gcd(h, 6p)` and `gcd(k, 6p)` are 1. O(n log p). Kept deliberately naive:
//! it exists to check the closed form, so it shares no arithmetic with it
//! beyond input validation.

use crate::engine::{half_of, require_prime};
use crate::error::Result;
use crate::oracle::PrimalityOracle;
use crate::sieve::gcd;

/// Count pairs `(h, k)`, `h + k = 2n`, `h <= k`, both coprime to `6p`.
pub fn count_bruteforce(oracle: &PrimalityOracle, two_n: i64, p: i64) -> Result<i64> {
    let n = half_of(two_n)?;
    require_prime(oracle, p)?;
    Ok(count_unchecked(two_n as u64, n as u64, 6 * p as u64))
}

fn count_unchecked(two_n: u64, half: u64, modulus: u64) -> i64 {
    (1..=half)
        .filter(|&h| gcd(h, modulus) == 1 && gcd(two_n - h, modulus) == 1)
        .count() as i64
}
