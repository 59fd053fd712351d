//! # Params — Per-Prime Constants `M(p)`, `a(p)`, `b(p)`
//!
//! For a prime `p >= 5`, `p mod 6` is 1 or 5. The counting formulas need the
//! two residues of `[0, p-1]` that make `6x + 1` and `6x + 5` divisible by `p`:
//!
//! ```text
//! M(p) = 1 if p ≡ 1 (mod 6), 0 if p ≡ 5 (mod 6)
//! a(p) = M·⌊(p-1)/6⌋ + (1-M)·⌊(5p-1)/6⌋      minimal x with 6x + 1 ≡ 0 (mod p)
//! b(p) = p - 1 - a(p)                          minimal x with 6x + 5 ≡ 0 (mod p)
//! ```
//!
//! [`ParamCache`] memoizes the record per distinct `p`. Entries are never
//! evicted; the number of distinct primes a process exercises is small.

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::error::{CountError, Result};
use crate::formula::{delta, ResidueCase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimeParams {
    pub p: i64,
    pub m: i64,
    pub a: i64,
    pub b: i64,
}

impl PrimeParams {
    /// Derive the record for `p`. The caller is responsible for `p` being a
    /// prime `>= 5`; any `p mod 6` other than 1 or 5 is an invariant
    /// violation.
    pub fn derive(p: i64) -> Result<Self> {
        let residue = delta(p, 6);
        let m = match residue {
            1 => 1,
            5 => 0,
            _ => return Err(CountError::InvariantViolation { p, residue }),
        };
        let a = m * ((p - 1) / 6) + (1 - m) * ((5 * p - 1) / 6);
        Ok(PrimeParams {
            p,
            m,
            a,
            b: p - 1 - a,
        })
    }

    /// Selector `f(n, p)`: `a(p)` when `n ≡ 1`, `b(p)` when `n ≡ 2 (mod 3)`.
    pub fn select(&self, n: i64) -> Result<i64> {
        match ResidueCase::of(n) {
            ResidueCase::One => Ok(self.a),
            ResidueCase::Two => Ok(self.b),
            ResidueCase::Zero => Err(CountError::WrongResidueCase {
                formula: "f(n, p)",
                expected: "n mod 3 in {1, 2}",
                n,
                residue: 0,
            }),
        }
    }
}

/// Memo table keyed by `p`.
#[derive(Default)]
pub struct ParamCache {
    entries: Mutex<HashMap<i64, PrimeParams>>,
}

impl ParamCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `p`, derived on first request.
    pub fn get(&self, p: i64) -> Result<PrimeParams> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(params) = entries.get(&p) {
            return Ok(*params);
        }
        let params = PrimeParams::derive(p)?;
        debug!(p, m = params.m, a = params.a, b = params.b, "prime parameters derived");
        entries.insert(p, params);
        Ok(params)
    }

    /// Number of memoized primes.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIMES: [i64; 24] = [
        5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
        101,
    ];

    #[test]
    fn known_parameters() {
        let cases = [
            (5, 0, 4, 0),
            (7, 1, 1, 5),
            (11, 0, 9, 1),
            (13, 1, 2, 10),
            (67, 1, 11, 55),
            (101, 0, 84, 16),
        ];
        for (p, m, a, b) in cases {
            assert_eq!(PrimeParams::derive(p).unwrap(), PrimeParams { p, m, a, b });
        }
    }

    #[test]
    fn a_plus_b_is_p_minus_one() {
        for p in PRIMES {
            let params = PrimeParams::derive(p).unwrap();
            assert_eq!(params.a + params.b, p - 1, "p = {}", p);
        }
    }

    #[test]
    fn a_and_b_are_minimal_roots() {
        for p in PRIMES {
            let params = PrimeParams::derive(p).unwrap();
            let first_a = (0..p).find(|x| (6 * x + 1) % p == 0).unwrap();
            let first_b = (0..p).find(|x| (6 * x + 5) % p == 0).unwrap();
            assert_eq!(params.a, first_a, "a({})", p);
            assert_eq!(params.b, first_b, "b({})", p);
        }
    }

    #[test]
    fn m_tracks_p_mod_6() {
        for p in PRIMES {
            let params = PrimeParams::derive(p).unwrap();
            match p % 6 {
                1 => assert_eq!(params.m, 1),
                5 => assert_eq!(params.m, 0),
                r => panic!("prime {} has residue {} mod 6", p, r),
            }
        }
    }

    #[test]
    fn impossible_residue_fails_loudly() {
        for p in [9, 15, 4, 6, 8] {
            assert!(matches!(
                PrimeParams::derive(p).unwrap_err(),
                CountError::InvariantViolation { .. }
            ));
        }
    }

    #[test]
    fn selector_follows_residue_case() {
        let params = PrimeParams::derive(13).unwrap();
        assert_eq!(params.select(4).unwrap(), 2);
        assert_eq!(params.select(5).unwrap(), 10);
        assert_eq!(params.select(-2).unwrap(), 2);
        assert!(matches!(
            params.select(6).unwrap_err(),
            CountError::WrongResidueCase { n: 6, .. }
        ));
    }

    #[test]
    fn cache_memoizes_per_prime() {
        let cache = ParamCache::new();
        assert!(cache.is_empty());
        let first = cache.get(31).unwrap();
        let second = cache.get(31).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
        cache.get(37).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn cache_does_not_store_failures() {
        let cache = ParamCache::new();
        assert!(cache.get(9).is_err());
        assert!(cache.is_empty());
    }
}
