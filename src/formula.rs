//! # Formula — Residue, Step and Indicator Primitives
//!
//! Small total functions over `i64` that the counting engine composes. None of
//! them hold state or touch the oracle; `p` is whatever the caller passes, and
//! validating it is the engine's job.
//!
//! Division and remainder follow floor semantics for a positive divisor
//! (`div_euclid` / `rem_euclid`). This matters: `m(2) = (2 - 5) / 3 = -1`, and
//! `η̄` takes `⌊(-1 - 1) / 2⌋`.
//!
//! | Symbol | Function |
//! |--------|----------|
//! | `H(x)` | [`step`] |
//! | `D(x)` | [`nonzero`] |
//! | `δ_k(a)` | [`delta`] |
//! | `κ`, `κ̄` | [`kappa`], [`kappa_bar`] |
//! | `τ` | [`tau`] |
//! | `ν`, `ν̄` | [`nu`], [`nu_bar`] |
//! | `λ`, `λ̄` | [`lambda`], [`lambda_bar`] |
//! | `h`, `m`, `m0` | [`h_poly`], [`m`], [`m0`] |
//! | `η`, `η̄` | [`eta`], [`eta_bar`] |

use serde::Serialize;

use crate::error::{CountError, Result};

/// `n mod 3`, which selects the closed-form branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "i64")]
pub enum ResidueCase {
    Zero,
    One,
    Two,
}

impl ResidueCase {
    pub fn of(n: i64) -> Self {
        match delta(n, 3) {
            0 => ResidueCase::Zero,
            1 => ResidueCase::One,
            _ => ResidueCase::Two,
        }
    }

    pub fn value(self) -> i64 {
        match self {
            ResidueCase::Zero => 0,
            ResidueCase::One => 1,
            ResidueCase::Two => 2,
        }
    }
}

impl From<ResidueCase> for i64 {
    fn from(case: ResidueCase) -> i64 {
        case.value()
    }
}

impl std::fmt::Display for ResidueCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Heaviside step: 1 if `x >= 0`, else 0.
#[inline]
pub fn step(x: i64) -> i64 {
    (x >= 0) as i64
}

/// Non-zero indicator: 0 if `x == 0`, else 1.
#[inline]
pub fn nonzero(x: i64) -> i64 {
    (x != 0) as i64
}

/// Canonical residue `a mod k` in `[0, k-1]` for `k > 0`.
#[inline]
pub fn delta(a: i64, k: i64) -> i64 {
    a.rem_euclid(k)
}

/// `κ(r, a) = ⌊r/2⌋ + 1 - H(r - a)`
pub fn kappa(r: i64, a: i64) -> i64 {
    r.div_euclid(2) + 1 - step(r - a)
}

/// `κ̄(r, a, p) = ⌊(p - r)/2⌋ - H(a - r - 1)`
pub fn kappa_bar(r: i64, a: i64, p: i64) -> i64 {
    (p - r).div_euclid(2) - step(a - r - 1)
}

/// `τ(r, a) = (1 - δ_2(r))·D(2a - r)`
pub fn tau(r: i64, a: i64) -> i64 {
    (1 - delta(r, 2)) * nonzero(2 * a - r)
}

/// `ν(r, a) = (κ - τ, τ)`
pub fn nu(r: i64, a: i64) -> (i64, i64) {
    let t = tau(r, a);
    (kappa(r, a) - t, t)
}

/// `ν̄(r, a, p) = (κ̄ - τ(p - r, a - r), τ(p - r, a - r))`
pub fn nu_bar(r: i64, a: i64, p: i64) -> (i64, i64) {
    let t = tau(p - r, a - r);
    (kappa_bar(r, a, p) - t, t)
}

/// `λ(r, a, b) = (r + 2) - H(r - a) - H(r - b) - D(a + b - r)`
pub fn lambda(r: i64, a: i64, b: i64) -> i64 {
    (r + 2) - step(r - a) - step(r - b) - nonzero(a + b - r)
}

/// `λ̄(r, a, b, p) = p - r - H(a - r - 1) - H(b - r - 1) - D(a + b - p - r)`
pub fn lambda_bar(r: i64, a: i64, b: i64, p: i64) -> i64 {
    p - r - step(a - r - 1) - step(b - r - 1) - nonzero(a + b - p - r)
}

/// Division form of `λ`: `r + 1 - (H(r-a) + H(r-b)) / (2 - D(a+b-r))`.
///
/// Errors if the quotient is not exact.
pub fn lambda_quotient(r: i64, a: i64, b: i64) -> Result<i64> {
    let numerator = step(r - a) + step(r - b);
    let denominator = 2 - nonzero(a + b - r);
    if numerator % denominator != 0 {
        return Err(CountError::InexactQuotient {
            form: "λ",
            numerator,
            denominator,
            r,
            a,
            b,
            p: None,
        });
    }
    Ok(r + 1 - numerator / denominator)
}

/// Division form of `λ̄`: `p - r - 1 - (H(a-r-1) + H(b-r-1)) / (2 - D(a+b-p-r))`.
pub fn lambda_bar_quotient(r: i64, a: i64, b: i64, p: i64) -> Result<i64> {
    let numerator = step(a - r - 1) + step(b - r - 1);
    let denominator = 2 - nonzero(a + b - p - r);
    if numerator % denominator != 0 {
        return Err(CountError::InexactQuotient {
            form: "λ̄",
            numerator,
            denominator,
            r,
            a,
            b,
            p: Some(p),
        });
    }
    Ok(p - r - 1 - numerator / denominator)
}

/// `h(x) = 3x² - 5x + 3`; only evaluated at `x ∈ {0, 1, 2}` where it gives 3, 1, 5.
pub fn h_poly(x: i64) -> i64 {
    3 * x * x - 5 * x + 3
}

/// `m(n) = (n - h(δ_3(n))) / 3`, for `n mod 3 ∈ {1, 2}`.
pub fn m(n: i64) -> i64 {
    (n - h_poly(delta(n, 3))).div_euclid(3)
}

/// `m0(n) = (n - 3) / 3`, for `n mod 3 = 0`.
pub fn m0(n: i64) -> i64 {
    (n - 3).div_euclid(3)
}

/// `η(m, p) = (⌊m/p⌋ + 1, ⌊⌊m/p⌋/2⌋ + 1)`
pub fn eta(mn: i64, p: i64) -> (i64, i64) {
    let w = mn.div_euclid(p);
    (w + 1, w.div_euclid(2) + 1)
}

/// `η̄(m, p) = (⌊m/p⌋, ⌊(⌊m/p⌋ - 1)/2⌋ + 1)`
pub fn eta_bar(mn: i64, p: i64) -> (i64, i64) {
    let w = mn.div_euclid(p);
    (w, (w - 1).div_euclid(2) + 1)
}

/// Dot product of two integer pairs.
#[inline]
pub fn dot(x: (i64, i64), y: (i64, i64)) -> i64 {
    x.0 * y.0 + x.1 * y.1
}
