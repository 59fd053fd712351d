//! # Error — Failure Taxonomy for the Counting Engine
//!
//! Every fallible operation in the library returns [`CountError`]. Variants
//! fall into four families:
//!
//! - **Type**: textual input that is not an integer, or does not fit `i64`.
//! - **Domain**: `2n` odd or below 2, `p` not a prime `>= 5`, or a
//!   case-restricted formula (`Q`, `Q0`, the `a/b` selector) called with the
//!   wrong residue of `n mod 3`.
//! - **Resource**: the sieve artifact is missing or corrupt, or a number is too
//!   large for the sieve plus trial division to classify.
//! - **Consistency**: strict-mode assertions on intermediate arithmetic. These
//!   indicate a modeling bug, never a user error.
//!
//! None of these are retryable. The verifier sweep is the only caller that
//! records them as data and keeps going.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CountError {
    #[error("{name} must be an integer, got {value:?}")]
    NotAnInteger { name: &'static str, value: String },

    #[error("{name} = {value} does not fit in a signed 64-bit integer")]
    OutOfRange { name: &'static str, value: String },

    #[error("2n must be even and >= 2, got {two_n}")]
    OddOrTooSmall { two_n: i64 },

    #[error("p must be a prime >= 5, got {p}")]
    NotPrime { p: i64 },

    #[error("n must be >= 1, got {n}")]
    NonPositiveN { n: i64 },

    #[error("{formula} is only defined for {expected}, but n = {n} has n mod 3 = {residue}")]
    WrongResidueCase {
        formula: &'static str,
        expected: &'static str,
        n: i64,
        residue: i64,
    },

    #[error(
        "sieve artifact not found at {}; generate it with `coprime build-sieve`",
        path.display()
    )]
    SieveMissing { path: PathBuf },

    #[error("sieve artifact {} is corrupt: {reason}", path.display())]
    SieveCorrupt { path: PathBuf, reason: String },

    #[error(
        "cannot classify {n}: trial division needs primes up to {needed}, but the sieve only covers {bound}"
    )]
    BeyondSieve { n: i64, needed: u64, bound: u64 },

    #[error("expected p mod 6 in {{1, 5}} for prime p >= 5, but {p} mod 6 = {residue}")]
    InvariantViolation { p: i64, residue: i64 },

    #[error(
        "non-integer quotient in {form}: {numerator} / {denominator} at r = {r}, a = {a}, b = {b}{}",
        .p.map(|p| format!(", p = {}", p)).unwrap_or_default()
    )]
    InexactQuotient {
        form: &'static str,
        numerator: i64,
        denominator: i64,
        r: i64,
        a: i64,
        b: i64,
        /// Only `λ̄` depends on `p`.
        p: Option<i64>,
    },

    #[error("{form} disagrees between division ({division}) and subtraction ({subtraction}) forms")]
    FormMismatch {
        form: &'static str,
        division: i64,
        subtraction: i64,
    },

    #[error("n - h(n mod 3) = {numerator} is not divisible by 3 (n = {n})")]
    InexactM { n: i64, numerator: i64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CountError {
    /// True for errors caused by caller input (type and domain families).
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CountError::NotAnInteger { .. }
                | CountError::OutOfRange { .. }
                | CountError::OddOrTooSmall { .. }
                | CountError::NotPrime { .. }
                | CountError::NonPositiveN { .. }
                | CountError::WrongResidueCase { .. }
        )
    }

    /// True for strict-mode arithmetic assertions.
    pub fn is_consistency_error(&self) -> bool {
        matches!(
            self,
            CountError::InvariantViolation { .. }
                | CountError::InexactQuotient { .. }
                | CountError::FormMismatch { .. }
                | CountError::InexactM { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CountError>;

/// Parse a decimal integer argument.
///
/// Arbitrary-length text is accepted by the parser so that a value that is a
/// well-formed integer but too large is reported as out of range rather than
/// as "not an integer".
pub fn parse_integer(name: &'static str, text: &str) -> Result<i64> {
    let trimmed = text.trim();
    let value = rug::Integer::parse(trimmed)
        .map(rug::Integer::from)
        .map_err(|_| CountError::NotAnInteger {
            name,
            value: text.to_string(),
        })?;
    value.to_i64().ok_or_else(|| CountError::OutOfRange {
        name,
        value: trimmed.to_string(),
    })
}
