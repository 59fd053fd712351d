//! # Engine — Closed-Form Count `g(2n, p)`
//!
//! Counts pairs `(h, k)` with `h + k = 2n`, `h <= k` and
//! `gcd(h, 6p) = gcd(k, 6p) = 1` without enumerating them.
//!
//! ## Case Split
//!
//! With `n = 2n / 2`, the residue `n mod 3` picks the branch:
//!
//! ```text
//! n ≡ 1, 2 (mod 3):  Q(n, p)  = η(m, p)·ν(r, α) + η̄(m, p)·ν̄(r, α, p)
//!                     m = m(n), r = m mod p, α = a(p) if n ≡ 1 else b(p)
//! n ≡ 0 (mod 3):     Q0(n, p) = (w + 1)·λ(r, a, b) + w·λ̄(r, a, b, p)
//!                     m = m0(n), r = m mod p, w = ⌊m / p⌋
//! ```
//!
//! `Q_total` routes between them; `g(2n, p) = Q_total(n, p)`.
//!
//! ## Validation
//!
//! Every public entry point validates `p` exactly once (prime, `>= 5`, via the
//! oracle) and then runs the unchecked core. `Q` and `Q0` additionally reject
//! an `n` in the other residue case.
//!
//! ## Evaluation Modes
//!
//! There is one arithmetic path. [`EvalMode::Strict`] layers assertions on top
//! of it: `n - h(n mod 3)` must divide by 3, and the division forms of `λ` and
//! `λ̄` must be exact and agree with the subtraction forms. A failure there is
//! a modeling bug. [`EvalMode::Fast`] skips the assertions.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::bruteforce;
use crate::error::{CountError, Result};
use crate::formula::{self, ResidueCase};
use crate::oracle::PrimalityOracle;
use crate::params::{ParamCache, PrimeParams};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalMode {
    #[default]
    Strict,
    Fast,
}

impl std::fmt::Display for EvalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalMode::Strict => write!(f, "strict"),
            EvalMode::Fast => write!(f, "fast"),
        }
    }
}

/// Intermediate values of a `Q_total` evaluation, for reports and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Breakdown {
    pub n: i64,
    pub case: ResidueCase,
    /// `m(n)` or `m0(n)`, depending on the case.
    pub m: i64,
    /// `m mod p`
    pub r: i64,
}

impl Breakdown {
    pub fn of(n: i64, p: i64) -> Self {
        let case = ResidueCase::of(n);
        let m = match case {
            ResidueCase::Zero => formula::m0(n),
            _ => formula::m(n),
        };
        Breakdown {
            n,
            case,
            m,
            r: formula::delta(m, p),
        }
    }
}

/// `n` for a valid `2n` (even, `>= 2`).
pub fn half_of(two_n: i64) -> Result<i64> {
    if two_n < 2 || two_n % 2 != 0 {
        return Err(CountError::OddOrTooSmall { two_n });
    }
    Ok(two_n / 2)
}

/// `n` as taken by `Q`, `Q0` and `Q_total`: at least 1, which also keeps
/// `n - h(n mod 3)` and `n - 3` clear of overflow.
fn require_positive_n(n: i64) -> Result<()> {
    if n < 1 {
        return Err(CountError::NonPositiveN { n });
    }
    Ok(())
}

/// Require `p` to be a prime `>= 5`.
pub fn require_prime(oracle: &PrimalityOracle, p: i64) -> Result<()> {
    if p < 5 || !oracle.is_prime(p)? {
        return Err(CountError::NotPrime { p });
    }
    Ok(())
}

pub struct CountingEngine {
    oracle: Arc<PrimalityOracle>,
    params: ParamCache,
    mode: EvalMode,
}

impl CountingEngine {
    pub fn new(oracle: Arc<PrimalityOracle>) -> Self {
        CountingEngine {
            oracle,
            params: ParamCache::new(),
            mode: EvalMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> EvalMode {
        self.mode
    }

    pub fn oracle(&self) -> &PrimalityOracle {
        &self.oracle
    }

    /// Validated `{M, a, b}` record for `p`.
    pub fn params(&self, p: i64) -> Result<PrimeParams> {
        require_prime(&self.oracle, p)?;
        self.params.get(p)
    }

    /// `Q(n, p)`, only for `n mod 3 ∈ {1, 2}`.
    pub fn q(&self, n: i64, p: i64) -> Result<i64> {
        require_positive_n(n)?;
        let params = self.params(p)?;
        let case = ResidueCase::of(n);
        if case == ResidueCase::Zero {
            return Err(CountError::WrongResidueCase {
                formula: "Q(n, p)",
                expected: "n mod 3 in {1, 2}",
                n,
                residue: case.value(),
            });
        }
        self.q_core(n, &params)
    }

    /// `Q0(n, p)`, only for `n mod 3 = 0`.
    pub fn q0(&self, n: i64, p: i64) -> Result<i64> {
        require_positive_n(n)?;
        let params = self.params(p)?;
        let case = ResidueCase::of(n);
        if case != ResidueCase::Zero {
            return Err(CountError::WrongResidueCase {
                formula: "Q0(n, p)",
                expected: "n mod 3 = 0",
                n,
                residue: case.value(),
            });
        }
        self.q0_core(n, &params)
    }

    /// `Q_total(n, p)`, defined for every `n`.
    pub fn q_total(&self, n: i64, p: i64) -> Result<i64> {
        require_positive_n(n)?;
        let params = self.params(p)?;
        self.q_total_core(n, &params)
    }

    /// `g(2n, p)`: the closed-form pair count.
    pub fn g(&self, two_n: i64, p: i64) -> Result<i64> {
        let n = half_of(two_n)?;
        let params = self.params(p)?;
        self.q_total_core(n, &params)
    }

    /// Reference count by enumeration.
    pub fn count_bruteforce(&self, two_n: i64, p: i64) -> Result<i64> {
        bruteforce::count_bruteforce(&self.oracle, two_n, p)
    }

    /// Core of `Q_total`; `params` must come from [`Self::params`].
    pub(crate) fn q_total_core(&self, n: i64, params: &PrimeParams) -> Result<i64> {
        match ResidueCase::of(n) {
            ResidueCase::Zero => self.q0_core(n, params),
            _ => self.q_core(n, params),
        }
    }

    fn q_core(&self, n: i64, params: &PrimeParams) -> Result<i64> {
        let p = params.p;
        if self.mode == EvalMode::Strict {
            let numerator = n - formula::h_poly(formula::delta(n, 3));
            if numerator % 3 != 0 {
                return Err(CountError::InexactM { n, numerator });
            }
        }
        let mn = formula::m(n);
        let r = formula::delta(mn, p);
        let alpha = params.select(n)?;

        let x1 = formula::eta(mn, p);
        let x2 = formula::eta_bar(mn, p);
        let y1 = formula::nu(r, alpha);
        let y2 = formula::nu_bar(r, alpha, p);
        Ok(formula::dot(x1, y1) + formula::dot(x2, y2))
    }

    fn q0_core(&self, n: i64, params: &PrimeParams) -> Result<i64> {
        let (p, a, b) = (params.p, params.a, params.b);
        let mn0 = formula::m0(n);
        let r = formula::delta(mn0, p);
        let w0 = mn0.div_euclid(p);

        let lam = formula::lambda(r, a, b);
        let lam_bar = formula::lambda_bar(r, a, b, p);
        if self.mode == EvalMode::Strict {
            check_forms("λ", formula::lambda_quotient(r, a, b)?, lam)?;
            check_forms("λ̄", formula::lambda_bar_quotient(r, a, b, p)?, lam_bar)?;
        }
        Ok((w0 + 1) * lam + w0 * lam_bar)
    }
}

fn check_forms(form: &'static str, division: i64, subtraction: i64) -> Result<()> {
    if division != subtraction {
        return Err(CountError::FormMismatch {
            form,
            division,
            subtraction,
        });
    }
    Ok(())
}
