pub mod bruteforce;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod formula;
pub mod oracle;
pub mod params;
pub mod sieve;
pub mod verify;

pub use engine::{CountingEngine, EvalMode};
pub use error::{CountError, Result};
pub use oracle::PrimalityOracle;
pub use params::PrimeParams;
pub use verify::{check_theorem, sweep, SweepConfig, SweepReport, TheoremCheck};
