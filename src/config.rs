//! TOML settings for the `coprime` binary.
//!
//! Every field has a default, so an empty file (or no file) is valid. The
//! binary applies CLI flags and environment variables on top.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::sieve::DEFAULT_SIEVE_LIMIT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Sieve artifact location.
    pub sieve_path: PathBuf,
    /// Bound used by `build-sieve` when `--limit` is not given.
    pub sieve_limit: u64,
    /// Run the closed form with its internal consistency checks.
    pub strict: bool,
    /// Primes swept or exported when none are given on the command line.
    pub primes: Vec<i64>,
    pub max_two_n: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            sieve_path: PathBuf::from("sieve.bin"),
            sieve_limit: DEFAULT_SIEVE_LIMIT,
            strict: true,
            primes: vec![5, 7, 11, 13],
            max_two_n: 10_000,
        }
    }
}

impl Settings {
    pub fn parse(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Settings from `path` if given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.sieve_limit < 2 {
            anyhow::bail!("sieve_limit must be at least 2, got {}", self.sieve_limit);
        }
        if self.max_two_n < 2 {
            anyhow::bail!("max_two_n must be at least 2, got {}", self.max_two_n);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(Settings::parse("").unwrap(), Settings::default());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let s = Settings::parse("strict = false\nprimes = [17, 19]\n").unwrap();
        assert!(!s.strict);
        assert_eq!(s.primes, vec![17, 19]);
        assert_eq!(s.max_two_n, 10_000);
        assert_eq!(s.sieve_path, PathBuf::from("sieve.bin"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::parse("sieve_limt = 10").is_err());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(Settings::parse("sieve_limit = 1").is_err());
        assert!(Settings::parse("max_two_n = 0").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sieve_path = \"/tmp/primes.bin\"").unwrap();
        writeln!(file, "sieve_limit = 50000").unwrap();
        let s = Settings::load(Some(file.path())).unwrap();
        assert_eq!(s.sieve_path, PathBuf::from("/tmp/primes.bin"));
        assert_eq!(s.sieve_limit, 50_000);
    }

    #[test]
    fn load_without_path_is_default() {
        assert_eq!(Settings::load(None).unwrap(), Settings::default());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = Settings::load(Some(Path::new("/nonexistent/coprime.toml"))).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/coprime.toml"));
    }
}
