//! # Sieve — Primality Table Construction and Persistence
//!
//! Builds the boolean primality table consumed by the [`oracle`](crate::oracle)
//! and stores it on disk. Provides:
//!
//! 1. **`BitSieve`**: a packed bit table, bit `i` set iff `i` is prime.
//! 2. **`build_sieve`**: sieve of Eratosthenes over odd numbers, writing
//!    straight into the packed table.
//! 3. **Artifact I/O** (`save`, `load`): a small binary file with a SHA-256
//!    checksum over the payload, written atomically.
//! 4. **Integer helpers** (`gcd`, `isqrt`) shared by the oracle and the
//!    brute-force counter.
//!
//! ## Artifact Layout
//!
//! All integers little-endian.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 8 | magic `CPSIEVE1` |
//! | 8 | 8 | bound `N` (the table covers `0..=N`) |
//! | 16 | 32 | SHA-256 of the word payload |
//! | 48 | 8·⌈(N+1)/64⌉ | packed `u64` words |
//!
//! ## Atomic Writes
//!
//! The artifact is written to a `.tmp` sibling and renamed into place, so a
//! crash mid-write never leaves a truncated table behind the real path.
//!
//! ## References
//!
//! - Eratosthenes of Cyrene, ~240 BCE (sieve algorithm).
//! - Josef Stein, "Computational problems associated with Racah algebra",
//!   J. Comput. Phys. 1(3):397–405, 1967 (binary GCD).

use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{CountError, Result};

/// Default sieve bound. Covers trial division up to 10^12.
pub const DEFAULT_SIEVE_LIMIT: u64 = 1_000_000;

const MAGIC: &[u8; 8] = b"CPSIEVE1";
const HEADER_LEN: usize = 8 + 8 + 32;

/// Packed bit table.
///
/// 8× memory reduction over `Vec<bool>`: the default million-entry table is
/// 122 KB. Bit `i` lives in word `i / 64` at position `i % 64`. Bits past
/// `len` in the last word are always clear so `count_ones` stays exact.
#[derive(Clone, PartialEq, Eq)]
pub struct BitSieve {
    words: Vec<u64>,
    len: usize,
}

impl std::fmt::Debug for BitSieve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitSieve")
            .field("len", &self.len)
            .field("ones", &self.count_ones())
            .finish()
    }
}

impl BitSieve {
    /// Create a table of `len` bits, all set.
    pub fn new_all_set(len: usize) -> Self {
        let num_words = len.div_ceil(64);
        let mut words = vec![u64::MAX; num_words];
        let extra = num_words * 64 - len;
        if extra > 0 {
            words[num_words - 1] >>= extra;
        }
        BitSieve { words, len }
    }

    /// Create a table of `len` bits, all clear.
    pub fn new_all_clear(len: usize) -> Self {
        BitSieve {
            words: vec![0u64; len.div_ceil(64)],
            len,
        }
    }

    /// Rebuild a table from its packed words. Returns `None` if the word count
    /// does not match `len` or a padding bit is set.
    pub fn from_words(words: Vec<u64>, len: usize) -> Option<Self> {
        if words.len() != len.div_ceil(64) {
            return None;
        }
        let extra = words.len() * 64 - len;
        if extra > 0 {
            let last = words[words.len() - 1];
            if last >> (64 - extra) != 0 {
                return None;
            }
        }
        Some(BitSieve { words, len })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Packed words, lowest index first.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Get bit `index`.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        assert!(
            index < self.len,
            "BitSieve index out of bounds: {} >= {}",
            index,
            self.len
        );
        self.words[index / 64] & (1u64 << (index % 64)) != 0
    }

    #[inline]
    pub fn set(&mut self, index: usize) {
        debug_assert!(index < self.len);
        self.words[index / 64] |= 1u64 << (index % 64);
    }

    #[inline]
    pub fn clear(&mut self, index: usize) {
        debug_assert!(index < self.len);
        self.words[index / 64] &= !(1u64 << (index % 64));
    }

    /// Number of set bits, via hardware POPCNT.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Indices of all set bits in ascending order.
    pub fn iter_set_bits(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &word)| BitIter {
            word,
            base: wi * 64,
        })
    }
}

/// Iterator over set bits within a single u64 word.
struct BitIter {
    word: u64,
    base: usize,
}

impl Iterator for BitIter {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.word == 0 {
            return None;
        }
        let tz = self.word.trailing_zeros() as usize;
        self.word &= self.word - 1;
        Some(self.base + tz)
    }
}

/// Build the primality table for `0..=limit`.
///
/// Even numbers other than 2 are cleared up front; the marking loop then only
/// visits odd multiples `i², i² + 2i, ...` of each odd prime `i ≤ √limit`.
/// Complexity: O(N log log N) time, O(N/64) words of space.
pub fn build_sieve(limit: u64) -> BitSieve {
    let len = limit as usize + 1;
    let mut sieve = BitSieve::new_all_set(len);
    sieve.clear(0);
    if len > 1 {
        sieve.clear(1);
    }
    for even in (4..len).step_by(2) {
        sieve.clear(even);
    }

    let root = isqrt(limit) as usize;
    let mut i = 3;
    while i <= root {
        if sieve.get(i) {
            let mut multiple = i * i;
            while multiple < len {
                sieve.clear(multiple);
                multiple += 2 * i;
            }
        }
        i += 2;
    }
    debug!(limit, primes = sieve.count_ones(), "sieve built");
    sieve
}

/// SHA-256 over the little-endian word payload.
fn payload_digest(words: &[u64]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for w in words {
        hasher.update(w.to_le_bytes());
    }
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

fn le_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

/// Write the table to `path` atomically.
pub fn save(path: &Path, sieve: &BitSieve) -> Result<()> {
    let bound = sieve.len().saturating_sub(1) as u64;
    let mut bytes = Vec::with_capacity(HEADER_LEN + sieve.words().len() * 8);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&bound.to_le_bytes());
    bytes.extend_from_slice(&payload_digest(sieve.words()));
    for w in sieve.words() {
        bytes.extend_from_slice(&w.to_le_bytes());
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;

    info!(path = %path.display(), bound, bytes = bytes.len(), "sieve artifact written");
    Ok(())
}

/// Read and verify the table stored at `path`.
pub fn load(path: &Path) -> Result<BitSieve> {
    let corrupt = |reason: String| CountError::SieveCorrupt {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CountError::SieveMissing {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    if bytes.len() < HEADER_LEN || &bytes[..8] != MAGIC {
        return Err(corrupt("missing CPSIEVE1 header".into()));
    }
    let bound = le_u64(&bytes[8..16]);
    let mut stored_digest = [0u8; 32];
    stored_digest.copy_from_slice(&bytes[16..HEADER_LEN]);

    let len = usize::try_from(bound)
        .ok()
        .and_then(|b| b.checked_add(1))
        .ok_or_else(|| corrupt(format!("bound {} does not fit in memory", bound)))?;
    let payload = &bytes[HEADER_LEN..];
    let expected_bytes = len.div_ceil(64) * 8;
    if payload.len() != expected_bytes {
        return Err(corrupt(format!(
            "payload is {} bytes, bound {} needs {}",
            payload.len(),
            bound,
            expected_bytes
        )));
    }

    let words: Vec<u64> = payload.chunks_exact(8).map(le_u64).collect();
    if payload_digest(&words) != stored_digest {
        return Err(corrupt("checksum mismatch".into()));
    }

    BitSieve::from_words(words, len).ok_or_else(|| corrupt("padding bits set".into()))
}

/// Greatest common divisor (Stein's binary algorithm).
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    if a == 0 {
        return b;
    }
    if b == 0 {
        return a;
    }
    let shift = (a | b).trailing_zeros();
    a >>= a.trailing_zeros();
    loop {
        b >>= b.trailing_zeros();
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }
        b -= a;
        if b == 0 {
            return a << shift;
        }
    }
}

/// Floor of the square root.
pub fn isqrt(n: u64) -> u64 {
    let mut r = (n as f64).sqrt() as u64;
    // f64 rounding can land one off either way near 2^64.
    while r.checked_mul(r).map_or(true, |sq| sq > n) {
        r -= 1;
    }
    while (r + 1).checked_mul(r + 1).map_or(false, |sq| sq <= n) {
        r += 1;
    }
    r
}

#[cfg(test)]
mod tests {
    //! # Sieve Table Tests
    //!
    //! - **`BitSieve`**: word-boundary indices (63, 64, 127, 128), padding bits
    //!   in the last word, and agreement between `count_ones` and
    //!   `iter_set_bits`.
    //! - **`build_sieve`**: agreement with naive trial division up to 10^4 and
    //!   known values of pi(x) (OEIS A000720): pi(100) = 25, pi(1000) = 168,
    //!   pi(10^4) = 1229, pi(10^5) = 9592, pi(10^6) = 78498.
    //! - **Artifact I/O**: save/load round trip, missing file, truncated
    //!   payload, and tampering detected by the checksum.
    //! - **`gcd`**: small known values and the zero cases.

    use super::*;

    fn naive_is_prime(n: u64) -> bool {
        n >= 2 && (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
    }

    // ── BitSieve ────────────────────────────────────────────────────

    #[test]
    fn bitsieve_new_all_set() {
        let bs = BitSieve::new_all_set(100);
        assert_eq!(bs.len(), 100);
        assert_eq!(bs.count_ones(), 100);
        assert!((0..100).all(|i| bs.get(i)));
    }

    #[test]
    fn bitsieve_word_boundaries() {
        let mut bs = BitSieve::new_all_clear(200);
        for &i in &[0usize, 63, 64, 127, 128, 199] {
            bs.set(i);
        }
        assert_eq!(bs.count_ones(), 6);
        assert!(bs.get(63) && bs.get(64) && !bs.get(65));
        bs.clear(64);
        assert!(!bs.get(64));
        assert_eq!(
            bs.iter_set_bits().collect::<Vec<_>>(),
            vec![0, 63, 127, 128, 199]
        );
    }

    /// len = 65 needs two words; the second may only have bit 0 set.
    #[test]
    fn bitsieve_padding_stays_clear() {
        let bs = BitSieve::new_all_set(65);
        assert_eq!(bs.count_ones(), 65);
        assert_eq!(bs.words().len(), 2);
        assert_eq!(bs.words()[1], 1);
    }

    #[test]
    fn bitsieve_from_words_rejects_bad_shapes() {
        assert!(BitSieve::from_words(vec![0, 0], 65).is_some());
        assert!(BitSieve::from_words(vec![0], 65).is_none());
        assert!(BitSieve::from_words(vec![0, 0b10], 65).is_none());
    }

    #[test]
    fn bitsieve_empty() {
        let bs = BitSieve::new_all_set(0);
        assert!(bs.is_empty());
        assert_eq!(bs.count_ones(), 0);
        assert_eq!(bs.iter_set_bits().count(), 0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn bitsieve_get_past_len_panics() {
        BitSieve::new_all_set(10).get(10);
    }

    // ── build_sieve ─────────────────────────────────────────────────

    #[test]
    fn build_sieve_matches_trial_division() {
        let sieve = build_sieve(10_000);
        assert_eq!(sieve.len(), 10_001);
        for n in 0..=10_000u64 {
            assert_eq!(sieve.get(n as usize), naive_is_prime(n), "n = {}", n);
        }
    }

    #[test]
    fn build_sieve_known_prime_counts() {
        assert_eq!(build_sieve(100).count_ones(), 25);
        assert_eq!(build_sieve(1_000).count_ones(), 168);
        assert_eq!(build_sieve(10_000).count_ones(), 1229);
        assert_eq!(build_sieve(100_000).count_ones(), 9592);
        assert_eq!(build_sieve(DEFAULT_SIEVE_LIMIT).count_ones(), 78498);
    }

    #[test]
    fn build_sieve_tiny_limits() {
        assert_eq!(build_sieve(0).count_ones(), 0);
        assert_eq!(build_sieve(1).count_ones(), 0);
        assert_eq!(build_sieve(2).iter_set_bits().collect::<Vec<_>>(), vec![2]);
        assert_eq!(
            build_sieve(10).iter_set_bits().collect::<Vec<_>>(),
            vec![2, 3, 5, 7]
        );
    }

    /// Squares of primes straddling a word boundary must be cleared.
    #[test]
    fn build_sieve_clears_prime_squares() {
        let sieve = build_sieve(1_000);
        for p in [3usize, 5, 7, 11, 13, 17, 19, 23, 29, 31] {
            assert!(!sieve.get(p * p), "{}^2 marked prime", p);
        }
    }

    // ── Artifact I/O ────────────────────────────────────────────────

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sieve.bin");
        let sieve = build_sieve(5_000);
        save(&path, &sieve).unwrap();
        assert!(!path.with_extension("tmp").exists());
        let loaded = load(&path).unwrap();
        assert_eq!(loaded, sieve);
    }

    #[test]
    fn load_missing_file_is_sieve_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, CountError::SieveMissing { .. }));
    }

    #[test]
    fn load_detects_tampering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sieve.bin");
        save(&path, &build_sieve(1_000)).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        // Flip bit 9 of the payload: marks 9 as prime.
        bytes[HEADER_LEN + 1] ^= 0b10;
        fs::write(&path, &bytes).unwrap();

        match load(&path).unwrap_err() {
            CountError::SieveCorrupt { reason, .. } => assert!(reason.contains("checksum")),
            other => panic!("expected SieveCorrupt, got {:?}", other),
        }
    }

    #[test]
    fn load_detects_truncation_and_bad_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sieve.bin");
        save(&path, &build_sieve(1_000)).unwrap();
        let bytes = fs::read(&path).unwrap();

        fs::write(&path, &bytes[..bytes.len() - 8]).unwrap();
        assert!(matches!(
            load(&path).unwrap_err(),
            CountError::SieveCorrupt { .. }
        ));

        fs::write(&path, b"not a sieve at all, just some text padding it out").unwrap();
        assert!(matches!(
            load(&path).unwrap_err(),
            CountError::SieveCorrupt { .. }
        ));
    }

    // ── gcd / isqrt ─────────────────────────────────────────────────

    #[test]
    fn gcd_known_values() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(17, 30), 1);
        assert_eq!(gcd(30, 42), 6);
        assert_eq!(gcd(0, 42), 42);
        assert_eq!(gcd(42, 0), 42);
        assert_eq!(gcd(0, 0), 0);
        assert_eq!(gcd(1 << 40, 1 << 12), 1 << 12);
    }

    #[test]
    fn isqrt_boundaries() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(99), 9);
        assert_eq!(isqrt(100), 10);
        assert_eq!(isqrt(1_000_000_000_000), 1_000_000);
        assert_eq!(isqrt(u64::MAX), u32::MAX as u64);
    }
}
