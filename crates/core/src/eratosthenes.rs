//! # Sieve of Eratosthenes
//!
//! Sequential bitset sieve over `2..=limit`. The driver uses it to size
//! value-bounded runs up front; tests use it as ground truth.

const WORD_BITS: usize = u64::BITS as usize;

/// Integer square root, rounded down
pub fn isqrt(n: u64) -> u64 {
    let mut root = (n as f64).sqrt() as u64;
    while root.checked_mul(root).map_or(true, |sq| sq > n) {
        root -= 1;
    }
    while (root + 1).checked_mul(root + 1).is_some_and(|sq| sq <= n) {
        root += 1;
    }
    root
}

/// Set of primes up to a fixed limit
#[derive(Debug, Clone)]
pub struct Eratosthenes {
    limit: usize,
    words: Vec<u64>,
}

impl Eratosthenes {
    /// Sieve every integer in `2..=limit`. A limit below 2 yields the empty set.
    pub fn new(limit: usize) -> Self {
        let mut sieve = Self {
            limit,
            words: vec![0; limit / WORD_BITS + 1],
        };
        if limit < 2 {
            return sieve;
        }

        for n in 2..=limit {
            sieve.set(n);
        }

        let root = isqrt(limit as u64) as usize;
        for p in 2..=root {
            if !sieve.contains(p) {
                continue;
            }
            let mut k = p * p;
            while k <= limit {
                sieve.clear(k);
                k += p;
            }
        }

        sieve
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_prime(&self, n: u64) -> bool {
        usize::try_from(n).is_ok_and(|n| n <= self.limit && self.contains(n))
    }

    /// Primes in ascending order
    pub fn primes(&self) -> impl Iterator<Item = u64> + '_ {
        (2..=self.limit)
            .filter(move |&n| self.contains(n))
            .map(|n| n as u64)
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Smallest prime strictly greater than `n` within the limit
    pub fn next_prime_after(&self, n: u64) -> Option<u64> {
        let start = usize::try_from(n).ok()?.checked_add(1)?;
        (start.max(2)..=self.limit)
            .find(|&k| self.contains(k))
            .map(|k| k as u64)
    }

    fn contains(&self, n: usize) -> bool {
        self.words[n / WORD_BITS] & (1 << (n % WORD_BITS)) != 0
    }

    fn set(&mut self, n: usize) {
        self.words[n / WORD_BITS] |= 1 << (n % WORD_BITS);
    }

    fn clear(&mut self, n: usize) {
        self.words[n / WORD_BITS] &= !(1 << (n % WORD_BITS));
    }
}

/// Number of primes `<= limit`
pub fn prime_count(limit: usize) -> usize {
    Eratosthenes::new(limit).count()
}
