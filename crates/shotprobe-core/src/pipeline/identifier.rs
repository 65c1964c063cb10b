//! Random candidate identifiers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Characters an identifier is drawn from.
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Default identifier length used by the screenshot host.
pub const DEFAULT_ID_LENGTH: usize = 6;

/// Generates fixed-length identifiers sampled uniformly with replacement.
pub struct IdGenerator {
    length: usize,
    rng: StdRng,
}

impl IdGenerator {
    /// Entropy-seeded generator.
    pub fn new(length: usize) -> Self {
        Self {
            length,
            rng: StdRng::from_entropy(),
        }
    }

    /// Generator that yields the same sequence for the same seed.
    pub fn from_seed(length: usize, seed: u64) -> Self {
        Self {
            length,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded when `seed` is set, entropy-seeded otherwise.
    pub fn with_optional_seed(length: usize, seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(length, seed),
            None => Self::new(length),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Next identifier in the sequence.
    pub fn next_id(&mut self) -> String {
        generate_with(&mut self.rng, self.length)
    }
}

/// Draw one identifier of `length` characters from `rng`.
///
/// Stateless apart from the caller's RNG, so any number of callers can use
/// their own RNGs concurrently.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_and_alphabet() {
        let mut generator = IdGenerator::new(DEFAULT_ID_LENGTH);
        for _ in 0..200 {
            let id = generator.next_id();
            assert_eq!(id.len(), DEFAULT_ID_LENGTH);
            assert!(id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_seeded_sequence_is_reproducible() {
        let mut a = IdGenerator::from_seed(6, 42);
        let mut b = IdGenerator::from_seed(6, 42);
        let first: Vec<String> = (0..20).map(|_| a.next_id()).collect();
        let second: Vec<String> = (0..20).map(|_| b.next_id()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = IdGenerator::from_seed(6, 1);
        let mut b = IdGenerator::from_seed(6, 2);
        let first: Vec<String> = (0..10).map(|_| a.next_id()).collect();
        let second: Vec<String> = (0..10).map(|_| b.next_id()).collect();
        assert_ne!(first, second);
    }

    #[test]
    fn test_custom_length() {
        let mut generator = IdGenerator::with_optional_seed(8, Some(7));
        assert_eq!(generator.length(), 8);
        assert_eq!(generator.next_id().len(), 8);
    }

    #[test]
    fn test_generate_with_thread_rng() {
        let id = generate_with(&mut rand::thread_rng(), 4);
        assert_eq!(id.len(), 4);
    }
}
