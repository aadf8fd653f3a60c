//! Workload Key Generation
//!
//! Pronounceable three-letter keys for benchmark clients. Unprefixed keys
//! alternate consonant-vowel-consonant; a client's single-letter label
//! replaces the leading consonant so each client's writes are
//! recognizable in the merged logs. The generator is seeded for
//! reproducible workloads and never hands out the same key twice.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use thiserror::Error;

const VOWELS: &[u8] = b"AEIOUY";
const CONSONANTS: &[u8] = b"BCDFGHJKLMNPQRSTVWXZ";

/// Re-rolls allowed before giving up on a unique key.
const MAX_TRIES: usize = 1000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkloadError {
    /// The three-letter key space for this shape ran dry
    #[error("could not generate a unique key after {0} tries")]
    KeySpaceExhausted(usize),
}

/// Seeded generator of unique workload keys.
pub struct KeyGen {
    rng: StdRng,
    issued: HashSet<String>,
}

impl KeyGen {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        KeyGen {
            rng: StdRng::from_seed(seed),
            issued: HashSet::new(),
        }
    }

    fn vowel(&mut self) -> char {
        VOWELS[self.rng.gen_range(0..VOWELS.len())] as char
    }

    fn consonant(&mut self) -> char {
        CONSONANTS[self.rng.gen_range(0..CONSONANTS.len())] as char
    }

    fn unique(&mut self, mut candidate: impl FnMut(&mut Self) -> String) -> Result<String, WorkloadError> {
        for _ in 0..MAX_TRIES {
            let key = candidate(self);
            if self.issued.insert(key.clone()) {
                return Ok(key);
            }
        }
        Err(WorkloadError::KeySpaceExhausted(MAX_TRIES))
    }

    /// A fresh consonant-vowel-consonant key.
    pub fn generate(&mut self) -> Result<String, WorkloadError> {
        self.unique(|g| format!("{}{}{}", g.consonant(), g.vowel(), g.consonant()))
    }

    /// A fresh key starting with the client's label.
    pub fn generate_prefixed(&mut self, label: char) -> Result<String, WorkloadError> {
        let label = label.to_ascii_uppercase();
        self.unique(move |g| format!("{}{}{}", label, g.vowel(), g.consonant()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unprefixed_shape() {
        let mut keygen = KeyGen::from_seed([7u8; 32]);
        let key = keygen.generate().unwrap();
        let chars: Vec<char> = key.chars().collect();

        assert_eq!(chars.len(), 3);
        assert!(CONSONANTS.contains(&(chars[0] as u8)));
        assert!(VOWELS.contains(&(chars[1] as u8)));
        assert!(CONSONANTS.contains(&(chars[2] as u8)));
    }

    #[test]
    fn test_prefixed_shape() {
        let mut keygen = KeyGen::from_seed([7u8; 32]);
        let key = keygen.generate_prefixed('a').unwrap();
        let chars: Vec<char> = key.chars().collect();

        assert_eq!(chars[0], 'A');
        assert!(VOWELS.contains(&(chars[1] as u8)));
        assert!(CONSONANTS.contains(&(chars[2] as u8)));
    }

    #[test]
    fn test_keys_never_repeat() {
        // Draw half the prefixed key space; every draw must be distinct
        let mut keygen = KeyGen::from_seed([42u8; 32]);
        let mut seen = HashSet::new();
        for _ in 0..60 {
            let key = keygen.generate_prefixed('B').unwrap();
            assert!(seen.insert(key));
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = KeyGen::from_seed([9u8; 32]);
        let mut b = KeyGen::from_seed([9u8; 32]);
        for _ in 0..10 {
            assert_eq!(a.generate().unwrap(), b.generate().unwrap());
        }
    }
}
