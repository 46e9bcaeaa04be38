//! Candidate code generation
//!
//! A candidate is a fixed prefix followed by `suffix_len` characters drawn
//! independently and uniformly, with replacement, from an [`Alphabet`].
//! Nothing prevents two calls from producing the same code.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Mutex;

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const UPPERCASE_DIGITS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Character set for the random suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alphabet {
    /// `A-Z`
    #[default]
    Upper,
    /// `A-Z0-9`
    UpperDigits,
}

impl Alphabet {
    pub fn chars(&self) -> &'static [u8] {
        match self {
            Self::Upper => UPPERCASE,
            Self::UpperDigits => UPPERCASE_DIGITS,
        }
    }

    pub fn contains(&self, c: char) -> bool {
        c.is_ascii() && self.chars().contains(&(c as u8))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::UpperDigits => "upper_digits",
        }
    }
}

impl FromStr for Alphabet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upper" | "uppercase" => Ok(Self::Upper),
            "upper_digits" | "uppercase_digits" | "alnum" => Ok(Self::UpperDigits),
            other => Err(format!("Unknown alphabet: {other}")),
        }
    }
}

impl std::fmt::Display for Alphabet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds candidate codes from a prefix and a random suffix
///
/// With a seed the generator draws from its own `ChaCha8Rng`, so a run can
/// be replayed exactly. Without one it uses the thread RNG.
#[derive(Debug)]
pub struct CodeGenerator {
    prefix: String,
    alphabet: Alphabet,
    suffix_len: usize,
    seeded: Option<Mutex<ChaCha8Rng>>,
}

impl CodeGenerator {
    pub fn new(prefix: impl Into<String>, alphabet: Alphabet, suffix_len: usize) -> Self {
        Self {
            prefix: prefix.into(),
            alphabet,
            suffix_len,
            seeded: None,
        }
    }

    /// Use a deterministic RNG seeded with `seed`
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seeded = Some(Mutex::new(ChaCha8Rng::seed_from_u64(seed)));
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    pub fn suffix_len(&self) -> usize {
        self.suffix_len
    }

    /// Total length of every generated code
    pub fn code_len(&self) -> usize {
        self.prefix.len() + self.suffix_len
    }

    /// Number of distinct codes this generator can produce
    pub fn keyspace(&self) -> u128 {
        (self.alphabet.chars().len() as u128).saturating_pow(self.suffix_len as u32)
    }

    /// Generate one candidate code
    pub fn generate(&self) -> String {
        match &self.seeded {
            Some(rng) => match rng.lock() {
                Ok(mut rng) => self.generate_with(&mut *rng),
                Err(poisoned) => self.generate_with(&mut *poisoned.into_inner()),
            },
            None => self.generate_with(&mut rand::thread_rng()),
        }
    }

    /// Generate one candidate code from the given RNG
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let chars = self.alphabet.chars();
        let mut code = String::with_capacity(self.code_len());
        code.push_str(&self.prefix);
        for _ in 0..self.suffix_len {
            code.push(chars[rng.gen_range(0..chars.len())] as char);
        }
        code
    }

    /// Check that `code` has this generator's shape
    pub fn matches(&self, code: &str) -> bool {
        code.len() == self.code_len()
            && code.starts_with(&self.prefix)
            && code[self.prefix.len()..].chars().all(|c| self.alphabet.contains(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_shape() {
        let generator = CodeGenerator::new("K6GLNG7", Alphabet::Upper, 5);
        let re = regex::Regex::new(r"^K6GLNG7[A-Z]{5}$").unwrap();

        for _ in 0..200 {
            let code = generator.generate();
            assert_eq!(code.len(), 12);
            assert!(re.is_match(&code), "unexpected code {code}");
        }
    }

    #[test]
    fn test_seeded_generator_is_reproducible() {
        let a = CodeGenerator::new("X", Alphabet::UpperDigits, 8).with_seed(42);
        let b = CodeGenerator::new("X", Alphabet::UpperDigits, 8).with_seed(42);

        let first: Vec<String> = (0..10).map(|_| a.generate()).collect();
        let second: Vec<String> = (0..10).map(|_| b.generate()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_suffix() {
        let generator = CodeGenerator::new("FIXED", Alphabet::Upper, 0);
        assert_eq!(generator.generate(), "FIXED");
        assert_eq!(generator.keyspace(), 1);
    }

    #[test]
    fn test_matches_rejects_wrong_shape() {
        let generator = CodeGenerator::new("AB", Alphabet::Upper, 3);
        assert!(generator.matches("ABXYZ"));
        assert!(!generator.matches("ABXY"));
        assert!(!generator.matches("ACXYZ"));
        assert!(!generator.matches("ABXY1"));
    }

    #[test]
    fn test_keyspace() {
        assert_eq!(CodeGenerator::new("", Alphabet::Upper, 5).keyspace(), 11_881_376);
        assert_eq!(CodeGenerator::new("", Alphabet::UpperDigits, 2).keyspace(), 1_296);
    }

    #[test]
    fn test_alphabet_parse() {
        assert_eq!("upper".parse::<Alphabet>().unwrap(), Alphabet::Upper);
        assert_eq!("UPPER_DIGITS".parse::<Alphabet>().unwrap(), Alphabet::UpperDigits);
        assert!("lower".parse::<Alphabet>().is_err());
    }

    proptest! {
        #[test]
        fn prop_code_has_prefix_and_length(
            prefix in "[A-Z0-9]{0,10}",
            suffix_len in 0usize..16,
            digits in any::<bool>(),
            seed in any::<u64>(),
        ) {
            let alphabet = if digits { Alphabet::UpperDigits } else { Alphabet::Upper };
            let generator = CodeGenerator::new(prefix.clone(), alphabet, suffix_len).with_seed(seed);
            let code = generator.generate();

            prop_assert!(code.starts_with(&prefix));
            prop_assert_eq!(code.len(), prefix.len() + suffix_len);
            prop_assert!(code[prefix.len()..].chars().all(|c| alphabet.contains(c)));
            prop_assert!(generator.matches(&code));
        }
    }
}
