//! Substitute-name generation.
//!
//! A seed is written as a bijective numeral: the least significant digit
//! comes from the leading alphabet, every further digit from the continuation
//! alphabet. Each seed maps to exactly one name and every name length is
//! reached, so the sequence never runs out and never repeats.

use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const DIGITS: &str = "0123456789";
const PUNCTUATION: &str = "_$";

/// Which characters generated names are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphabetPolicy {
    /// Uppercase first character, mixed-case and digit continuation. Generated
    /// names never start lowercase, so they cannot collide with names picked
    /// by a local-variable minifier.
    #[default]
    Disjoint,
    /// One alphabet for every position, built from the enabled groups.
    Shared(SharedAlphabet),
}

/// Character groups making up a shared alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedAlphabet {
    /// `a-z` and `A-Z`.
    pub letters: bool,
    /// `0-9` (never in the leading position unless a prefix is set).
    pub digits: bool,
    /// `_` and `$`.
    pub punctuation: bool,
}

impl Default for SharedAlphabet {
    fn default() -> Self {
        Self {
            letters: true,
            digits: true,
            punctuation: true,
        }
    }
}

impl SharedAlphabet {
    fn chars(self) -> Vec<char> {
        let mut set = Vec::new();
        if self.letters {
            set.extend(LOWER.chars());
            set.extend(UPPER.chars());
        }
        if self.digits {
            set.extend(DIGITS.chars());
        }
        if self.punctuation {
            set.extend(PUNCTUATION.chars());
        }
        set
    }
}

/// Deterministic generator of substitute names.
///
/// The alphabets are fixed at construction; a generator never changes for
/// the lifetime of the cache that owns it.
#[derive(Debug, Clone)]
pub struct Generator {
    first: Vec<char>,
    next: Vec<char>,
    prefix: String,
}

impl Generator {
    /// Build a generator, optionally shuffling the alphabets with a seeded RNG.
    pub fn new(policy: &AlphabetPolicy, prefix: &str, shuffle_seed: Option<u64>) -> Result<Self> {
        if !prefix.is_empty() && !is_valid_prefix(prefix) {
            return Err(Error::Alphabet(format!(
                "prefix {prefix:?} is not a valid identifier start"
            )));
        }

        let mut rng = shuffle_seed.map(StdRng::seed_from_u64);
        let (first, next) = match policy {
            AlphabetPolicy::Disjoint => {
                let mut first: Vec<char> = UPPER.chars().collect();
                let mut next: Vec<char> = UPPER.chars().chain(LOWER.chars()).chain(DIGITS.chars()).collect();
                if let Some(rng) = rng.as_mut() {
                    first.shuffle(rng);
                    next.shuffle(rng);
                }
                (first, next)
            }
            AlphabetPolicy::Shared(groups) => {
                let mut set = groups.chars();
                if let Some(rng) = rng.as_mut() {
                    set.shuffle(rng);
                }
                // A prefix already starts the identifier, so any character
                // may follow it.
                let first = if prefix.is_empty() {
                    set.iter().copied().filter(|c| !c.is_ascii_digit()).collect()
                } else {
                    set.clone()
                };
                (first, set)
            }
        };

        if first.is_empty() {
            return Err(Error::Alphabet("no characters can start a name".to_string()));
        }
        if next.is_empty() {
            return Err(Error::Alphabet("alphabet is empty".to_string()));
        }

        Ok(Self {
            first,
            next,
            prefix: prefix.to_string(),
        })
    }

    /// The name for `seed`.
    #[must_use]
    pub fn generate(&self, seed: u64) -> String {
        let first_len = self.first.len() as u64;
        let next_len = self.next.len() as u64;

        let mut name = String::with_capacity(self.prefix.len() + 4);
        name.push_str(&self.prefix);

        let mut rest = seed;
        let digit = rest % first_len;
        name.push(self.first[digit as usize]);
        rest = (rest - digit) / first_len;

        while rest > 0 {
            let digit = (rest - 1) % next_len;
            name.push(self.next[digit as usize]);
            rest = (rest - (digit + 1)) / next_len;
        }
        name
    }

    /// Characters allowed in the first generated position.
    #[must_use]
    pub fn leading(&self) -> &[char] {
        &self.first
    }

    /// Characters allowed in every later position.
    #[must_use]
    pub fn continuation(&self) -> &[char] {
        &self.next
    }
}

/// The readable stand-in used in debug mode: `_$name$suffix_`.
#[must_use]
pub fn debug_name(name: &str, suffix: &str) -> String {
    format!("_${name}${suffix}_")
}

fn is_valid_prefix(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn disjoint() -> Generator {
        Generator::new(&AlphabetPolicy::Disjoint, "", None).unwrap()
    }

    #[test]
    fn test_disjoint_sequence() {
        let generator = disjoint();
        assert_eq!(generator.generate(0), "A");
        assert_eq!(generator.generate(1), "B");
        assert_eq!(generator.generate(25), "Z");
        assert_eq!(generator.generate(26), "AA");
        assert_eq!(generator.generate(27), "BA");
        assert_eq!(generator.generate(26 + 26), "AB");
        // 26 one-char names, then 26 * 62 two-char names.
        assert_eq!(generator.generate(26 + 26 * 62 - 1).len(), 2);
        assert_eq!(generator.generate(26 + 26 * 62).len(), 3);
    }

    #[test]
    fn test_names_are_unique() {
        let generator = disjoint();
        let names: HashSet<String> = (0..20_000).map(|seed| generator.generate(seed)).collect();
        assert_eq!(names.len(), 20_000);
        assert!(names.iter().all(|n| n.starts_with(|c: char| c.is_ascii_uppercase())));
    }

    #[test]
    fn test_shared_alphabet_leading_set() {
        let generator = Generator::new(&AlphabetPolicy::Shared(SharedAlphabet::default()), "", None).unwrap();
        assert_eq!(generator.leading().len(), 54);
        assert_eq!(generator.continuation().len(), 64);
        assert_eq!(generator.generate(0), "a");
        assert!(!generator.leading().contains(&'0'));

        let prefixed = Generator::new(&AlphabetPolicy::Shared(SharedAlphabet::default()), "p_", None).unwrap();
        assert_eq!(prefixed.leading().len(), 64);
        assert_eq!(prefixed.generate(0), "p_a");
    }

    #[test]
    fn test_shuffle_is_deterministic() {
        let a = Generator::new(&AlphabetPolicy::Disjoint, "", Some(7)).unwrap();
        let b = Generator::new(&AlphabetPolicy::Disjoint, "", Some(7)).unwrap();
        let c = Generator::new(&AlphabetPolicy::Disjoint, "", Some(8)).unwrap();
        let first_names = |g: &Generator| (0..100).map(|s| g.generate(s)).collect::<Vec<_>>();
        assert_eq!(first_names(&a), first_names(&b));
        assert_ne!(first_names(&a), first_names(&c));
        assert!(a.leading().iter().all(char::is_ascii_uppercase));
    }

    #[test]
    fn test_invalid_configuration() {
        let digits_only = SharedAlphabet {
            letters: false,
            digits: true,
            punctuation: false,
        };
        assert!(matches!(
            Generator::new(&AlphabetPolicy::Shared(digits_only), "", None),
            Err(Error::Alphabet(_))
        ));
        assert!(Generator::new(&AlphabetPolicy::Shared(digits_only), "n", None).is_ok());
        assert!(Generator::new(&AlphabetPolicy::Disjoint, "1x", None).is_err());
        assert!(Generator::new(&AlphabetPolicy::Disjoint, "a-b", None).is_err());
    }

    #[test]
    fn test_debug_name() {
        assert_eq!(debug_name("foo", ""), "_$foo$_");
        assert_eq!(debug_name("foo", "xyz"), "_$foo$xyz_");
    }
}
