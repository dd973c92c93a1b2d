//! Identifier generation for entries and connection registrations.

use std::fmt;

/// Alphabet used for generated ids: URL-safe and easy to read in logs.
pub const DEFAULT_ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Default generated id length.
pub const DEFAULT_ID_LENGTH: usize = 10;

/// Produces opaque, collision-resistant string identifiers.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random ids from the `nanoid` crate.
#[derive(Clone)]
pub struct NanoIdGenerator {
    alphabet: Vec<char>,
    length: usize,
}

impl NanoIdGenerator {
    /// Use a custom alphabet and length.
    ///
    /// An empty alphabet or zero length falls back to the defaults.
    pub fn new(alphabet: &str, length: usize) -> Self {
        let alphabet: Vec<char> = if alphabet.is_empty() {
            DEFAULT_ALPHABET.chars().collect()
        } else {
            alphabet.chars().collect()
        };
        let length = if length == 0 { DEFAULT_ID_LENGTH } else { length };
        Self { alphabet, length }
    }
}

impl Default for NanoIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHABET, DEFAULT_ID_LENGTH)
    }
}

impl fmt::Debug for NanoIdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NanoIdGenerator")
            .field("alphabet_len", &self.alphabet.len())
            .field("length", &self.length)
            .finish()
    }
}

impl IdGenerator for NanoIdGenerator {
    fn generate(&self) -> String {
        nanoid::format(nanoid::rngs::default, &self.alphabet, self.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generates_ids_of_configured_length_from_alphabet() {
        let generator = NanoIdGenerator::new("ab", 16);
        let id = generator.generate();
        assert_eq!(id.chars().count(), 16);
        assert!(id.chars().all(|c| c == 'a' || c == 'b'));
    }

    #[test]
    fn default_ids_do_not_collide_in_practice() {
        let generator = NanoIdGenerator::default();
        let ids: HashSet<String> = (0..1000).map(|_| generator.generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn empty_settings_fall_back_to_defaults() {
        let id = NanoIdGenerator::new("", 0).generate();
        assert_eq!(id.len(), DEFAULT_ID_LENGTH);
    }
}
