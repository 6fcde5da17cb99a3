//! 5-character game ids, uniformly sampled from `[0-9a-z]` (§4.1.1).

use rand::Rng;
use std::collections::HashSet;
use std::fmt;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameId(String);

impl GameId {
    /// Wraps an id string received off the wire (a subscription tag, a
    /// resync payload) for registry lookup. Does not validate shape —
    /// a lookup miss on a malformed id just behaves like "not found".
    pub fn new(s: impl Into<String>) -> GameId {
        GameId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn sample() -> GameId {
        let mut rng = rand::rng();
        let s: String = (0..ID_LEN)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        GameId(s)
    }

    /// Samples a fresh id, retrying on collision with `existing`.
    pub fn generate(existing: &HashSet<GameId>) -> GameId {
        loop {
            let candidate = Self::sample();
            if !existing.contains(&candidate) {
                return candidate;
            }
        }
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_returns_five_char_alphanumeric_id() {
        let existing = HashSet::new();
        let id = GameId::generate(&existing);
        assert_eq!(id.as_str().len(), ID_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_avoids_collision_with_existing() {
        let mut existing = HashSet::new();
        let first = GameId::generate(&existing);
        existing.insert(first.clone());
        let second = GameId::generate(&existing);
        assert_ne!(first, second);
    }
}
