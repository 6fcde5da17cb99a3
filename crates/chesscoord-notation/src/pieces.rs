//! The piece dictionary: a fixed mapping between long piece names and
//! 1–3 letter tokens. Case encodes color — white tokens are uppercase,
//! black tokens lowercase — so the dictionary itself only needs to know
//! one spelling per piece kind.

use crate::error::NotationError;

/// Color as seen by the notation layer. Kept separate from the protocol
/// crate's `Color` so this crate has no dependency on it — the codec is
/// pure and self-contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    White,
    Black,
}

/// `(long_name, base_token)`. The base token is written uppercase for
/// `Side::White` and lowercase for `Side::Black`. Order is lookup order,
/// not load-bearing, but longer tokens are listed first so prefix
/// matching during parse never stops early (`"hawk"` must not shadow
/// `"ha"` if such a token existed).
const DICTIONARY: &[(&str, &str)] = &[
    ("pawn", "P"),
    ("knight", "N"),
    ("bishop", "B"),
    ("rook", "R"),
    ("queen", "Q"),
    ("king", "K"),
    ("amazon", "AM"),
    ("chancellor", "CH"),
    ("archbishop", "AR"),
    ("centaur", "CE"),
    ("royalcentaur", "RC"),
    ("hawk", "HA"),
    ("guard", "GU"),
    ("knightrider", "NR"),
];

fn apply_case(token: &str, side: Side) -> String {
    match side {
        Side::White => token.to_uppercase(),
        Side::Black => token.to_lowercase(),
    }
}

/// Looks up the token for a long piece name under the given side.
pub fn token_for(long_name: &str, side: Side) -> Result<String, NotationError> {
    DICTIONARY
        .iter()
        .find(|(name, _)| *name == long_name)
        .map(|(_, token)| apply_case(token, side))
        .ok_or_else(|| NotationError::UnknownPieceName(long_name.to_string()))
}

/// Recovers `(long_name, side)` from a token. Side is determined by
/// case: a token is either entirely uppercase (white) or entirely
/// lowercase (black) — mixed case is not a token this dictionary knows.
pub fn name_for(token: &str) -> Result<(&'static str, Side), NotationError> {
    let is_upper = token.chars().all(|c| c.is_ascii_uppercase());
    let is_lower = token.chars().all(|c| c.is_ascii_lowercase());
    let side = if is_upper {
        Side::White
    } else if is_lower {
        Side::Black
    } else {
        return Err(NotationError::UnknownPieceToken(token.to_string()));
    };
    let upper = token.to_uppercase();
    DICTIONARY
        .iter()
        .find(|(_, base)| *base == upper)
        .map(|(name, _)| (*name, side))
        .ok_or_else(|| NotationError::UnknownPieceToken(token.to_string()))
}
