//! Position encoding: pipe-separated piece placements.
//!
//! `<token><x>,<y>[+]|<token><x>,<y>[+]|…` — the `+` suffix marks a piece
//! that retains a special privilege (pawn double-push, castling right).
//! Coordinates are signed so the board is effectively unbounded.

use crate::error::NotationError;
use crate::pieces::{self, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coord {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedPiece {
    pub long_name: &'static str,
    pub side: Side,
    pub at: Coord,
    /// Pawn double-push or castling right still available from here.
    pub special_right: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Position(pub Vec<PlacedPiece>);

pub fn encode(position: &Position) -> Result<String, NotationError> {
    let mut entries = Vec::with_capacity(position.0.len());
    for piece in &position.0 {
        let token = pieces::token_for(piece.long_name, piece.side)?;
        let suffix = if piece.special_right { "+" } else { "" };
        entries.push(format!("{token}{},{}{suffix}", piece.at.x, piece.at.y));
    }
    Ok(entries.join("|"))
}

pub fn parse(s: &str) -> Result<Position, NotationError> {
    if s.trim().is_empty() {
        return Ok(Position::default());
    }
    let mut pieces_out = Vec::new();
    for entry in s.split('|') {
        pieces_out.push(parse_entry(entry)?);
    }
    Ok(Position(pieces_out))
}

fn parse_entry(entry: &str) -> Result<PlacedPiece, NotationError> {
    let bad = || NotationError::MalformedPosition(entry.to_string());
    let token_end = entry
        .find(|c: char| !c.is_ascii_alphabetic())
        .ok_or_else(bad)?;
    let (token, rest) = entry.split_at(token_end);
    if token.is_empty() {
        return Err(bad());
    }
    let (name, side) = pieces::name_for(token)?;
    let (coords, special_right) = match rest.strip_suffix('+') {
        Some(stripped) => (stripped, true),
        None => (rest, false),
    };
    let (x_str, y_str) = coords.split_once(',').ok_or_else(bad)?;
    let x: i64 = x_str
        .parse()
        .map_err(|_| NotationError::NonIntegerCoordinate(entry.to_string()))?;
    let y: i64 = y_str
        .parse()
        .map_err(|_| NotationError::NonIntegerCoordinate(entry.to_string()))?;
    Ok(PlacedPiece {
        long_name: name,
        side,
        at: Coord { x, y },
        special_right,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Position {
        Position(vec![
            PlacedPiece {
                long_name: "king",
                side: Side::White,
                at: Coord { x: 5, y: 1 },
                special_right: true,
            },
            PlacedPiece {
                long_name: "pawn",
                side: Side::Black,
                at: Coord { x: -3, y: -12 },
                special_right: false,
            },
        ])
    }

    #[test]
    fn test_encode_then_parse_round_trips() {
        let encoded = encode(&sample()).unwrap();
        assert_eq!(encoded, "K5,1+|p-3,-12");
        let parsed = parse(&encoded).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_empty_position_round_trips() {
        assert_eq!(parse("").unwrap(), Position::default());
        assert_eq!(encode(&Position::default()).unwrap(), "");
    }

    #[test]
    fn test_negative_coordinates_allow_unbounded_board() {
        let pos = parse("q-999999,123456").unwrap();
        assert_eq!(pos.0[0].at, Coord { x: -999_999, y: 123_456 });
    }

    #[test]
    fn test_non_integer_coordinate_is_rejected() {
        assert!(parse("Kx,y").is_err());
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        assert!(parse("Zz5,5").is_err());
    }
}
