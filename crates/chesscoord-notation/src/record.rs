//! A complete game record: tag block, metadata/position line, move list.
//! `encode` and `parse` are each other's inverse modulo whitespace
//! normalization and whichever annotations the encoder was asked to
//! drop (§4.3 "round-trip").

use crate::error::NotationError;
use crate::header::{self, GameHeader};
use crate::moves::{self, Move};

#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub header: GameHeader,
    pub moves: Vec<Move>,
}

/// Renders a full transcript. `compact` controls the move-list
/// annotations exactly as [`moves::encode`] does.
pub fn encode(record: &GameRecord, compact: bool) -> Result<String, NotationError> {
    let tags = header::encode_tags(&record.header.tags);
    let metadata = header::encode_metadata_line(&record.header)?;
    let move_list = record
        .moves
        .iter()
        .map(|m| moves::encode(m, compact))
        .collect::<Vec<_>>()
        .join(" ");
    Ok(format!("{tags}\n\n{metadata}\n\n{move_list}"))
}

/// Parses a transcript produced by [`encode`]. `compact` must match the
/// mode the transcript was encoded with.
pub fn parse(s: &str, compact: bool) -> Result<GameRecord, NotationError> {
    let mut blocks = s.splitn(3, "\n\n");
    let bad = || NotationError::MalformedHeader(s.to_string());
    let tag_block = blocks.next().ok_or_else(bad)?;
    let metadata_line = blocks.next().ok_or_else(bad)?;
    let move_block = blocks.next().unwrap_or("");

    let tags = header::parse_tags(tag_block)?;
    let mut parsed_header = header::parse_metadata_line(metadata_line.trim())?;
    parsed_header.tags = tags;

    let move_block = move_block.trim();
    let parsed_moves = if move_block.is_empty() {
        Vec::new()
    } else {
        move_block
            .split_whitespace()
            .map(|tok| moves::parse(tok, compact))
            .collect::<Result<Vec<_>, _>>()?
    };

    Ok(GameRecord {
        header: parsed_header,
        moves: parsed_moves,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::Move;
    use crate::pieces::Side;
    use crate::position::{Coord, PlacedPiece, Position};

    fn sample_record() -> GameRecord {
        GameRecord {
            header: GameHeader {
                tags: vec![
                    ("Event".to_string(), "Casual Game".to_string()),
                    ("Result".to_string(), "1-0".to_string()),
                ],
                turn: Side::White,
                en_passant: None,
                move_rule: None,
                fullmove: 3,
                promotion_ranks: None,
                win_conditions: None,
                other_rules: None,
                position: Position(vec![PlacedPiece {
                    long_name: "king",
                    side: Side::White,
                    at: Coord { x: 5, y: 1 },
                    special_right: true,
                }]),
            },
            moves: vec![
                Move {
                    from: Coord { x: 5, y: 2 },
                    to: Coord { x: 5, y: 4 },
                    promotion: None,
                    capture: false,
                    check: false,
                    checkmate: false,
                },
                Move {
                    from: Coord { x: 4, y: 7 },
                    to: Coord { x: 4, y: 5 },
                    promotion: None,
                    capture: false,
                    check: false,
                    checkmate: false,
                },
            ],
        }
    }

    #[test]
    fn test_full_record_round_trips_compact() {
        let encoded = encode(&sample_record(), true).unwrap();
        let parsed = parse(&encoded, true).unwrap();
        assert_eq!(parsed, sample_record());
    }

    #[test]
    fn test_empty_move_list_round_trips() {
        let mut record = sample_record();
        record.moves.clear();
        let encoded = encode(&record, true).unwrap();
        let parsed = parse(&encoded, true).unwrap();
        assert_eq!(parsed.moves, Vec::new());
    }

    #[test]
    fn test_encoded_record_has_three_blank_line_separated_blocks() {
        let encoded = encode(&sample_record(), true).unwrap();
        assert_eq!(encoded.split("\n\n").count(), 3);
    }
}
