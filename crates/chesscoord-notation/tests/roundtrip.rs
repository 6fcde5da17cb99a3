use chesscoord_notation::header::GameHeader;
use chesscoord_notation::moves::Move;
use chesscoord_notation::pieces::Side;
use chesscoord_notation::position::{Coord, PlacedPiece, Position};
use chesscoord_notation::record::{self, GameRecord};

fn starting_position() -> Position {
    let mut pieces = Vec::new();
    for x in 1..=8 {
        pieces.push(PlacedPiece {
            long_name: "pawn",
            side: Side::White,
            at: Coord { x, y: 2 },
            special_right: true,
        });
        pieces.push(PlacedPiece {
            long_name: "pawn",
            side: Side::Black,
            at: Coord { x, y: 7 },
            special_right: true,
        });
    }
    pieces.push(PlacedPiece {
        long_name: "king",
        side: Side::White,
        at: Coord { x: 5, y: 1 },
        special_right: true,
    });
    pieces.push(PlacedPiece {
        long_name: "king",
        side: Side::Black,
        at: Coord { x: 5, y: 8 },
        special_right: true,
    });
    Position(pieces)
}

fn fools_mate_record() -> GameRecord {
    GameRecord {
        header: GameHeader {
            tags: vec![
                ("Event".to_string(), "Rated Classical".to_string()),
                ("White".to_string(), "alice".to_string()),
                ("Black".to_string(), "bob".to_string()),
                ("TimeControl".to_string(), "300+2".to_string()),
                ("Result".to_string(), "0-1".to_string()),
                ("Termination".to_string(), "checkmate".to_string()),
            ],
            turn: Side::White,
            en_passant: None,
            move_rule: Some((0, 100)),
            fullmove: 3,
            promotion_ranks: None,
            win_conditions: Some("checkmate".to_string()),
            other_rules: None,
            position: starting_position(),
        },
        moves: vec![
            Move {
                from: Coord { x: 6, y: 2 },
                to: Coord { x: 6, y: 3 },
                promotion: None,
                capture: false,
                check: false,
                checkmate: false,
            },
            Move {
                from: Coord { x: 5, y: 7 },
                to: Coord { x: 5, y: 5 },
                promotion: None,
                capture: false,
                check: false,
                checkmate: false,
            },
            Move {
                from: Coord { x: 7, y: 2 },
                to: Coord { x: 7, y: 4 },
                promotion: None,
                capture: false,
                check: false,
                checkmate: false,
            },
            Move {
                from: Coord { x: 4, y: 8 },
                to: Coord { x: 8, y: 4 },
                promotion: None,
                capture: false,
                check: false,
                checkmate: true,
            },
        ],
    }
}

#[test]
fn full_game_record_round_trips_through_compact_transcript() {
    let record = fools_mate_record();
    let transcript = record::encode(&record, true).expect("encode should succeed");
    let parsed = record::parse(&transcript, true).expect("parse should succeed");
    assert_eq!(parsed, record);
}

#[test]
fn full_mode_preserves_checkmate_annotation_across_round_trip() {
    let record = fools_mate_record();
    let transcript = record::encode(&record, false).expect("encode should succeed");
    let parsed = record::parse(&transcript, false).expect("parse should succeed");
    assert!(parsed.moves.last().unwrap().checkmate);
}

#[test]
fn compact_mode_drops_checkmate_annotation() {
    let record = fools_mate_record();
    let transcript = record::encode(&record, true).expect("encode should succeed");
    assert!(!transcript.contains('#'));
}

#[test]
fn tags_survive_transcript_round_trip_in_order() {
    let record = fools_mate_record();
    let transcript = record::encode(&record, true).unwrap();
    let parsed = record::parse(&transcript, true).unwrap();
    assert_eq!(parsed.header.tags, record.header.tags);
    assert_eq!(parsed.header.tag("Result"), Some("0-1"));
}

#[test]
fn malformed_position_with_non_integer_coordinate_is_rejected() {
    let bad_transcript = "[Event: X]\n\nw 1 Ka,b\n\n";
    assert!(record::parse(bad_transcript, true).is_err());
}
