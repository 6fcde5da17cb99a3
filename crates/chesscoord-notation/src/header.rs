//! Header parsing: `[Key: Value]` tag lines, a blank line, then a single
//! metadata line (turn, optional en-passant square, optional move-rule
//! fraction, full-move counter, optional promotion-rank and
//! win-condition declarations, an optional other-rules JSON blob, and
//! the position), then a blank line before the move list.

use crate::error::NotationError;
use crate::moves::take_coord;
use crate::pieces::Side;
use crate::position::{self, Coord, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct GameHeader {
    /// `[Key: Value]` pairs, in file order.
    pub tags: Vec<(String, String)>,
    pub turn: Side,
    pub en_passant: Option<Coord>,
    /// `(moves_since_progress, max_moves)` — the `mvs/max` fraction.
    pub move_rule: Option<(u32, u32)>,
    pub fullmove: u32,
    pub promotion_ranks: Option<String>,
    pub win_conditions: Option<String>,
    pub other_rules: Option<serde_json::Value>,
    pub position: Position,
}

impl GameHeader {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

pub fn encode_tags(tags: &[(String, String)]) -> String {
    tags.iter()
        .map(|(k, v)| format!("[{k}: {v}]"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn parse_tags(block: &str) -> Result<Vec<(String, String)>, NotationError> {
    let mut tags = Vec::new();
    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let bad = || NotationError::MalformedHeader(line.to_string());
        let inner = line
            .strip_prefix('[')
            .and_then(|l| l.strip_suffix(']'))
            .ok_or_else(bad)?;
        let (key, value) = inner.split_once(':').ok_or_else(bad)?;
        tags.push((key.trim().to_string(), value.trim().to_string()));
    }
    Ok(tags)
}

pub fn encode_metadata_line(header: &GameHeader) -> Result<String, NotationError> {
    let mut line = String::new();
    line.push(match header.turn {
        Side::White => 'w',
        Side::Black => 'b',
    });
    if let Some(ep) = header.en_passant {
        line.push(' ');
        line.push_str(&format!("{},{}", ep.x, ep.y));
    }
    if let Some((mvs, max)) = header.move_rule {
        line.push(' ');
        line.push_str(&format!("{mvs}/{max}"));
    }
    line.push(' ');
    line.push_str(&header.fullmove.to_string());
    // Both parenthetical slots are positional — if either is present, both
    // are written (using an empty group for the absent one) so parsing
    // never has to guess which slot a lone `(...)` belongs to.
    if header.promotion_ranks.is_some() || header.win_conditions.is_some() {
        line.push_str(&format!(
            " ({})",
            header.promotion_ranks.as_deref().unwrap_or("")
        ));
        line.push_str(&format!(
            " ({})",
            header.win_conditions.as_deref().unwrap_or("")
        ));
    }
    if let Some(other) = &header.other_rules {
        line.push_str(&format!(" {other}"));
    }
    line.push(' ');
    line.push_str(&position::encode(&header.position)?);
    Ok(line)
}

fn peek_token(s: &str) -> &str {
    s.split_whitespace().next().unwrap_or("")
}

/// Consumes a leading `open ... close` group if present, returning its
/// inner content and the remainder. Returns `(None, s)` untouched if `s`
/// doesn't start with `open`. An `open` with no matching `close` is a
/// hard parse error — a truncated transcript must not be silently
/// accepted.
fn extract_delimited<'a>(
    s: &'a str,
    open: char,
    close: char,
) -> Result<(Option<String>, &'a str), NotationError> {
    let trimmed = s.trim_start();
    if !trimmed.starts_with(open) {
        return Ok((None, trimmed));
    }
    let after_open = &trimmed[open.len_utf8()..];
    match after_open.find(close) {
        Some(idx) => {
            let content = after_open[..idx].to_string();
            let remainder = after_open[idx + close.len_utf8()..].trim_start();
            Ok((Some(content), remainder))
        }
        None => Err(match open {
            '{' => NotationError::UnterminatedBrace(s.to_string()),
            '[' => NotationError::UnterminatedBracket(s.to_string()),
            _ => NotationError::MalformedHeader(s.to_string()),
        }),
    }
}

pub fn parse_metadata_line(line: &str) -> Result<GameHeader, NotationError> {
    let bad = || NotationError::MalformedHeader(line.to_string());
    let mut rest = line.trim();

    let turn = match rest.chars().next() {
        Some('w') => Side::White,
        Some('b') => Side::Black,
        _ => return Err(bad()),
    };
    rest = rest[1..].trim_start();

    let mut en_passant = None;
    let tok = peek_token(rest);
    if tok.contains(',') {
        if let Ok((coord, leftover)) = take_coord(tok) {
            if leftover.is_empty() {
                en_passant = Some(coord);
                rest = rest[tok.len()..].trim_start();
            }
        }
    }

    let mut move_rule = None;
    let tok = peek_token(rest);
    if let Some((mvs_str, max_str)) = tok.split_once('/') {
        if let (Ok(mvs), Ok(max)) = (mvs_str.parse::<u32>(), max_str.parse::<u32>()) {
            move_rule = Some((mvs, max));
            rest = rest[tok.len()..].trim_start();
        }
    }

    let tok = peek_token(rest);
    let fullmove: u32 = tok.parse().map_err(|_| bad())?;
    rest = rest[tok.len()..].trim_start();

    let (promotion_ranks, rest1) = extract_delimited(rest, '(', ')')?;
    rest = rest1;
    let (win_conditions, rest2) = extract_delimited(rest, '(', ')')?;
    rest = rest2;
    // An empty parenthetical group is the positional placeholder for "not
    // present", not a zero-length value.
    let promotion_ranks = promotion_ranks.filter(|s| !s.is_empty());
    let win_conditions = win_conditions.filter(|s| !s.is_empty());
    let (json_blob, rest3) = extract_delimited(rest, '{', '}')?;
    rest = rest3;
    let other_rules = match json_blob {
        Some(body) => Some(serde_json::from_str(&format!("{{{body}}}"))?),
        None => None,
    };

    let position = position::parse(rest.trim())?;

    Ok(GameHeader {
        tags: Vec::new(),
        turn,
        en_passant,
        move_rule,
        fullmove,
        promotion_ranks,
        win_conditions,
        other_rules,
        position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::Side;
    use crate::position::PlacedPiece;

    fn sample_position() -> Position {
        Position(vec![PlacedPiece {
            long_name: "king",
            side: Side::White,
            at: Coord { x: 5, y: 1 },
            special_right: true,
        }])
    }

    #[test]
    fn test_tags_round_trip() {
        let tags = vec![
            ("Event".to_string(), "Rated Game".to_string()),
            ("Variant".to_string(), "Classical".to_string()),
        ];
        let encoded = encode_tags(&tags);
        assert_eq!(encoded, "[Event: Rated Game]\n[Variant: Classical]");
        assert_eq!(parse_tags(&encoded).unwrap(), tags);
    }

    #[test]
    fn test_minimal_metadata_line_round_trips() {
        let header = GameHeader {
            tags: Vec::new(),
            turn: Side::White,
            en_passant: None,
            move_rule: None,
            fullmove: 1,
            promotion_ranks: None,
            win_conditions: None,
            other_rules: None,
            position: sample_position(),
        };
        let line = encode_metadata_line(&header).unwrap();
        assert_eq!(line, "w 1 K5,1+");
        let parsed = parse_metadata_line(&line).unwrap();
        assert_eq!(parsed.turn, Side::White);
        assert_eq!(parsed.fullmove, 1);
        assert_eq!(parsed.position, sample_position());
    }

    #[test]
    fn test_full_metadata_line_with_all_optional_fields() {
        let header = GameHeader {
            tags: Vec::new(),
            turn: Side::Black,
            en_passant: Some(Coord { x: 3, y: 4 }),
            move_rule: Some((12, 100)),
            fullmove: 7,
            promotion_ranks: Some("1,8".to_string()),
            win_conditions: Some("checkmate".to_string()),
            other_rules: Some(serde_json::json!({"noCastling": true})),
            position: sample_position(),
        };
        let line = encode_metadata_line(&header).unwrap();
        let parsed = parse_metadata_line(&line).unwrap();
        assert_eq!(parsed.turn, Side::Black);
        assert_eq!(parsed.en_passant, Some(Coord { x: 3, y: 4 }));
        assert_eq!(parsed.move_rule, Some((12, 100)));
        assert_eq!(parsed.fullmove, 7);
        assert_eq!(parsed.promotion_ranks, Some("1,8".to_string()));
        assert_eq!(parsed.win_conditions, Some("checkmate".to_string()));
        assert_eq!(parsed.other_rules, Some(serde_json::json!({"noCastling": true})));
        assert_eq!(parsed.position, sample_position());
    }

    #[test]
    fn test_unterminated_json_blob_is_rejected() {
        let err = parse_metadata_line("w 1 {\"a\":1 K5,1+").unwrap_err();
        assert!(matches!(err, NotationError::UnterminatedBrace(_)));
    }

    #[test]
    fn test_missing_fullmove_counter_is_rejected() {
        assert!(parse_metadata_line("w K5,1+").is_err());
    }
}
