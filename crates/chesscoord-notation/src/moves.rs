//! Move encoding: `<x,y>><x,y>[<promotionToken>]`.
//!
//! The "compact-moves" mode omits the `=`, `x`, `+`, `#` annotations
//! (capture, promotion marker, check, checkmate) that the full mode
//! carries. Archival transcripts are written compact; either mode
//! parses back to the same [`Move`].

use crate::error::NotationError;
use crate::position::Coord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub from: Coord,
    pub to: Coord,
    pub promotion: Option<String>,
    pub capture: bool,
    pub check: bool,
    pub checkmate: bool,
}

pub fn encode(m: &Move, compact: bool) -> String {
    let mut out = format!("{},{}>{},{}", m.from.x, m.from.y, m.to.x, m.to.y);
    if compact {
        if let Some(promo) = &m.promotion {
            out.push_str(promo);
        }
        return out;
    }
    if m.capture {
        out.push('x');
    }
    if let Some(promo) = &m.promotion {
        out.push('=');
        out.push_str(promo);
    }
    if m.checkmate {
        out.push('#');
    } else if m.check {
        out.push('+');
    }
    out
}

pub fn parse(s: &str, compact: bool) -> Result<Move, NotationError> {
    let bad = || NotationError::MalformedMove(s.to_string());
    let (from_part, to_part) = s.split_once('>').ok_or_else(bad)?;
    let (from, leftover) = take_coord(from_part)?;
    if !leftover.is_empty() {
        return Err(bad());
    }
    let (to, remainder) = take_coord(to_part)?;

    if compact {
        let promotion = if remainder.is_empty() {
            None
        } else if remainder.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(remainder.to_string())
        } else {
            return Err(bad());
        };
        return Ok(Move {
            from,
            to,
            promotion,
            capture: false,
            check: false,
            checkmate: false,
        });
    }

    let mut rest = remainder;
    let capture = rest.starts_with('x');
    if capture {
        rest = &rest[1..];
    }
    let promotion = if let Some(after_eq) = rest.strip_prefix('=') {
        let end = after_eq
            .find(['+', '#'])
            .unwrap_or(after_eq.len());
        let token = &after_eq[..end];
        rest = &after_eq[end..];
        Some(token.to_string())
    } else {
        None
    };
    let checkmate = rest == "#";
    let check = rest == "+";
    if !rest.is_empty() && !checkmate && !check {
        return Err(bad());
    }
    Ok(Move {
        from,
        to,
        promotion,
        capture,
        check,
        checkmate,
    })
}

/// Parses a leading `<int>,<int>` off `s`, returning the coordinate and
/// whatever text follows it.
pub(crate) fn take_coord(s: &str) -> Result<(Coord, &str), NotationError> {
    let bad = || NotationError::MalformedMove(s.to_string());
    let (x, after_x) = take_signed_int(s).ok_or_else(bad)?;
    let after_x = after_x.strip_prefix(',').ok_or_else(bad)?;
    let (y, rest) = take_signed_int(after_x).ok_or_else(bad)?;
    Ok((Coord { x, y }, rest))
}

fn take_signed_int(s: &str) -> Option<(i64, &str)> {
    let mut end = 0;
    let bytes = s.as_bytes();
    if end < bytes.len() && bytes[end] == b'-' {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    let value: i64 = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}
