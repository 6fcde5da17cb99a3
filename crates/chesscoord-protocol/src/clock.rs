//! Time-control strings: `"m*60+inc"` and the untimed sentinel `"-"`.
//!
//! Pure functions only — no I/O, no timers (that's `chesscoord-timer`).
//! `isValid`/`parse` from spec §4.2 become [`is_valid`]/[`parse`].

use serde::{Deserialize, Serialize};

/// A parsed time control. Immutable for the lifetime of a game once set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeControl {
    Infinite,
    Timed { initial_ms: u64, increment_ms: u64 },
}

impl TimeControl {
    pub fn is_timed(&self) -> bool {
        matches!(self, TimeControl::Timed { .. })
    }
}

/// The literal whitelist of production time-control strings, plus the
/// untimed sentinel. Order is display order, not load-bearing.
const WHITELIST: &[&str] = &[
    "-", "60+2", "120+2", "180+2", "300+2", "480+3", "600+4", "600+6",
    "720+5", "900+6", "1200+8", "1500+10", "1800+15", "2400+20",
];

/// Extra entries accepted only when `allow_dev_controls` is set (mirrors
/// `NODE_ENV` gating dev-only time controls per spec §6).
const DEV_WHITELIST: &[&str] = &["15+2"];

/// Whether `s` is one of the recognized time-control strings. `allow_dev`
/// additionally accepts the short dev-only controls (`NODE_ENV` in
/// {development, test} in the meta-crate's configuration).
pub fn is_valid(s: &str, allow_dev: bool) -> bool {
    WHITELIST.contains(&s) || (allow_dev && DEV_WHITELIST.contains(&s))
}

/// Parses a whitelisted time-control string. Callers should check
/// [`is_valid`] first (or accept the `ClockFormatError` this returns for
/// a string outside the whitelist).
pub fn parse(s: &str, allow_dev: bool) -> Result<TimeControl, ClockFormatError> {
    if !is_valid(s, allow_dev) {
        return Err(ClockFormatError::NotWhitelisted(s.to_string()));
    }
    if s == "-" {
        return Ok(TimeControl::Infinite);
    }
    let (seconds_str, increment_str) = s
        .split_once('+')
        .ok_or_else(|| ClockFormatError::Malformed(s.to_string()))?;
    let seconds: u64 = seconds_str
        .parse()
        .map_err(|_| ClockFormatError::Malformed(s.to_string()))?;
    let increment: u64 = increment_str
        .parse()
        .map_err(|_| ClockFormatError::Malformed(s.to_string()))?;
    Ok(TimeControl::Timed {
        initial_ms: seconds * 1000,
        increment_ms: increment * 1000,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ClockFormatError {
    #[error("time control {0:?} is not in the whitelist")]
    NotWhitelisted(String),
    #[error("time control {0:?} does not match <seconds>+<increment>")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untimed_sentinel_parses_to_infinite() {
        assert!(is_valid("-", false));
        assert_eq!(parse("-", false).unwrap(), TimeControl::Infinite);
    }

    #[test]
    fn test_standard_whitelist_entries_parse() {
        assert_eq!(
            parse("600+4", false).unwrap(),
            TimeControl::Timed {
                initial_ms: 600_000,
                increment_ms: 4_000
            }
        );
        assert_eq!(
            parse("60+2", false).unwrap(),
            TimeControl::Timed {
                initial_ms: 60_000,
                increment_ms: 2_000
            }
        );
    }

    #[test]
    fn test_every_whitelisted_string_is_valid_and_parses() {
        for s in WHITELIST {
            assert!(is_valid(s, false), "{s} should be valid");
            assert!(parse(s, false).is_ok(), "{s} should parse");
        }
    }

    #[test]
    fn test_dev_only_control_rejected_without_flag() {
        assert!(!is_valid("15+2", false));
        assert!(parse("15+2", false).is_err());
    }

    #[test]
    fn test_dev_only_control_accepted_with_flag() {
        assert!(is_valid("15+2", true));
        assert_eq!(
            parse("15+2", true).unwrap(),
            TimeControl::Timed {
                initial_ms: 15_000,
                increment_ms: 2_000
            }
        );
    }

    #[test]
    fn test_unknown_string_is_invalid() {
        assert!(!is_valid("600+0", false));
        assert!(!is_valid("", false));
        assert!(!is_valid("abc", false));
        assert!(parse("600+0", false).is_err());
    }

    #[test]
    fn test_time_control_is_timed() {
        assert!(!TimeControl::Infinite.is_timed());
        assert!(TimeControl::Timed {
            initial_ms: 1,
            increment_ms: 0
        }
        .is_timed());
    }
}
