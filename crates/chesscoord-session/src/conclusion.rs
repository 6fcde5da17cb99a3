//! The game's terminal state (§3 "conclusion"), the draw-offer state
//! machine (§4.1.9), and per-seat disconnect bookkeeping (§4.1.4).

use chesscoord_protocol::Color;
use chesscoord_timer::TimerHandle;
use std::fmt;
use tokio::time::Instant;

/// The terminal tag of a game. Monotonic: a game never returns to
/// `Active` once concluded (invariant 2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conclusion {
    Active,
    Aborted,
    /// A decisive token, e.g. `"white checkmate"`, `"white time"`,
    /// `"draw agreement"`.
    Decisive(String),
}

impl Conclusion {
    pub fn is_active(&self) -> bool {
        matches!(self, Conclusion::Active)
    }

    /// The wire string sent in [`chesscoord_protocol::SafeGameView::conclusion`].
    pub fn as_wire_str(&self) -> &str {
        match self {
            Conclusion::Active => "Active",
            Conclusion::Aborted => "Aborted",
            Conclusion::Decisive(token) => token,
        }
    }

    /// The color that *wins* this token, if the token names a single
    /// winner (§7 "decisive"). Draw and abort tokens have no winner.
    pub fn winner(&self) -> Option<Color> {
        match self {
            Conclusion::Decisive(token) if token.starts_with("white") => Some(Color::White),
            Conclusion::Decisive(token) if token.starts_with("black") => Some(Color::Black),
            _ => None,
        }
    }
}

/// A move's claimed conclusion is only legal if it isn't a declared win
/// for the *opponent* of the claimant (§4.1.2 precondition 7).
pub fn claim_is_legal_for(claimed: &Conclusion, claimant: Color) -> bool {
    match claimed.winner() {
        Some(winner) => winner == claimant,
        None => true,
    }
}

/// One seat's position in the four-transition draw-offer machine (§4.1.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawOfferState {
    #[default]
    None,
    Offered,
    Unconfirmed,
    Declined,
    Confirmed,
}

/// §3 "disconnect record": the two competing timers for a seat that has
/// dropped its endpoint, plus the predicted loss instant and how the
/// disconnect began.
#[derive(Default)]
pub struct DisconnectRecord {
    pub start_delay_timer: Option<TimerHandle>,
    pub auto_resign_timer: Option<TimerHandle>,
    pub auto_loss_at: Option<Instant>,
    pub was_by_choice: Option<bool>,
}

impl DisconnectRecord {
    pub fn is_armed(&self) -> bool {
        self.start_delay_timer.is_some() || self.auto_resign_timer.is_some()
    }

    /// Cancels both timers, if armed. Idempotent.
    pub fn cancel_timers(&mut self) {
        if let Some(t) = self.start_delay_timer.take() {
            t.cancel();
        }
        if let Some(t) = self.auto_resign_timer.take() {
            t.cancel();
        }
        self.auto_loss_at = None;
    }
}

impl fmt::Debug for DisconnectRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisconnectRecord")
            .field("start_delay_armed", &self.start_delay_timer.is_some())
            .field("auto_resign_armed", &self.auto_resign_timer.is_some())
            .field("auto_loss_at", &self.auto_loss_at)
            .field("was_by_choice", &self.was_by_choice)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decisive_token_winner_is_parsed_from_color_prefix() {
        assert_eq!(
            Conclusion::Decisive("white checkmate".to_string()).winner(),
            Some(Color::White)
        );
        assert_eq!(
            Conclusion::Decisive("black resignation".to_string()).winner(),
            Some(Color::Black)
        );
    }

    #[test]
    fn test_draw_and_abort_tokens_have_no_winner() {
        assert_eq!(Conclusion::Decisive("draw agreement".to_string()).winner(), None);
        assert_eq!(Conclusion::Aborted.winner(), None);
        assert_eq!(Conclusion::Active.winner(), None);
    }

    #[test]
    fn test_claim_is_legal_only_for_the_claimants_own_win() {
        let white_wins = Conclusion::Decisive("white checkmate".to_string());
        assert!(claim_is_legal_for(&white_wins, Color::White));
        assert!(!claim_is_legal_for(&white_wins, Color::Black));

        let draw = Conclusion::Decisive("draw agreement".to_string());
        assert!(claim_is_legal_for(&draw, Color::White));
        assert!(claim_is_legal_for(&draw, Color::Black));
    }

    #[test]
    fn test_as_wire_str_matches_expected_literals() {
        assert_eq!(Conclusion::Active.as_wire_str(), "Active");
        assert_eq!(Conclusion::Aborted.as_wire_str(), "Aborted");
        assert_eq!(
            Conclusion::Decisive("white time".to_string()).as_wire_str(),
            "white time"
        );
    }
}
