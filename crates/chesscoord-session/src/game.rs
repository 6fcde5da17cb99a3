//! The per-game state record (§3) and its pure mutations. Nothing in
//! here touches a socket or a [`chesscoord_timer::TimerService`] — the
//! actor owns both and calls into this module to decide what to do with
//! them. `Game` itself is not generic over a transport: per §9, "the
//! game owns no endpoint; it merely references one."

use crate::conclusion::{Conclusion, DisconnectRecord, DrawOfferState};
use crate::id::GameId;
use crate::seats::Seats;
use chesscoord_protocol::{
    ClockView, Color, DisconnectView, InviteOptions, PlayerHandle, Publicity, SafeGameView,
    TimeControl,
};
use chesscoord_timer::TimerHandle;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// Default cooldown between one side's own draw offers, in plies (§4.1.9).
pub const MOVES_BETWEEN_DRAW_OFFERS: usize = 2;

/// Chess's two free plies: the clock does not start ticking until a
/// third ply has been played (§4.1.3).
const FREE_PLIES: usize = 2;

pub struct Game {
    pub id: GameId,
    /// Monotonic anchor paired with `created_at`, used to translate the
    /// `tokio::time::Instant`s this struct tracks internally into the
    /// wall-clock millisecond timestamps the wire format wants.
    anchor: Instant,
    pub created_at: DateTime<Utc>,
    pub publicity: Publicity,
    pub variant: String,
    /// The original wire string (e.g. `"600+4"`), echoed back verbatim
    /// in every [`SafeGameView`].
    pub time_control_str: String,
    pub time_control: TimeControl,
    pub rated: bool,
    pub seats: Seats<PlayerHandle>,
    pub moves: Vec<String>,
    pub whose_turn: Option<Color>,
    pub turn_started_at: Option<Instant>,
    pub remaining_at_turn_start: Option<u64>,
    pub next_loss_at: Option<Instant>,
    /// `None` for untimed games (invariant: absent iff `!time_control.is_timed()`).
    pub clock: Option<Seats<u64>>,
    pub auto_time_loss_timer: Option<TimerHandle>,
    pub afk_auto_resign_timer: Option<TimerHandle>,
    pub afk_loss_at: Option<Instant>,
    pub disconnect: Seats<DisconnectRecord>,
    pub draw_offer: Seats<DrawOfferState>,
    pub draw_offer_last_move: Seats<usize>,
    pub conclusion: Conclusion,
    pub deletion_timer: Option<TimerHandle>,
    /// Set only by the position-paste setup flow, which is out of scope
    /// here; carried so the archival skip in §4.4 has something to check.
    pub position_pasted: bool,
    pub server_restart_at: Option<DateTime<Utc>>,
}

impl Game {
    /// Builds a fresh, active game from an accepted invite (§4.1.1). The
    /// caller has already resolved `ColorPreference::Random` and decided
    /// who sits where; `white`/`black` are the two final seat occupants.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: GameId,
        now: Instant,
        created_at: DateTime<Utc>,
        invite: &InviteOptions,
        time_control: TimeControl,
        white: PlayerHandle,
        black: PlayerHandle,
        black_starts: bool,
    ) -> Self {
        let clock = match time_control {
            TimeControl::Timed { initial_ms, .. } => Some(Seats::new(initial_ms, initial_ms)),
            TimeControl::Infinite => None,
        };
        let whose_turn = if black_starts { Color::Black } else { Color::White };
        let remaining_at_turn_start = clock.as_ref().map(|c| *c.get(whose_turn));
        Self {
            id,
            anchor: now,
            created_at,
            publicity: invite.publicity,
            variant: invite.variant.clone(),
            time_control_str: invite.time_control.clone(),
            time_control,
            rated: invite.rated,
            seats: Seats::new(white, black),
            moves: Vec::new(),
            whose_turn: Some(whose_turn),
            turn_started_at: Some(now),
            remaining_at_turn_start,
            next_loss_at: None,
            clock,
            auto_time_loss_timer: None,
            afk_auto_resign_timer: None,
            afk_loss_at: None,
            disconnect: Seats::default(),
            draw_offer: Seats::default(),
            draw_offer_last_move: Seats::new(0, 0),
            conclusion: Conclusion::Active,
            deletion_timer: None,
            position_pasted: false,
            server_restart_at: None,
        }
    }

    pub(crate) fn epoch_ms(&self, instant: Instant) -> u64 {
        let created_epoch_ms = self.created_at.timestamp_millis().max(0) as u64;
        let delta = instant.saturating_duration_since(self.anchor);
        created_epoch_ms + delta.as_millis() as u64
    }

    pub fn color_of(&self, player: &PlayerHandle) -> Option<Color> {
        self.seats
            .iter()
            .find(|(_, seated)| *seated == player)
            .map(|(color, _)| color)
    }

    /// §4.1.2 precondition: resignation/abort split on ply count.
    pub fn is_resignable(&self) -> bool {
        self.moves.len() >= FREE_PLIES
    }

    pub fn is_abortable(&self) -> bool {
        self.conclusion.is_active() && !self.is_resignable()
    }

    pub fn record_move(&mut self, mv: String) {
        self.moves.push(mv);
    }

    /// §4.1.3 push-clock: hands the turn to the other seat, and once the
    /// two free plies are behind us, settles the mover's spent time
    /// (crediting increment starting the third ply) and re-arms the
    /// auto-time-loss deadline against the new active seat's reserve.
    ///
    /// Returns the new deadline the caller should re-arm its timer to,
    /// if any — the caller owns the `TimerService`, this doesn't.
    pub fn push_clock(&mut self, mover: Color, now: Instant) -> Option<Instant> {
        self.whose_turn = Some(mover.opposite());
        if let Some(t) = self.auto_time_loss_timer.take() {
            t.cancel();
        }

        let increment_ms = match self.time_control {
            TimeControl::Timed { increment_ms, .. } => increment_ms,
            TimeControl::Infinite => return None,
        };
        if self.moves.len() < FREE_PLIES {
            return None;
        }

        let turn_started_at = self.turn_started_at?;
        let remaining_at_turn_start = self.remaining_at_turn_start?;
        let spent_ms = now.saturating_duration_since(turn_started_at).as_millis() as u64;
        let new_time = remaining_at_turn_start.saturating_sub(spent_ms);

        if self.moves.len() > FREE_PLIES {
            let clock = self.clock.as_mut().expect("timed game always has a clock");
            clock.set(mover, new_time + increment_ms);
        }

        self.turn_started_at = Some(now);
        let next_active = mover.opposite();
        let remaining = *self.clock.as_ref().expect("timed game always has a clock").get(next_active);
        self.remaining_at_turn_start = Some(remaining);
        let next_loss_at = now + Duration::from_millis(remaining);
        self.next_loss_at = Some(next_loss_at);
        Some(next_loss_at)
    }

    /// §4.1.4: the predicted loss instant a fresh disconnect timer for
    /// `color` should use, folding in the AFK/disconnect interaction —
    /// if `color` is the active, already-AFK seat and its AFK deadline
    /// is sooner than the disconnect default, the AFK deadline wins and
    /// the AFK timer is retired in favor of the disconnect one.
    pub fn disconnect_loss_at(&mut self, color: Color, now: Instant, default_duration: Duration) -> Instant {
        let default_loss_at = now + default_duration;
        if self.whose_turn != Some(color) {
            return default_loss_at;
        }
        match self.afk_loss_at {
            Some(afk_loss_at) if afk_loss_at < default_loss_at => {
                if let Some(t) = self.afk_auto_resign_timer.take() {
                    t.cancel();
                }
                self.afk_loss_at = None;
                afk_loss_at
            }
            _ => default_loss_at,
        }
    }

    /// §4.1.7 rejoin: clears whichever of the AFK/disconnect timers were
    /// armed against `color`.
    pub fn handle_rejoin(&mut self, color: Color) {
        if self.whose_turn == Some(color) {
            if let Some(t) = self.afk_auto_resign_timer.take() {
                t.cancel();
            }
            self.afk_loss_at = None;
        }
        self.disconnect.get_mut(color).cancel_timers();
    }

    /// §4.1.4 return-from-afk: cancels the AFK timer if one is armed,
    /// reporting whether it actually was (so the caller knows whether an
    /// `opponentafkreturn` notice is warranted).
    pub fn cancel_afk(&mut self) -> bool {
        let was_armed = self.afk_auto_resign_timer.is_some();
        if let Some(t) = self.afk_auto_resign_timer.take() {
            t.cancel();
        }
        self.afk_loss_at = None;
        was_armed
    }

    /// §4.1.8: what resigning right now would conclude the game as.
    pub fn resign_outcome(&self, color: Color) -> Conclusion {
        if self.is_resignable() {
            Conclusion::Decisive(format!("{} resignation", color.opposite()))
        } else {
            Conclusion::Aborted
        }
    }

    /// §4.1.9 offer: both the "only one outstanding offer" and the
    /// cooldown-since-this-seat's-last-offer preconditions.
    pub fn offer_draw(&mut self, color: Color) -> Result<(), &'static str> {
        if !self.conclusion.is_active() {
            return Err("game is not active");
        }
        if !self.is_resignable() {
            return Err("too early to offer a draw");
        }
        if *self.draw_offer.get(color) == DrawOfferState::Offered
            || *self.draw_offer.get(color.opposite()) == DrawOfferState::Offered
        {
            return Err("a draw offer is already outstanding");
        }
        let last = *self.draw_offer_last_move.get(color);
        if self.moves.len().saturating_sub(last) < MOVES_BETWEEN_DRAW_OFFERS {
            return Err("draw offer cooldown has not elapsed");
        }
        self.draw_offer.set(color, DrawOfferState::Offered);
        self.draw_offer.set(color.opposite(), DrawOfferState::Unconfirmed);
        self.draw_offer_last_move.set(color, self.moves.len());
        Ok(())
    }

    pub fn accept_draw(&mut self, color: Color) -> Result<(), &'static str> {
        if *self.draw_offer.get(color.opposite()) != DrawOfferState::Offered {
            return Err("no draw offer to accept");
        }
        self.draw_offer.set(color, DrawOfferState::Confirmed);
        Ok(())
    }

    pub fn decline_draw(&mut self, color: Color) -> Result<(), &'static str> {
        if *self.draw_offer.get(color.opposite()) != DrawOfferState::Offered {
            return Err("no draw offer to decline");
        }
        self.draw_offer.set(color, DrawOfferState::Declined);
        self.draw_offer.set(color.opposite(), DrawOfferState::None);
        Ok(())
    }

    /// §4.1.2: a move silently auto-declines any offer still outstanding
    /// against `mover`. Returns whether one was cleared, so the caller
    /// knows whether to send the mover's opponent a `declinedraw` notice.
    pub fn auto_decline_draw(&mut self, mover: Color) -> bool {
        if *self.draw_offer.get(mover.opposite()) == DrawOfferState::Offered {
            self.draw_offer.set(mover.opposite(), DrawOfferState::Declined);
            self.draw_offer.set(mover, DrawOfferState::None);
            true
        } else {
            false
        }
    }

    /// §4.1.10: the cheat-report rollback — the reported move never
    /// happened. Returns the popped move for logging.
    pub fn rollback_last_move(&mut self) -> Option<String> {
        self.moves.pop()
    }

    /// §3 invariant 2 / §4.1.*: moves a game into its terminal state,
    /// settling the active seat's clock against the instant of
    /// conclusion and retiring every live timer. No-ops if already
    /// concluded — conclusion is monotonic.
    pub fn conclude(&mut self, conclusion: Conclusion, now: Instant) {
        if !self.conclusion.is_active() {
            return;
        }
        self.conclusion = conclusion;

        if let (Some(active), Some(turn_started_at), Some(remaining)) =
            (self.whose_turn, self.turn_started_at, self.remaining_at_turn_start)
        {
            if let Some(clock) = self.clock.as_mut() {
                let spent_ms = now.saturating_duration_since(turn_started_at).as_millis() as u64;
                clock.set(active, remaining.saturating_sub(spent_ms));
            }
        }

        self.whose_turn = None;
        self.turn_started_at = None;
        self.remaining_at_turn_start = None;
        self.next_loss_at = None;
        if let Some(t) = self.auto_time_loss_timer.take() {
            t.cancel();
        }
        if let Some(t) = self.afk_auto_resign_timer.take() {
            t.cancel();
        }
        self.afk_loss_at = None;
        for color in [Color::White, Color::Black] {
            self.disconnect.get_mut(color).cancel_timers();
            self.draw_offer.set(color, DrawOfferState::None);
        }
    }

    pub(crate) fn clock_view(&self) -> Option<ClockView> {
        let clock = self.clock.as_ref()?;
        Some(ClockView {
            white_ms: *clock.get(Color::White),
            black_ms: *clock.get(Color::Black),
            next_loss_at: self.next_loss_at.map(|i| self.epoch_ms(i)),
        })
    }

    pub(crate) fn disconnect_view(&self, color: Color) -> Option<DisconnectView> {
        let rec = self.disconnect.get(color);
        if !rec.is_armed() {
            return None;
        }
        Some(DisconnectView {
            auto_resign_at: rec.auto_loss_at.map(|i| self.epoch_ms(i)),
            was_by_choice: rec.was_by_choice.unwrap_or(false),
        })
    }

    /// §4.1.5: the projection sent to `viewer`. Never includes the
    /// opponent's own disconnect record, and never the raw guest token.
    pub fn safe_view(&self, viewer: Color) -> SafeGameView {
        SafeGameView {
            game_id: self.id.as_str().to_string(),
            created_at: self.created_at.timestamp_millis().max(0) as u64,
            publicity: self.publicity,
            variant: self.variant.clone(),
            time_control: self.time_control_str.clone(),
            rated: self.rated,
            moves: self.moves.clone(),
            white_display_name: self.seats.get(Color::White).public_display_name().to_string(),
            black_display_name: self.seats.get(Color::Black).public_display_name().to_string(),
            your_color: viewer,
            clock: self.clock_view(),
            conclusion: self.conclusion.as_wire_str().to_string(),
            afk_loss_at: self.afk_loss_at.map(|i| self.epoch_ms(i)),
            opponent_disconnect: self.disconnect_view(viewer.opposite()),
            server_restart_at: self.server_restart_at.map(|dt| dt.timestamp_millis().max(0) as u64),
        }
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("publicity", &self.publicity)
            .field("variant", &self.variant)
            .field("time_control", &self.time_control)
            .field("rated", &self.rated)
            .field("seats", &self.seats)
            .field("moves", &self.moves)
            .field("whose_turn", &self.whose_turn)
            .field("clock", &self.clock)
            .field("disconnect", &self.disconnect)
            .field("draw_offer", &self.draw_offer)
            .field("conclusion", &self.conclusion)
            .field("position_pasted", &self.position_pasted)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite(time_control: &str) -> InviteOptions {
        InviteOptions {
            variant: "standard".to_string(),
            time_control: time_control.to_string(),
            color_preference: chesscoord_protocol::ColorPreference::White,
            rated: false,
            publicity: Publicity::Public,
            owner_handle: PlayerHandle::Guest {
                browser_token: "owner".to_string(),
            },
            black_starts: false,
        }
    }

    fn players() -> (PlayerHandle, PlayerHandle) {
        (
            PlayerHandle::Guest { browser_token: "w".to_string() },
            PlayerHandle::Guest { browser_token: "b".to_string() },
        )
    }

    fn new_timed_game() -> Game {
        let invite = invite("600+4");
        let (white, black) = players();
        let tc = chesscoord_protocol::clock_parse("600+4", false).unwrap();
        Game::new(
            GameId::generate(&Default::default()),
            Instant::now(),
            Utc::now(),
            &invite,
            tc,
            white,
            black,
            false,
        )
    }

    #[test]
    fn test_first_two_plies_do_not_advance_either_clock() {
        let mut game = new_timed_game();
        let initial = game.clock.clone().unwrap();

        game.record_move("e2e4".to_string());
        let r1 = game.push_clock(Color::White, Instant::now() + Duration::from_secs(5));
        assert!(r1.is_none(), "no re-arm before the free plies are behind us");
        assert_eq!(game.clock.clone().unwrap(), initial);

        game.record_move("e7e5".to_string());
        let r2 = game.push_clock(Color::Black, Instant::now() + Duration::from_secs(8));
        assert!(r2.is_none());
        assert_eq!(game.clock.clone().unwrap(), initial);
    }

    #[test]
    fn test_third_ply_credits_the_mover_and_rearms() {
        let mut game = new_timed_game();
        game.record_move("e2e4".to_string());
        game.push_clock(Color::White, Instant::now());
        game.record_move("e7e5".to_string());
        game.push_clock(Color::Black, Instant::now());

        game.record_move("g1f3".to_string());
        let before = Instant::now();
        let rearm = game.push_clock(Color::White, before + Duration::from_secs(3));
        assert!(rearm.is_some());
        // White spent 3s thinking, then gained the 4s increment back.
        let clock = game.clock.clone().unwrap();
        assert_eq!(*clock.get(Color::White), 600_000 - 3_000 + 4_000);
    }

    #[test]
    fn test_resignable_only_after_two_plies() {
        let mut game = new_timed_game();
        assert!(!game.is_resignable());
        assert!(game.is_abortable());
        game.record_move("e2e4".to_string());
        assert!(!game.is_resignable());
        game.record_move("e7e5".to_string());
        assert!(game.is_resignable());
        assert!(!game.is_abortable());
    }

    #[test]
    fn test_conclude_is_monotonic() {
        let mut game = new_timed_game();
        let now = Instant::now();
        game.conclude(Conclusion::Aborted, now);
        assert_eq!(game.conclusion, Conclusion::Aborted);
        game.conclude(Conclusion::Decisive("white checkmate".to_string()), now);
        assert_eq!(game.conclusion, Conclusion::Aborted, "conclusion must not change once set");
    }

    #[test]
    fn test_draw_offer_round_trip() {
        let mut game = new_timed_game();
        game.record_move("e2e4".to_string());
        game.record_move("e7e5".to_string());
        game.offer_draw(Color::White).unwrap();
        assert_eq!(*game.draw_offer.get(Color::White), DrawOfferState::Offered);
        assert_eq!(*game.draw_offer.get(Color::Black), DrawOfferState::Unconfirmed);

        assert!(game.offer_draw(Color::Black).is_err());
        game.accept_draw(Color::Black).unwrap();
        assert_eq!(*game.draw_offer.get(Color::Black), DrawOfferState::Confirmed);
    }

    #[test]
    fn test_move_auto_declines_outstanding_offer_against_mover() {
        let mut game = new_timed_game();
        game.record_move("e2e4".to_string());
        game.record_move("e7e5".to_string());
        game.offer_draw(Color::White).unwrap();

        let cleared = game.auto_decline_draw(Color::Black);
        assert!(cleared);
        assert_eq!(*game.draw_offer.get(Color::White), DrawOfferState::Declined);
        assert_eq!(*game.draw_offer.get(Color::Black), DrawOfferState::None);
    }

    #[test]
    fn test_resign_outcome_before_two_plies_is_abort() {
        let game = new_timed_game();
        assert_eq!(game.resign_outcome(Color::White), Conclusion::Aborted);
    }

    #[test]
    fn test_resign_outcome_after_two_plies_is_decisive() {
        let mut game = new_timed_game();
        game.record_move("e2e4".to_string());
        game.record_move("e7e5".to_string());
        assert_eq!(
            game.resign_outcome(Color::White),
            Conclusion::Decisive("black resignation".to_string())
        );
    }

    #[test]
    fn test_safe_view_never_exposes_guest_token() {
        let game = new_timed_game();
        let view = game.safe_view(Color::White);
        assert_eq!(view.white_display_name, "(Guest)");
        assert_eq!(view.black_display_name, "(Guest)");
    }
}
