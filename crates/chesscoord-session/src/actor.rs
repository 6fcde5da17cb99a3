//! Game actor: an isolated Tokio task owning one [`Game`] and its two
//! endpoints (§5 "per-game serialization"). Commands arrive over an
//! mpsc channel and are handled one at a time, so every mutation of the
//! game's state — including a timer's own firing, which reinjects
//! itself as a command rather than mutating directly (per
//! `chesscoord-timer`'s own contract) — is serialized against every
//! other mutation of that same game.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use chesscoord_archive::{ArchiveSink, GameResult, GameSummary};
use chesscoord_notation::{GameHeader, Position, Side};
use chesscoord_protocol::{
    Color, GameConclusionClaim, GameEvent, NoticeKind, NoticeText, Publicity, SafeGameView,
};
use chesscoord_timer::{TimerKind, TimerService};
use chesscoord_transport::{Connection, Endpoint};

use crate::conclusion::Conclusion;
use crate::error::SessionError;
use crate::game::Game;
use crate::id::GameId;
use crate::seats::Seats;

/// Which armed countdown reinjected itself into the actor's own channel.
#[derive(Debug, Clone, Copy)]
enum TimerFire {
    AutoTimeLoss,
    AfkAutoResign,
    DisconnectStart(Color),
    DisconnectAutoResign(Color),
    Deletion,
}

const DISCONNECT_GRACE: std::time::Duration = std::time::Duration::from_secs(5);
const DISCONNECT_BY_CHOICE: std::time::Duration = std::time::Duration::from_secs(20);
const DISCONNECT_RESIGNABLE: std::time::Duration = std::time::Duration::from_secs(60);
const DISCONNECT_UNRESIGNABLE: std::time::Duration = std::time::Duration::from_secs(20);
const AFK_AUTO_RESIGN: std::time::Duration = std::time::Duration::from_secs(20);
const DELETION_WINDOW: std::time::Duration = std::time::Duration::from_secs(15);

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Commands a [`GameHandle`] sends to its actor. Every externally
/// triggered variant carries a reply channel; `TimerFired` does not —
/// nothing is waiting on a timer's reinjection.
pub enum GameCommand<C: Connection> {
    SubmitMove {
        color: Color,
        mv: String,
        move_number: u32,
        claim: GameConclusionClaim,
        reply: Reply<()>,
    },
    Rejoin {
        color: Color,
        endpoint: Arc<Endpoint<C>>,
        reply: Reply<()>,
    },
    Resync {
        color: Color,
        reply: Reply<SafeGameView>,
    },
    EndpointClosed {
        color: Color,
        by_choice: bool,
        reply: Reply<()>,
    },
    Abort {
        color: Color,
        reply: Reply<()>,
    },
    Resign {
        color: Color,
        reply: Reply<()>,
    },
    OfferDraw {
        color: Color,
        reply: Reply<()>,
    },
    AcceptDraw {
        color: Color,
        reply: Reply<()>,
    },
    DeclineDraw {
        color: Color,
        reply: Reply<()>,
    },
    DeclareAfk {
        color: Color,
        reply: Reply<()>,
    },
    ReturnFromAfk {
        color: Color,
        reply: Reply<()>,
    },
    Report {
        reporter: Color,
        reason: String,
        opponents_move_number: u32,
        reply: Reply<()>,
    },
    ServerRestart {
        restart_at: chrono::DateTime<chrono::Utc>,
    },
    /// §4.1.12: force an immediate, synchronous conclusion and archival,
    /// skipping the deletion grace window. Used only by server drain.
    Drain {
        reply: Reply<()>,
    },
    TimerFired(TimerFire),
}

/// Cheap-to-clone handle a [`crate::manager::GameSessionManager`] holds
/// per live game.
#[derive(Clone)]
pub struct GameHandle<C: Connection> {
    id: GameId,
    sender: mpsc::Sender<GameCommand<C>>,
}

impl<C: Connection> GameHandle<C> {
    pub fn id(&self) -> &GameId {
        &self.id
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> GameCommand<C>,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| SessionError::Unavailable(self.id.clone()))?;
        rx.await.map_err(|_| SessionError::Unavailable(self.id.clone()))?
    }

    pub async fn submit_move(
        &self,
        color: Color,
        mv: String,
        move_number: u32,
        claim: GameConclusionClaim,
    ) -> Result<(), SessionError> {
        self.call(|reply| GameCommand::SubmitMove { color, mv, move_number, claim, reply }).await
    }

    pub async fn rejoin(&self, color: Color, endpoint: Arc<Endpoint<C>>) -> Result<(), SessionError> {
        self.call(|reply| GameCommand::Rejoin { color, endpoint, reply }).await
    }

    pub async fn resync(&self, color: Color) -> Result<SafeGameView, SessionError> {
        self.call(|reply| GameCommand::Resync { color, reply }).await
    }

    pub async fn endpoint_closed(&self, color: Color, by_choice: bool) -> Result<(), SessionError> {
        self.call(|reply| GameCommand::EndpointClosed { color, by_choice, reply }).await
    }

    pub async fn abort(&self, color: Color) -> Result<(), SessionError> {
        self.call(|reply| GameCommand::Abort { color, reply }).await
    }

    pub async fn resign(&self, color: Color) -> Result<(), SessionError> {
        self.call(|reply| GameCommand::Resign { color, reply }).await
    }

    pub async fn offer_draw(&self, color: Color) -> Result<(), SessionError> {
        self.call(|reply| GameCommand::OfferDraw { color, reply }).await
    }

    pub async fn accept_draw(&self, color: Color) -> Result<(), SessionError> {
        self.call(|reply| GameCommand::AcceptDraw { color, reply }).await
    }

    pub async fn decline_draw(&self, color: Color) -> Result<(), SessionError> {
        self.call(|reply| GameCommand::DeclineDraw { color, reply }).await
    }

    pub async fn declare_afk(&self, color: Color) -> Result<(), SessionError> {
        self.call(|reply| GameCommand::DeclareAfk { color, reply }).await
    }

    pub async fn return_from_afk(&self, color: Color) -> Result<(), SessionError> {
        self.call(|reply| GameCommand::ReturnFromAfk { color, reply }).await
    }

    pub async fn report(
        &self,
        reporter: Color,
        reason: String,
        opponents_move_number: u32,
    ) -> Result<(), SessionError> {
        self.call(|reply| GameCommand::Report { reporter, reason, opponents_move_number, reply }).await
    }

    pub async fn server_restart(&self, restart_at: chrono::DateTime<chrono::Utc>) -> Result<(), SessionError> {
        self.sender
            .send(GameCommand::ServerRestart { restart_at })
            .await
            .map_err(|_| SessionError::Unavailable(self.id.clone()))
    }

    pub async fn drain(&self) -> Result<(), SessionError> {
        self.call(|reply| GameCommand::Drain { reply }).await
    }
}

pub struct GameActor<C: Connection> {
    game: Game,
    endpoints: Seats<Option<Arc<Endpoint<C>>>>,
    timers: TimerService,
    archive: Arc<ArchiveSink>,
    self_sender: mpsc::Sender<GameCommand<C>>,
    receiver: mpsc::Receiver<GameCommand<C>>,
    /// Told the game's id once it has been archived and is ready to be
    /// dropped from the manager's index.
    deleted: mpsc::UnboundedSender<GameId>,
}

impl<C: Connection> GameActor<C> {
    async fn run(mut self) {
        let id = self.game.id.clone();
        info!(game_id = %id, "game actor started");
        while let Some(cmd) = self.receiver.recv().await {
            self.handle(cmd).await;
        }
        info!(game_id = %id, "game actor stopped");
    }

    async fn handle(&mut self, cmd: GameCommand<C>) {
        match cmd {
            GameCommand::SubmitMove { color, mv, move_number, claim, reply } => {
                let _ = reply.send(self.handle_submit_move(color, mv, move_number, claim).await);
            }
            GameCommand::Rejoin { color, endpoint, reply } => {
                let _ = reply.send(self.handle_rejoin(color, endpoint).await);
            }
            GameCommand::Resync { color, reply } => {
                let _ = reply.send(Ok(self.game.safe_view(color)));
            }
            GameCommand::EndpointClosed { color, by_choice, reply } => {
                let _ = reply.send(self.handle_endpoint_closed(color, by_choice).await);
            }
            GameCommand::Abort { color, reply } => {
                let _ = reply.send(self.handle_abort(color).await);
            }
            GameCommand::Resign { color, reply } => {
                let _ = reply.send(self.handle_resign(color).await);
            }
            GameCommand::OfferDraw { color, reply } => {
                let _ = reply.send(self.handle_offer_draw(color).await);
            }
            GameCommand::AcceptDraw { color, reply } => {
                let _ = reply.send(self.handle_accept_draw(color).await);
            }
            GameCommand::DeclineDraw { color, reply } => {
                let _ = reply.send(self.handle_decline_draw(color).await);
            }
            GameCommand::DeclareAfk { color, reply } => {
                let _ = reply.send(self.handle_declare_afk(color).await);
            }
            GameCommand::ReturnFromAfk { color, reply } => {
                let _ = reply.send(self.handle_return_from_afk(color).await);
            }
            GameCommand::Report { reporter, reason, opponents_move_number, reply } => {
                let _ = reply.send(self.handle_report(reporter, reason, opponents_move_number).await);
            }
            GameCommand::ServerRestart { restart_at } => {
                self.game.server_restart_at = Some(restart_at);
                self.broadcast(GameEvent::ServerRestart {
                    restart_at: restart_at.timestamp_millis().max(0) as u64,
                })
                .await;
            }
            GameCommand::Drain { reply } => {
                self.handle_drain().await;
                let _ = reply.send(Ok(()));
            }
            GameCommand::TimerFired(fire) => self.handle_timer_fired(fire).await,
        }
    }

    /// §4.1.12: conclude (if still active), cancel the deletion grace,
    /// and archive synchronously rather than waiting out the window.
    async fn handle_drain(&mut self) {
        if self.game.conclusion.is_active() {
            self.game.conclude(Conclusion::Aborted, Instant::now());
            self.broadcast_update().await;
        }
        if let Some(t) = self.game.deletion_timer.take() {
            t.cancel();
        }
        self.finish_deletion().await;
    }

    fn arm(&self, kind: TimerKind, deadline: Instant) -> Option<chesscoord_timer::TimerHandle> {
        let tx = self.self_sender.clone();
        let fire = match kind {
            TimerKind::AutoTimeLoss => TimerFire::AutoTimeLoss,
            TimerKind::AfkAutoResign => TimerFire::AfkAutoResign,
            TimerKind::Deletion => TimerFire::Deletion,
            // Disconnect timers are armed through `arm_disconnect`, which
            // carries the color explicitly.
            TimerKind::DisconnectStart | TimerKind::DisconnectAutoResign => unreachable!(),
        };
        match self.timers.schedule_at(kind, deadline, async move {
            let _ = tx.send(GameCommand::TimerFired(fire)).await;
        }) {
            Ok(handle) => Some(handle),
            Err(e) => {
                // Deadline already elapsed by the time we got here (e.g. the
                // actor was busy with an earlier command). Reinject the same
                // `TimerFired` command the scheduled callback would have sent,
                // so the fire still goes through the normal serialized path
                // instead of being silently dropped (§3 invariant 3).
                warn!(game_id = %self.game.id, %e, "timer deadline already past, reinjecting fire immediately");
                let tx = self.self_sender.clone();
                tokio::spawn(async move {
                    let _ = tx.send(GameCommand::TimerFired(fire)).await;
                });
                None
            }
        }
    }

    fn arm_disconnect(&self, kind: TimerKind, color: Color, deadline: Instant) -> Option<chesscoord_timer::TimerHandle> {
        let tx = self.self_sender.clone();
        let fire = match kind {
            TimerKind::DisconnectStart => TimerFire::DisconnectStart(color),
            TimerKind::DisconnectAutoResign => TimerFire::DisconnectAutoResign(color),
            _ => unreachable!(),
        };
        self.timers
            .schedule_at(kind, deadline, async move {
                let _ = tx.send(GameCommand::TimerFired(fire)).await;
            })
            .ok()
    }

    async fn send_to(&self, color: Color, event: GameEvent) {
        if let Some(endpoint) = self.endpoints.get(color).clone() {
            if let Ok(msg) = chesscoord_protocol::OutboundMessage::game_event(&event, None) {
                if endpoint.send(msg.route, msg.action, msg.value, msg.id).await.is_err() {
                    debug!(game_id = %self.game.id, %color, "send failed, endpoint presumed closed");
                }
            }
        }
    }

    async fn broadcast(&self, event: GameEvent) {
        self.send_to(Color::White, event.clone()).await;
        self.send_to(Color::Black, event.clone()).await;
    }

    async fn notify(&self, color: Color, kind: NoticeKind, text: NoticeText) {
        if let Some(endpoint) = self.endpoints.get(color).clone() {
            if let Ok(msg) = chesscoord_protocol::OutboundMessage::notice(kind, text, None) {
                let _ = endpoint.send(msg.route, msg.action, msg.value, msg.id).await;
            }
        }
    }

    /// Clears the caller's subscription slot silently (§4.1.8: abort and
    /// resign both unsubscribe the caller without notifying them of it).
    fn unsubscribe(&self, color: Color) {
        if let Some(endpoint) = self.endpoints.get(color) {
            endpoint.set_subscription(None);
        }
    }

    async fn broadcast_update(&self) {
        self.send_to(Color::White, GameEvent::GameUpdate(self.game.safe_view(Color::White))).await;
        self.send_to(Color::Black, GameEvent::GameUpdate(self.game.safe_view(Color::Black))).await;
    }

    /// Moves the game to its terminal state and arms the 15s deletion
    /// window (§4.1.11 "shutdown window" uses the same window — here
    /// it's per-game, post-conclusion archival delay).
    async fn conclude(&mut self, conclusion: Conclusion) {
        self.game.conclude(conclusion, Instant::now());
        self.broadcast_update().await;
        let deadline = Instant::now() + DELETION_WINDOW;
        self.game.deletion_timer = self.arm(TimerKind::Deletion, deadline);
    }

    async fn handle_submit_move(
        &mut self,
        color: Color,
        mv: String,
        move_number: u32,
        claim: GameConclusionClaim,
    ) -> Result<(), SessionError> {
        if !self.game.conclusion.is_active() {
            return Err(SessionError::ProtocolViolation("move submitted on a finished game".into()));
        }
        if move_number as usize != self.game.moves.len() + 1 {
            warn!(
                game_id = %self.game.id, %color, move_number, expected = self.game.moves.len() + 1,
                "move number mismatch, possible desync or hack attempt"
            );
            return Err(SessionError::MoveNumberMismatch);
        }
        if self.game.whose_turn != Some(color) {
            return Err(SessionError::ProtocolViolation("move submitted out of turn".into()));
        }
        if chesscoord_notation::moves::parse(&mv, true).is_err() {
            return Err(SessionError::ProtocolViolation(format!("invalid move format: {mv}")));
        }
        let claimed = match &claim {
            GameConclusionClaim::Active => None,
            GameConclusionClaim::Claimed(token) if token == "Aborted" => Some(Conclusion::Aborted),
            GameConclusionClaim::Claimed(token) => Some(Conclusion::Decisive(token.clone())),
        };
        if let Some(claimed) = &claimed {
            if !crate::conclusion::claim_is_legal_for(claimed, color) {
                return Err(SessionError::ProtocolViolation(
                    "claimed conclusion declares a win for the opponent".into(),
                ));
            }
        }

        self.game.record_move(mv.clone());
        if self.game.auto_decline_draw(color) {
            self.notify(
                color.opposite(),
                NoticeKind::Notify,
                NoticeText::TranslationKey("draw_offer_auto_declined".to_string()),
            )
            .await;
            self.send_to(color.opposite(), GameEvent::DeclineDraw).await;
        }

        let rearm = self.game.push_clock(color, Instant::now());
        self.game.auto_time_loss_timer = rearm.and_then(|deadline| self.arm(TimerKind::AutoTimeLoss, deadline));

        let clock = self.game.clock_view();
        self.send_to(color.opposite(), GameEvent::Move { mv, move_number, clock: clock.clone() }).await;

        if let Some(conclusion) = claimed {
            self.conclude(conclusion).await;
        } else if let Some(clock) = clock {
            self.send_to(color, GameEvent::Clock(clock)).await;
        }
        Ok(())
    }

    async fn handle_rejoin(&mut self, color: Color, endpoint: Arc<Endpoint<C>>) -> Result<(), SessionError> {
        let was_disconnect_armed = self.game.disconnect.get(color).is_armed();
        // §4.1.1: a seat's prior endpoint (a duplicate tab) gets told
        // `leaveGame` and detached before the new one takes its place.
        if let Some(old) = self.endpoints.get(color).clone() {
            if let Ok(msg) = chesscoord_protocol::OutboundMessage::game_event(&GameEvent::LeaveGame, None) {
                let _ = old.send(msg.route, msg.action, msg.value, msg.id).await;
            }
        }
        self.endpoints.set(color, Some(endpoint));
        self.game.handle_rejoin(color);
        if was_disconnect_armed {
            self.send_to(color.opposite(), GameEvent::OpponentDisconnectReturn).await;
        }
        let view = self.game.safe_view(color);
        self.send_to(color, GameEvent::JoinGame(view)).await;
        Ok(())
    }

    async fn handle_endpoint_closed(&mut self, color: Color, by_choice: bool) -> Result<(), SessionError> {
        self.endpoints.set(color, None);
        if !self.game.conclusion.is_active() {
            return Ok(());
        }
        let now = Instant::now();
        if by_choice {
            let loss_at = self.game.disconnect_loss_at(color, now, DISCONNECT_BY_CHOICE);
            let handle = self.arm_disconnect(TimerKind::DisconnectAutoResign, color, loss_at);
            let rec = self.game.disconnect.get_mut(color);
            rec.auto_resign_timer = handle;
            rec.auto_loss_at = Some(loss_at);
            rec.was_by_choice = Some(true);
            self.send_to(
                color.opposite(),
                GameEvent::OpponentDisconnect { auto_resign_at: Some(self.epoch_ms(loss_at)), was_by_choice: true },
            )
            .await;
        } else {
            let deadline = now + DISCONNECT_GRACE;
            let handle = self.arm_disconnect(TimerKind::DisconnectStart, color, deadline);
            let rec = self.game.disconnect.get_mut(color);
            rec.start_delay_timer = handle;
            rec.was_by_choice = Some(false);
            self.send_to(
                color.opposite(),
                GameEvent::OpponentDisconnect { auto_resign_at: None, was_by_choice: false },
            )
            .await;
        }
        Ok(())
    }

    fn epoch_ms(&self, instant: Instant) -> u64 {
        self.game.epoch_ms(instant)
    }

    async fn handle_abort(&mut self, color: Color) -> Result<(), SessionError> {
        if !self.game.is_abortable() {
            return Err(SessionError::StaleAction("game can no longer be aborted".into()));
        }
        self.unsubscribe(color);
        self.conclude(Conclusion::Aborted).await;
        Ok(())
    }

    async fn handle_resign(&mut self, color: Color) -> Result<(), SessionError> {
        if !self.game.conclusion.is_active() {
            return Err(SessionError::ProtocolViolation("resign on a finished game".into()));
        }
        let outcome = self.game.resign_outcome(color);
        self.unsubscribe(color);
        self.conclude(outcome).await;
        Ok(())
    }

    async fn handle_offer_draw(&mut self, color: Color) -> Result<(), SessionError> {
        self.game
            .offer_draw(color)
            .map_err(|e| SessionError::StaleAction(e.to_string()))?;
        self.send_to(color.opposite(), GameEvent::DrawOffer).await;
        Ok(())
    }

    async fn handle_accept_draw(&mut self, color: Color) -> Result<(), SessionError> {
        self.game
            .accept_draw(color)
            .map_err(|e| SessionError::StaleAction(e.to_string()))?;
        self.conclude(Conclusion::Decisive("draw agreement".to_string())).await;
        Ok(())
    }

    async fn handle_decline_draw(&mut self, color: Color) -> Result<(), SessionError> {
        self.game
            .decline_draw(color)
            .map_err(|e| SessionError::StaleAction(e.to_string()))?;
        self.send_to(color.opposite(), GameEvent::DeclineDraw).await;
        Ok(())
    }

    async fn handle_declare_afk(&mut self, color: Color) -> Result<(), SessionError> {
        if !self.game.conclusion.is_active() || self.game.whose_turn != Some(color) {
            return Err(SessionError::StaleAction("cannot declare AFK right now".into()));
        }
        if self.game.disconnect.get(color).is_armed() {
            return Err(SessionError::StaleAction("a disconnect timer is already running".into()));
        }
        let deadline = Instant::now() + AFK_AUTO_RESIGN;
        self.game.afk_auto_resign_timer = self.arm(TimerKind::AfkAutoResign, deadline);
        self.game.afk_loss_at = Some(deadline);
        self.send_to(
            color.opposite(),
            GameEvent::OpponentAfk { auto_afk_resign_time: self.epoch_ms(deadline) },
        )
        .await;
        Ok(())
    }

    async fn handle_return_from_afk(&mut self, color: Color) -> Result<(), SessionError> {
        if self.game.cancel_afk() {
            self.send_to(color.opposite(), GameEvent::OpponentAfkReturn).await;
        }
        Ok(())
    }

    async fn handle_report(
        &mut self,
        reporter: Color,
        reason: String,
        opponents_move_number: u32,
    ) -> Result<(), SessionError> {
        if !self.game.conclusion.is_active() {
            return Err(SessionError::StaleAction("game already concluded".into()));
        }
        if self.game.publicity == Publicity::Private {
            return Err(SessionError::ProtocolViolation("cannot report a private game".into()));
        }
        if opponents_move_number as usize != self.game.moves.len() {
            return Err(SessionError::ProtocolViolation(
                "reported move number does not match the last move played".into(),
            ));
        }
        let last_mover = if self.game.moves.len() % 2 == 1 { Color::White } else { Color::Black };
        if last_mover == reporter {
            return Err(SessionError::ProtocolViolation("cannot report your own move".into()));
        }
        let rolled_back = self.game.rollback_last_move();
        info!(game_id = %self.game.id, %reporter, %reason, ?rolled_back, "cheat report received");
        self.notify(
            Color::White,
            NoticeKind::Notify,
            NoticeText::TranslationKey("ws-game_aborted_cheating".to_string()),
        )
        .await;
        self.notify(
            Color::Black,
            NoticeKind::Notify,
            NoticeText::TranslationKey("ws-game_aborted_cheating".to_string()),
        )
        .await;
        self.conclude(Conclusion::Aborted).await;
        Ok(())
    }

    async fn handle_timer_fired(&mut self, fire: TimerFire) {
        match fire {
            TimerFire::AutoTimeLoss => {
                if let Some(active) = self.game.whose_turn {
                    let winner = active.opposite();
                    self.conclude(Conclusion::Decisive(format!("{winner} time"))).await;
                }
            }
            TimerFire::AfkAutoResign => {
                if let Some(active) = self.game.whose_turn {
                    let outcome = self.game.resign_outcome(active);
                    self.conclude(outcome).await;
                }
            }
            TimerFire::DisconnectStart(color) => {
                if !self.game.conclusion.is_active() || self.endpoints.get(color).is_some() {
                    return;
                }
                let duration = if self.game.is_resignable() { DISCONNECT_RESIGNABLE } else { DISCONNECT_UNRESIGNABLE };
                let now = Instant::now();
                let loss_at = self.game.disconnect_loss_at(color, now, duration);
                let handle = self.arm_disconnect(TimerKind::DisconnectAutoResign, color, loss_at);
                let rec = self.game.disconnect.get_mut(color);
                rec.auto_resign_timer = handle;
                rec.auto_loss_at = Some(loss_at);
                self.send_to(
                    color.opposite(),
                    GameEvent::OpponentDisconnect { auto_resign_at: Some(self.epoch_ms(loss_at)), was_by_choice: false },
                )
                .await;
            }
            TimerFire::DisconnectAutoResign(color) => {
                if !self.game.conclusion.is_active() || self.endpoints.get(color).is_some() {
                    return;
                }
                let outcome = self.game.resign_outcome(color);
                self.conclude(outcome).await;
            }
            TimerFire::Deletion => self.finish_deletion().await,
        }
    }

    async fn finish_deletion(&mut self) {
        if self.game.moves.is_empty() {
            debug!(game_id = %self.game.id, "no moves played, skipping archival");
        } else {
            let summary = self.build_summary();
            if let Err(e) = self.archive.archive(&summary).await {
                warn!(game_id = %self.game.id, %e, "archival failed, game still removed");
            }
        }
        let _ = self.deleted.send(self.game.id.clone());
    }

    /// §7 item 5: a notation-decode failure while rebuilding the
    /// transcript degrades to the `ICN UNAVAILABLE` sentinel rather than
    /// dropping the archive record entirely — the players line, header,
    /// and result still land.
    fn build_summary(&self) -> GameSummary {
        let (moves, transcript_unavailable) = match self
            .game
            .moves
            .iter()
            .map(|s| chesscoord_notation::moves::parse(s, true))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(moves) => (moves, false),
            Err(e) => {
                warn!(game_id = %self.game.id, %e, "could not decode move list for archival, writing ICN UNAVAILABLE");
                (Vec::new(), true)
            }
        };
        let turn = match self.game.whose_turn.unwrap_or(Color::White) {
            Color::White => Side::White,
            Color::Black => Side::Black,
        };
        let header = GameHeader {
            tags: Vec::new(),
            turn,
            en_passant: None,
            move_rule: None,
            fullmove: (self.game.moves.len() as u32 / 2) + 1,
            promotion_ranks: None,
            win_conditions: None,
            other_rules: None,
            position: Position(Vec::new()),
        };
        let (final_white, final_black) = match &self.game.clock {
            Some(clock) => (*clock.get(Color::White), *clock.get(Color::Black)),
            None => (0, 0),
        };
        GameSummary {
            game_id: self.game.id.as_str().to_string(),
            white_display_name: self.game.seats.get(Color::White).public_display_name().to_string(),
            black_display_name: self.game.seats.get(Color::Black).public_display_name().to_string(),
            publicity: self.game.publicity,
            variant: self.game.variant.clone(),
            time_control: self.game.time_control_str.clone(),
            rated: self.game.rated,
            final_clock_white_ms: final_white,
            final_clock_black_ms: final_black,
            header,
            moves,
            transcript_unavailable,
            result: archive_result(&self.game.conclusion),
            termination: self.game.conclusion.as_wire_str().to_string(),
            recorded_at: chrono::Utc::now(),
        }
    }
}

fn archive_result(conclusion: &Conclusion) -> GameResult {
    match conclusion {
        Conclusion::Active => GameResult::Aborted,
        Conclusion::Aborted => GameResult::Aborted,
        Conclusion::Decisive(token) if token.contains("draw") => GameResult::Draw,
        Conclusion::Decisive(token) if token.starts_with("white") => GameResult::WhiteWins,
        Conclusion::Decisive(_) => GameResult::BlackWins,
    }
}

#[allow(clippy::too_many_arguments)]
pub fn spawn_game<C: Connection>(
    game: Game,
    timers: TimerService,
    archive: Arc<ArchiveSink>,
    deleted: mpsc::UnboundedSender<GameId>,
    channel_size: usize,
) -> GameHandle<C> {
    let id = game.id.clone();
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = GameActor {
        game,
        endpoints: Seats::default(),
        timers,
        archive,
        self_sender: tx.clone(),
        receiver: rx,
        deleted,
    };

    tokio::spawn(actor.run());

    GameHandle { id, sender: tx }
}
