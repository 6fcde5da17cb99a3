//! Session manager: creates games, indexes players to games, and routes
//! inbound protocol messages to the right game actor (§4.1's public
//! contract).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use chesscoord_archive::ArchiveSink;
use chesscoord_protocol::{
    Color, ColorPreference, GameAction, GameEvent, InboundMessage, InviteOptions, NoticeKind,
    NoticeText, PlayerHandle,
};
use chesscoord_timer::TimerService;
use chesscoord_transport::{Connection, Endpoint, Subscription};

use crate::actor::{spawn_game, GameHandle};
use crate::error::SessionError;
use crate::game::Game;
use crate::id::GameId;

const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Fired on every game create/delete (§4.1: "used by the invite
/// subsystem for external broadcast").
pub type ActiveGameCountCallback = Box<dyn Fn(usize) + Send + Sync>;

/// Owns every active game and the player-to-game index (§5 "shared
/// resources"). One value per process, constructed at boot.
pub struct GameSessionManager<C: Connection> {
    games: HashMap<GameId, GameHandle<C>>,
    /// Both seats' handles, so a deletion notice can unwind the index
    /// without asking the (already-gone) game actor.
    game_players: HashMap<GameId, (PlayerHandle, PlayerHandle)>,
    members: HashMap<u64, GameId>,
    guests: HashMap<String, GameId>,
    timers: TimerService,
    archive: Arc<ArchiveSink>,
    deleted_tx: mpsc::UnboundedSender<GameId>,
    deleted_rx: mpsc::UnboundedReceiver<GameId>,
    on_count_changed: Option<ActiveGameCountCallback>,
    allow_dev_controls: bool,
}

impl<C: Connection> GameSessionManager<C> {
    pub fn new(archive: Arc<ArchiveSink>, allow_dev_controls: bool) -> Self {
        let (deleted_tx, deleted_rx) = mpsc::unbounded_channel();
        Self {
            games: HashMap::new(),
            game_players: HashMap::new(),
            members: HashMap::new(),
            guests: HashMap::new(),
            timers: TimerService::new(),
            archive,
            deleted_tx,
            deleted_rx,
            on_count_changed: None,
            allow_dev_controls,
        }
    }

    pub fn set_on_active_game_count_changed(&mut self, callback: ActiveGameCountCallback) {
        self.on_count_changed = Some(callback);
    }

    pub fn get_active_game_count(&self) -> usize {
        self.games.len()
    }

    pub fn is_player_in_active_game(&self, handle: &PlayerHandle) -> bool {
        self.index_get(handle).is_some()
    }

    /// §4.1.1. `owner_endpoint` is absent when the owner's channel closed
    /// between invite acceptance and game creation; the owner seat then
    /// immediately enters the not-by-choice disconnect flow.
    pub async fn create_game_from_invite(
        &mut self,
        invite: InviteOptions,
        owner_endpoint: Option<Arc<Endpoint<C>>>,
        accepter_handle: PlayerHandle,
        accepter_endpoint: Arc<Endpoint<C>>,
    ) -> Result<GameId, SessionError> {
        self.reap();
        if self.is_player_in_active_game(&invite.owner_handle) {
            return Err(SessionError::AlreadyInGame(invite.owner_handle.clone()));
        }
        if self.is_player_in_active_game(&accepter_handle) {
            return Err(SessionError::AlreadyInGame(accepter_handle));
        }

        let time_control = chesscoord_protocol::clock_parse(&invite.time_control, self.allow_dev_controls)
            .map_err(|e| SessionError::ProtocolViolation(e.to_string()))?;

        let existing: HashSet<GameId> = self.games.keys().cloned().collect();
        let id = GameId::generate(&existing);

        let owner_is_white = match invite.color_preference {
            ColorPreference::White => true,
            ColorPreference::Black => false,
            ColorPreference::Random => rand::rng().random_bool(0.5),
        };
        let (white, black) = if owner_is_white {
            (invite.owner_handle.clone(), accepter_handle.clone())
        } else {
            (accepter_handle.clone(), invite.owner_handle.clone())
        };
        let owner_color = if owner_is_white { Color::White } else { Color::Black };
        let accepter_color = owner_color.opposite();

        let now = Instant::now();
        let created_at = Utc::now();
        let game = Game::new(
            id.clone(),
            now,
            created_at,
            &invite,
            time_control,
            white.clone(),
            black.clone(),
            invite.black_starts,
        );

        let handle = spawn_game::<C>(
            game,
            self.timers.clone(),
            Arc::clone(&self.archive),
            self.deleted_tx.clone(),
            DEFAULT_CHANNEL_SIZE,
        );

        self.games.insert(id.clone(), handle.clone());
        self.game_players.insert(id.clone(), (white.clone(), black.clone()));
        self.index_insert(&white, id.clone());
        self.index_insert(&black, id.clone());
        self.bump_count();

        accepter_endpoint.set_subscription(Some(Subscription {
            game_id: id.as_str().to_string(),
            color: accepter_color,
        }));
        let _ = handle.rejoin(accepter_color, accepter_endpoint).await;

        match owner_endpoint {
            Some(endpoint) => {
                endpoint.set_subscription(Some(Subscription {
                    game_id: id.as_str().to_string(),
                    color: owner_color,
                }));
                let _ = handle.rejoin(owner_color, endpoint).await;
            }
            None => {
                let _ = handle.endpoint_closed(owner_color, false).await;
            }
        }

        info!(game_id = %id, %owner_color, "game created from invite");
        Ok(id)
    }

    /// §4.1: dispatch over the tagged union of `route == "game"` actions.
    /// `identity` is the caller's already-authenticated handle, needed
    /// only for `rejoin` and identity-based `resync` (the endpoint itself
    /// carries no identity, only its current subscription).
    pub async fn handle_incoming_message(
        &mut self,
        endpoint: &Arc<Endpoint<C>>,
        identity: Option<&PlayerHandle>,
        msg: InboundMessage,
    ) {
        self.reap();
        if msg.route != "game" {
            return;
        }
        let action = match GameAction::decode(&msg.action, &msg.value) {
            Ok(Some(action)) => action,
            Ok(None) => {
                debug!(action = %msg.action, "unrecognized game action, ignoring");
                return;
            }
            Err(e) => {
                warn!(%e, action = %msg.action, "malformed game action payload");
                return;
            }
        };

        match action {
            GameAction::Rejoin => self.dispatch_rejoin(endpoint, identity).await,
            GameAction::Resync { game_id } => {
                self.dispatch_resync(endpoint, Some(game_id), identity, msg.id).await
            }
            GameAction::Unsubscribe => endpoint.set_subscription(None),
            other => self.dispatch_subscribed(endpoint, other).await,
        }
    }

    /// §4.1: begins or schedules the disconnect flow for whichever seat
    /// `endpoint` occupies. A no-op if the endpoint isn't subscribed.
    pub async fn on_endpoint_closed(&mut self, endpoint: &Arc<Endpoint<C>>, by_choice: bool) {
        self.reap();
        let Some(sub) = endpoint.subscription() else {
            return;
        };
        let game_id = GameId::new(sub.game_id);
        if let Some(handle) = self.games.get(&game_id) {
            let _ = handle.endpoint_closed(sub.color, by_choice).await;
        }
    }

    /// §4.1.11. Subsequent join/resync/game-update projections carry the
    /// same timestamp because each game actor remembers it on its own
    /// [`Game`] record.
    pub async fn broadcast_shutdown_window(&mut self, restart_at: DateTime<Utc>) {
        self.reap();
        for handle in self.games.values() {
            let _ = handle.server_restart(restart_at).await;
        }
    }

    /// §4.1.12. Must complete before the process exits — every call here
    /// is awaited synchronously rather than fired off.
    pub async fn drain_and_log_all_games(&mut self) {
        self.reap();
        let handles: Vec<_> = self.games.values().cloned().collect();
        info!(count = handles.len(), "draining active games");
        for handle in &handles {
            if let Err(e) = handle.drain().await {
                warn!(game_id = %handle.id(), %e, "drain failed for game");
            }
        }
        self.reap();
    }

    async fn dispatch_rejoin(&mut self, endpoint: &Arc<Endpoint<C>>, identity: Option<&PlayerHandle>) {
        let Some(identity) = identity else {
            warn!("rejoin requested with no resolved identity");
            return;
        };
        let Some((game_id, color)) = self.locate_by_identity(identity) else {
            self.send_event(endpoint, GameEvent::NoGame, None).await;
            return;
        };
        let Some(handle) = self.games.get(&game_id).cloned() else {
            self.send_event(endpoint, GameEvent::NoGame, None).await;
            return;
        };
        endpoint.set_subscription(Some(Subscription { game_id: game_id.as_str().to_string(), color }));
        let _ = handle.rejoin(color, Arc::clone(endpoint)).await;
    }

    /// §4.1.6: locate by subscription, then by the payload's id, then by
    /// identity. Whichever one resolves re-subscribes the endpoint.
    async fn dispatch_resync(
        &mut self,
        endpoint: &Arc<Endpoint<C>>,
        game_id_hint: Option<String>,
        identity: Option<&PlayerHandle>,
        correlation: Option<String>,
    ) {
        let located = endpoint
            .subscription()
            .map(|s| (GameId::new(s.game_id), s.color))
            .or_else(|| {
                let identity = identity?;
                let gid = GameId::new(game_id_hint?);
                let color = self.color_of(&gid, identity)?;
                Some((gid, color))
            })
            .or_else(|| {
                let identity = identity?;
                self.locate_by_identity(identity)
            });

        let Some((game_id, color)) = located else {
            self.send_event(endpoint, GameEvent::NoGame, correlation).await;
            return;
        };
        let Some(handle) = self.games.get(&game_id).cloned() else {
            self.send_event(endpoint, GameEvent::NoGame, correlation).await;
            return;
        };
        match handle.resync(color).await {
            Ok(view) => {
                endpoint.set_subscription(Some(Subscription { game_id: game_id.as_str().to_string(), color }));
                self.send_event(endpoint, GameEvent::GameUpdate(view), correlation).await;
            }
            Err(_) => self.send_event(endpoint, GameEvent::NoGame, correlation).await,
        }
    }

    async fn dispatch_subscribed(&mut self, endpoint: &Arc<Endpoint<C>>, action: GameAction) {
        let Some(sub) = endpoint.subscription() else {
            debug!("game action with no active subscription, dropping (§7.3)");
            return;
        };
        let game_id = GameId::new(sub.game_id);
        let Some(handle) = self.games.get(&game_id).cloned() else {
            warn!(game_id = %game_id, "game does not exist");
            self.send_notice(endpoint, NoticeKind::PrintError, NoticeText::Literal("game does not exist".into())).await;
            return;
        };
        let color = sub.color;

        let result = match action {
            GameAction::SubmitMove { mv, move_number, game_conclusion } => {
                handle.submit_move(color, mv, move_number, game_conclusion).await
            }
            GameAction::Abort => handle.abort(color).await,
            GameAction::Resign => handle.resign(color).await,
            GameAction::OfferDraw => handle.offer_draw(color).await,
            GameAction::AcceptDraw => handle.accept_draw(color).await,
            GameAction::DeclineDraw => handle.decline_draw(color).await,
            GameAction::DeclareAfk => handle.declare_afk(color).await,
            GameAction::ReturnFromAfk => handle.return_from_afk(color).await,
            GameAction::Report { reason, opponents_move_number } => {
                handle.report(color, reason, opponents_move_number).await
            }
            GameAction::Rejoin | GameAction::Resync { .. } | GameAction::Unsubscribe => {
                unreachable!("routed before reaching dispatch_subscribed")
            }
        };

        if let Err(e) = result {
            self.handle_action_error(endpoint, &handle, color, e).await;
        }
    }

    async fn handle_action_error(
        &self,
        endpoint: &Arc<Endpoint<C>>,
        handle: &GameHandle<C>,
        color: Color,
        err: SessionError,
    ) {
        match err {
            SessionError::MoveNumberMismatch => {
                warn!(game_id = %handle.id(), %color, "resyncing after move number mismatch");
                if let Ok(view) = handle.resync(color).await {
                    self.send_event(endpoint, GameEvent::GameUpdate(view), None).await;
                }
            }
            SessionError::ProtocolViolation(ref msg) => {
                warn!(game_id = %handle.id(), %color, %msg, "protocol violation");
                self.send_notice(endpoint, NoticeKind::PrintError, NoticeText::Literal(msg.clone())).await;
            }
            SessionError::StaleAction(ref msg) => {
                warn!(game_id = %handle.id(), %color, %msg, "stale action");
                self.send_notice(endpoint, NoticeKind::Notify, NoticeText::Literal(msg.clone())).await;
            }
            other => {
                warn!(game_id = %handle.id(), %color, %other, "game command failed");
            }
        }
    }

    async fn send_event(&self, endpoint: &Arc<Endpoint<C>>, event: GameEvent, id: Option<String>) {
        if let Ok(msg) = chesscoord_protocol::OutboundMessage::game_event(&event, id) {
            let _ = endpoint.send(msg.route, msg.action, msg.value, msg.id).await;
        }
    }

    async fn send_notice(&self, endpoint: &Arc<Endpoint<C>>, kind: NoticeKind, text: NoticeText) {
        if let Ok(msg) = chesscoord_protocol::OutboundMessage::notice(kind, text, None) {
            let _ = endpoint.send(msg.route, msg.action, msg.value, msg.id).await;
        }
    }

    fn locate_by_identity(&self, identity: &PlayerHandle) -> Option<(GameId, Color)> {
        let game_id = self.index_get(identity)?;
        let color = self.color_of(&game_id, identity)?;
        Some((game_id, color))
    }

    fn color_of(&self, game_id: &GameId, identity: &PlayerHandle) -> Option<Color> {
        let (white, black) = self.game_players.get(game_id)?;
        if white == identity {
            Some(Color::White)
        } else if black == identity {
            Some(Color::Black)
        } else {
            None
        }
    }

    fn index_insert(&mut self, handle: &PlayerHandle, id: GameId) {
        match handle {
            PlayerHandle::Member { stable_user_id, .. } => {
                self.members.insert(*stable_user_id, id);
            }
            PlayerHandle::Guest { browser_token } => {
                self.guests.insert(browser_token.clone(), id);
            }
        }
    }

    fn index_remove(&mut self, handle: &PlayerHandle) {
        match handle {
            PlayerHandle::Member { stable_user_id, .. } => {
                self.members.remove(stable_user_id);
            }
            PlayerHandle::Guest { browser_token } => {
                self.guests.remove(browser_token);
            }
        }
    }

    fn index_get(&self, handle: &PlayerHandle) -> Option<GameId> {
        match handle {
            PlayerHandle::Member { stable_user_id, .. } => self.members.get(stable_user_id).cloned(),
            PlayerHandle::Guest { browser_token } => self.guests.get(browser_token).cloned(),
        }
    }

    fn bump_count(&self) {
        if let Some(cb) = &self.on_count_changed {
            cb(self.games.len());
        }
    }

    /// Drains the "game deleted" channel every game actor's deletion
    /// window (or drain) feeds into, pruning the registry and index.
    fn reap(&mut self) {
        let mut changed = false;
        while let Ok(id) = self.deleted_rx.try_recv() {
            self.games.remove(&id);
            if let Some((white, black)) = self.game_players.remove(&id) {
                self.index_remove(&white);
                self.index_remove(&black);
            }
            debug!(game_id = %id, "game reaped from registry");
            changed = true;
        }
        if changed {
            self.bump_count();
        }
    }
}
