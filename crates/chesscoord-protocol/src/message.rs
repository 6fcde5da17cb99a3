//! Wire message shapes (§6). The transport hands the core an already
//! decoded [`InboundMessage`]; the core hands the transport an
//! [`OutboundMessage`] to re-encode and deliver to one endpoint.

use crate::identity::Color;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{route, action, value, id?}` exactly as decoded off the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub route: String,
    pub action: String,
    pub value: Value,
    pub id: Option<String>,
}

/// A move's claimed outcome, sent alongside `submitmove`. `Active` is the
/// literal `false`; anything else is a conclusion token the server must
/// verify independently rather than trust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameConclusionClaim {
    Active,
    Claimed(String),
}

impl GameConclusionClaim {
    pub fn from_value(v: &Value) -> Option<GameConclusionClaim> {
        match v {
            Value::Bool(false) => Some(GameConclusionClaim::Active),
            Value::String(s) => Some(GameConclusionClaim::Claimed(s.clone())),
            _ => None,
        }
    }
}

/// `route == "game"` inbound actions, decoded from `(action, value)`.
#[derive(Debug, Clone, PartialEq)]
pub enum GameAction {
    SubmitMove {
        mv: String,
        move_number: u32,
        game_conclusion: GameConclusionClaim,
    },
    /// `joingame` inbound — rejoin an existing game.
    Rejoin,
    /// `removefromplayersinactivegames` inbound — unsubscribe.
    Unsubscribe,
    Resync {
        game_id: String,
    },
    Abort,
    Resign,
    OfferDraw,
    AcceptDraw,
    DeclineDraw,
    /// `AFK` inbound.
    DeclareAfk,
    /// `AFK-Return` inbound.
    ReturnFromAfk,
    Report {
        reason: String,
        opponents_move_number: u32,
    },
}

impl GameAction {
    /// Decodes `(action, value)` per the literal action strings in §6.
    /// An unrecognized action is not an error here — callers log and
    /// ignore per the session manager's contract, so this returns `None`
    /// rather than surfacing a `ProtocolError` for that case.
    pub fn decode(action: &str, value: &Value) -> Result<Option<GameAction>, crate::error::ProtocolError> {
        let bad = || crate::error::ProtocolError::MalformedPayload(action.to_string());
        Ok(Some(match action {
            "submitmove" => {
                let mv = value.get("move").and_then(Value::as_str).ok_or_else(bad)?;
                let move_number = value
                    .get("moveNumber")
                    .and_then(Value::as_u64)
                    .ok_or_else(bad)? as u32;
                let game_conclusion = value
                    .get("gameConclusion")
                    .and_then(GameConclusionClaim::from_value)
                    .ok_or_else(bad)?;
                GameAction::SubmitMove {
                    mv: mv.to_string(),
                    move_number,
                    game_conclusion,
                }
            }
            "joingame" => GameAction::Rejoin,
            "removefromplayersinactivegames" => GameAction::Unsubscribe,
            "resync" => {
                let game_id = value.as_str().ok_or_else(bad)?.to_string();
                GameAction::Resync { game_id }
            }
            "abort" => GameAction::Abort,
            "resign" => GameAction::Resign,
            "offerdraw" => GameAction::OfferDraw,
            "acceptdraw" => GameAction::AcceptDraw,
            "declinedraw" => GameAction::DeclineDraw,
            "AFK" => GameAction::DeclareAfk,
            "AFK-Return" => GameAction::ReturnFromAfk,
            "report" => {
                let reason = value
                    .get("reason")
                    .and_then(Value::as_str)
                    .ok_or_else(bad)?
                    .to_string();
                let opponents_move_number = value
                    .get("opponentsMoveNumber")
                    .and_then(Value::as_u64)
                    .ok_or_else(bad)? as u32;
                GameAction::Report {
                    reason,
                    opponents_move_number,
                }
            }
            _ => return Ok(None),
        }))
    }
}

/// Clocks carried in outbound payloads that include timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockView {
    pub white_ms: u64,
    pub black_ms: u64,
    pub next_loss_at: Option<u64>,
}

/// The opponent's disconnect record, as exposed to the caller only
/// (never one's own — there is nothing to tell oneself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectView {
    pub auto_resign_at: Option<u64>,
    pub was_by_choice: bool,
}

/// The projection sent on join/rejoin/resync: never leaks the opponent's
/// guest token, carries only what the caller's own client needs (§4.1.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeGameView {
    pub game_id: String,
    pub created_at: u64,
    pub publicity: crate::invite::Publicity,
    pub variant: String,
    pub time_control: String,
    pub rated: bool,
    pub moves: Vec<String>,
    pub white_display_name: String,
    pub black_display_name: String,
    pub your_color: Color,
    pub clock: Option<ClockView>,
    /// `"Active"` or a decisive conclusion token (e.g. `"white checkmate"`).
    pub conclusion: String,
    pub afk_loss_at: Option<u64>,
    pub opponent_disconnect: Option<DisconnectView>,
    pub server_restart_at: Option<u64>,
}

/// `route == "game"` outbound actions (§6). Each variant's payload is
/// serialized into `OutboundMessage::value` under the matching action
/// string returned by [`GameEvent::action_name`].
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GameEvent {
    JoinGame(SafeGameView),
    GameUpdate(SafeGameView),
    Clock(ClockView),
    Move {
        #[serde(rename = "move")]
        mv: String,
        move_number: u32,
        clock: Option<ClockView>,
    },
    DrawOffer,
    DeclineDraw,
    OpponentAfk {
        auto_afk_resign_time: u64,
    },
    OpponentAfkReturn,
    OpponentDisconnect {
        auto_resign_at: Option<u64>,
        was_by_choice: bool,
    },
    OpponentDisconnectReturn,
    ServerRestart {
        restart_at: u64,
    },
    Unsub,
    LeaveGame,
    NoGame,
    Login,
}

impl GameEvent {
    pub fn action_name(&self) -> &'static str {
        match self {
            GameEvent::JoinGame(_) => "joingame",
            GameEvent::GameUpdate(_) => "gameupdate",
            GameEvent::Clock(_) => "clock",
            GameEvent::Move { .. } => "move",
            GameEvent::DrawOffer => "drawoffer",
            GameEvent::DeclineDraw => "declinedraw",
            GameEvent::OpponentAfk { .. } => "opponentafk",
            GameEvent::OpponentAfkReturn => "opponentafkreturn",
            GameEvent::OpponentDisconnect { .. } => "opponentdisconnect",
            GameEvent::OpponentDisconnectReturn => "opponentdisconnectreturn",
            GameEvent::ServerRestart { .. } => "serverrestart",
            GameEvent::Unsub => "unsub",
            GameEvent::LeaveGame => "leavegame",
            GameEvent::NoGame => "nogame",
            GameEvent::Login => "login",
        }
    }
}

/// `route == "general"` outbound actions: a message that is either
/// already localized or a translation key the transport resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NoticeText {
    Literal(String),
    TranslationKey(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Notify,
    NotifyError,
    PrintError,
}

impl NoticeKind {
    pub fn action_name(self) -> &'static str {
        match self {
            NoticeKind::Notify => "notify",
            NoticeKind::NotifyError => "notifyerror",
            NoticeKind::PrintError => "printerror",
        }
    }
}

/// The fully-built outbound envelope, ready for the codec to serialize.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub route: &'static str,
    pub action: &'static str,
    pub value: Value,
    pub id: Option<String>,
}

impl OutboundMessage {
    pub fn game_event(event: &GameEvent, id: Option<String>) -> Result<OutboundMessage, crate::error::ProtocolError> {
        let value = serde_json::to_value(event).map_err(crate::error::ProtocolError::Encode)?;
        Ok(OutboundMessage {
            route: "game",
            action: event.action_name(),
            value,
            id,
        })
    }

    pub fn notice(kind: NoticeKind, text: NoticeText, id: Option<String>) -> Result<OutboundMessage, crate::error::ProtocolError> {
        let value = serde_json::to_value(text).map_err(crate::error::ProtocolError::Encode)?;
        Ok(OutboundMessage {
            route: "general",
            action: kind.action_name(),
            value,
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_submitmove_payload() {
        let v = json!({"move": "e2e4", "moveNumber": 1, "gameConclusion": false});
        let decoded = GameAction::decode("submitmove", &v).unwrap().unwrap();
        assert_eq!(
            decoded,
            GameAction::SubmitMove {
                mv: "e2e4".to_string(),
                move_number: 1,
                game_conclusion: GameConclusionClaim::Active,
            }
        );
    }

    #[test]
    fn test_decode_submitmove_with_claimed_conclusion() {
        let v = json!({"move": "Qh5xf7", "moveNumber": 9, "gameConclusion": "white checkmate"});
        let decoded = GameAction::decode("submitmove", &v).unwrap().unwrap();
        match decoded {
            GameAction::SubmitMove { game_conclusion, .. } => {
                assert_eq!(
                    game_conclusion,
                    GameConclusionClaim::Claimed("white checkmate".to_string())
                );
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_decode_resync_payload_is_bare_string() {
        let v = json!("game-123");
        let decoded = GameAction::decode("resync", &v).unwrap().unwrap();
        assert_eq!(
            decoded,
            GameAction::Resync {
                game_id: "game-123".to_string()
            }
        );
    }

    #[test]
    fn test_decode_afk_variants_have_no_payload() {
        assert_eq!(
            GameAction::decode("AFK", &Value::Null).unwrap().unwrap(),
            GameAction::DeclareAfk
        );
        assert_eq!(
            GameAction::decode("AFK-Return", &Value::Null).unwrap().unwrap(),
            GameAction::ReturnFromAfk
        );
    }

    #[test]
    fn test_decode_unknown_action_returns_none_not_error() {
        assert!(GameAction::decode("not-a-real-action", &Value::Null)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_decode_submitmove_missing_field_is_malformed_error() {
        let v = json!({"move": "e2e4"});
        assert!(GameAction::decode("submitmove", &v).is_err());
    }

    #[test]
    fn test_game_event_action_names_match_wire_literals() {
        assert_eq!(GameEvent::Unsub.action_name(), "unsub");
        assert_eq!(GameEvent::OpponentAfkReturn.action_name(), "opponentafkreturn");
        assert_eq!(
            GameEvent::ServerRestart { restart_at: 0 }.action_name(),
            "serverrestart"
        );
    }
}
