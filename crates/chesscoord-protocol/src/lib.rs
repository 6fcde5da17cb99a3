//! Wire protocol for the chess game session coordinator.
//!
//! This crate defines the "language" clients and the core speak:
//!
//! - **Identity** ([`PlayerHandle`], [`Color`]) — who is playing and which
//!   seat they hold.
//! - **Clock format** ([`clock`]) — parsing and validating time-control
//!   strings.
//! - **Invite options** ([`invite`]) — the input consumed once at game
//!   creation.
//! - **Messages** ([`message`]) — the inbound/outbound wire shapes (§6).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong decoding.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (InboundMessage) → Session (game state)
//! ```
//!
//! This layer doesn't know about connections or games — it only knows
//! how to shape and (de)serialize messages.

mod clock;
mod codec;
mod error;
mod identity;
mod invite;
mod message;

pub use clock::{is_valid as clock_is_valid, parse as clock_parse, ClockFormatError, TimeControl};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use identity::{Color, PlayerHandle};
pub use invite::{ColorPreference, InviteOptions, Publicity};
pub use message::{
    ClockView, DisconnectView, GameAction, GameConclusionClaim, GameEvent, InboundMessage,
    NoticeKind, NoticeText, OutboundMessage, SafeGameView,
};
