//! Game session lifecycle for the chess coordinator.
//!
//! Each game runs as an isolated Tokio task (actor model) with its own
//! state, seats, and timers; [`manager::GameSessionManager`] creates
//! these actors from accepted invites and routes inbound protocol
//! messages to whichever one a caller's endpoint is subscribed to.

pub mod actor;
pub mod conclusion;
pub mod error;
pub mod game;
pub mod id;
pub mod manager;
pub mod seats;

pub use actor::{GameActor, GameHandle};
pub use error::SessionError;
pub use game::Game;
pub use id::GameId;
pub use manager::GameSessionManager;
