//! # chesscoord
//!
//! Server-side session coordinator for a two-player chess game: accepts
//! WebSocket connections, creates one actor per active game, and routes
//! moves, clocks, draw offers, AFK handling, and reconnection between a
//! player's endpoint and their game.
//!
//! ```rust,no_run
//! use chesscoord::{ChessCoordServer, GuestAuthenticator};
//!
//! # async fn run() -> Result<(), chesscoord::CoordError> {
//! let server = ChessCoordServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(GuestAuthenticator)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod identity;
mod server;

pub use config::{AppConfig, Environment};
pub use error::CoordError;
pub use identity::{Authenticator, GuestAuthError, GuestAuthenticator};
pub use server::{ChessCoordServer, ChessCoordServerBuilder};
