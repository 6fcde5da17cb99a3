//! `ChessCoordServer` builder and server loop.
//!
//! This is the entry point for running the coordinator. It ties together
//! the layers: transport → protocol → session.

use std::sync::Arc;
use std::time::Duration;

use chesscoord_archive::ArchiveSink;
use chesscoord_session::GameSessionManager;
use chesscoord_transport::{Transport, WebSocketConnection, WebSocketTransport};
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::handler::handle_connection;
use crate::identity::Authenticator;
use crate::CoordError;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<A: Authenticator> {
    pub(crate) manager: Mutex<GameSessionManager<WebSocketConnection>>,
    pub(crate) auth: A,
    pub(crate) config: AppConfig,
}

/// Builder for configuring and starting a coordinator server.
pub struct ChessCoordServerBuilder {
    config: AppConfig,
}

impl ChessCoordServerBuilder {
    pub fn new() -> Self {
        Self { config: AppConfig::from_env() }
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn build<A: Authenticator>(
        self,
        auth: A,
    ) -> Result<ChessCoordServer<A>, CoordError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let archive = Arc::new(ArchiveSink::new(
            self.config.archive_log_path.clone(),
            self.config.stats_path.clone(),
        ));
        let manager = GameSessionManager::new(archive, self.config.environment.allow_dev_controls());

        let state = Arc::new(ServerState {
            manager: Mutex::new(manager),
            auth,
            config: self.config,
        });

        Ok(ChessCoordServer { transport, state })
    }
}

impl Default for ChessCoordServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running coordinator server. Call [`run()`](Self::run) to start
/// accepting connections.
pub struct ChessCoordServer<A: Authenticator> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A>>,
}

impl<A: Authenticator> ChessCoordServer<A> {
    pub fn builder() -> ChessCoordServerBuilder {
        ChessCoordServerBuilder::new()
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop and the allow-invites poller until the
    /// process is terminated, then drains every active game.
    pub async fn run(mut self) -> Result<(), CoordError> {
        tracing::info!(addr = %self.state.config.bind_addr, "coordinator server running");

        let poller_state = Arc::clone(&self.state);
        let poller = tokio::spawn(async move { run_allow_invites_poller(poller_state).await });

        let result = loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed, stopping server");
                    break Err(e.into());
                }
            }
        };

        poller.abort();
        self.state.manager.lock().await.drain_and_log_all_games().await;
        result
    }
}

/// §6: `database/allowinvites.json` is polled every 5s by the (external,
/// out-of-scope) invite subsystem; when it carries a restart timestamp,
/// every active game is told about the shutdown window.
async fn run_allow_invites_poller<A: Authenticator>(state: Arc<ServerState<A>>) {
    let mut last_restart_at = None;
    loop {
        tokio::time::sleep(Duration::from_secs(5)).await;
        match read_restart_at(&state.config.allow_invites_path).await {
            Ok(Some(restart_at)) if Some(restart_at) != last_restart_at => {
                tracing::info!(%restart_at, "shutdown window announced");
                state.manager.lock().await.broadcast_shutdown_window(restart_at).await;
                last_restart_at = Some(restart_at);
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "allow-invites file unreadable"),
        }
    }
}

async fn read_restart_at(path: &std::path::Path) -> std::io::Result<Option<chrono::DateTime<chrono::Utc>>> {
    let contents = tokio::fs::read_to_string(path).await?;
    let value: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(value
        .get("restartAt")
        .and_then(serde_json::Value::as_i64)
        .and_then(|ms| chrono::DateTime::from_timestamp_millis(ms)))
}
