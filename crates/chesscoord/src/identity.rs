//! Connection-time identity resolution.
//!
//! §1 puts "user account/identity resolution" out of scope for the core:
//! the session manager just wants a [`PlayerHandle`] per endpoint. Here at
//! the edge, something still has to produce one from whatever the first
//! message on a new connection carries. This is the narrow interface that
//! does it, pluggable so a real deployment can swap in its own account
//! lookup without touching `chesscoord-session`.

use chesscoord_protocol::PlayerHandle;

/// Resolves a connection's opening credential into a [`PlayerHandle`].
pub trait Authenticator: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn authenticate(
        &self,
        credential: &str,
    ) -> impl std::future::Future<Output = Result<PlayerHandle, Self::Error>> + Send;
}

#[derive(Debug, thiserror::Error)]
#[error("empty credential")]
pub struct GuestAuthError;

/// Default authenticator for standalone/demo deployments: every
/// connection is a guest, keyed by whatever opaque token the client
/// sent as its credential (a browser-local token in the real deployment
/// this was distilled from).
#[derive(Debug, Clone, Copy, Default)]
pub struct GuestAuthenticator;

impl Authenticator for GuestAuthenticator {
    type Error = GuestAuthError;

    async fn authenticate(&self, credential: &str) -> Result<PlayerHandle, Self::Error> {
        if credential.is_empty() {
            return Err(GuestAuthError);
        }
        Ok(PlayerHandle::Guest { browser_token: credential.to_string() })
    }
}
