//! Controlled-station (server) entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{info, warn};

use crate::error::Result;
use crate::policy::SessionPolicy;
use crate::registry::TypeRegistry;
use crate::session::{Session, SessionConfig, SessionRole};

/// Accept connections and hand each admitted session to `on_session`.
///
/// Every peer passes [`SessionPolicy::check_peer`] before a session is
/// created; rejected connections are closed without a handshake. Each
/// accepted session waits for STARTDT act under T0 and runs
/// independently. The callback is synchronous; spawn a task inside it
/// for per-session work.
///
/// Runs until the listener fails. Uses the standard type registry; see
/// [`serve_with_registry`] to bring caller-registered ASDU types.
pub async fn serve<F>(
    bind_addr: impl ToSocketAddrs,
    config: SessionConfig,
    policy: Arc<dyn SessionPolicy>,
    on_session: F,
) -> Result<()>
where
    F: FnMut(Session, SocketAddr),
{
    let registry = Arc::new(TypeRegistry::with_standard_types());
    serve_with_registry(bind_addr, config, policy, registry, on_session).await
}

/// [`serve`] with an explicit type registry.
pub async fn serve_with_registry<F>(
    bind_addr: impl ToSocketAddrs,
    config: SessionConfig,
    policy: Arc<dyn SessionPolicy>,
    registry: Arc<TypeRegistry>,
    on_session: F,
) -> Result<()>
where
    F: FnMut(Session, SocketAddr),
{
    let listener = TcpListener::bind(bind_addr).await?;
    serve_listener(listener, config, policy, registry, on_session).await
}

/// [`serve`] on an already-bound listener.
///
/// Useful when the caller needs the ephemeral port before serving.
pub async fn serve_listener<F>(
    listener: TcpListener,
    config: SessionConfig,
    policy: Arc<dyn SessionPolicy>,
    registry: Arc<TypeRegistry>,
    mut on_session: F,
) -> Result<()>
where
    F: FnMut(Session, SocketAddr),
{
    config.validate()?;
    info!(addr = ?listener.local_addr().ok(), "listening");

    loop {
        let (stream, peer) = listener.accept().await?;

        if !policy.check_peer(peer).is_accept() {
            warn!(%peer, "connection rejected by policy");
            continue;
        }

        stream.set_nodelay(true).ok();
        match Session::spawn(
            stream,
            SessionRole::Server,
            config.clone(),
            Arc::clone(&policy),
            Arc::clone(&registry),
            Some(peer),
        ) {
            Ok(session) => {
                info!(%peer, "session accepted");
                on_session(session, peer);
            }
            Err(err) => warn!(%peer, %err, "failed to start session"),
        }
    }
}
