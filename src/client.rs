//! Controlling-station (client) entry point.

use std::sync::Arc;

use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::timeout;
use tracing::info;

use crate::error::{Iec104Error, Result};
use crate::policy::SessionPolicy;
use crate::registry::TypeRegistry;
use crate::session::{Session, SessionConfig, SessionEvent, SessionRole};

/// Default IEC 104 TCP port.
pub const DEFAULT_PORT: u16 = 2404;

/// Connect to a controlled station and return a running session.
///
/// The TCP connect is bounded by T0. With the default
/// [`SessionConfig::auto_start`] the STARTDT handshake is performed
/// before this returns, so the session is in `Running`; with
/// `auto_start(false)` the session is returned in `Connecting` and the
/// caller drives [`Session::start_data_transfer`].
///
/// Uses the standard type registry; see [`open_client_with_registry`]
/// to bring caller-registered ASDU types.
pub async fn open_client(
    addr: impl ToSocketAddrs,
    config: SessionConfig,
    policy: Arc<dyn SessionPolicy>,
) -> Result<Session> {
    let registry = Arc::new(TypeRegistry::with_standard_types());
    open_client_with_registry(addr, config, policy, registry).await
}

/// [`open_client`] with an explicit type registry.
pub async fn open_client_with_registry(
    addr: impl ToSocketAddrs,
    config: SessionConfig,
    policy: Arc<dyn SessionPolicy>,
    registry: Arc<TypeRegistry>,
) -> Result<Session> {
    config.validate()?;

    let stream = timeout(config.t0, TcpStream::connect(addr))
        .await
        .map_err(|_| Iec104Error::T0Timeout)??;

    // Telecontrol traffic is small and latency-sensitive.
    stream.set_nodelay(true).ok();
    let peer = stream.peer_addr().ok();
    info!(?peer, "connected");

    let auto_start = config.auto_start;
    let mut session = Session::spawn(
        stream,
        SessionRole::Client,
        config,
        policy,
        registry,
        peer,
    )?;

    if auto_start {
        match session.receive().await {
            Some(SessionEvent::Started) => {}
            Some(SessionEvent::Stopped(Some(err))) => return Err(err),
            Some(SessionEvent::Stopped(None)) => return Err(Iec104Error::TransportClosed),
            _ => return Err(Iec104Error::protocol_static("unexpected event during STARTDT")),
        }
    }

    Ok(session)
}
