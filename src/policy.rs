//! Security policy hooks.
//!
//! The stack consults a caller-supplied policy at two points: when a
//! peer connects to a server (before the session enters CONNECTING) and
//! before any received I-frame is dispatched to the application. Both
//! hooks are synchronous and must answer immediately; implementations
//! are free to consult data maintained elsewhere (an allowlist, a token
//! bucket) but must not block. A rejection closes the session with a
//! policy violation.

use std::net::SocketAddr;

use crate::types::{Cot, FrameType};

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Let the peer or frame through.
    Accept,
    /// Close the session with a policy violation.
    Reject,
}

impl PolicyDecision {
    /// Check if this decision accepts.
    #[inline]
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Metadata of a received I-frame offered to [`SessionPolicy::check_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMeta {
    /// Frame classification
    pub frame_type: FrameType,
    /// ASDU type identification
    pub type_id: u8,
    /// Cause of transmission
    pub cot: Cot,
    /// Common address of the ASDU
    pub common_address: u16,
    /// Declared information object count
    pub num_objects: u8,
    /// Peer address, when the transport has one
    pub peer: Option<SocketAddr>,
}

/// Caller-supplied security policy.
///
/// Both methods default to accept, so implementations override only the
/// checks they care about. Policies are shared between sessions and
/// must be `Send + Sync`.
pub trait SessionPolicy: Send + Sync {
    /// Called by the server before a new connection becomes a session.
    fn check_peer(&self, peer: SocketAddr) -> PolicyDecision {
        let _ = peer;
        PolicyDecision::Accept
    }

    /// Called before a received I-frame is dispatched to the
    /// application (rate limiting hook).
    fn check_frame(&self, meta: &FrameMeta) -> PolicyDecision {
        let _ = meta;
        PolicyDecision::Accept
    }
}

/// Policy that accepts every peer and frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl SessionPolicy for AcceptAll {}
