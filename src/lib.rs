//! # iec104-net
//!
//! IEC 60870-5-104 protocol stack for Rust.
//!
//! This crate implements the IEC 104 telecontrol protocol over TCP in
//! both the controlling-station (client) and controlled-station
//! (server) roles: APCI framing, the typed ASDU codec with an open
//! type registry, the STARTDT/STOPDT/TESTFR session state machine, the
//! T0..T3 timer regime and k/w flow control.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use iec104_net::{open_client, AcceptAll, Asdu, SessionConfig, SessionEvent};
//!
//! #[tokio::main]
//! async fn main() -> iec104_net::Result<()> {
//!     let config = SessionConfig::default();
//!     let mut session = open_client("192.168.1.100:2404", config, Arc::new(AcceptAll)).await?;
//!
//!     // Request a general interrogation
//!     session.submit(Asdu::general_interrogation(1)).await?;
//!
//!     while let Some(event) = session.receive().await {
//!         match event {
//!             SessionEvent::Asdu(asdu) => println!("{:?}", asdu),
//!             SessionEvent::Unhandled(raw) => println!("unhandled type {}", raw.header.type_id),
//!             SessionEvent::Stopped(reason) => {
//!                 println!("stopped: {:?}", reason);
//!                 break;
//!             }
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Protocol overview
//!
//! IEC 60870-5-104 runs over TCP (default port 2404) and frames every
//! APDU with a start octet and length:
//!
//! ```text
//! APCI (6 bytes):
//! +--------+--------+--------+--------+--------+--------+
//! | 0x68   | Length | Control field (4 bytes)           |
//! +--------+--------+--------+--------+--------+--------+
//! ```
//!
//! - **I-frame**: numbered information transfer (carries an ASDU)
//! - **S-frame**: supervisory acknowledgement
//! - **U-frame**: unnumbered control (STARTDT, STOPDT, TESTFR)
//!
//! Sequence numbers are 15-bit; at most `k` I-frames may be
//! unacknowledged outbound, and an S-frame acknowledges inbound frames
//! at the `w` threshold. The four standard timers govern connection
//! establishment (T0), acknowledgement (T1), ack delay (T2) and idle
//! testing (T3).

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod client;
pub mod codec;
pub mod error;
pub mod policy;
pub mod registry;
pub mod server;
pub mod session;
pub mod types;
pub mod window;

// Re-export the main surface
pub use client::{open_client, open_client_with_registry, DEFAULT_PORT};
pub use codec::{Apdu, Iec104Codec};
pub use error::{Iec104Error, Result};
pub use policy::{AcceptAll, FrameMeta, PolicyDecision, SessionPolicy};
pub use registry::{ElementCodec, TypeRegistry, UnhandledAsdu};
pub use server::{serve, serve_listener, serve_with_registry};
pub use session::{
    Session, SessionConfig, SessionEvent, SessionRole, SessionState,
};
pub use types::*;
