//! Error types for the IEC 60870-5-104 stack.

use std::borrow::Cow;
use thiserror::Error;

/// Result type alias for IEC 104 operations.
pub type Result<T> = std::result::Result<T, Iec104Error>;

/// IEC 60870-5-104 protocol error kinds.
///
/// Most kinds are session-fatal: they drive the session to `Stopped`,
/// close the transport and are surfaced to the caller exactly once.
/// `UnhandledType` is the exception; it is delivered inline and the
/// session continues.
///
/// Uses `Cow<'static, str>` to avoid allocations for static messages.
#[derive(Debug, Error)]
pub enum Iec104Error {
    /// APDU length field outside [4, 253]
    #[error("Malformed APDU length: {0}")]
    MalformedLength(u8),

    /// Byte other than the 0x68 start octet at a frame boundary
    #[error("Framing violation: expected start octet 0x68, got 0x{0:02X}")]
    FramingViolation(u8),

    /// Control field or frame structure violates the protocol
    #[error("Protocol violation: {0}")]
    ProtocolViolation(Cow<'static, str>),

    /// ASDU type identification with no registered codec
    #[error("Unhandled type ID: {0}")]
    UnhandledType(u8),

    /// ASDU body shorter than its declared information objects
    #[error("Truncated ASDU: {0}")]
    Truncated(Cow<'static, str>),

    /// ASDU body longer than its declared information objects
    #[error("Trailing bytes after {expected} declared information objects")]
    TrailingBytes {
        /// Declared object count
        expected: u8,
    },

    /// ASDU with a zero object count
    #[error("Empty ASDU: zero information objects")]
    EmptyAsdu,

    /// Received N(R) outside the [V(A), V(S)] window
    #[error("N(R) {nr} outside window [{va}, {vs}]")]
    NrOutOfRange {
        /// Received acknowledge number
        nr: u16,
        /// Oldest unacknowledged send sequence
        va: u16,
        /// Next send sequence
        vs: u16,
    },

    /// More than k outbound I-frames in flight
    #[error("Send window overflow (k={0})")]
    WindowOverflow(u16),

    /// Connection establishment exceeded T0
    #[error("T0 timeout: connection not established")]
    T0Timeout,

    /// Send or test confirmation exceeded T1
    #[error("T1 timeout: no acknowledgement received")]
    T1Timeout,

    /// Idle test cycle failed within T3
    #[error("T3 timeout: connection test failed")]
    T3Timeout,

    /// Security policy rejected the peer or a frame
    #[error("Policy violation: {0}")]
    PolicyViolation(Cow<'static, str>),

    /// Receive buffer filled without a complete frame
    #[error("Receive buffer exceeded {0} bytes without a complete frame")]
    BufferExceeded(usize),

    /// Peer closed the transport
    #[error("Transport closed by peer")]
    TransportClosed,

    /// Session aborted by the caller
    #[error("Session aborted")]
    Aborted,

    /// Invalid session parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(Cow<'static, str>),

    /// Operation requires the RUNNING state
    #[error("Session is not running")]
    NotRunning,

    /// Session task is gone
    #[error("Session channel closed")]
    ChannelClosed,

    /// Attempt to encode an out-of-range frame
    #[error("Encode error: {0}")]
    Encode(Cow<'static, str>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Iec104Error {
    /// Create a protocol violation with a static message (zero allocation).
    #[inline]
    pub const fn protocol_static(msg: &'static str) -> Self {
        Self::ProtocolViolation(Cow::Borrowed(msg))
    }

    /// Create a protocol violation with a dynamic message.
    #[inline]
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::ProtocolViolation(Cow::Owned(msg.into()))
    }

    /// Create a truncated-ASDU error with a static message (zero allocation).
    #[inline]
    pub const fn truncated_static(msg: &'static str) -> Self {
        Self::Truncated(Cow::Borrowed(msg))
    }

    /// Create an invalid-configuration error with a static message.
    #[inline]
    pub const fn config_static(msg: &'static str) -> Self {
        Self::InvalidConfig(Cow::Borrowed(msg))
    }

    /// Create an encode error with a static message.
    #[inline]
    pub const fn encode_static(msg: &'static str) -> Self {
        Self::Encode(Cow::Borrowed(msg))
    }

    /// Check whether this kind terminates the session.
    ///
    /// `UnhandledType` is delivered inline and the session continues;
    /// configuration and handle-level kinds never reach a session task.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::UnhandledType(_)
                | Self::InvalidConfig(_)
                | Self::NotRunning
                | Self::ChannelClosed
                | Self::Encode(_)
        )
    }

    /// Check whether this kind is a timeout.
    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::T0Timeout | Self::T1Timeout | Self::T3Timeout)
    }

    /// Map the error kind to the reference CLI exit code.
    ///
    /// 0 normal, 2 parameter error, 3 protocol violation, 4 policy
    /// rejection, 5 timeout. Transport kinds that are not protocol
    /// failures map to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::TransportClosed | Self::Aborted => 0,
            Self::InvalidConfig(_) => 2,
            Self::PolicyViolation(_) => 4,
            Self::T0Timeout | Self::T1Timeout | Self::T3Timeout => 5,
            Self::Io(_) | Self::ChannelClosed | Self::NotRunning => 1,
            _ => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Iec104Error::UnhandledType(255);
        assert_eq!(err.to_string(), "Unhandled type ID: 255");

        let err = Iec104Error::NrOutOfRange { nr: 9, va: 2, vs: 5 };
        assert_eq!(err.to_string(), "N(R) 9 outside window [2, 5]");

        let err = Iec104Error::MalformedLength(3);
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_is_fatal() {
        assert!(Iec104Error::FramingViolation(0xFF).is_fatal());
        assert!(Iec104Error::T1Timeout.is_fatal());
        assert!(Iec104Error::EmptyAsdu.is_fatal());
        assert!(Iec104Error::WindowOverflow(12).is_fatal());
        assert!(Iec104Error::PolicyViolation(Cow::Borrowed("denied")).is_fatal());
        assert!(Iec104Error::BufferExceeded(65536).is_fatal());

        assert!(!Iec104Error::UnhandledType(99).is_fatal());
        assert!(!Iec104Error::config_static("w >= k").is_fatal());
        assert!(!Iec104Error::NotRunning.is_fatal());
        assert!(!Iec104Error::ChannelClosed.is_fatal());
    }

    #[test]
    fn test_is_timeout() {
        assert!(Iec104Error::T0Timeout.is_timeout());
        assert!(Iec104Error::T1Timeout.is_timeout());
        assert!(Iec104Error::T3Timeout.is_timeout());
        assert!(!Iec104Error::TransportClosed.is_timeout());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Iec104Error::TransportClosed.exit_code(), 0);
        assert_eq!(Iec104Error::Aborted.exit_code(), 0);
        assert_eq!(Iec104Error::config_static("k").exit_code(), 2);
        assert_eq!(Iec104Error::protocol_static("bad").exit_code(), 3);
        assert_eq!(Iec104Error::FramingViolation(0x00).exit_code(), 3);
        assert_eq!(
            Iec104Error::PolicyViolation(Cow::Borrowed("blocked")).exit_code(),
            4
        );
        assert_eq!(Iec104Error::T1Timeout.exit_code(), 5);
    }

    #[test]
    fn test_io_error_conversion() {
        use std::io::{Error as IoError, ErrorKind};
        let io_err = IoError::new(ErrorKind::ConnectionRefused, "refused");
        let err: Iec104Error = io_err.into();
        assert!(matches!(err, Iec104Error::Io(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_display_all_variants_nonempty() {
        let errors = [
            Iec104Error::MalformedLength(0),
            Iec104Error::FramingViolation(0xAA),
            Iec104Error::protocol_static("x"),
            Iec104Error::UnhandledType(120),
            Iec104Error::truncated_static("body"),
            Iec104Error::TrailingBytes { expected: 2 },
            Iec104Error::EmptyAsdu,
            Iec104Error::NrOutOfRange { nr: 0, va: 0, vs: 0 },
            Iec104Error::WindowOverflow(12),
            Iec104Error::T0Timeout,
            Iec104Error::T1Timeout,
            Iec104Error::T3Timeout,
            Iec104Error::PolicyViolation(Cow::Borrowed("x")),
            Iec104Error::BufferExceeded(64),
            Iec104Error::TransportClosed,
            Iec104Error::Aborted,
            Iec104Error::config_static("x"),
            Iec104Error::NotRunning,
            Iec104Error::ChannelClosed,
            Iec104Error::encode_static("x"),
        ];
        for err in errors {
            assert!(!err.to_string().is_empty(), "{err:?}");
        }
    }
}
