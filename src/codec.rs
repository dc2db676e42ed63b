//! IEC 60870-5-104 frame codec for tokio.
//!
//! Implements APCI framing on top of the tokio-util codec framework.
//! The decoder is strict: a byte other than 0x68 at a frame boundary, a
//! length outside [4, 253] or a malformed control field all fail the
//! stream; there is no resynchronisation. ASDU bodies are carried as
//! cheap [`Bytes`] slices of the receive buffer and handed to the ASDU
//! codec unparsed.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::Iec104Error;
use crate::types::{Apci, UFunction, MAX_APDU_LENGTH, MAX_ASDU_LENGTH, MIN_APDU_LENGTH, START_BYTE};

/// Default receive buffer bound.
pub const DEFAULT_MAX_RECV_BUFFER: usize = 64 * 1024;

/// An IEC 104 APDU: APCI control information plus the raw ASDU body.
///
/// The body is empty for S- and U-frames. I-frame bodies are encoded
/// and decoded by the [`crate::registry::TypeRegistry`], keeping the
/// frame codec stateless with respect to application types.
#[derive(Debug, Clone, PartialEq)]
pub struct Apdu {
    /// APCI control field
    pub apci: Apci,
    /// Raw ASDU body (I-frames only)
    pub body: Bytes,
}

impl Apdu {
    /// Create an I-frame APDU carrying an encoded ASDU body.
    pub fn i_frame(send_seq: u16, recv_seq: u16, body: Bytes) -> Self {
        Self {
            apci: Apci::i_frame(send_seq, recv_seq),
            body,
        }
    }

    /// Create an S-frame APDU.
    pub fn s_frame(recv_seq: u16) -> Self {
        Self {
            apci: Apci::s_frame(recv_seq),
            body: Bytes::new(),
        }
    }

    /// Create a U-frame APDU.
    pub fn u_frame(function: UFunction) -> Self {
        Self {
            apci: Apci::u_frame(function),
            body: Bytes::new(),
        }
    }

    /// Check if this is an I-frame.
    pub fn is_i_frame(&self) -> bool {
        self.apci.is_i_frame()
    }

    /// Check if this is an S-frame.
    pub fn is_s_frame(&self) -> bool {
        self.apci.is_s_frame()
    }

    /// Check if this is a U-frame.
    pub fn is_u_frame(&self) -> bool {
        self.apci.is_u_frame()
    }
}

impl std::fmt::Display for Apdu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.apci)?;
        if !self.body.is_empty() {
            write!(f, " +{}B", self.body.len())?;
        }
        Ok(())
    }
}

/// IEC 60870-5-104 frame codec.
///
/// # Example
///
/// ```rust,ignore
/// use tokio_util::codec::Framed;
/// use iec104_net::codec::{Apdu, Iec104Codec};
///
/// let stream = TcpStream::connect("192.168.1.100:2404").await?;
/// let mut framed = Framed::new(stream, Iec104Codec::new());
/// framed.send(Apdu::u_frame(UFunction::StartDtAct)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Iec104Codec {
    state: DecodeState,
    max_recv_buffer: usize,
}

#[derive(Debug, Clone, Default)]
enum DecodeState {
    #[default]
    Start,
    Data {
        length: usize,
    },
}

impl Default for Iec104Codec {
    fn default() -> Self {
        Self {
            state: DecodeState::Start,
            max_recv_buffer: DEFAULT_MAX_RECV_BUFFER,
        }
    }
}

impl Iec104Codec {
    /// Create a codec with the default receive buffer bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with a custom receive buffer bound.
    pub fn with_max_buffer(max_recv_buffer: usize) -> Self {
        Self {
            state: DecodeState::Start,
            max_recv_buffer,
        }
    }
}

impl Decoder for Iec104Codec {
    type Item = Apdu;
    type Error = Iec104Error;

    fn decode(&mut self, src: &mut BytesMut) -> std::result::Result<Option<Apdu>, Iec104Error> {
        loop {
            match self.state {
                DecodeState::Start => {
                    if src.is_empty() {
                        return Ok(None);
                    }

                    if src[0] != START_BYTE {
                        return Err(Iec104Error::FramingViolation(src[0]));
                    }

                    if src.len() < 2 {
                        return self.check_buffer(src);
                    }

                    let length = src[1] as usize;
                    if !(MIN_APDU_LENGTH..=MAX_APDU_LENGTH).contains(&length) {
                        return Err(Iec104Error::MalformedLength(src[1]));
                    }

                    src.advance(2);
                    self.state = DecodeState::Data { length };
                }

                DecodeState::Data { length } => {
                    if src.len() < length {
                        return self.check_buffer(src);
                    }

                    let mut frame = src.split_to(length).freeze();
                    self.state = DecodeState::Start;

                    let apci = Apci::parse(&frame[..4])?;
                    let body = frame.split_off(4);

                    match &apci {
                        Apci::IFrame { .. } => {
                            if body.is_empty() {
                                return Err(Iec104Error::protocol_static(
                                    "I-frame without ASDU body",
                                ));
                            }
                        }
                        Apci::SFrame { .. } | Apci::UFrame { .. } => {
                            if !body.is_empty() {
                                return Err(Iec104Error::protocol_static(
                                    "S/U-frame length must be 4",
                                ));
                            }
                        }
                    }

                    return Ok(Some(Apdu { apci, body }));
                }
            }
        }
    }
}

impl Iec104Codec {
    /// Incomplete frame: keep waiting unless the buffer bound is hit.
    fn check_buffer(&self, src: &BytesMut) -> std::result::Result<Option<Apdu>, Iec104Error> {
        if src.len() > self.max_recv_buffer {
            Err(Iec104Error::BufferExceeded(self.max_recv_buffer))
        } else {
            Ok(None)
        }
    }
}

impl Encoder<Apdu> for Iec104Codec {
    type Error = Iec104Error;

    fn encode(&mut self, item: Apdu, dst: &mut BytesMut) -> std::result::Result<(), Iec104Error> {
        if item.body.len() > MAX_ASDU_LENGTH {
            return Err(Iec104Error::encode_static("ASDU body exceeds 249 bytes"));
        }
        if !item.apci.is_i_frame() && !item.body.is_empty() {
            return Err(Iec104Error::encode_static("only I-frames carry an ASDU"));
        }

        dst.reserve(6 + item.body.len());
        dst.extend_from_slice(&item.apci.encode_header(item.body.len()));
        dst.extend_from_slice(&item.body);
        Ok(())
    }
}
