//! IEC 60870-5-104 APCI (Application Protocol Control Information).
//!
//! APCI is the 6-byte header of an APDU: start octet, length octet and
//! four control octets carrying frame type and sequence numbers.

use crate::error::{Iec104Error, Result};

/// Start octet for IEC 104 frames.
pub const START_BYTE: u8 = 0x68;

/// Minimum APDU length (control field only, no ASDU).
pub const MIN_APDU_LENGTH: usize = 4;

/// Maximum APDU length.
pub const MAX_APDU_LENGTH: usize = 253;

/// Maximum ASDU body length inside an I-frame.
pub const MAX_ASDU_LENGTH: usize = MAX_APDU_LENGTH - 4;

/// Sequence numbers are 15-bit; arithmetic is modulo this value.
pub const SEQ_MODULO: u16 = 32768;

/// APCI frame type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// I-frame: information transfer
    IFrame,
    /// S-frame: supervisory (acknowledgment)
    SFrame,
    /// U-frame: unnumbered (control)
    UFrame,
}

/// U-frame control functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UFunction {
    /// STARTDT act (start data transfer activation)
    StartDtAct,
    /// STARTDT con (start data transfer confirmation)
    StartDtCon,
    /// STOPDT act (stop data transfer activation)
    StopDtAct,
    /// STOPDT con (stop data transfer confirmation)
    StopDtCon,
    /// TESTFR act (test frame activation)
    TestFrAct,
    /// TESTFR con (test frame confirmation)
    TestFrCon,
}

impl UFunction {
    /// Get the first control octet for this U-function.
    pub const fn control_byte(&self) -> u8 {
        match self {
            Self::StartDtAct => 0x07, // 0000 0111
            Self::StartDtCon => 0x0B, // 0000 1011
            Self::StopDtAct => 0x13,  // 0001 0011
            Self::StopDtCon => 0x23,  // 0010 0011
            Self::TestFrAct => 0x43,  // 0100 0011
            Self::TestFrCon => 0x83,  // 1000 0011
        }
    }

    /// Parse a U-function from the first control octet.
    ///
    /// Exactly one of the six function bits must be set.
    pub fn from_control_byte(byte: u8) -> Result<Self> {
        match byte {
            0x07 => Ok(Self::StartDtAct),
            0x0B => Ok(Self::StartDtCon),
            0x13 => Ok(Self::StopDtAct),
            0x23 => Ok(Self::StopDtCon),
            0x43 => Ok(Self::TestFrAct),
            0x83 => Ok(Self::TestFrCon),
            _ => Err(Iec104Error::protocol(format!(
                "invalid U-frame function byte 0x{byte:02X}"
            ))),
        }
    }
}

/// APCI control field.
///
/// ```text
/// +--------+--------+--------+--------+--------+--------+
/// | 0x68   | Length | CF1    | CF2    | CF3    | CF4    |
/// +--------+--------+--------+--------+--------+--------+
///   Start    APDU     Control field (4 octets)
///   octet    length
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Apci {
    /// I-frame with send and receive sequence numbers.
    IFrame {
        /// Send sequence number N(S), 0..32767
        send_seq: u16,
        /// Receive sequence number N(R), 0..32767
        recv_seq: u16,
    },
    /// S-frame with receive sequence number only.
    SFrame {
        /// Receive sequence number N(R), 0..32767
        recv_seq: u16,
    },
    /// U-frame with control function.
    UFrame {
        /// U-frame function
        function: UFunction,
    },
}

impl Apci {
    /// Create a new I-frame APCI.
    pub fn i_frame(send_seq: u16, recv_seq: u16) -> Self {
        debug_assert!(send_seq < SEQ_MODULO && recv_seq < SEQ_MODULO);
        Self::IFrame { send_seq, recv_seq }
    }

    /// Create a new S-frame APCI.
    pub fn s_frame(recv_seq: u16) -> Self {
        debug_assert!(recv_seq < SEQ_MODULO);
        Self::SFrame { recv_seq }
    }

    /// Create a new U-frame APCI.
    pub fn u_frame(function: UFunction) -> Self {
        Self::UFrame { function }
    }

    /// Get the frame type.
    pub fn frame_type(&self) -> FrameType {
        match self {
            Self::IFrame { .. } => FrameType::IFrame,
            Self::SFrame { .. } => FrameType::SFrame,
            Self::UFrame { .. } => FrameType::UFrame,
        }
    }

    /// Parse the 4-octet control field.
    ///
    /// Reserved bits are strict: the low bit of CF3 must be clear in
    /// I- and S-frames, S-frames require `CF1 == 0x01, CF2 == 0x00`,
    /// and U-frames require `CF2 = CF3 = CF4 = 0x00`.
    pub fn parse(control: &[u8]) -> Result<Self> {
        if control.len() < 4 {
            return Err(Iec104Error::protocol_static("control field too short"));
        }

        let cf1 = control[0];

        if cf1 & 0x01 == 0 {
            // I-frame: bit 0 of CF1 = 0
            if control[2] & 0x01 != 0 {
                return Err(Iec104Error::protocol_static(
                    "I-frame reserved bit set in CF3",
                ));
            }
            let send_seq = ((control[1] as u16) << 7) | ((cf1 >> 1) as u16);
            let recv_seq = ((control[3] as u16) << 7) | ((control[2] >> 1) as u16);
            Ok(Self::IFrame { send_seq, recv_seq })
        } else if cf1 & 0x03 == 0x01 {
            // S-frame: bits 0-1 of CF1 = 01
            if cf1 != 0x01 || control[1] != 0x00 {
                return Err(Iec104Error::protocol_static(
                    "S-frame reserved bits set in CF1/CF2",
                ));
            }
            if control[2] & 0x01 != 0 {
                return Err(Iec104Error::protocol_static(
                    "S-frame reserved bit set in CF3",
                ));
            }
            let recv_seq = ((control[3] as u16) << 7) | ((control[2] >> 1) as u16);
            Ok(Self::SFrame { recv_seq })
        } else {
            // U-frame: bits 0-1 of CF1 = 11
            if control[1] != 0x00 || control[2] != 0x00 || control[3] != 0x00 {
                return Err(Iec104Error::protocol_static(
                    "U-frame reserved octets not zero",
                ));
            }
            let function = UFunction::from_control_byte(cf1)?;
            Ok(Self::UFrame { function })
        }
    }

    /// Encode the 4-octet control field.
    pub fn encode(&self) -> [u8; 4] {
        match self {
            Self::IFrame { send_seq, recv_seq } => {
                let cf1 = ((send_seq & 0x7F) << 1) as u8;
                let cf2 = (send_seq >> 7) as u8;
                let cf3 = ((recv_seq & 0x7F) << 1) as u8;
                let cf4 = (recv_seq >> 7) as u8;
                [cf1, cf2, cf3, cf4]
            }
            Self::SFrame { recv_seq } => {
                let cf3 = ((recv_seq & 0x7F) << 1) as u8;
                let cf4 = (recv_seq >> 7) as u8;
                [0x01, 0x00, cf3, cf4]
            }
            Self::UFrame { function } => [function.control_byte(), 0x00, 0x00, 0x00],
        }
    }

    /// Encode the full 6-octet APDU header (start + length + control).
    ///
    /// `asdu_len` is the length of the ASDU body that follows (0 for
    /// S- and U-frames).
    pub fn encode_header(&self, asdu_len: usize) -> [u8; 6] {
        let control = self.encode();
        let apdu_len = (4 + asdu_len) as u8;
        [
            START_BYTE, apdu_len, control[0], control[1], control[2], control[3],
        ]
    }

    /// Check if this is an I-frame.
    pub fn is_i_frame(&self) -> bool {
        matches!(self, Self::IFrame { .. })
    }

    /// Check if this is an S-frame.
    pub fn is_s_frame(&self) -> bool {
        matches!(self, Self::SFrame { .. })
    }

    /// Check if this is a U-frame.
    pub fn is_u_frame(&self) -> bool {
        matches!(self, Self::UFrame { .. })
    }

    /// Get the send sequence number (I-frame only).
    pub fn send_seq(&self) -> Option<u16> {
        match self {
            Self::IFrame { send_seq, .. } => Some(*send_seq),
            _ => None,
        }
    }

    /// Get the receive sequence number (I-frame and S-frame).
    pub fn recv_seq(&self) -> Option<u16> {
        match self {
            Self::IFrame { recv_seq, .. } | Self::SFrame { recv_seq } => Some(*recv_seq),
            _ => None,
        }
    }
}

impl std::fmt::Display for Apci {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IFrame { send_seq, recv_seq } => {
                write!(f, "I(S={}, R={})", send_seq, recv_seq)
            }
            Self::SFrame { recv_seq } => {
                write!(f, "S(R={})", recv_seq)
            }
            Self::UFrame { function } => {
                let name = match function {
                    UFunction::StartDtAct => "STARTDT act",
                    UFunction::StartDtCon => "STARTDT con",
                    UFunction::StopDtAct => "STOPDT act",
                    UFunction::StopDtCon => "STOPDT con",
                    UFunction::TestFrAct => "TESTFR act",
                    UFunction::TestFrCon => "TESTFR con",
                };
                write!(f, "U({})", name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i_frame_encode_decode() {
        let apci = Apci::i_frame(100, 50);
        let encoded = apci.encode();
        let decoded = Apci::parse(&encoded).unwrap();

        assert_eq!(decoded, apci);
        assert_eq!(decoded.send_seq(), Some(100));
        assert_eq!(decoded.recv_seq(), Some(50));
    }

    #[test]
    fn test_s_frame_encode_decode() {
        let apci = Apci::s_frame(200);
        let encoded = apci.encode();
        let decoded = Apci::parse(&encoded).unwrap();

        assert_eq!(decoded, apci);
        assert_eq!(decoded.send_seq(), None);
        assert_eq!(decoded.recv_seq(), Some(200));
    }

    #[test]
    fn test_u_frame_encode_decode() {
        for func in [
            UFunction::StartDtAct,
            UFunction::StartDtCon,
            UFunction::StopDtAct,
            UFunction::StopDtCon,
            UFunction::TestFrAct,
            UFunction::TestFrCon,
        ] {
            let apci = Apci::u_frame(func);
            let encoded = apci.encode();
            let decoded = Apci::parse(&encoded).unwrap();
            assert_eq!(decoded, apci);
        }
    }

    #[test]
    fn test_u_frame_function_bytes() {
        assert_eq!(UFunction::StartDtAct.control_byte(), 0x07);
        assert_eq!(UFunction::StartDtCon.control_byte(), 0x0B);
        assert_eq!(UFunction::StopDtAct.control_byte(), 0x13);
        assert_eq!(UFunction::StopDtCon.control_byte(), 0x23);
        assert_eq!(UFunction::TestFrAct.control_byte(), 0x43);
        assert_eq!(UFunction::TestFrCon.control_byte(), 0x83);
    }

    #[test]
    fn test_u_frame_multiple_bits_rejected() {
        // STARTDT act + STOPDT act bits together
        assert!(UFunction::from_control_byte(0x17).is_err());
        // no function bit at all
        assert!(UFunction::from_control_byte(0x03).is_err());
        // all function bits
        assert!(UFunction::from_control_byte(0xFF).is_err());
    }

    #[test]
    fn test_u_frame_reserved_octets_strict() {
        assert!(Apci::parse(&[0x07, 0x01, 0x00, 0x00]).is_err());
        assert!(Apci::parse(&[0x07, 0x00, 0x02, 0x00]).is_err());
        assert!(Apci::parse(&[0x07, 0x00, 0x00, 0x80]).is_err());
    }

    #[test]
    fn test_s_frame_reserved_bits_strict() {
        // CF1 upper bits set
        assert!(Apci::parse(&[0x05, 0x00, 0x00, 0x00]).is_err());
        // CF2 not zero
        assert!(Apci::parse(&[0x01, 0x01, 0x00, 0x00]).is_err());
        // CF3 low bit set
        assert!(Apci::parse(&[0x01, 0x00, 0x01, 0x00]).is_err());
    }

    #[test]
    fn test_i_frame_reserved_bit_strict() {
        // CF3 low bit must be clear
        assert!(Apci::parse(&[0x02, 0x00, 0x01, 0x00]).is_err());
    }

    #[test]
    fn test_frame_type() {
        assert_eq!(Apci::i_frame(0, 0).frame_type(), FrameType::IFrame);
        assert_eq!(Apci::s_frame(0).frame_type(), FrameType::SFrame);
        assert_eq!(
            Apci::u_frame(UFunction::StartDtAct).frame_type(),
            FrameType::UFrame
        );
    }

    #[test]
    fn test_apci_display() {
        assert_eq!(Apci::i_frame(10, 5).to_string(), "I(S=10, R=5)");
        assert_eq!(Apci::s_frame(20).to_string(), "S(R=20)");
        assert_eq!(
            Apci::u_frame(UFunction::StartDtAct).to_string(),
            "U(STARTDT act)"
        );
    }

    #[test]
    fn test_sequence_number_max() {
        // Max sequence number is 32767 (15 bits)
        let apci = Apci::i_frame(32767, 32767);
        let encoded = apci.encode();
        let decoded = Apci::parse(&encoded).unwrap();
        assert_eq!(decoded.send_seq(), Some(32767));
        assert_eq!(decoded.recv_seq(), Some(32767));
    }

    #[test]
    fn test_encode_header_length_field() {
        let apci = Apci::i_frame(1, 2);
        let header = apci.encode_header(10);
        assert_eq!(header[0], START_BYTE);
        assert_eq!(header[1], 14); // 4 control octets + 10 body bytes
    }
}
