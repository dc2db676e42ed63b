//! IEC 60870-5-104 ASDU (Application Service Data Unit).
//!
//! An ASDU is a 6-octet data unit identifier followed by one or more
//! information objects. Object layouts are produced and consumed by the
//! codec registry; this module holds the structural types and the
//! command builders.

use bytes::{BufMut, BytesMut};

use crate::error::{Iec104Error, Result};
use crate::types::{
    Cot, Cp56Time2a, DoubleCommandInfo, ObjectValue, RegulatingStepInfo, SetpointQualifier,
    SingleCommandInfo, TypeId, QOI_STATION, TEST_PATTERN,
};

/// Size of the fixed ASDU header (data unit identifier).
pub const ASDU_HEADER_SIZE: usize = 6;

/// IOA wire size (fixed in this profile).
pub const IOA_SIZE: usize = 3;

/// Variable structure qualifier (VSQ).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vsq {
    /// Number of information objects (0..=127)
    pub count: u8,
    /// SQ bit: one address followed by consecutive values
    pub sequence: bool,
}

impl Vsq {
    /// Create a new VSQ.
    #[inline]
    pub const fn new(count: u8, sequence: bool) -> Self {
        Self { count, sequence }
    }

    /// Parse a VSQ octet.
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        Self {
            count: value & 0x7F,
            sequence: (value & 0x80) != 0,
        }
    }

    /// Encode a VSQ octet.
    #[inline]
    pub const fn as_u8(&self) -> u8 {
        (self.count & 0x7F) | if self.sequence { 0x80 } else { 0 }
    }
}

/// Information object address (IOA).
///
/// A 24-bit little-endian address identifying a data point within a
/// station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Ioa(u32);

impl Ioa {
    /// Create an IOA from the lower 24 bits of `value`.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value & 0x00FF_FFFF)
    }

    /// Parse an IOA from its 3-octet little-endian form.
    #[inline]
    pub const fn from_array(bytes: [u8; IOA_SIZE]) -> Self {
        Self((bytes[0] as u32) | ((bytes[1] as u32) << 8) | ((bytes[2] as u32) << 16))
    }

    /// Encode to the 3-octet little-endian form.
    #[inline]
    pub const fn to_bytes(&self) -> [u8; IOA_SIZE] {
        [
            (self.0 & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            ((self.0 >> 16) & 0xFF) as u8,
        ]
    }

    /// Address incremented by `offset` within the 24-bit space.
    ///
    /// Used for the implicit addresses of SQ=1 sequences.
    #[inline]
    pub const fn offset(&self, offset: u32) -> Self {
        Self::new(self.0.wrapping_add(offset))
    }

    /// Get the raw address value.
    #[inline]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for Ioa {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for Ioa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ASDU header (data unit identifier, 6 octets).
///
/// The type identification is kept raw so that ids outside the built-in
/// [`TypeId`] profile survive the codec boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsduHeader {
    /// Type identification
    pub type_id: u8,
    /// Variable structure qualifier
    pub vsq: Vsq,
    /// Cause of transmission
    pub cot: Cot,
    /// Test flag (T)
    pub test: bool,
    /// Negative confirmation flag (P/N)
    pub negative: bool,
    /// Originator address
    pub originator: u8,
    /// Common address of ASDU (station address; 0 and 65535 are
    /// reserved by the standard)
    pub common_address: u16,
}

impl AsduHeader {
    /// Create a header for `count` non-sequential objects.
    #[inline]
    pub const fn new(type_id: TypeId, count: u8, cot: Cot, common_address: u16) -> Self {
        Self {
            type_id: type_id.as_u8(),
            vsq: Vsq::new(count, false),
            cot,
            test: false,
            negative: false,
            originator: 0,
            common_address,
        }
    }

    /// Look up the built-in type id, if this header uses one.
    #[inline]
    pub fn known_type(&self) -> Option<TypeId> {
        TypeId::from_u8(self.type_id)
    }

    /// Parse a header from the start of an ASDU body.
    ///
    /// Returns the header and the number of bytes consumed. The cause
    /// space is non-exhaustive, so an unassigned cause never fails;
    /// it is retained as [`Cot::Other`].
    pub fn parse(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < ASDU_HEADER_SIZE {
            return Err(Iec104Error::truncated_static("ASDU header too short"));
        }

        Ok((
            Self {
                type_id: data[0],
                vsq: Vsq::from_u8(data[1]),
                cot: Cot::from_u8(data[2]),
                negative: (data[2] & 0x40) != 0,
                test: (data[2] & 0x80) != 0,
                originator: data[3],
                common_address: data[4] as u16 | ((data[5] as u16) << 8),
            },
            ASDU_HEADER_SIZE,
        ))
    }

    /// Encode the header into `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.type_id);
        buf.put_u8(self.vsq.as_u8());

        let mut cot_byte = self.cot.as_u8();
        if self.negative {
            cot_byte |= 0x40;
        }
        if self.test {
            cot_byte |= 0x80;
        }
        buf.put_u8(cot_byte);
        buf.put_u8(self.originator);
        buf.put_u16_le(self.common_address);
    }
}

/// A single information object: address plus typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct InformationObject {
    /// Information object address
    pub ioa: Ioa,
    /// Typed value; the shape matches the ASDU type identification
    pub value: ObjectValue,
}

impl InformationObject {
    /// Create an information object.
    #[inline]
    pub fn new(ioa: impl Into<Ioa>, value: ObjectValue) -> Self {
        Self {
            ioa: ioa.into(),
            value,
        }
    }
}

/// A complete ASDU: header plus decoded information objects.
#[derive(Debug, Clone, PartialEq)]
pub struct Asdu {
    /// Data unit identifier
    pub header: AsduHeader,
    /// Information objects in wire order
    pub objects: Vec<InformationObject>,
}

impl Asdu {
    /// Create an ASDU with a single information object.
    pub fn single(type_id: TypeId, cot: Cot, common_address: u16, object: InformationObject) -> Self {
        Self {
            header: AsduHeader::new(type_id, 1, cot, common_address),
            objects: vec![object],
        }
    }

    /// Create an ASDU from a list of objects (SQ=0).
    ///
    /// The object count must fit the 7-bit VSQ field.
    pub fn from_objects(
        type_id: TypeId,
        cot: Cot,
        common_address: u16,
        objects: Vec<InformationObject>,
    ) -> Result<Self> {
        if objects.is_empty() {
            return Err(Iec104Error::EmptyAsdu);
        }
        if objects.len() > 0x7F {
            return Err(Iec104Error::encode_static("more than 127 objects"));
        }
        Ok(Self {
            header: AsduHeader::new(type_id, objects.len() as u8, cot, common_address),
            objects,
        })
    }

    /// Mark this ASDU as a sequence (SQ=1).
    ///
    /// Objects must carry consecutive addresses; the registry encoder
    /// verifies this.
    pub fn into_sequence(mut self) -> Self {
        self.header.vsq.sequence = true;
        self
    }

    /// General interrogation command (C_IC_NA_1, activation).
    ///
    /// `qoi` 20 requests the station interrogation; 21..=36 request
    /// group 1..=16.
    pub fn interrogation_command(common_address: u16, qoi: u8) -> Self {
        Self::single(
            TypeId::InterrogationCommand,
            Cot::Activation,
            common_address,
            InformationObject::new(0u32, ObjectValue::Interrogation { qoi }),
        )
    }

    /// Station interrogation command (QOI 20).
    pub fn general_interrogation(common_address: u16) -> Self {
        Self::interrogation_command(common_address, QOI_STATION)
    }

    /// Counter interrogation command (C_CI_NA_1, activation).
    pub fn counter_interrogation(common_address: u16, qcc: u8) -> Self {
        Self::single(
            TypeId::CounterInterrogation,
            Cot::Activation,
            common_address,
            InformationObject::new(0u32, ObjectValue::CounterInterrogation { qcc }),
        )
    }

    /// Clock synchronization command (C_CS_NA_1, activation).
    pub fn clock_sync_command(common_address: u16, time: Cp56Time2a) -> Self {
        Self::single(
            TypeId::ClockSync,
            Cot::Activation,
            common_address,
            InformationObject::new(0u32, ObjectValue::ClockSync(time)),
        )
    }

    /// Read command (C_RD_NA_1, request).
    pub fn read_command(common_address: u16, ioa: impl Into<Ioa>) -> Self {
        Self::single(
            TypeId::ReadCommand,
            Cot::Request,
            common_address,
            InformationObject::new(ioa, ObjectValue::Read),
        )
    }

    /// Single command (C_SC_NA_1, activation).
    pub fn single_command(
        common_address: u16,
        ioa: impl Into<Ioa>,
        command: SingleCommandInfo,
    ) -> Self {
        Self::single(
            TypeId::SingleCommand,
            Cot::Activation,
            common_address,
            InformationObject::new(ioa, ObjectValue::SingleCommand(command)),
        )
    }

    /// Double command (C_DC_NA_1, activation).
    pub fn double_command(
        common_address: u16,
        ioa: impl Into<Ioa>,
        command: DoubleCommandInfo,
    ) -> Self {
        Self::single(
            TypeId::DoubleCommand,
            Cot::Activation,
            common_address,
            InformationObject::new(ioa, ObjectValue::DoubleCommand(command)),
        )
    }

    /// Regulating step command (C_RC_NA_1, activation).
    pub fn regulating_step_command(
        common_address: u16,
        ioa: impl Into<Ioa>,
        command: RegulatingStepInfo,
    ) -> Self {
        Self::single(
            TypeId::RegulatingStep,
            Cot::Activation,
            common_address,
            InformationObject::new(ioa, ObjectValue::RegulatingStep(command)),
        )
    }

    /// Short floating point set-point command (C_SE_NC_1, activation).
    pub fn setpoint_float_command(
        common_address: u16,
        ioa: impl Into<Ioa>,
        value: f32,
        qos: SetpointQualifier,
    ) -> Self {
        Self::single(
            TypeId::SetpointFloat,
            Cot::Activation,
            common_address,
            InformationObject::new(ioa, ObjectValue::SetpointFloat { value, qos }),
        )
    }

    /// Test command with the fixed bit pattern (C_TS_NA_1, activation).
    pub fn test_command(common_address: u16) -> Self {
        Self::single(
            TypeId::TestCommand,
            Cot::Activation,
            common_address,
            InformationObject::new(0u32, ObjectValue::TestPattern(TEST_PATTERN)),
        )
    }

    /// Reset process command (C_RP_NA_1, activation).
    pub fn reset_process_command(common_address: u16, qrp: u8) -> Self {
        Self::single(
            TypeId::ResetProcess,
            Cot::Activation,
            common_address,
            InformationObject::new(0u32, ObjectValue::ResetProcess { qrp }),
        )
    }

    /// Turn an activation into its confirmation (COT 7), preserving the
    /// payload. `negative` reports a rejected activation.
    pub fn into_confirmation(mut self, negative: bool) -> Self {
        self.header.cot = Cot::ActivationConfirm;
        self.header.negative = negative;
        self
    }

    /// Turn an activation into its termination (COT 10).
    pub fn into_termination(mut self) -> Self {
        self.header.cot = Cot::ActivationTermination;
        self.header.negative = false;
        self
    }
}
