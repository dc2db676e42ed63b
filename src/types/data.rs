//! Information elements for IEC 60870-5-104 ASDUs.
//!
//! Each structure here models one information-element layout from the
//! companion standard; the codec registry composes them into complete
//! information objects. Bit layouts follow the standard exactly and all
//! multi-octet fields are little-endian.

use bytes::Bytes;

use crate::error::{Iec104Error, Result};

/// Quality descriptor for single/double point information (SIQ/DIQ bits 4..7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QualityDescriptor {
    /// Blocked (BL)
    pub blocked: bool,
    /// Substituted (SB)
    pub substituted: bool,
    /// Not topical (NT)
    pub not_topical: bool,
    /// Invalid (IV)
    pub invalid: bool,
}

impl QualityDescriptor {
    /// Quality with all flags clear.
    pub const GOOD: Self = Self {
        blocked: false,
        substituted: false,
        not_topical: false,
        invalid: false,
    };

    /// Parse the quality bits of a SIQ or DIQ octet.
    #[inline]
    pub const fn from_bits(value: u8) -> Self {
        Self {
            blocked: (value & 0x10) != 0,
            substituted: (value & 0x20) != 0,
            not_topical: (value & 0x40) != 0,
            invalid: (value & 0x80) != 0,
        }
    }

    /// Encode the quality bits (value bits left clear).
    #[inline]
    pub const fn to_bits(&self) -> u8 {
        let mut result = 0u8;
        if self.blocked {
            result |= 0x10;
        }
        if self.substituted {
            result |= 0x20;
        }
        if self.not_topical {
            result |= 0x40;
        }
        if self.invalid {
            result |= 0x80;
        }
        result
    }

    /// Check if all flags are clear.
    #[inline]
    pub const fn is_good(&self) -> bool {
        !self.blocked && !self.substituted && !self.not_topical && !self.invalid
    }
}

/// Quality descriptor for measured values (QDS octet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeasuredQuality {
    /// Overflow (OV)
    pub overflow: bool,
    /// Blocked (BL)
    pub blocked: bool,
    /// Substituted (SB)
    pub substituted: bool,
    /// Not topical (NT)
    pub not_topical: bool,
    /// Invalid (IV)
    pub invalid: bool,
}

impl MeasuredQuality {
    /// Quality with all flags clear.
    pub const GOOD: Self = Self {
        overflow: false,
        blocked: false,
        substituted: false,
        not_topical: false,
        invalid: false,
    };

    /// Parse a QDS octet.
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        Self {
            overflow: (value & 0x01) != 0,
            blocked: (value & 0x10) != 0,
            substituted: (value & 0x20) != 0,
            not_topical: (value & 0x40) != 0,
            invalid: (value & 0x80) != 0,
        }
    }

    /// Encode a QDS octet.
    #[inline]
    pub const fn as_u8(&self) -> u8 {
        let mut result = 0u8;
        if self.overflow {
            result |= 0x01;
        }
        if self.blocked {
            result |= 0x10;
        }
        if self.substituted {
            result |= 0x20;
        }
        if self.not_topical {
            result |= 0x40;
        }
        if self.invalid {
            result |= 0x80;
        }
        result
    }

    /// Check if all flags are clear.
    #[inline]
    pub const fn is_good(&self) -> bool {
        !self.overflow && !self.blocked && !self.substituted && !self.not_topical && !self.invalid
    }
}

/// Single-point information with quality (SIQ octet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinglePointInfo {
    /// Point state (OFF/ON)
    pub value: bool,
    /// Quality descriptor
    pub quality: QualityDescriptor,
}

impl SinglePointInfo {
    /// Create a single point in the ON/OFF state with good quality.
    #[inline]
    pub const fn new(value: bool) -> Self {
        Self {
            value,
            quality: QualityDescriptor::GOOD,
        }
    }

    /// Parse a SIQ octet.
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        Self {
            value: (value & 0x01) != 0,
            quality: QualityDescriptor::from_bits(value),
        }
    }

    /// Encode a SIQ octet.
    #[inline]
    pub const fn as_u8(&self) -> u8 {
        (self.value as u8) | self.quality.to_bits()
    }
}

/// Double-point state (DIQ bits 0..1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DoublePointValue {
    /// Indeterminate or intermediate (00)
    Indeterminate = 0,
    /// Determined OFF (01)
    Off = 1,
    /// Determined ON (10)
    On = 2,
    /// Indeterminate or faulty (11)
    IndeterminateOrFaulty = 3,
}

impl DoublePointValue {
    /// Parse the lower two bits.
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        match value & 0x03 {
            1 => Self::Off,
            2 => Self::On,
            3 => Self::IndeterminateOrFaulty,
            _ => Self::Indeterminate,
        }
    }

    /// Encode to the lower two bits.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Double-point information with quality (DIQ octet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoublePointInfo {
    /// Double-point state
    pub value: DoublePointValue,
    /// Quality descriptor
    pub quality: QualityDescriptor,
}

impl DoublePointInfo {
    /// Create a double point with good quality.
    #[inline]
    pub const fn new(value: DoublePointValue) -> Self {
        Self {
            value,
            quality: QualityDescriptor::GOOD,
        }
    }

    /// Parse a DIQ octet.
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        Self {
            value: DoublePointValue::from_u8(value),
            quality: QualityDescriptor::from_bits(value),
        }
    }

    /// Encode a DIQ octet.
    #[inline]
    pub const fn as_u8(&self) -> u8 {
        self.value.as_u8() | self.quality.to_bits()
    }
}

/// Step position with transient indicator (VTI octet) plus QDS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPositionInfo {
    /// Position in -64..=63
    pub value: i8,
    /// Equipment is in transient state
    pub transient: bool,
    /// Quality descriptor
    pub quality: MeasuredQuality,
}

impl StepPositionInfo {
    /// Parse VTI + QDS octets.
    #[inline]
    pub fn from_bytes(vti: u8, qds: u8) -> Self {
        // VTI value is a 7-bit two's complement number.
        let value = ((vti & 0x7F) << 1) as i8 >> 1;
        Self {
            value,
            transient: (vti & 0x80) != 0,
            quality: MeasuredQuality::from_u8(qds),
        }
    }

    /// Encode to VTI + QDS octets.
    #[inline]
    pub fn to_bytes(&self) -> [u8; 2] {
        let vti = (self.value as u8 & 0x7F) | if self.transient { 0x80 } else { 0 };
        [vti, self.quality.as_u8()]
    }
}

/// Normalized measured value (NVA) plus QDS.
///
/// The raw 16-bit value maps linearly onto [-1.0, +1.0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedInfo {
    /// Raw 16-bit normalized value
    pub raw: i16,
    /// Quality descriptor
    pub quality: MeasuredQuality,
}

impl NormalizedInfo {
    /// Create from the raw 16-bit value with good quality.
    #[inline]
    pub const fn new(raw: i16) -> Self {
        Self {
            raw,
            quality: MeasuredQuality::GOOD,
        }
    }

    /// The value scaled to [-1.0, +1.0).
    #[inline]
    pub fn as_f32(&self) -> f32 {
        self.raw as f32 / 32768.0
    }
}

/// Scaled measured value (SVA) plus QDS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledInfo {
    /// Scaled value
    pub value: i16,
    /// Quality descriptor
    pub quality: MeasuredQuality,
}

impl ScaledInfo {
    /// Create with good quality.
    #[inline]
    pub const fn new(value: i16) -> Self {
        Self {
            value,
            quality: MeasuredQuality::GOOD,
        }
    }
}

/// Short floating point measured value (IEEE 754) plus QDS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShortFloatInfo {
    /// Measured value
    pub value: f32,
    /// Quality descriptor
    pub quality: MeasuredQuality,
}

impl ShortFloatInfo {
    /// Create with good quality.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self {
            value,
            quality: MeasuredQuality::GOOD,
        }
    }
}

/// Bitstring of 32 bits (BSI) plus QDS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitstringInfo {
    /// Bit pattern
    pub value: u32,
    /// Quality descriptor
    pub quality: MeasuredQuality,
}

/// Binary counter reading (BCR).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterInfo {
    /// Counter value
    pub value: i32,
    /// Sequence notation (0..=31)
    pub sequence: u8,
    /// Counter overflow carry (CY)
    pub carry: bool,
    /// Counter was adjusted (CA)
    pub adjusted: bool,
    /// Reading is invalid (IV)
    pub invalid: bool,
}

impl CounterInfo {
    /// Parse the 5-octet BCR layout.
    #[inline]
    pub fn from_bytes(bytes: &[u8; 5]) -> Self {
        let value = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let flags = bytes[4];
        Self {
            value,
            sequence: flags & 0x1F,
            carry: (flags & 0x20) != 0,
            adjusted: (flags & 0x40) != 0,
            invalid: (flags & 0x80) != 0,
        }
    }

    /// Encode the 5-octet BCR layout.
    #[inline]
    pub fn to_bytes(&self) -> [u8; 5] {
        let v = self.value.to_le_bytes();
        let flags = (self.sequence & 0x1F)
            | if self.carry { 0x20 } else { 0 }
            | if self.adjusted { 0x40 } else { 0 }
            | if self.invalid { 0x80 } else { 0 };
        [v[0], v[1], v[2], v[3], flags]
    }
}

/// CP56Time2a timestamp (7 octets).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cp56Time2a {
    /// Milliseconds of minute (0..=59999)
    pub milliseconds: u16,
    /// Minutes (0..=59)
    pub minutes: u8,
    /// Hours (0..=23)
    pub hours: u8,
    /// Day of month (1..=31)
    pub day: u8,
    /// Day of week (1..=7, 1 = Monday, 0 = unused)
    pub day_of_week: u8,
    /// Month (1..=12)
    pub month: u8,
    /// Years since 2000 (0..=99)
    pub year: u8,
    /// Invalid flag (IV)
    pub invalid: bool,
    /// Summer time flag (SU)
    pub summer_time: bool,
}

impl Cp56Time2a {
    /// Parse from 7 octets.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 7 {
            return Err(Iec104Error::truncated_static("CP56Time2a too short"));
        }

        Ok(Self {
            milliseconds: bytes[0] as u16 | ((bytes[1] as u16) << 8),
            minutes: bytes[2] & 0x3F,
            invalid: (bytes[2] & 0x80) != 0,
            hours: bytes[3] & 0x1F,
            summer_time: (bytes[3] & 0x80) != 0,
            day: bytes[4] & 0x1F,
            day_of_week: (bytes[4] >> 5) & 0x07,
            month: bytes[5] & 0x0F,
            year: bytes[6] & 0x7F,
        })
    }

    /// Encode to 7 octets.
    #[inline]
    pub const fn to_bytes(&self) -> [u8; 7] {
        [
            (self.milliseconds & 0xFF) as u8,
            (self.milliseconds >> 8) as u8,
            (self.minutes & 0x3F) | if self.invalid { 0x80 } else { 0 },
            (self.hours & 0x1F) | if self.summer_time { 0x80 } else { 0 },
            (self.day & 0x1F) | ((self.day_of_week & 0x07) << 5),
            self.month & 0x0F,
            self.year & 0x7F,
        ]
    }
}

/// Single command (SCO octet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleCommandInfo {
    /// Commanded state (SCS)
    pub value: bool,
    /// Select (true) or execute (false) (S/E)
    pub select: bool,
    /// Qualifier of command (QU, 0..=31)
    pub qualifier: u8,
}

impl SingleCommandInfo {
    /// Execute command for the given state.
    #[inline]
    pub const fn execute(value: bool) -> Self {
        Self {
            value,
            select: false,
            qualifier: 0,
        }
    }

    /// Parse an SCO octet.
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        Self {
            value: (value & 0x01) != 0,
            select: (value & 0x80) != 0,
            qualifier: (value >> 2) & 0x1F,
        }
    }

    /// Encode an SCO octet.
    #[inline]
    pub const fn as_u8(&self) -> u8 {
        (self.value as u8) | ((self.qualifier & 0x1F) << 2) | if self.select { 0x80 } else { 0 }
    }
}

/// Double command (DCO octet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoubleCommandInfo {
    /// Commanded state (DCS)
    pub value: DoublePointValue,
    /// Select (true) or execute (false) (S/E)
    pub select: bool,
    /// Qualifier of command (QU, 0..=31)
    pub qualifier: u8,
}

impl DoubleCommandInfo {
    /// Execute command for the given state.
    #[inline]
    pub const fn execute(value: DoublePointValue) -> Self {
        Self {
            value,
            select: false,
            qualifier: 0,
        }
    }

    /// Parse a DCO octet.
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        Self {
            value: DoublePointValue::from_u8(value),
            select: (value & 0x80) != 0,
            qualifier: (value >> 2) & 0x1F,
        }
    }

    /// Encode a DCO octet.
    #[inline]
    pub const fn as_u8(&self) -> u8 {
        self.value.as_u8() | ((self.qualifier & 0x1F) << 2) | if self.select { 0x80 } else { 0 }
    }
}

/// Regulating step direction (RCS bits 0..1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StepDirection {
    /// Not permitted (00)
    NotPermitted0 = 0,
    /// Next step lower (01)
    Lower = 1,
    /// Next step higher (10)
    Higher = 2,
    /// Not permitted (11)
    NotPermitted3 = 3,
}

impl StepDirection {
    /// Parse the lower two bits.
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        match value & 0x03 {
            1 => Self::Lower,
            2 => Self::Higher,
            3 => Self::NotPermitted3,
            _ => Self::NotPermitted0,
        }
    }

    /// Encode to the lower two bits.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Regulating step command (RCO octet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegulatingStepInfo {
    /// Step direction (RCS)
    pub direction: StepDirection,
    /// Select (true) or execute (false) (S/E)
    pub select: bool,
    /// Qualifier of command (QU, 0..=31)
    pub qualifier: u8,
}

impl RegulatingStepInfo {
    /// Parse an RCO octet.
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        Self {
            direction: StepDirection::from_u8(value),
            select: (value & 0x80) != 0,
            qualifier: (value >> 2) & 0x1F,
        }
    }

    /// Encode an RCO octet.
    #[inline]
    pub const fn as_u8(&self) -> u8 {
        self.direction.as_u8() | ((self.qualifier & 0x1F) << 2) | if self.select { 0x80 } else { 0 }
    }
}

/// Qualifier of set-point command (QOS octet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetpointQualifier {
    /// Select (true) or execute (false) (S/E)
    pub select: bool,
    /// Qualifier (QL, 0..=127)
    pub qualifier: u8,
}

impl SetpointQualifier {
    /// Parse a QOS octet.
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        Self {
            select: (value & 0x80) != 0,
            qualifier: value & 0x7F,
        }
    }

    /// Encode a QOS octet.
    #[inline]
    pub const fn as_u8(&self) -> u8 {
        (self.qualifier & 0x7F) | if self.select { 0x80 } else { 0 }
    }
}

/// End of initialization (COI octet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfInitInfo {
    /// Cause of initialization (0 = power on, 1 = local manual reset,
    /// 2 = remote reset)
    pub cause: u8,
    /// Local parameters changed during initialization (BS1)
    pub local_change: bool,
}

impl EndOfInitInfo {
    /// Parse a COI octet.
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        Self {
            cause: value & 0x7F,
            local_change: (value & 0x80) != 0,
        }
    }

    /// Encode a COI octet.
    #[inline]
    pub const fn as_u8(&self) -> u8 {
        (self.cause & 0x7F) | if self.local_change { 0x80 } else { 0 }
    }
}

/// Station interrogation qualifier (QOI 20).
pub const QOI_STATION: u8 = 20;

/// Test command fixed bit pattern (FBP).
pub const TEST_PATTERN: u16 = 0x55AA;

/// Typed information-object value.
///
/// The variant is selected by the ASDU type identification; the
/// `Opaque` variant carries values of caller-registered types.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectValue {
    /// Type 1 (M_SP_NA_1)
    SinglePoint(SinglePointInfo),
    /// Type 30 (M_SP_TB_1)
    SinglePointTimed(SinglePointInfo, Cp56Time2a),
    /// Type 3 (M_DP_NA_1)
    DoublePoint(DoublePointInfo),
    /// Type 31 (M_DP_TB_1)
    DoublePointTimed(DoublePointInfo, Cp56Time2a),
    /// Type 5 (M_ST_NA_1)
    StepPosition(StepPositionInfo),
    /// Type 7 (M_BO_NA_1)
    Bitstring(BitstringInfo),
    /// Type 9 (M_ME_NA_1)
    Normalized(NormalizedInfo),
    /// Type 11 (M_ME_NB_1)
    Scaled(ScaledInfo),
    /// Type 13 (M_ME_NC_1)
    ShortFloat(ShortFloatInfo),
    /// Type 36 (M_ME_TF_1)
    ShortFloatTimed(ShortFloatInfo, Cp56Time2a),
    /// Type 15 (M_IT_NA_1)
    IntegratedTotal(CounterInfo),
    /// Type 45 (C_SC_NA_1)
    SingleCommand(SingleCommandInfo),
    /// Type 58 (C_SC_TA_1)
    SingleCommandTimed(SingleCommandInfo, Cp56Time2a),
    /// Type 46 (C_DC_NA_1)
    DoubleCommand(DoubleCommandInfo),
    /// Type 59 (C_DC_TA_1)
    DoubleCommandTimed(DoubleCommandInfo, Cp56Time2a),
    /// Type 47 (C_RC_NA_1)
    RegulatingStep(RegulatingStepInfo),
    /// Type 48 (C_SE_NA_1)
    SetpointNormalized {
        /// Raw 16-bit normalized set point
        raw: i16,
        /// Qualifier of set-point command
        qos: SetpointQualifier,
    },
    /// Type 49 (C_SE_NB_1)
    SetpointScaled {
        /// Scaled set point
        value: i16,
        /// Qualifier of set-point command
        qos: SetpointQualifier,
    },
    /// Type 50 (C_SE_NC_1)
    SetpointFloat {
        /// Set point
        value: f32,
        /// Qualifier of set-point command
        qos: SetpointQualifier,
    },
    /// Type 63 (C_SE_TC_1)
    SetpointFloatTimed {
        /// Set point
        value: f32,
        /// Qualifier of set-point command
        qos: SetpointQualifier,
        /// Command time tag
        time: Cp56Time2a,
    },
    /// Type 51 (C_BO_NA_1)
    BitstringCommand(u32),
    /// Type 70 (M_EI_NA_1)
    EndOfInit(EndOfInitInfo),
    /// Type 100 (C_IC_NA_1)
    Interrogation {
        /// Qualifier of interrogation (QOI; 20 = station)
        qoi: u8,
    },
    /// Type 101 (C_CI_NA_1)
    CounterInterrogation {
        /// Request qualifier (QCC)
        qcc: u8,
    },
    /// Type 102 (C_RD_NA_1); the IOA alone selects the point to read
    Read,
    /// Type 103 (C_CS_NA_1)
    ClockSync(Cp56Time2a),
    /// Type 104 (C_TS_NA_1)
    TestPattern(u16),
    /// Type 105 (C_RP_NA_1)
    ResetProcess {
        /// Qualifier of reset process (QRP)
        qrp: u8,
    },
    /// Raw element bytes of a caller-registered type
    Opaque(Bytes),
}

impl ObjectValue {
    /// Get the value as `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::SinglePoint(p) | Self::SinglePointTimed(p, _) => {
                Some(if p.value { 1.0 } else { 0.0 })
            }
            Self::DoublePoint(p) | Self::DoublePointTimed(p, _) => match p.value {
                DoublePointValue::Off => Some(0.0),
                DoublePointValue::On => Some(1.0),
                _ => Some(f64::NAN),
            },
            Self::Normalized(v) => Some(v.as_f32() as f64),
            Self::Scaled(v) => Some(v.value as f64),
            Self::ShortFloat(v) | Self::ShortFloatTimed(v, _) => Some(v.value as f64),
            Self::Bitstring(v) => Some(v.value as f64),
            Self::StepPosition(v) => Some(v.value as f64),
            Self::IntegratedTotal(v) => Some(v.value as f64),
            _ => None,
        }
    }

    /// Get the value as `bool` if it is a point state.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::SinglePoint(p) | Self::SinglePointTimed(p, _) => Some(p.value),
            Self::DoublePoint(p) | Self::DoublePointTimed(p, _) => match p.value {
                DoublePointValue::Off => Some(false),
                DoublePointValue::On => Some(true),
                _ => None,
            },
            _ => None,
        }
    }

    /// Get the time tag if the value carries one.
    pub fn time_tag(&self) -> Option<&Cp56Time2a> {
        match self {
            Self::SinglePointTimed(_, t)
            | Self::DoublePointTimed(_, t)
            | Self::ShortFloatTimed(_, t)
            | Self::SingleCommandTimed(_, t)
            | Self::DoubleCommandTimed(_, t)
            | Self::SetpointFloatTimed { time: t, .. }
            | Self::ClockSync(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_descriptor_roundtrip() {
        for bits in [0x00u8, 0x10, 0x20, 0x40, 0x80, 0xF0] {
            let qd = QualityDescriptor::from_bits(bits);
            assert_eq!(qd.to_bits(), bits);
        }
        assert!(QualityDescriptor::GOOD.is_good());
        assert!(!QualityDescriptor::from_bits(0x80).is_good());
    }

    #[test]
    fn test_measured_quality_roundtrip() {
        let mq = MeasuredQuality::from_u8(0xF1);
        assert!(mq.overflow);
        assert!(mq.blocked);
        assert!(mq.substituted);
        assert!(mq.not_topical);
        assert!(mq.invalid);
        assert_eq!(mq.as_u8(), 0xF1);

        assert!(MeasuredQuality::GOOD.is_good());
        assert!(!MeasuredQuality::from_u8(0x01).is_good());
    }

    #[test]
    fn test_single_point_siq() {
        let sp = SinglePointInfo::from_u8(0x01);
        assert!(sp.value);
        assert!(sp.quality.is_good());

        let sp = SinglePointInfo::from_u8(0x80);
        assert!(!sp.value);
        assert!(sp.quality.invalid);

        let sp = SinglePointInfo::from_u8(0x31);
        assert!(sp.value);
        assert!(sp.quality.blocked);
        assert!(sp.quality.substituted);
        assert_eq!(sp.as_u8(), 0x31);
    }

    #[test]
    fn test_double_point_diq() {
        assert_eq!(
            DoublePointValue::from_u8(0x00),
            DoublePointValue::Indeterminate
        );
        assert_eq!(DoublePointValue::from_u8(0x01), DoublePointValue::Off);
        assert_eq!(DoublePointValue::from_u8(0x02), DoublePointValue::On);
        assert_eq!(
            DoublePointValue::from_u8(0xFF),
            DoublePointValue::IndeterminateOrFaulty
        );

        let dp = DoublePointInfo::from_u8(0x82);
        assert_eq!(dp.value, DoublePointValue::On);
        assert!(dp.quality.invalid);
        assert_eq!(dp.as_u8(), 0x82);
    }

    #[test]
    fn test_step_position_vti() {
        // +31, transient
        let sp = StepPositionInfo::from_bytes(0x80 | 31, 0x00);
        assert_eq!(sp.value, 31);
        assert!(sp.transient);
        assert_eq!(sp.to_bytes(), [0x80 | 31, 0x00]);

        // -64 (7-bit two's complement 0x40)
        let sp = StepPositionInfo::from_bytes(0x40, 0x80);
        assert_eq!(sp.value, -64);
        assert!(!sp.transient);
        assert!(sp.quality.invalid);
        assert_eq!(sp.to_bytes(), [0x40, 0x80]);

        // -1 encodes as 0x7F
        let sp = StepPositionInfo::from_bytes(0x7F, 0x00);
        assert_eq!(sp.value, -1);
        assert_eq!(sp.to_bytes(), [0x7F, 0x00]);
    }

    #[test]
    fn test_normalized_scaling() {
        assert!((NormalizedInfo::new(16384).as_f32() - 0.5).abs() < 1e-6);
        assert!((NormalizedInfo::new(-32768).as_f32() + 1.0).abs() < 1e-6);
        assert_eq!(NormalizedInfo::new(0).as_f32(), 0.0);
    }

    #[test]
    fn test_counter_bcr_roundtrip() {
        let counter = CounterInfo {
            value: 123456,
            sequence: 5,
            carry: true,
            adjusted: false,
            invalid: true,
        };
        let bytes = counter.to_bytes();
        assert_eq!(CounterInfo::from_bytes(&bytes), counter);

        let negative = CounterInfo {
            value: -1,
            sequence: 31,
            carry: false,
            adjusted: true,
            invalid: false,
        };
        let bytes = negative.to_bytes();
        assert_eq!(CounterInfo::from_bytes(&bytes), negative);
    }

    #[test]
    fn test_cp56time2a_roundtrip() {
        let time = Cp56Time2a {
            milliseconds: 30123,
            minutes: 30,
            hours: 12,
            day: 15,
            day_of_week: 3,
            month: 6,
            year: 26,
            invalid: false,
            summer_time: true,
        };
        let bytes = time.to_bytes();
        let parsed = Cp56Time2a::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, time);
    }

    #[test]
    fn test_cp56time2a_boundaries() {
        let max = Cp56Time2a {
            milliseconds: 59999,
            minutes: 59,
            hours: 23,
            day: 31,
            day_of_week: 7,
            month: 12,
            year: 99,
            invalid: true,
            summer_time: true,
        };
        let parsed = Cp56Time2a::from_bytes(&max.to_bytes()).unwrap();
        assert_eq!(parsed, max);

        assert!(Cp56Time2a::from_bytes(&[0; 6]).is_err());
    }

    #[test]
    fn test_single_command_sco() {
        let cmd = SingleCommandInfo {
            value: true,
            select: true,
            qualifier: 1,
        };
        assert_eq!(cmd.as_u8(), 0x85);
        assert_eq!(SingleCommandInfo::from_u8(0x85), cmd);

        let exec = SingleCommandInfo::execute(true);
        assert_eq!(exec.as_u8(), 0x01);
        assert!(!exec.select);
    }

    #[test]
    fn test_double_command_dco() {
        let cmd = DoubleCommandInfo {
            value: DoublePointValue::On,
            select: false,
            qualifier: 0,
        };
        assert_eq!(cmd.as_u8(), 0x02);
        assert_eq!(DoubleCommandInfo::from_u8(0x02), cmd);

        let sel = DoubleCommandInfo {
            value: DoublePointValue::Off,
            select: true,
            qualifier: 3,
        };
        assert_eq!(DoubleCommandInfo::from_u8(sel.as_u8()), sel);
    }

    #[test]
    fn test_regulating_step_rco() {
        let step = RegulatingStepInfo {
            direction: StepDirection::Higher,
            select: false,
            qualifier: 0,
        };
        assert_eq!(step.as_u8(), 0x02);
        assert_eq!(RegulatingStepInfo::from_u8(0x02), step);
    }

    #[test]
    fn test_setpoint_qualifier_qos() {
        let qos = SetpointQualifier {
            select: true,
            qualifier: 5,
        };
        assert_eq!(qos.as_u8(), 0x85);
        assert_eq!(SetpointQualifier::from_u8(0x85), qos);
        assert_eq!(SetpointQualifier::default().as_u8(), 0x00);
    }

    #[test]
    fn test_end_of_init_coi() {
        let coi = EndOfInitInfo {
            cause: 2,
            local_change: true,
        };
        assert_eq!(coi.as_u8(), 0x82);
        assert_eq!(EndOfInitInfo::from_u8(0x82), coi);
    }

    #[test]
    fn test_object_value_as_f64() {
        assert_eq!(
            ObjectValue::SinglePoint(SinglePointInfo::new(true)).as_f64(),
            Some(1.0)
        );
        assert_eq!(
            ObjectValue::Scaled(ScaledInfo::new(-100)).as_f64(),
            Some(-100.0)
        );
        let v = ObjectValue::ShortFloat(ShortFloatInfo::new(3.14)).as_f64();
        assert!((v.unwrap() - 3.14).abs() < 1e-6);
        assert_eq!(ObjectValue::Read.as_f64(), None);
        assert!(
            ObjectValue::DoublePoint(DoublePointInfo::new(DoublePointValue::Indeterminate))
                .as_f64()
                .unwrap()
                .is_nan()
        );
    }

    #[test]
    fn test_object_value_as_bool() {
        assert_eq!(
            ObjectValue::SinglePoint(SinglePointInfo::new(false)).as_bool(),
            Some(false)
        );
        assert_eq!(
            ObjectValue::DoublePoint(DoublePointInfo::new(DoublePointValue::On)).as_bool(),
            Some(true)
        );
        assert_eq!(
            ObjectValue::DoublePoint(DoublePointInfo::new(DoublePointValue::Indeterminate))
                .as_bool(),
            None
        );
        assert_eq!(
            ObjectValue::ShortFloat(ShortFloatInfo::new(1.0)).as_bool(),
            None
        );
    }

    #[test]
    fn test_object_value_time_tag() {
        let time = Cp56Time2a {
            milliseconds: 1,
            minutes: 2,
            hours: 3,
            day: 4,
            day_of_week: 5,
            month: 6,
            year: 7,
            invalid: false,
            summer_time: false,
        };
        let value = ObjectValue::SinglePointTimed(SinglePointInfo::new(true), time);
        assert_eq!(value.time_tag(), Some(&time));
        assert_eq!(
            ObjectValue::SinglePoint(SinglePointInfo::new(true)).time_tag(),
            None
        );
    }
}
