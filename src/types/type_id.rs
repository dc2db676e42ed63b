//! IEC 60870-5-104 type identification.
//!
//! The type id selects the shape of every information object in an
//! ASDU. The enum below covers the built-in profile; the codec registry
//! is keyed on the raw `u8` so callers can register ids outside this
//! set (the file-transfer family 120..=127 is deliberately absent).

/// IEC 60870-5-104 type identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeId {
    // Process information in monitoring direction
    /// Single-point information (M_SP_NA_1)
    SinglePoint = 1,
    /// Double-point information (M_DP_NA_1)
    DoublePoint = 3,
    /// Step position information (M_ST_NA_1)
    StepPosition = 5,
    /// Bitstring of 32 bit (M_BO_NA_1)
    Bitstring32 = 7,
    /// Measured value, normalized (M_ME_NA_1)
    MeasuredNormalized = 9,
    /// Measured value, scaled (M_ME_NB_1)
    MeasuredScaled = 11,
    /// Measured value, short floating point (M_ME_NC_1)
    MeasuredFloat = 13,
    /// Integrated totals (M_IT_NA_1)
    IntegratedTotals = 15,
    /// Single-point information with time tag CP56Time2a (M_SP_TB_1)
    SinglePointTime56 = 30,
    /// Double-point information with time tag CP56Time2a (M_DP_TB_1)
    DoublePointTime56 = 31,
    /// Measured value, short floating point with time tag CP56Time2a (M_ME_TF_1)
    MeasuredFloatTime56 = 36,

    // Process information in control direction
    /// Single command (C_SC_NA_1)
    SingleCommand = 45,
    /// Double command (C_DC_NA_1)
    DoubleCommand = 46,
    /// Regulating step command (C_RC_NA_1)
    RegulatingStep = 47,
    /// Set-point command, normalized (C_SE_NA_1)
    SetpointNormalized = 48,
    /// Set-point command, scaled (C_SE_NB_1)
    SetpointScaled = 49,
    /// Set-point command, short floating point (C_SE_NC_1)
    SetpointFloat = 50,
    /// Bitstring of 32 bit command (C_BO_NA_1)
    Bitstring32Command = 51,
    /// Single command with time tag CP56Time2a (C_SC_TA_1)
    SingleCommandTime56 = 58,
    /// Double command with time tag CP56Time2a (C_DC_TA_1)
    DoubleCommandTime56 = 59,
    /// Set-point command, short floating point with time tag CP56Time2a (C_SE_TC_1)
    SetpointFloatTime56 = 63,

    // System information in monitoring direction
    /// End of initialization (M_EI_NA_1)
    EndOfInit = 70,

    // System information in control direction
    /// Interrogation command (C_IC_NA_1)
    InterrogationCommand = 100,
    /// Counter interrogation command (C_CI_NA_1)
    CounterInterrogation = 101,
    /// Read command (C_RD_NA_1)
    ReadCommand = 102,
    /// Clock synchronization command (C_CS_NA_1)
    ClockSync = 103,
    /// Test command (C_TS_NA_1)
    TestCommand = 104,
    /// Reset process command (C_RP_NA_1)
    ResetProcess = 105,
    /// Test command with time tag CP56Time2a (C_TS_TA_1)
    TestCommandTime56 = 107,
}

impl TypeId {
    /// Look up a built-in type id from its raw value.
    ///
    /// Returns `None` for ids outside the built-in profile; the codec
    /// registry decides whether such ids are handled or surfaced as
    /// unhandled.
    #[inline]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::SinglePoint),
            3 => Some(Self::DoublePoint),
            5 => Some(Self::StepPosition),
            7 => Some(Self::Bitstring32),
            9 => Some(Self::MeasuredNormalized),
            11 => Some(Self::MeasuredScaled),
            13 => Some(Self::MeasuredFloat),
            15 => Some(Self::IntegratedTotals),
            30 => Some(Self::SinglePointTime56),
            31 => Some(Self::DoublePointTime56),
            36 => Some(Self::MeasuredFloatTime56),
            45 => Some(Self::SingleCommand),
            46 => Some(Self::DoubleCommand),
            47 => Some(Self::RegulatingStep),
            48 => Some(Self::SetpointNormalized),
            49 => Some(Self::SetpointScaled),
            50 => Some(Self::SetpointFloat),
            51 => Some(Self::Bitstring32Command),
            58 => Some(Self::SingleCommandTime56),
            59 => Some(Self::DoubleCommandTime56),
            63 => Some(Self::SetpointFloatTime56),
            70 => Some(Self::EndOfInit),
            100 => Some(Self::InterrogationCommand),
            101 => Some(Self::CounterInterrogation),
            102 => Some(Self::ReadCommand),
            103 => Some(Self::ClockSync),
            104 => Some(Self::TestCommand),
            105 => Some(Self::ResetProcess),
            107 => Some(Self::TestCommandTime56),
            _ => None,
        }
    }

    /// Convert to the raw wire value.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Check if this type flows in the monitoring direction (station to master).
    #[inline]
    pub const fn is_monitoring(&self) -> bool {
        matches!(self.as_u8(), 1..=44 | 70)
    }

    /// Check if this type flows in the control direction (master to station).
    #[inline]
    pub const fn is_control(&self) -> bool {
        matches!(self.as_u8(), 45..=69 | 100..=107)
    }

    /// Check if this type carries a CP56Time2a time tag.
    #[inline]
    pub const fn has_time_tag(&self) -> bool {
        matches!(
            self,
            Self::SinglePointTime56
                | Self::DoublePointTime56
                | Self::MeasuredFloatTime56
                | Self::SingleCommandTime56
                | Self::DoubleCommandTime56
                | Self::SetpointFloatTime56
                | Self::TestCommandTime56
        )
    }

    /// Get the IEC standard name (e.g. "M_SP_NA_1").
    #[inline]
    pub const fn standard_name(&self) -> &'static str {
        match self {
            Self::SinglePoint => "M_SP_NA_1",
            Self::DoublePoint => "M_DP_NA_1",
            Self::StepPosition => "M_ST_NA_1",
            Self::Bitstring32 => "M_BO_NA_1",
            Self::MeasuredNormalized => "M_ME_NA_1",
            Self::MeasuredScaled => "M_ME_NB_1",
            Self::MeasuredFloat => "M_ME_NC_1",
            Self::IntegratedTotals => "M_IT_NA_1",
            Self::SinglePointTime56 => "M_SP_TB_1",
            Self::DoublePointTime56 => "M_DP_TB_1",
            Self::MeasuredFloatTime56 => "M_ME_TF_1",
            Self::SingleCommand => "C_SC_NA_1",
            Self::DoubleCommand => "C_DC_NA_1",
            Self::RegulatingStep => "C_RC_NA_1",
            Self::SetpointNormalized => "C_SE_NA_1",
            Self::SetpointScaled => "C_SE_NB_1",
            Self::SetpointFloat => "C_SE_NC_1",
            Self::Bitstring32Command => "C_BO_NA_1",
            Self::SingleCommandTime56 => "C_SC_TA_1",
            Self::DoubleCommandTime56 => "C_DC_TA_1",
            Self::SetpointFloatTime56 => "C_SE_TC_1",
            Self::EndOfInit => "M_EI_NA_1",
            Self::InterrogationCommand => "C_IC_NA_1",
            Self::CounterInterrogation => "C_CI_NA_1",
            Self::ReadCommand => "C_RD_NA_1",
            Self::ClockSync => "C_CS_NA_1",
            Self::TestCommand => "C_TS_NA_1",
            Self::ResetProcess => "C_RP_NA_1",
            Self::TestCommandTime56 => "C_TS_TA_1",
        }
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.standard_name())
    }
}

impl From<TypeId> for u8 {
    fn from(id: TypeId) -> u8 {
        id.as_u8()
    }
}
