//! IEC 60870-5-104 Cause of Transmission (COT).

/// Cause of Transmission.
///
/// The 6-bit cause carried in the third ASDU header octet; the test and
/// negative flags occupy the top two bits of the same octet and live on
/// [`crate::types::AsduHeader`]. The cause space is non-exhaustive:
/// values without an assigned name decode as [`Cot::Other`] and travel
/// through the codec unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cot {
    /// Periodic, cyclic (1)
    Periodic,
    /// Background scan (2)
    Background,
    /// Spontaneous (3)
    Spontaneous,
    /// Initialized (4)
    Initialized,
    /// Request or requested (5)
    Request,
    /// Activation (6)
    Activation,
    /// Activation confirmation (7)
    ActivationConfirm,
    /// Deactivation (8)
    Deactivation,
    /// Deactivation confirmation (9)
    DeactivationConfirm,
    /// Activation termination (10)
    ActivationTermination,
    /// Return information caused by a remote command (11)
    ReturnRemoteCommand,
    /// Return information caused by a local command (12)
    ReturnLocalCommand,
    /// File transfer (13)
    FileTransfer,
    /// Interrogated by station interrogation (20)
    InterrogatedByStation,
    /// Interrogated by group 1 interrogation (21)
    InterrogatedByGroup1,
    /// Interrogated by group 2 interrogation (22)
    InterrogatedByGroup2,
    /// Interrogated by group 3 interrogation (23)
    InterrogatedByGroup3,
    /// Interrogated by group 4 interrogation (24)
    InterrogatedByGroup4,
    /// Interrogated by group 5 interrogation (25)
    InterrogatedByGroup5,
    /// Interrogated by group 6 interrogation (26)
    InterrogatedByGroup6,
    /// Interrogated by group 7 interrogation (27)
    InterrogatedByGroup7,
    /// Interrogated by group 8 interrogation (28)
    InterrogatedByGroup8,
    /// Interrogated by group 9 interrogation (29)
    InterrogatedByGroup9,
    /// Interrogated by group 10 interrogation (30)
    InterrogatedByGroup10,
    /// Interrogated by group 11 interrogation (31)
    InterrogatedByGroup11,
    /// Interrogated by group 12 interrogation (32)
    InterrogatedByGroup12,
    /// Interrogated by group 13 interrogation (33)
    InterrogatedByGroup13,
    /// Interrogated by group 14 interrogation (34)
    InterrogatedByGroup14,
    /// Interrogated by group 15 interrogation (35)
    InterrogatedByGroup15,
    /// Interrogated by group 16 interrogation (36)
    InterrogatedByGroup16,
    /// Requested by general counter request (37)
    RequestedByGeneralCounter,
    /// Requested by group 1 counter request (38)
    RequestedByGroup1Counter,
    /// Requested by group 2 counter request (39)
    RequestedByGroup2Counter,
    /// Requested by group 3 counter request (40)
    RequestedByGroup3Counter,
    /// Requested by group 4 counter request (41)
    RequestedByGroup4Counter,
    /// Unknown type identification (44)
    UnknownTypeId,
    /// Unknown cause of transmission (45)
    UnknownCot,
    /// Unknown common address of ASDU (46)
    UnknownCommonAddress,
    /// Unknown information object address (47)
    UnknownIoa,
    /// A cause without an assigned name; the raw 6-bit value is kept
    Other(u8),
}

impl Cot {
    /// Parse a COT from the raw cause octet (lower 6 bits; flag bits
    /// are ignored here). Total: unassigned causes come back as
    /// [`Cot::Other`].
    #[inline]
    pub fn from_u8(value: u8) -> Self {
        match value & 0x3F {
            1 => Self::Periodic,
            2 => Self::Background,
            3 => Self::Spontaneous,
            4 => Self::Initialized,
            5 => Self::Request,
            6 => Self::Activation,
            7 => Self::ActivationConfirm,
            8 => Self::Deactivation,
            9 => Self::DeactivationConfirm,
            10 => Self::ActivationTermination,
            11 => Self::ReturnRemoteCommand,
            12 => Self::ReturnLocalCommand,
            13 => Self::FileTransfer,
            20 => Self::InterrogatedByStation,
            21 => Self::InterrogatedByGroup1,
            22 => Self::InterrogatedByGroup2,
            23 => Self::InterrogatedByGroup3,
            24 => Self::InterrogatedByGroup4,
            25 => Self::InterrogatedByGroup5,
            26 => Self::InterrogatedByGroup6,
            27 => Self::InterrogatedByGroup7,
            28 => Self::InterrogatedByGroup8,
            29 => Self::InterrogatedByGroup9,
            30 => Self::InterrogatedByGroup10,
            31 => Self::InterrogatedByGroup11,
            32 => Self::InterrogatedByGroup12,
            33 => Self::InterrogatedByGroup13,
            34 => Self::InterrogatedByGroup14,
            35 => Self::InterrogatedByGroup15,
            36 => Self::InterrogatedByGroup16,
            37 => Self::RequestedByGeneralCounter,
            38 => Self::RequestedByGroup1Counter,
            39 => Self::RequestedByGroup2Counter,
            40 => Self::RequestedByGroup3Counter,
            41 => Self::RequestedByGroup4Counter,
            44 => Self::UnknownTypeId,
            45 => Self::UnknownCot,
            46 => Self::UnknownCommonAddress,
            47 => Self::UnknownIoa,
            cause => Self::Other(cause),
        }
    }

    /// Convert to the raw 6-bit cause value.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Periodic => 1,
            Self::Background => 2,
            Self::Spontaneous => 3,
            Self::Initialized => 4,
            Self::Request => 5,
            Self::Activation => 6,
            Self::ActivationConfirm => 7,
            Self::Deactivation => 8,
            Self::DeactivationConfirm => 9,
            Self::ActivationTermination => 10,
            Self::ReturnRemoteCommand => 11,
            Self::ReturnLocalCommand => 12,
            Self::FileTransfer => 13,
            Self::InterrogatedByStation => 20,
            Self::InterrogatedByGroup1 => 21,
            Self::InterrogatedByGroup2 => 22,
            Self::InterrogatedByGroup3 => 23,
            Self::InterrogatedByGroup4 => 24,
            Self::InterrogatedByGroup5 => 25,
            Self::InterrogatedByGroup6 => 26,
            Self::InterrogatedByGroup7 => 27,
            Self::InterrogatedByGroup8 => 28,
            Self::InterrogatedByGroup9 => 29,
            Self::InterrogatedByGroup10 => 30,
            Self::InterrogatedByGroup11 => 31,
            Self::InterrogatedByGroup12 => 32,
            Self::InterrogatedByGroup13 => 33,
            Self::InterrogatedByGroup14 => 34,
            Self::InterrogatedByGroup15 => 35,
            Self::InterrogatedByGroup16 => 36,
            Self::RequestedByGeneralCounter => 37,
            Self::RequestedByGroup1Counter => 38,
            Self::RequestedByGroup2Counter => 39,
            Self::RequestedByGroup3Counter => 40,
            Self::RequestedByGroup4Counter => 41,
            Self::UnknownTypeId => 44,
            Self::UnknownCot => 45,
            Self::UnknownCommonAddress => 46,
            Self::UnknownIoa => 47,
            Self::Other(cause) => cause & 0x3F,
        }
    }

    /// Check if this cause is a positive command confirmation.
    #[inline]
    pub const fn is_confirmation(&self) -> bool {
        matches!(
            self,
            Self::ActivationConfirm | Self::DeactivationConfirm | Self::ActivationTermination
        )
    }

    /// Check if this cause reports an unknown-reference error.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        matches!(
            self,
            Self::UnknownTypeId | Self::UnknownCot | Self::UnknownCommonAddress | Self::UnknownIoa
        )
    }

    /// Check if this cause answers a station or group interrogation.
    #[inline]
    pub const fn is_interrogation_response(&self) -> bool {
        !matches!(self, Self::Other(_)) && matches!(self.as_u8(), 20..=36)
    }

    /// Check if this cause answers a counter request.
    #[inline]
    pub const fn is_counter_response(&self) -> bool {
        !matches!(self, Self::Other(_)) && matches!(self.as_u8(), 37..=41)
    }

    /// Response cause for an interrogation of the given group.
    ///
    /// Group 0 is the station interrogation (QOI 20).
    #[inline]
    pub fn interrogated_by(group: u8) -> Option<Self> {
        if group <= 16 {
            Some(Self::from_u8(20 + group))
        } else {
            None
        }
    }
}

impl std::fmt::Display for Cot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Periodic => "Periodic",
            Self::Background => "Background",
            Self::Spontaneous => "Spontaneous",
            Self::Initialized => "Initialized",
            Self::Request => "Request",
            Self::Activation => "Activation",
            Self::ActivationConfirm => "ActivationConfirm",
            Self::Deactivation => "Deactivation",
            Self::DeactivationConfirm => "DeactivationConfirm",
            Self::ActivationTermination => "ActivationTermination",
            Self::ReturnRemoteCommand => "ReturnRemoteCommand",
            Self::ReturnLocalCommand => "ReturnLocalCommand",
            Self::FileTransfer => "FileTransfer",
            Self::InterrogatedByStation => "InterrogatedByStation",
            Self::InterrogatedByGroup1 => "InterrogatedByGroup1",
            Self::InterrogatedByGroup2 => "InterrogatedByGroup2",
            Self::InterrogatedByGroup3 => "InterrogatedByGroup3",
            Self::InterrogatedByGroup4 => "InterrogatedByGroup4",
            Self::InterrogatedByGroup5 => "InterrogatedByGroup5",
            Self::InterrogatedByGroup6 => "InterrogatedByGroup6",
            Self::InterrogatedByGroup7 => "InterrogatedByGroup7",
            Self::InterrogatedByGroup8 => "InterrogatedByGroup8",
            Self::InterrogatedByGroup9 => "InterrogatedByGroup9",
            Self::InterrogatedByGroup10 => "InterrogatedByGroup10",
            Self::InterrogatedByGroup11 => "InterrogatedByGroup11",
            Self::InterrogatedByGroup12 => "InterrogatedByGroup12",
            Self::InterrogatedByGroup13 => "InterrogatedByGroup13",
            Self::InterrogatedByGroup14 => "InterrogatedByGroup14",
            Self::InterrogatedByGroup15 => "InterrogatedByGroup15",
            Self::InterrogatedByGroup16 => "InterrogatedByGroup16",
            Self::RequestedByGeneralCounter => "RequestedByGeneralCounter",
            Self::RequestedByGroup1Counter => "RequestedByGroup1Counter",
            Self::RequestedByGroup2Counter => "RequestedByGroup2Counter",
            Self::RequestedByGroup3Counter => "RequestedByGroup3Counter",
            Self::RequestedByGroup4Counter => "RequestedByGroup4Counter",
            Self::UnknownTypeId => "UnknownTypeId",
            Self::UnknownCot => "UnknownCot",
            Self::UnknownCommonAddress => "UnknownCommonAddress",
            Self::UnknownIoa => "UnknownIoa",
            Self::Other(cause) => return write!(f, "Cause({})", cause),
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cot_from_u8() {
        assert_eq!(Cot::from_u8(1), Cot::Periodic);
        assert_eq!(Cot::from_u8(3), Cot::Spontaneous);
        assert_eq!(Cot::from_u8(6), Cot::Activation);
        assert_eq!(Cot::from_u8(7), Cot::ActivationConfirm);
        assert_eq!(Cot::from_u8(10), Cot::ActivationTermination);
        assert_eq!(Cot::from_u8(20), Cot::InterrogatedByStation);
        assert_eq!(Cot::from_u8(47), Cot::UnknownIoa);
    }

    #[test]
    fn test_cot_named_values_roundtrip() {
        for val in (1..=13).chain(20..=41).chain(44..=47) {
            let cot = Cot::from_u8(val);
            assert!(!matches!(cot, Cot::Other(_)), "{val} should have a name");
            assert_eq!(cot.as_u8(), val, "roundtrip failed for {val}");
        }
    }

    #[test]
    fn test_cot_unassigned_values_kept_raw() {
        for val in [0u8, 14, 15, 16, 17, 18, 19, 42, 43, 48, 49, 63] {
            let cot = Cot::from_u8(val);
            assert_eq!(cot, Cot::Other(val), "expected raw cause for {val}");
            assert_eq!(cot.as_u8(), val, "roundtrip failed for {val}");
        }
    }

    #[test]
    fn test_cot_upper_bits_masked() {
        // Flag bits (test/negative) share the octet and are masked off.
        assert_eq!(Cot::from_u8(0x43), Cot::Spontaneous);
        assert_eq!(Cot::from_u8(0x86), Cot::Activation);
        assert_eq!(Cot::from_u8(0xC6), Cot::Activation);
        assert_eq!(Cot::from_u8(0x8E), Cot::Other(14));
    }

    #[test]
    fn test_cot_predicates() {
        assert!(Cot::ActivationConfirm.is_confirmation());
        assert!(Cot::ActivationTermination.is_confirmation());
        assert!(!Cot::Activation.is_confirmation());

        assert!(Cot::UnknownTypeId.is_negative());
        assert!(Cot::UnknownIoa.is_negative());
        assert!(!Cot::Spontaneous.is_negative());

        assert!(Cot::InterrogatedByStation.is_interrogation_response());
        assert!(Cot::InterrogatedByGroup16.is_interrogation_response());
        assert!(!Cot::Spontaneous.is_interrogation_response());

        assert!(Cot::RequestedByGeneralCounter.is_counter_response());
        assert!(!Cot::InterrogatedByStation.is_counter_response());

        // Raw causes never classify
        assert!(!Cot::Other(25).is_interrogation_response());
        assert!(!Cot::Other(38).is_counter_response());
        assert!(!Cot::Other(7).is_confirmation());
    }

    #[test]
    fn test_interrogated_by_group() {
        assert_eq!(Cot::interrogated_by(0), Some(Cot::InterrogatedByStation));
        assert_eq!(Cot::interrogated_by(1), Some(Cot::InterrogatedByGroup1));
        assert_eq!(Cot::interrogated_by(16), Some(Cot::InterrogatedByGroup16));
        assert_eq!(Cot::interrogated_by(17), None);
    }

    #[test]
    fn test_cot_display() {
        assert_eq!(Cot::Spontaneous.to_string(), "Spontaneous");
        assert_eq!(Cot::ActivationConfirm.to_string(), "ActivationConfirm");
        assert_eq!(Cot::UnknownIoa.to_string(), "UnknownIoa");
        assert_eq!(Cot::Other(42).to_string(), "Cause(42)");
    }
}
