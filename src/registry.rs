//! ASDU codec and type registry.
//!
//! The registry maps a raw type identification to a pair of pure
//! element codec functions. The generic driver in this module owns the
//! object layout rules shared by every type: explicit addressing
//! (SQ=0, one IOA per object) versus sequence addressing (SQ=1, one
//! base IOA followed by consecutive values), exact-length accounting
//! and the empty/truncated/trailing failure modes.
//!
//! The registry is populated once at startup and shared read-only
//! (`Arc<TypeRegistry>`) between sessions. Additional handlers may be
//! registered before the registry is shared.

use std::collections::HashMap;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Iec104Error, Result};
use crate::types::{
    Asdu, AsduHeader, BitstringInfo, CounterInfo, Cp56Time2a, DoubleCommandInfo, DoublePointInfo,
    EndOfInitInfo, InformationObject, Ioa, MeasuredQuality, NormalizedInfo, ObjectValue,
    RegulatingStepInfo, ScaledInfo, SetpointQualifier, ShortFloatInfo, SingleCommandInfo,
    SinglePointInfo, StepPositionInfo, TypeId, IOA_SIZE, MAX_ASDU_LENGTH,
};

/// Element codec for one type identification.
///
/// `decode` receives exactly `size` bytes; `encode` must append exactly
/// `size` bytes or fail. Both are pure functions so a registry can be
/// shared freely once built.
#[derive(Clone, Copy)]
pub struct ElementCodec {
    /// Fixed information-element size in bytes, excluding the IOA.
    pub size: usize,
    /// Decode one information element.
    pub decode: fn(&[u8]) -> Result<ObjectValue>,
    /// Encode one information element.
    pub encode: fn(&ObjectValue, &mut BytesMut) -> Result<()>,
}

impl std::fmt::Debug for ElementCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementCodec")
            .field("size", &self.size)
            .finish()
    }
}

/// An ASDU whose type identification has no registered codec.
///
/// Carried to the application unparsed so it can be logged or
/// forwarded; receiving one never terminates the session.
#[derive(Debug, Clone, PartialEq)]
pub struct UnhandledAsdu {
    /// Parsed data unit identifier
    pub header: AsduHeader,
    /// Raw information-object bytes
    pub raw: Bytes,
}

/// Registry of ASDU type handlers.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    handlers: HashMap<u8, ElementCodec>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_standard_types()
    }
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Create a registry with all built-in type handlers.
    pub fn with_standard_types() -> Self {
        let mut registry = Self::empty();

        // Process information in monitoring direction
        registry.register(TypeId::SinglePoint.as_u8(), codecs::SINGLE_POINT);
        registry.register(TypeId::DoublePoint.as_u8(), codecs::DOUBLE_POINT);
        registry.register(TypeId::StepPosition.as_u8(), codecs::STEP_POSITION);
        registry.register(TypeId::Bitstring32.as_u8(), codecs::BITSTRING);
        registry.register(TypeId::MeasuredNormalized.as_u8(), codecs::NORMALIZED);
        registry.register(TypeId::MeasuredScaled.as_u8(), codecs::SCALED);
        registry.register(TypeId::MeasuredFloat.as_u8(), codecs::SHORT_FLOAT);
        registry.register(TypeId::IntegratedTotals.as_u8(), codecs::INTEGRATED_TOTAL);
        registry.register(TypeId::SinglePointTime56.as_u8(), codecs::SINGLE_POINT_T56);
        registry.register(TypeId::DoublePointTime56.as_u8(), codecs::DOUBLE_POINT_T56);
        registry.register(TypeId::MeasuredFloatTime56.as_u8(), codecs::SHORT_FLOAT_T56);

        // Process information in control direction
        registry.register(TypeId::SingleCommand.as_u8(), codecs::SINGLE_COMMAND);
        registry.register(TypeId::DoubleCommand.as_u8(), codecs::DOUBLE_COMMAND);
        registry.register(TypeId::RegulatingStep.as_u8(), codecs::REGULATING_STEP);
        registry.register(TypeId::SetpointNormalized.as_u8(), codecs::SETPOINT_NORMALIZED);
        registry.register(TypeId::SetpointScaled.as_u8(), codecs::SETPOINT_SCALED);
        registry.register(TypeId::SetpointFloat.as_u8(), codecs::SETPOINT_FLOAT);
        registry.register(TypeId::Bitstring32Command.as_u8(), codecs::BITSTRING_COMMAND);
        registry.register(TypeId::SingleCommandTime56.as_u8(), codecs::SINGLE_COMMAND_T56);
        registry.register(TypeId::DoubleCommandTime56.as_u8(), codecs::DOUBLE_COMMAND_T56);
        registry.register(TypeId::SetpointFloatTime56.as_u8(), codecs::SETPOINT_FLOAT_T56);

        // System information
        registry.register(TypeId::EndOfInit.as_u8(), codecs::END_OF_INIT);
        registry.register(TypeId::InterrogationCommand.as_u8(), codecs::INTERROGATION);
        registry.register(TypeId::CounterInterrogation.as_u8(), codecs::COUNTER_INTERROGATION);
        registry.register(TypeId::ReadCommand.as_u8(), codecs::READ);
        registry.register(TypeId::ClockSync.as_u8(), codecs::CLOCK_SYNC);
        registry.register(TypeId::TestCommand.as_u8(), codecs::TEST_COMMAND);
        registry.register(TypeId::ResetProcess.as_u8(), codecs::RESET_PROCESS);

        registry
    }

    /// Register a handler for `type_id`, replacing any existing one.
    pub fn register(&mut self, type_id: u8, codec: ElementCodec) {
        self.handlers.insert(type_id, codec);
    }

    /// Check whether `type_id` has a handler.
    pub fn contains(&self, type_id: u8) -> bool {
        self.handlers.contains_key(&type_id)
    }

    /// Decode a full ASDU (header plus objects) from an I-frame body.
    pub fn decode(&self, body: &[u8]) -> Result<Asdu> {
        let (header, consumed) = AsduHeader::parse(body)?;
        let objects = self.decode_objects(&header, &body[consumed..])?;
        Ok(Asdu { header, objects })
    }

    /// Decode the information objects following a parsed header.
    pub fn decode_objects(
        &self,
        header: &AsduHeader,
        body: &[u8],
    ) -> Result<Vec<InformationObject>> {
        let count = header.vsq.count as usize;
        if count == 0 {
            return Err(Iec104Error::EmptyAsdu);
        }

        let codec = self
            .handlers
            .get(&header.type_id)
            .ok_or(Iec104Error::UnhandledType(header.type_id))?;

        let expected = if header.vsq.sequence {
            IOA_SIZE + count * codec.size
        } else {
            count * (IOA_SIZE + codec.size)
        };
        if body.len() < expected {
            return Err(Iec104Error::truncated_static(
                "ASDU body shorter than declared objects",
            ));
        }
        if body.len() > expected {
            return Err(Iec104Error::TrailingBytes {
                expected: header.vsq.count,
            });
        }

        let mut objects = Vec::with_capacity(count);
        if header.vsq.sequence {
            let base = Ioa::from_array([body[0], body[1], body[2]]);
            let mut offset = IOA_SIZE;
            for i in 0..count {
                let value = (codec.decode)(&body[offset..offset + codec.size])?;
                objects.push(InformationObject::new(base.offset(i as u32), value));
                offset += codec.size;
            }
        } else {
            let mut offset = 0;
            for _ in 0..count {
                let ioa = Ioa::from_array([body[offset], body[offset + 1], body[offset + 2]]);
                offset += IOA_SIZE;
                let value = (codec.decode)(&body[offset..offset + codec.size])?;
                objects.push(InformationObject::new(ioa, value));
                offset += codec.size;
            }
        }

        Ok(objects)
    }

    /// Encode a full ASDU into an I-frame body.
    pub fn encode(&self, asdu: &Asdu) -> Result<Bytes> {
        let count = asdu.objects.len();
        if count == 0 {
            return Err(Iec104Error::EmptyAsdu);
        }
        if count > 0x7F {
            return Err(Iec104Error::encode_static("more than 127 objects"));
        }
        if asdu.header.vsq.count as usize != count {
            return Err(Iec104Error::encode_static(
                "VSQ count does not match object count",
            ));
        }

        let codec = self
            .handlers
            .get(&asdu.header.type_id)
            .ok_or(Iec104Error::UnhandledType(asdu.header.type_id))?;

        let body_len = if asdu.header.vsq.sequence {
            IOA_SIZE + count * codec.size
        } else {
            count * (IOA_SIZE + codec.size)
        };
        if body_len + 6 > MAX_ASDU_LENGTH {
            return Err(Iec104Error::encode_static("ASDU exceeds 249 bytes"));
        }

        let mut buf = BytesMut::with_capacity(6 + body_len);
        asdu.header.encode(&mut buf);

        if asdu.header.vsq.sequence {
            let base = asdu.objects[0].ioa;
            for (i, object) in asdu.objects.iter().enumerate() {
                if object.ioa != base.offset(i as u32) {
                    return Err(Iec104Error::encode_static(
                        "SQ=1 requires consecutive addresses",
                    ));
                }
            }
            buf.put_slice(&base.to_bytes());
            for object in &asdu.objects {
                (codec.encode)(&object.value, &mut buf)?;
            }
        } else {
            for object in &asdu.objects {
                buf.put_slice(&object.ioa.to_bytes());
                (codec.encode)(&object.value, &mut buf)?;
            }
        }

        Ok(buf.freeze())
    }
}

/// Built-in element codecs.
mod codecs {
    use super::*;

    fn mismatch() -> Iec104Error {
        Iec104Error::encode_static("object value does not match type identification")
    }

    // ---- monitoring direction ----

    pub(super) const SINGLE_POINT: ElementCodec = ElementCodec {
        size: 1,
        decode: |data| Ok(ObjectValue::SinglePoint(SinglePointInfo::from_u8(data[0]))),
        encode: |value, buf| match value {
            ObjectValue::SinglePoint(p) => {
                buf.put_u8(p.as_u8());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const DOUBLE_POINT: ElementCodec = ElementCodec {
        size: 1,
        decode: |data| Ok(ObjectValue::DoublePoint(DoublePointInfo::from_u8(data[0]))),
        encode: |value, buf| match value {
            ObjectValue::DoublePoint(p) => {
                buf.put_u8(p.as_u8());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const STEP_POSITION: ElementCodec = ElementCodec {
        size: 2,
        decode: |data| {
            Ok(ObjectValue::StepPosition(StepPositionInfo::from_bytes(
                data[0], data[1],
            )))
        },
        encode: |value, buf| match value {
            ObjectValue::StepPosition(p) => {
                buf.put_slice(&p.to_bytes());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const BITSTRING: ElementCodec = ElementCodec {
        size: 5,
        decode: |data| {
            Ok(ObjectValue::Bitstring(BitstringInfo {
                value: u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
                quality: MeasuredQuality::from_u8(data[4]),
            }))
        },
        encode: |value, buf| match value {
            ObjectValue::Bitstring(b) => {
                buf.put_u32_le(b.value);
                buf.put_u8(b.quality.as_u8());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const NORMALIZED: ElementCodec = ElementCodec {
        size: 3,
        decode: |data| {
            Ok(ObjectValue::Normalized(NormalizedInfo {
                raw: i16::from_le_bytes([data[0], data[1]]),
                quality: MeasuredQuality::from_u8(data[2]),
            }))
        },
        encode: |value, buf| match value {
            ObjectValue::Normalized(v) => {
                buf.put_i16_le(v.raw);
                buf.put_u8(v.quality.as_u8());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const SCALED: ElementCodec = ElementCodec {
        size: 3,
        decode: |data| {
            Ok(ObjectValue::Scaled(ScaledInfo {
                value: i16::from_le_bytes([data[0], data[1]]),
                quality: MeasuredQuality::from_u8(data[2]),
            }))
        },
        encode: |value, buf| match value {
            ObjectValue::Scaled(v) => {
                buf.put_i16_le(v.value);
                buf.put_u8(v.quality.as_u8());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const SHORT_FLOAT: ElementCodec = ElementCodec {
        size: 5,
        decode: |data| {
            Ok(ObjectValue::ShortFloat(ShortFloatInfo {
                value: f32::from_le_bytes([data[0], data[1], data[2], data[3]]),
                quality: MeasuredQuality::from_u8(data[4]),
            }))
        },
        encode: |value, buf| match value {
            ObjectValue::ShortFloat(v) => {
                buf.put_f32_le(v.value);
                buf.put_u8(v.quality.as_u8());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const INTEGRATED_TOTAL: ElementCodec = ElementCodec {
        size: 5,
        decode: |data| {
            Ok(ObjectValue::IntegratedTotal(CounterInfo::from_bytes(&[
                data[0], data[1], data[2], data[3], data[4],
            ])))
        },
        encode: |value, buf| match value {
            ObjectValue::IntegratedTotal(c) => {
                buf.put_slice(&c.to_bytes());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const SINGLE_POINT_T56: ElementCodec = ElementCodec {
        size: 8,
        decode: |data| {
            Ok(ObjectValue::SinglePointTimed(
                SinglePointInfo::from_u8(data[0]),
                Cp56Time2a::from_bytes(&data[1..8])?,
            ))
        },
        encode: |value, buf| match value {
            ObjectValue::SinglePointTimed(p, time) => {
                buf.put_u8(p.as_u8());
                buf.put_slice(&time.to_bytes());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const DOUBLE_POINT_T56: ElementCodec = ElementCodec {
        size: 8,
        decode: |data| {
            Ok(ObjectValue::DoublePointTimed(
                DoublePointInfo::from_u8(data[0]),
                Cp56Time2a::from_bytes(&data[1..8])?,
            ))
        },
        encode: |value, buf| match value {
            ObjectValue::DoublePointTimed(p, time) => {
                buf.put_u8(p.as_u8());
                buf.put_slice(&time.to_bytes());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const SHORT_FLOAT_T56: ElementCodec = ElementCodec {
        size: 12,
        decode: |data| {
            Ok(ObjectValue::ShortFloatTimed(
                ShortFloatInfo {
                    value: f32::from_le_bytes([data[0], data[1], data[2], data[3]]),
                    quality: MeasuredQuality::from_u8(data[4]),
                },
                Cp56Time2a::from_bytes(&data[5..12])?,
            ))
        },
        encode: |value, buf| match value {
            ObjectValue::ShortFloatTimed(v, time) => {
                buf.put_f32_le(v.value);
                buf.put_u8(v.quality.as_u8());
                buf.put_slice(&time.to_bytes());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    // ---- control direction ----

    pub(super) const SINGLE_COMMAND: ElementCodec = ElementCodec {
        size: 1,
        decode: |data| {
            Ok(ObjectValue::SingleCommand(SingleCommandInfo::from_u8(
                data[0],
            )))
        },
        encode: |value, buf| match value {
            ObjectValue::SingleCommand(c) => {
                buf.put_u8(c.as_u8());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const DOUBLE_COMMAND: ElementCodec = ElementCodec {
        size: 1,
        decode: |data| {
            Ok(ObjectValue::DoubleCommand(DoubleCommandInfo::from_u8(
                data[0],
            )))
        },
        encode: |value, buf| match value {
            ObjectValue::DoubleCommand(c) => {
                buf.put_u8(c.as_u8());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const REGULATING_STEP: ElementCodec = ElementCodec {
        size: 1,
        decode: |data| {
            Ok(ObjectValue::RegulatingStep(RegulatingStepInfo::from_u8(
                data[0],
            )))
        },
        encode: |value, buf| match value {
            ObjectValue::RegulatingStep(c) => {
                buf.put_u8(c.as_u8());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const SETPOINT_NORMALIZED: ElementCodec = ElementCodec {
        size: 3,
        decode: |data| {
            Ok(ObjectValue::SetpointNormalized {
                raw: i16::from_le_bytes([data[0], data[1]]),
                qos: SetpointQualifier::from_u8(data[2]),
            })
        },
        encode: |value, buf| match value {
            ObjectValue::SetpointNormalized { raw, qos } => {
                buf.put_i16_le(*raw);
                buf.put_u8(qos.as_u8());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const SETPOINT_SCALED: ElementCodec = ElementCodec {
        size: 3,
        decode: |data| {
            Ok(ObjectValue::SetpointScaled {
                value: i16::from_le_bytes([data[0], data[1]]),
                qos: SetpointQualifier::from_u8(data[2]),
            })
        },
        encode: |value, buf| match value {
            ObjectValue::SetpointScaled { value, qos } => {
                buf.put_i16_le(*value);
                buf.put_u8(qos.as_u8());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const SETPOINT_FLOAT: ElementCodec = ElementCodec {
        size: 5,
        decode: |data| {
            Ok(ObjectValue::SetpointFloat {
                value: f32::from_le_bytes([data[0], data[1], data[2], data[3]]),
                qos: SetpointQualifier::from_u8(data[4]),
            })
        },
        encode: |value, buf| match value {
            ObjectValue::SetpointFloat { value, qos } => {
                buf.put_f32_le(*value);
                buf.put_u8(qos.as_u8());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const BITSTRING_COMMAND: ElementCodec = ElementCodec {
        size: 4,
        decode: |data| {
            Ok(ObjectValue::BitstringCommand(u32::from_le_bytes([
                data[0], data[1], data[2], data[3],
            ])))
        },
        encode: |value, buf| match value {
            ObjectValue::BitstringCommand(v) => {
                buf.put_u32_le(*v);
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const SINGLE_COMMAND_T56: ElementCodec = ElementCodec {
        size: 8,
        decode: |data| {
            Ok(ObjectValue::SingleCommandTimed(
                SingleCommandInfo::from_u8(data[0]),
                Cp56Time2a::from_bytes(&data[1..8])?,
            ))
        },
        encode: |value, buf| match value {
            ObjectValue::SingleCommandTimed(c, time) => {
                buf.put_u8(c.as_u8());
                buf.put_slice(&time.to_bytes());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const DOUBLE_COMMAND_T56: ElementCodec = ElementCodec {
        size: 8,
        decode: |data| {
            Ok(ObjectValue::DoubleCommandTimed(
                DoubleCommandInfo::from_u8(data[0]),
                Cp56Time2a::from_bytes(&data[1..8])?,
            ))
        },
        encode: |value, buf| match value {
            ObjectValue::DoubleCommandTimed(c, time) => {
                buf.put_u8(c.as_u8());
                buf.put_slice(&time.to_bytes());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const SETPOINT_FLOAT_T56: ElementCodec = ElementCodec {
        size: 12,
        decode: |data| {
            Ok(ObjectValue::SetpointFloatTimed {
                value: f32::from_le_bytes([data[0], data[1], data[2], data[3]]),
                qos: SetpointQualifier::from_u8(data[4]),
                time: Cp56Time2a::from_bytes(&data[5..12])?,
            })
        },
        encode: |value, buf| match value {
            ObjectValue::SetpointFloatTimed { value, qos, time } => {
                buf.put_f32_le(*value);
                buf.put_u8(qos.as_u8());
                buf.put_slice(&time.to_bytes());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    // ---- system information ----

    pub(super) const END_OF_INIT: ElementCodec = ElementCodec {
        size: 1,
        decode: |data| Ok(ObjectValue::EndOfInit(EndOfInitInfo::from_u8(data[0]))),
        encode: |value, buf| match value {
            ObjectValue::EndOfInit(e) => {
                buf.put_u8(e.as_u8());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const INTERROGATION: ElementCodec = ElementCodec {
        size: 1,
        decode: |data| Ok(ObjectValue::Interrogation { qoi: data[0] }),
        encode: |value, buf| match value {
            ObjectValue::Interrogation { qoi } => {
                buf.put_u8(*qoi);
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const COUNTER_INTERROGATION: ElementCodec = ElementCodec {
        size: 1,
        decode: |data| Ok(ObjectValue::CounterInterrogation { qcc: data[0] }),
        encode: |value, buf| match value {
            ObjectValue::CounterInterrogation { qcc } => {
                buf.put_u8(*qcc);
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const READ: ElementCodec = ElementCodec {
        size: 0,
        decode: |_| Ok(ObjectValue::Read),
        encode: |value, _| match value {
            ObjectValue::Read => Ok(()),
            _ => Err(mismatch()),
        },
    };

    pub(super) const CLOCK_SYNC: ElementCodec = ElementCodec {
        size: 7,
        decode: |data| Ok(ObjectValue::ClockSync(Cp56Time2a::from_bytes(data)?)),
        encode: |value, buf| match value {
            ObjectValue::ClockSync(time) => {
                buf.put_slice(&time.to_bytes());
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const TEST_COMMAND: ElementCodec = ElementCodec {
        size: 2,
        decode: |data| {
            Ok(ObjectValue::TestPattern(u16::from_le_bytes([
                data[0], data[1],
            ])))
        },
        encode: |value, buf| match value {
            ObjectValue::TestPattern(pattern) => {
                buf.put_u16_le(*pattern);
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };

    pub(super) const RESET_PROCESS: ElementCodec = ElementCodec {
        size: 1,
        decode: |data| Ok(ObjectValue::ResetProcess { qrp: data[0] }),
        encode: |value, buf| match value {
            ObjectValue::ResetProcess { qrp } => {
                buf.put_u8(*qrp);
                Ok(())
            }
            _ => Err(mismatch()),
        },
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cot, DoublePointValue, Vsq, QOI_STATION};

    fn registry() -> TypeRegistry {
        TypeRegistry::with_standard_types()
    }

    #[test]
    fn test_mandatory_types_registered() {
        let r = registry();
        for type_id in [1u8, 3, 9, 13, 30, 45, 46, 100, 103] {
            assert!(r.contains(type_id), "missing mandatory type {type_id}");
        }
    }

    #[test]
    fn test_decode_single_point_spontaneous() {
        // type 1, sq=0, n=1, cot=3 (spontaneous), ca=1, IOA=100, on
        let body = [0x01, 0x01, 0x03, 0x00, 0x01, 0x00, 0x64, 0x00, 0x00, 0x01];
        let asdu = registry().decode(&body).unwrap();

        assert_eq!(asdu.header.type_id, 1);
        assert_eq!(asdu.header.cot, Cot::Spontaneous);
        assert_eq!(asdu.header.common_address, 1);
        assert_eq!(asdu.objects.len(), 1);
        assert_eq!(asdu.objects[0].ioa.value(), 100);
        assert_eq!(asdu.objects[0].value.as_bool(), Some(true));
    }

    #[test]
    fn test_encode_single_point_matches_wire() {
        let asdu = Asdu::single(
            TypeId::SinglePoint,
            Cot::Spontaneous,
            1,
            InformationObject::new(100u32, ObjectValue::SinglePoint(SinglePointInfo::new(true))),
        );
        let encoded = registry().encode(&asdu).unwrap();
        assert_eq!(
            &encoded[..],
            &[0x01, 0x01, 0x03, 0x00, 0x01, 0x00, 0x64, 0x00, 0x00, 0x01]
        );
    }

    #[test]
    fn test_short_float_bit_exact() {
        // IEEE 754 float 3.14 with QDS 0x00, 5 bytes per value
        let asdu = Asdu::single(
            TypeId::MeasuredFloat,
            Cot::Spontaneous,
            1,
            InformationObject::new(
                0x000064u32,
                ObjectValue::ShortFloat(ShortFloatInfo::new(3.14)),
            ),
        );
        let encoded = registry().encode(&asdu).unwrap();
        assert_eq!(encoded.len(), 6 + 3 + 5);
        assert_eq!(&encoded[9..13], &3.14f32.to_le_bytes());
        assert_eq!(encoded[13], 0x00);

        let decoded = registry().decode(&encoded).unwrap();
        assert_eq!(decoded, asdu);
    }

    #[test]
    fn test_sequence_addressing() {
        // sq=1: one IOA then consecutive values
        let objects = vec![
            InformationObject::new(100u32, ObjectValue::SinglePoint(SinglePointInfo::new(false))),
            InformationObject::new(101u32, ObjectValue::SinglePoint(SinglePointInfo::new(true))),
            InformationObject::new(
                102u32,
                ObjectValue::SinglePoint(SinglePointInfo::from_u8(0x80)),
            ),
        ];
        let asdu = Asdu::from_objects(TypeId::SinglePoint, Cot::Spontaneous, 1, objects)
            .unwrap()
            .into_sequence();

        let encoded = registry().encode(&asdu).unwrap();
        // header + base IOA + 3 values
        assert_eq!(encoded.len(), 6 + 3 + 3);

        let decoded = registry().decode(&encoded).unwrap();
        assert_eq!(decoded.objects.len(), 3);
        assert_eq!(decoded.objects[0].ioa.value(), 100);
        assert_eq!(decoded.objects[1].ioa.value(), 101);
        assert_eq!(decoded.objects[2].ioa.value(), 102);
        assert_eq!(decoded.objects[1].value.as_bool(), Some(true));
        assert_eq!(decoded, asdu);
    }

    #[test]
    fn test_sequence_requires_consecutive_addresses() {
        let objects = vec![
            InformationObject::new(100u32, ObjectValue::SinglePoint(SinglePointInfo::new(true))),
            InformationObject::new(105u32, ObjectValue::SinglePoint(SinglePointInfo::new(true))),
        ];
        let asdu = Asdu::from_objects(TypeId::SinglePoint, Cot::Spontaneous, 1, objects)
            .unwrap()
            .into_sequence();
        assert!(registry().encode(&asdu).is_err());
    }

    #[test]
    fn test_empty_asdu() {
        let body = [0x01, 0x00, 0x03, 0x00, 0x01, 0x00];
        let err = registry().decode(&body).unwrap_err();
        assert!(matches!(err, Iec104Error::EmptyAsdu));
    }

    #[test]
    fn test_truncated() {
        // Declares one single point but the SIQ octet is missing
        let body = [0x01, 0x01, 0x03, 0x00, 0x01, 0x00, 0x64, 0x00, 0x00];
        let err = registry().decode(&body).unwrap_err();
        assert!(matches!(err, Iec104Error::Truncated(_)));
    }

    #[test]
    fn test_trailing_bytes() {
        let body = [
            0x01, 0x01, 0x03, 0x00, 0x01, 0x00, 0x64, 0x00, 0x00, 0x01, 0xFF,
        ];
        let err = registry().decode(&body).unwrap_err();
        assert!(matches!(err, Iec104Error::TrailingBytes { expected: 1 }));
    }

    #[test]
    fn test_unhandled_type() {
        // Type 110 (parameter family) has no built-in handler
        let body = [110, 0x01, 0x03, 0x00, 0x01, 0x00, 0x64, 0x00, 0x00, 0x01];
        let err = registry().decode(&body).unwrap_err();
        assert!(matches!(err, Iec104Error::UnhandledType(110)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_known_type_without_codec_is_unhandled() {
        // C_TS_TA_1 (107) is a known type identification but carries no
        // built-in codec; it surfaces as unhandled, not as an error.
        let r = registry();
        assert_eq!(TypeId::from_u8(107), Some(TypeId::TestCommandTime56));
        assert!(!r.contains(107));

        let body = [107, 0x01, 0x06, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0xAA, 0x55];
        let err = r.decode(&body).unwrap_err();
        assert!(matches!(err, Iec104Error::UnhandledType(107)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_unassigned_cause_decodes() {
        // Cause 14 is unassigned; the ASDU still decodes with the raw
        // cause retained.
        let body = [0x01, 0x01, 0x0E, 0x00, 0x01, 0x00, 0x64, 0x00, 0x00, 0x01];
        let asdu = registry().decode(&body).unwrap();
        assert_eq!(asdu.header.cot, Cot::Other(14));
        assert_eq!(asdu.objects[0].value.as_bool(), Some(true));

        let encoded = registry().encode(&asdu).unwrap();
        assert_eq!(&encoded[..], &body[..]);
    }

    #[test]
    fn test_interrogation_roundtrip() {
        // C_IC_NA_1, activation, QOI 20 (station interrogation)
        let asdu = Asdu::general_interrogation(1);
        let encoded = registry().encode(&asdu).unwrap();
        assert_eq!(
            &encoded[..],
            &[0x64, 0x01, 0x06, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x14]
        );

        let decoded = registry().decode(&encoded).unwrap();
        assert_eq!(decoded.header.cot, Cot::Activation);
        assert_eq!(
            decoded.objects[0].value,
            ObjectValue::Interrogation { qoi: QOI_STATION }
        );
    }

    #[test]
    fn test_clock_sync_roundtrip() {
        let time = Cp56Time2a {
            milliseconds: 45123,
            minutes: 7,
            hours: 22,
            day: 28,
            day_of_week: 0,
            month: 2,
            year: 26,
            invalid: false,
            summer_time: false,
        };
        let asdu = Asdu::clock_sync_command(0x0A, time);
        let encoded = registry().encode(&asdu).unwrap();
        assert_eq!(encoded.len(), 6 + 3 + 7);
        let decoded = registry().decode(&encoded).unwrap();
        assert_eq!(decoded, asdu);
    }

    #[test]
    fn test_command_roundtrips() {
        let r = registry();

        let commands = [
            Asdu::single_command(
                1,
                200u32,
                SingleCommandInfo {
                    value: true,
                    select: true,
                    qualifier: 1,
                },
            ),
            Asdu::double_command(1, 201u32, DoubleCommandInfo::execute(DoublePointValue::Off)),
            Asdu::regulating_step_command(1, 202u32, RegulatingStepInfo::from_u8(0x02)),
            Asdu::setpoint_float_command(1, 203u32, -12.5, SetpointQualifier::default()),
            Asdu::counter_interrogation(1, 0x45),
            Asdu::read_command(1, 300u32),
            Asdu::test_command(1),
            Asdu::reset_process_command(1, 1),
        ];

        for asdu in commands {
            let encoded = r.encode(&asdu).unwrap();
            let decoded = r.decode(&encoded).unwrap();
            assert_eq!(decoded, asdu);
        }
    }

    #[test]
    fn test_monitoring_roundtrips() {
        let r = registry();
        let time = Cp56Time2a {
            milliseconds: 100,
            minutes: 1,
            hours: 2,
            day: 3,
            day_of_week: 4,
            month: 5,
            year: 6,
            invalid: false,
            summer_time: false,
        };

        let asdus = [
            Asdu::single(
                TypeId::DoublePoint,
                Cot::Spontaneous,
                1,
                InformationObject::new(
                    1u32,
                    ObjectValue::DoublePoint(DoublePointInfo::new(DoublePointValue::On)),
                ),
            ),
            Asdu::single(
                TypeId::StepPosition,
                Cot::Spontaneous,
                1,
                InformationObject::new(
                    2u32,
                    ObjectValue::StepPosition(StepPositionInfo::from_bytes(0x85, 0x00)),
                ),
            ),
            Asdu::single(
                TypeId::Bitstring32,
                Cot::Spontaneous,
                1,
                InformationObject::new(
                    3u32,
                    ObjectValue::Bitstring(BitstringInfo {
                        value: 0xDEAD_BEEF,
                        quality: MeasuredQuality::GOOD,
                    }),
                ),
            ),
            Asdu::single(
                TypeId::MeasuredNormalized,
                Cot::Periodic,
                1,
                InformationObject::new(4u32, ObjectValue::Normalized(NormalizedInfo::new(16384))),
            ),
            Asdu::single(
                TypeId::MeasuredScaled,
                Cot::Periodic,
                1,
                InformationObject::new(5u32, ObjectValue::Scaled(ScaledInfo::new(-1000))),
            ),
            Asdu::single(
                TypeId::IntegratedTotals,
                Cot::RequestedByGeneralCounter,
                1,
                InformationObject::new(
                    6u32,
                    ObjectValue::IntegratedTotal(CounterInfo {
                        value: 123456,
                        sequence: 5,
                        carry: false,
                        adjusted: false,
                        invalid: false,
                    }),
                ),
            ),
            Asdu::single(
                TypeId::SinglePointTime56,
                Cot::Spontaneous,
                1,
                InformationObject::new(
                    7u32,
                    ObjectValue::SinglePointTimed(SinglePointInfo::new(true), time),
                ),
            ),
            Asdu::single(
                TypeId::MeasuredFloatTime56,
                Cot::Spontaneous,
                1,
                InformationObject::new(
                    8u32,
                    ObjectValue::ShortFloatTimed(ShortFloatInfo::new(42.0), time),
                ),
            ),
            Asdu::single(
                TypeId::EndOfInit,
                Cot::Initialized,
                1,
                InformationObject::new(
                    0u32,
                    ObjectValue::EndOfInit(EndOfInitInfo {
                        cause: 0,
                        local_change: false,
                    }),
                ),
            ),
        ];

        for asdu in asdus {
            let encoded = r.encode(&asdu).unwrap();
            let decoded = r.decode(&encoded).unwrap();
            assert_eq!(decoded, asdu);
        }
    }

    #[test]
    fn test_multi_object_explicit_addressing() {
        let objects = vec![
            InformationObject::new(
                1000u32,
                ObjectValue::ShortFloat(ShortFloatInfo::new(1.0)),
            ),
            InformationObject::new(
                2000u32,
                ObjectValue::ShortFloat(ShortFloatInfo::new(2.0)),
            ),
        ];
        let asdu =
            Asdu::from_objects(TypeId::MeasuredFloat, Cot::InterrogatedByStation, 1, objects)
                .unwrap();

        let encoded = registry().encode(&asdu).unwrap();
        assert_eq!(encoded.len(), 6 + 2 * (3 + 5));
        let decoded = registry().decode(&encoded).unwrap();
        assert_eq!(decoded, asdu);
    }

    #[test]
    fn test_encode_count_mismatch_rejected() {
        let mut asdu = Asdu::general_interrogation(1);
        asdu.header.vsq = Vsq::new(2, false);
        assert!(registry().encode(&asdu).is_err());
    }

    #[test]
    fn test_encode_value_kind_mismatch_rejected() {
        // Single-point value under a float type id
        let asdu = Asdu::single(
            TypeId::MeasuredFloat,
            Cot::Spontaneous,
            1,
            InformationObject::new(1u32, ObjectValue::SinglePoint(SinglePointInfo::new(true))),
        );
        assert!(registry().encode(&asdu).is_err());
    }

    #[test]
    fn test_custom_handler_registration() {
        // Callers can register ids outside the built-in profile; type
        // 110 (P_ME_NA_1) as a 3-byte opaque element.
        let mut r = TypeRegistry::with_standard_types();
        r.register(
            110,
            ElementCodec {
                size: 3,
                decode: |data| Ok(ObjectValue::Opaque(Bytes::copy_from_slice(data))),
                encode: |value, buf| match value {
                    ObjectValue::Opaque(raw) => {
                        buf.put_slice(raw);
                        Ok(())
                    }
                    _ => Err(Iec104Error::encode_static("expected opaque value")),
                },
            },
        );
        assert!(r.contains(110));

        let body = [110, 0x01, 0x03, 0x00, 0x01, 0x00, 0x64, 0x00, 0x00, 0x01, 0x02, 0x03];
        let asdu = r.decode(&body).unwrap();
        assert_eq!(
            asdu.objects[0].value,
            ObjectValue::Opaque(Bytes::from_static(&[0x01, 0x02, 0x03]))
        );

        let encoded = r.encode(&asdu).unwrap();
        assert_eq!(&encoded[..], &body[..]);
    }

    #[test]
    fn test_oversized_asdu_rejected() {
        // 31 float objects at 8 bytes each exceed the 249-byte bound
        let objects: Vec<_> = (0..31)
            .map(|i| {
                InformationObject::new(
                    i as u32,
                    ObjectValue::ShortFloat(ShortFloatInfo::new(i as f32)),
                )
            })
            .collect();
        let asdu =
            Asdu::from_objects(TypeId::MeasuredFloat, Cot::InterrogatedByStation, 1, objects)
                .unwrap();
        assert!(registry().encode(&asdu).is_err());
    }
}
