//! Triplets: `[length:1][code:1][payload]` attribute sub-records.
//!
//! The meaning of code `0x21` depends on the structured field carrying it,
//! so it is dispatched through the collision table of [`TRIPLETS`].
//!
//! An Attribute Qualifier carries a triplet list of its own. Nesting stops
//! there: a qualifier found inside another qualifier is kept as
//! [`Triplet::Unknown`].

use afp_macros::{ToBytes, fixed_layout};
use anyhow::Result;
use log::debug;

use crate::define_flags;
use crate::log_or_err;
use crate::process::context::DecodeContext;
use crate::process::iterate::{Element, ElementWriter, Framing, FramingPolicy, Stop, SubRecords};
use crate::process::registry::{Collision, Enclosing, Entry, Registry};
use crate::structs::field::TypeId;
use crate::utils::byteorder::{FixedLayout, WriteBytesBe};
use crate::utils::charset::{Charset, SPACE};
use crate::utils::errors::CodecError;
use crate::utils::flags::FlagSet;
use crate::utils::span::{ByteSpan, SpanReader, Threshold};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ToBytes)]
#[fixed_layout(0x01)]
pub struct CodedGraphicCharacterSet {
    pub gcsgid: u16,
    pub cpgid: u16,
}

impl CodedGraphicCharacterSet {
    fn read(reader: &mut SpanReader) -> Result<Self> {
        Ok(Self {
            gcsgid: reader.get_u16()?,
            cpgid: reader.get_u16()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ToBytes)]
#[fixed_layout(0x4B)]
pub struct MeasurementUnits {
    pub x_base: u8,
    pub y_base: u8,
    pub x_units: u16,
    pub y_units: u16,
}

impl MeasurementUnits {
    fn read(reader: &mut SpanReader) -> Result<Self> {
        Ok(Self {
            x_base: reader.get_u8()?,
            y_base: reader.get_u8()?,
            x_units: reader.get_u16()?,
            y_units: reader.get_u16()?,
        })
    }
}

/// Name formats of a fully qualified name.
pub const FQN_CHARACTER_STRING: u8 = 0x00;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualifiedName {
    /// Host text, transcoded with the configured charset.
    Character(String),
    /// Object identifiers, URLs and other binary forms.
    Other(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullyQualifiedName {
    pub fqn_type: u8,
    pub format: u8,
    pub name: QualifiedName,
}

define_flags! {
    /// Structure flags of an object classification, three 2-bit groups
    /// where every pattern is defined.
    pub enum StructureFlag {
        ContainerReserved = (0xC0, 0x00),
        ContainerUnknown = (0xC0, 0x40),
        ContainerAbsent = (0xC0, 0x80),
        ContainerPresent = (0xC0, 0xC0),
        EnvironmentReserved = (0x30, 0x00),
        EnvironmentUnknown = (0x30, 0x10),
        EnvironmentAbsent = (0x30, 0x20),
        EnvironmentPresent = (0x30, 0x30),
        DataReserved = (0x0C, 0x00),
        DataUnknown = (0x0C, 0x04),
        DataAbsent = (0x0C, 0x08),
        DataPresent = (0x0C, 0x0C),
    }
}

/// The value of one structure flag group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Reserved,
    Unknown,
    Absent,
    Present,
}

impl Presence {
    fn from_group(flags: FlagSet<StructureFlag>, mask: u8) -> Self {
        match (flags.encode() & mask) >> mask.trailing_zeros() {
            0 => Presence::Reserved,
            1 => Presence::Unknown,
            2 => Presence::Absent,
            _ => Presence::Present,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectClassification {
    pub reserved: u8,
    pub class: u8,
    pub reserved2: u16,
    pub structure: FlagSet<StructureFlag>,
    pub structure_reserved: u8,
    pub object_id: [u8; 16],
    pub type_name: Option<String>,
    pub level: Option<String>,
    pub company: Option<String>,
}

impl ObjectClassification {
    const TYPE_NAME: Threshold = Threshold::Above(22);
    const TYPE_NAME_LEN: usize = 32;
    const LEVEL: Threshold = Threshold::Above(54);
    const LEVEL_LEN: usize = 8;
    const COMPANY: Threshold = Threshold::Above(62);
    const COMPANY_LEN: usize = 32;

    pub fn container(&self) -> Presence {
        Presence::from_group(self.structure, 0xC0)
    }

    pub fn environment(&self) -> Presence {
        Presence::from_group(self.structure, 0x30)
    }

    pub fn data(&self) -> Presence {
        Presence::from_group(self.structure, 0x0C)
    }

    fn read_name(
        reader: &mut SpanReader,
        charset: Charset,
        threshold: Threshold,
        width: usize,
    ) -> Result<Option<String>> {
        reader.optional(threshold, width, |r| {
            Ok(charset.decode_fixed(r.take(width)?.bytes(), SPACE))
        })
    }

    fn read(reader: &mut SpanReader, ctx: &DecodeContext) -> Result<Self> {
        let charset = ctx.charset();

        Ok(Self {
            reserved: reader.get_u8()?,
            class: reader.get_u8()?,
            reserved2: reader.get_u16()?,
            structure: FlagSet::decode(reader.get_u8()?)?,
            structure_reserved: reader.get_u8()?,
            object_id: reader.get_array()?,
            type_name: Self::read_name(reader, charset, Self::TYPE_NAME, Self::TYPE_NAME_LEN)?,
            level: Self::read_name(reader, charset, Self::LEVEL, Self::LEVEL_LEN)?,
            company: Self::read_name(reader, charset, Self::COMPANY, Self::COMPANY_LEN)?,
        })
    }

    fn write(&self, dst: &mut Vec<u8>, ctx: &DecodeContext) {
        let charset = ctx.charset();

        dst.extend(crate::join_bytes_be!(
            self.reserved,
            self.class,
            self.reserved2,
            self.structure,
            self.structure_reserved,
            self.object_id
        ));

        // a later name needs every earlier slot
        let names = [
            (&self.type_name, Self::TYPE_NAME_LEN),
            (&self.level, Self::LEVEL_LEN),
            (&self.company, Self::COMPANY_LEN),
        ];
        let present = names.iter().rposition(|(name, _)| name.is_some()).map_or(0, |i| i + 1);

        for (name, width) in &names[..present] {
            let name = name.as_deref().unwrap_or_default();
            dst.extend(charset.encode_fixed(name, *width, SPACE));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ToBytes)]
pub struct ObjectFunctionSet {
    pub object_type: u8,
    pub architecture_version: u8,
    pub function_set: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ToBytes)]
pub struct ResourceObjectType {
    pub resource_type: u8,
    pub constant: [u8; 7],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ToBytes)]
pub struct EncodingScheme {
    pub code_page: u16,
    pub user_data: Option<u16>,
}

impl EncodingScheme {
    const USER_DATA: Threshold = Threshold::Above(2);
}

const ATTRIBUTE_QUALIFIER: u8 = 0x80;
const FINISHING_OPERATION: u8 = 0x85;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeQualifier {
    pub sequence: u32,
    pub level: u32,
    pub qualifiers: Vec<Triplet>,
}

/// A finishing operation and the positions it applies at. The position
/// count is a prefix byte, so it is written from `positions.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishingOperation {
    pub operation: u8,
    pub reserved: u16,
    pub reference_edge: u8,
    pub axis_offset: u16,
    pub positions: Vec<u16>,
}

impl FinishingOperation {
    const POSITION_WIDTH: usize = 2;

    fn write(&self, dst: &mut Vec<u8>) -> Result<()> {
        let count = u8::try_from(self.positions.len()).map_err(|_| CodecError::ValueTooLarge {
            what: "Finishing position count",
            length: self.positions.len(),
            max: u8::MAX as usize,
        })?;

        dst.extend(crate::join_bytes_be!(
            self.operation,
            self.reserved,
            self.reference_edge,
            count,
            self.axis_offset
        ));

        let mut writer = ElementWriter::new(FramingPolicy::Stride(Self::POSITION_WIDTH));
        for position in &self.positions {
            writer.write(dst, 0, &position.to_be_bytes())?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Triplet {
    CodedGraphicCharacterSet(CodedGraphicCharacterSet),
    FullyQualifiedName(FullyQualifiedName),
    ObjectClassification(ObjectClassification),
    ObjectFunctionSet(ObjectFunctionSet),
    ResourceObjectType(ResourceObjectType),
    AttributeValue { reserved: u16, value: String },
    MeasurementUnits(MeasurementUnits),
    EncodingScheme(EncodingScheme),
    Comment(String),
    AttributeQualifier(AttributeQualifier),
    FinishingOperation(FinishingOperation),
    Unknown { code: u8, data: Vec<u8> },
}

pub static TRIPLETS: Registry<Triplet> = Registry {
    family: "triplet",
    entries: &[
        Entry {
            code: 0x01,
            framing: Framing::Long,
            name: "Coded Graphic Character Set Global Identifier",
            decode: Triplet::read_coded_graphic_character_set,
        },
        Entry {
            code: 0x02,
            framing: Framing::Long,
            name: "Fully Qualified Name",
            decode: Triplet::read_fully_qualified_name,
        },
        Entry {
            code: 0x10,
            framing: Framing::Long,
            name: "Object Classification",
            decode: Triplet::read_object_classification,
        },
        Entry {
            code: 0x36,
            framing: Framing::Long,
            name: "Attribute Value",
            decode: Triplet::read_attribute_value,
        },
        Entry {
            code: 0x4B,
            framing: Framing::Long,
            name: "Measurement Units",
            decode: Triplet::read_measurement_units,
        },
        Entry {
            code: 0x50,
            framing: Framing::Long,
            name: "Encoding Scheme ID",
            decode: Triplet::read_encoding_scheme,
        },
        Entry {
            code: 0x65,
            framing: Framing::Long,
            name: "Comment",
            decode: Triplet::read_comment,
        },
        Entry {
            code: ATTRIBUTE_QUALIFIER as u32,
            framing: Framing::Long,
            name: "Attribute Qualifier",
            decode: Triplet::read_attribute_qualifier,
        },
        Entry {
            code: FINISHING_OPERATION as u32,
            framing: Framing::Long,
            name: "Finishing Operation",
            decode: Triplet::read_finishing_operation,
        },
    ],
    collisions: &[
        Collision {
            enclosing: Enclosing::Field(TypeId::BEGIN_DOCUMENT),
            code: 0x21,
            name: "Object Function Set Specification",
            decode: Triplet::read_object_function_set,
        },
        Collision {
            enclosing: Enclosing::Field(TypeId::BEGIN_RESOURCE),
            code: 0x21,
            name: "Resource Object Type",
            decode: Triplet::read_resource_object_type,
        },
    ],
    unknown: Triplet::read_unknown,
};

impl Triplet {
    fn read_coded_graphic_character_set(
        element: &Element<'_>,
        _: &mut DecodeContext,
    ) -> Result<Self> {
        CodedGraphicCharacterSet::read(&mut element.data.reader())
            .map(Self::CodedGraphicCharacterSet)
    }

    fn read_fully_qualified_name(element: &Element<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        let reader = &mut element.data.reader();
        let fqn_type = reader.get_u8()?;
        let format = reader.get_u8()?;
        let rest = reader.take_rest()?.bytes();

        let name = if format == FQN_CHARACTER_STRING {
            QualifiedName::Character(ctx.charset().decode(rest))
        } else {
            QualifiedName::Other(rest.to_vec())
        };

        Ok(Self::FullyQualifiedName(FullyQualifiedName {
            fqn_type,
            format,
            name,
        }))
    }

    fn read_object_classification(element: &Element<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        ObjectClassification::read(&mut element.data.reader(), ctx).map(Self::ObjectClassification)
    }

    fn read_object_function_set(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        let reader = &mut element.data.reader();

        Ok(Self::ObjectFunctionSet(ObjectFunctionSet {
            object_type: reader.get_u8()?,
            architecture_version: reader.get_u8()?,
            function_set: reader.get_u16()?,
        }))
    }

    fn read_resource_object_type(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        let reader = &mut element.data.reader();

        Ok(Self::ResourceObjectType(ResourceObjectType {
            resource_type: reader.get_u8()?,
            constant: reader.get_array()?,
        }))
    }

    fn read_attribute_value(element: &Element<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        let reader = &mut element.data.reader();
        let reserved = reader.get_u16()?;
        let value = ctx.charset().decode(reader.take_rest()?.bytes());

        Ok(Self::AttributeValue { reserved, value })
    }

    fn read_measurement_units(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        MeasurementUnits::read(&mut element.data.reader()).map(Self::MeasurementUnits)
    }

    fn read_encoding_scheme(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        let reader = &mut element.data.reader();

        Ok(Self::EncodingScheme(EncodingScheme {
            code_page: reader.get_u16()?,
            user_data: reader.optional(EncodingScheme::USER_DATA, 2, |r| r.get_u16())?,
        }))
    }

    fn read_comment(element: &Element<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        Ok(Self::Comment(ctx.charset().decode(element.data.bytes())))
    }

    fn read_attribute_qualifier(element: &Element<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        let reader = &mut element.data.reader();
        let sequence = reader.get_u32()?;
        let level = reader.get_u32()?;
        let enclosing = Enclosing::Triplet(ATTRIBUTE_QUALIFIER);

        Ok(Self::AttributeQualifier(AttributeQualifier {
            sequence,
            level,
            qualifiers: read_triplets(reader.take_rest()?, enclosing, ctx)?,
        }))
    }

    fn read_finishing_operation(element: &Element<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        let reader = &mut element.data.reader();
        let operation = reader.get_u8()?;
        let reserved = reader.get_u16()?;
        let reference_edge = reader.get_u8()?;
        let count = reader.get_u8()? as usize;
        let axis_offset = reader.get_u16()?;

        let mut walker = SubRecords::new(
            reader.take_rest()?,
            FramingPolicy::Stride(FinishingOperation::POSITION_WIDTH),
            Stop::Count(count),
            ctx.config.fail_level,
        );
        let positions = walker
            .by_ref()
            .map(|element| element.and_then(|element| element.data.reader().get_u16()))
            .collect::<Result<Vec<_>>>()?;

        let surplus = walker.remainder();
        if !surplus.is_empty() {
            log_or_err!(
                ctx.config,
                log::Level::Warn,
                CodecError::SurplusBytes {
                    offset: surplus.offset(),
                    remaining: surplus.len(),
                    count,
                }
            );
        }

        Ok(Self::FinishingOperation(FinishingOperation {
            operation,
            reserved,
            reference_edge,
            axis_offset,
            positions,
        }))
    }

    fn read_unknown(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        Ok(Self::Unknown {
            code: element.header.code as u8,
            data: element.data.bytes().to_vec(),
        })
    }

    pub fn code(&self) -> u8 {
        match self {
            Triplet::CodedGraphicCharacterSet(t) => t.type_code() as u8,
            Triplet::FullyQualifiedName(_) => 0x02,
            Triplet::ObjectClassification(_) => 0x10,
            Triplet::ObjectFunctionSet(_) | Triplet::ResourceObjectType(_) => 0x21,
            Triplet::AttributeValue { .. } => 0x36,
            Triplet::MeasurementUnits(t) => t.type_code() as u8,
            Triplet::EncodingScheme(_) => 0x50,
            Triplet::Comment(_) => 0x65,
            Triplet::AttributeQualifier(_) => ATTRIBUTE_QUALIFIER,
            Triplet::FinishingOperation(_) => FINISHING_OPERATION,
            Triplet::Unknown { code, .. } => *code,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Triplet::ObjectFunctionSet(_) => "Object Function Set Specification",
            Triplet::ResourceObjectType(_) => "Resource Object Type",
            Triplet::Unknown { .. } => "Unknown",
            _ => TRIPLETS
                .name(self.code() as u32, Framing::Long, Enclosing::Unspecified)
                .unwrap_or("Unknown"),
        }
    }

    pub fn payload(&self, ctx: &DecodeContext) -> Result<Vec<u8>> {
        let charset = ctx.charset();
        let mut dst = Vec::new();

        match self {
            Triplet::CodedGraphicCharacterSet(t) => return Ok(t.payload()),
            Triplet::FullyQualifiedName(t) => {
                dst.push(t.fqn_type);
                dst.push(t.format);
                match &t.name {
                    QualifiedName::Character(name) => dst.extend(charset.encode(name)),
                    QualifiedName::Other(bytes) => dst.extend_from_slice(bytes),
                }
            }
            Triplet::ObjectClassification(t) => t.write(&mut dst, ctx),
            Triplet::ObjectFunctionSet(t) => t.write_be(&mut dst),
            Triplet::ResourceObjectType(t) => t.write_be(&mut dst),
            Triplet::AttributeValue { reserved, value } => {
                reserved.write_be(&mut dst);
                dst.extend(charset.encode(value));
            }
            Triplet::MeasurementUnits(t) => return Ok(t.payload()),
            Triplet::EncodingScheme(t) => t.write_be(&mut dst),
            Triplet::Comment(text) => dst.extend(charset.encode(text)),
            Triplet::AttributeQualifier(t) => {
                t.sequence.write_be(&mut dst);
                t.level.write_be(&mut dst);
                write_triplets(&mut dst, &t.qualifiers, ctx)?;
            }
            Triplet::FinishingOperation(t) => t.write(&mut dst)?,
            Triplet::Unknown { data, .. } => dst.extend_from_slice(data),
        }

        Ok(dst)
    }
}

/// Decodes every triplet in `span`. `enclosing` settles colliding codes.
pub fn read_triplets(
    span: ByteSpan<'_>,
    enclosing: Enclosing,
    ctx: &mut DecodeContext,
) -> Result<Vec<Triplet>> {
    SubRecords::new(span, FramingPolicy::Triplet, Stop::ByteCount, ctx.config.fail_level)
        .map(|element| element.and_then(|element| read_triplet(&element, enclosing, ctx)))
        .collect()
}

fn read_triplet(
    element: &Element<'_>,
    enclosing: Enclosing,
    ctx: &mut DecodeContext,
) -> Result<Triplet> {
    let nested = matches!(enclosing, Enclosing::Triplet(_));

    if nested && element.header.code == ATTRIBUTE_QUALIFIER as u32 {
        debug!("Attribute Qualifier at offset {:#X} nested too deep", element.offset);
        return Triplet::read_unknown(element, ctx);
    }

    TRIPLETS.decode(element, enclosing, ctx)
}

pub fn write_triplets(dst: &mut Vec<u8>, triplets: &[Triplet], ctx: &DecodeContext) -> Result<()> {
    let mut writer = ElementWriter::new(FramingPolicy::Triplet);

    for triplet in triplets {
        writer.write(dst, triplet.code() as u32, &triplet.payload(ctx)?)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::context::DecoderConfig;
    use crate::utils::flags::Flag;

    fn decode_one(buf: &[u8], enclosing: Enclosing) -> Result<Triplet> {
        let ctx = &mut DecodeContext::default();
        let mut triplets = read_triplets(ByteSpan::whole(buf), enclosing, ctx)?;
        assert_eq!(triplets.len(), 1);
        Ok(triplets.remove(0))
    }

    fn encode(triplets: &[Triplet]) -> Result<Vec<u8>> {
        let mut dst = Vec::new();
        write_triplets(&mut dst, triplets, &DecodeContext::default())?;
        Ok(dst)
    }

    #[test]
    fn collision_resolved_by_enclosing_field() -> Result<()> {
        let buf = [0x0A, 0x21, 0x05, 0x01, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00];

        let active = decode_one(&buf, Enclosing::Field(TypeId::BEGIN_DOCUMENT))?;
        assert_eq!(
            active,
            Triplet::ObjectFunctionSet(ObjectFunctionSet {
                object_type: 0x05,
                architecture_version: 0x01,
                function_set: 0x8000,
            })
        );
        assert_eq!(active.name(), "Object Function Set Specification");

        let retired = decode_one(&buf, Enclosing::Field(TypeId::BEGIN_RESOURCE))?;
        assert_eq!(
            retired,
            Triplet::ResourceObjectType(ResourceObjectType {
                resource_type: 0x05,
                constant: [0x01, 0x80, 0, 0, 0, 0, 0],
            })
        );
        assert_eq!(encode(&[retired])?, buf);

        let ambiguous = decode_one(&buf, Enclosing::Field(TypeId::TAG_LOGICAL_ELEMENT))?;
        assert!(matches!(ambiguous, Triplet::Unknown { code: 0x21, .. }));
        assert_eq!(encode(&[ambiguous])?, buf);

        Ok(())
    }

    #[test]
    fn unknown_triplet_is_preserved() -> Result<()> {
        let buf = [0x05, 0x9C, 0x01, 0x02, 0x03];
        let triplet = decode_one(&buf, Enclosing::Unspecified)?;

        assert_eq!(
            triplet,
            Triplet::Unknown {
                code: 0x9C,
                data: vec![1, 2, 3]
            }
        );
        assert_eq!(encode(&[triplet])?, buf);

        Ok(())
    }

    #[test]
    fn fixed_layout_triplets() -> Result<()> {
        let buf = [
            0x06, 0x01, 0x03, 0xB9, 0x01, 0xF4, // CGCSGID 953 / 500
            0x08, 0x4B, 0x00, 0x00, 0x38, 0x40, 0x38, 0x40, // 14400 units per 10 inches
        ];

        let ctx = &mut DecodeContext::default();
        let triplets = read_triplets(ByteSpan::whole(&buf), Enclosing::Unspecified, ctx)?;

        assert_eq!(
            triplets[0],
            Triplet::CodedGraphicCharacterSet(CodedGraphicCharacterSet {
                gcsgid: 953,
                cpgid: 500
            })
        );
        assert_eq!(triplets[1].name(), "Measurement Units");
        assert_eq!(encode(&triplets)?, buf);

        Ok(())
    }

    fn classification(len: usize) -> Vec<u8> {
        let mut payload = vec![0x00, 0x01, 0x00, 0x00, 0xE4, 0x00];
        payload.extend([0xAB; 16]);
        payload.extend(std::iter::repeat_n(0xC1, len.saturating_sub(payload.len())));
        payload.truncate(len);

        let mut triplet = vec![(len + 2) as u8, 0x10];
        triplet.extend(payload);
        triplet
    }

    #[test]
    fn classification_thresholds() -> Result<()> {
        let triplet = decode_one(&classification(22), Enclosing::Unspecified)?;
        let Triplet::ObjectClassification(oc) = triplet else {
            panic!("not an object classification");
        };
        assert_eq!(oc.type_name, None);
        assert_eq!(oc.container(), Presence::Present);
        assert_eq!(oc.environment(), Presence::Absent);
        assert_eq!(oc.data(), Presence::Unknown);

        let triplet = decode_one(&classification(54), Enclosing::Unspecified)?;
        let Triplet::ObjectClassification(oc) = triplet else {
            panic!("not an object classification");
        };
        assert_eq!(oc.type_name.as_deref(), Some("A".repeat(32).as_str()));
        assert_eq!(oc.level, None);

        let err = decode_one(&classification(23), Enclosing::Unspecified).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CodecError>(),
            Some(&CodecError::TruncatedRecord {
                offset: 24,
                required: 32,
                available: 1
            })
        );

        let triplet = decode_one(&classification(94), Enclosing::Unspecified)?;
        assert_eq!(encode(&[triplet])?, classification(94));

        Ok(())
    }

    #[test]
    fn classification_fills_skipped_names() -> Result<()> {
        let triplet = decode_one(&classification(22), Enclosing::Unspecified)?;
        let Triplet::ObjectClassification(mut oc) = triplet else {
            panic!("not an object classification");
        };
        oc.level = Some("V1".into());

        let bytes = encode(&[Triplet::ObjectClassification(oc)])?;
        assert_eq!(bytes.len(), 2 + 62);

        let Triplet::ObjectClassification(oc) = decode_one(&bytes, Enclosing::Unspecified)? else {
            panic!("not an object classification");
        };
        assert_eq!(oc.type_name.as_deref(), Some(""));
        assert_eq!(oc.level.as_deref(), Some("V1"));
        assert_eq!(oc.company, None);

        Ok(())
    }

    #[test]
    fn structure_groups_cover_every_byte() -> Result<()> {
        for byte in 0..=255u8 {
            let flags = FlagSet::<StructureFlag>::decode(byte)?;

            for mask in [0xC0, 0x30, 0x0C] {
                assert_eq!(flags.iter().filter(|f| f.mask() == mask).count(), 1);
                assert_eq!(flags.encode() & mask, byte & mask);
            }
        }

        Ok(())
    }

    #[test]
    fn encoding_scheme_threshold() -> Result<()> {
        let short = decode_one(&[0x04, 0x50, 0x21, 0x00], Enclosing::Unspecified)?;
        assert_eq!(
            short,
            Triplet::EncodingScheme(EncodingScheme {
                code_page: 0x2100,
                user_data: None
            })
        );

        let long = decode_one(&[0x06, 0x50, 0x21, 0x00, 0x71, 0x00], Enclosing::Unspecified)?;
        assert_eq!(encode(&[long])?, [0x06, 0x50, 0x21, 0x00, 0x71, 0x00]);

        Ok(())
    }

    #[test]
    fn attribute_qualifier_nests_one_level() -> Result<()> {
        let buf = [
            0x17, 0x80, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // sequence 1, level 1
            0x03, 0x65, 0xC1, // comment "A"
            0x0A, 0x80, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03, // too deep
        ];

        let triplet = decode_one(&buf, Enclosing::Field(TypeId::TAG_LOGICAL_ELEMENT))?;
        assert_eq!(triplet.name(), "Attribute Qualifier");

        let Triplet::AttributeQualifier(mut aq) = triplet.clone() else {
            panic!("not an attribute qualifier");
        };
        assert_eq!((aq.sequence, aq.level), (1, 1));
        assert_eq!(
            aq.qualifiers,
            [
                Triplet::Comment("A".into()),
                Triplet::Unknown {
                    code: 0x80,
                    data: vec![0, 0, 0, 2, 0, 0, 0, 3]
                },
            ]
        );
        assert_eq!(encode(&[triplet])?, buf);

        aq.qualifiers.push(Triplet::Comment("BC".into()));
        let grown = encode(&[Triplet::AttributeQualifier(aq)])?;
        assert_eq!(grown.len(), buf.len() + 4);
        assert_eq!(grown[0], 0x1B);

        Ok(())
    }

    #[test]
    fn nested_triplet_overruns_its_qualifier() -> Result<()> {
        let buf = [
            0x0D, 0x80, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // sequence 1, level 1
            0x05, 0x65, 0xC1, // declares 5, 3 left
        ];

        let err = decode_one(&buf, Enclosing::Unspecified).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CodecError>(),
            Some(&CodecError::OverrunSubRecord {
                offset: 10,
                declared: 5,
                remaining: 3
            })
        );

        Ok(())
    }

    #[test]
    fn finishing_positions_follow_their_count() -> Result<()> {
        let buf = [
            0x0D, 0x85, 0x01, 0x00, 0x00, 0x02, 0x02, 0x00, 0x24, // two positions
            0x01, 0x00, 0x02, 0x00,
        ];

        let triplet = decode_one(&buf, Enclosing::Unspecified)?;
        assert_eq!(
            triplet,
            Triplet::FinishingOperation(FinishingOperation {
                operation: 0x01,
                reserved: 0,
                reference_edge: 0x02,
                axis_offset: 0x24,
                positions: vec![0x0100, 0x0200],
            })
        );
        assert_eq!(encode(&[triplet])?, buf);

        let mut short = buf;
        short[6] = 3;
        let err = decode_one(&short, Enclosing::Unspecified).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CodecError>(),
            Some(&CodecError::TruncatedRecord {
                offset: 13,
                required: 2,
                available: 0
            })
        );

        Ok(())
    }

    #[test]
    fn finishing_surplus_is_strict_only() -> Result<()> {
        let buf = [
            0x0D, 0x85, 0x01, 0x00, 0x00, 0x02, 0x01, 0x00, 0x24, // one position
            0x01, 0x00, 0x02, 0x00,
        ];

        let Triplet::FinishingOperation(op) = decode_one(&buf, Enclosing::Unspecified)? else {
            panic!("not a finishing operation");
        };
        assert_eq!(op.positions, [0x0100]);

        let ctx = &mut DecodeContext::new(DecoderConfig {
            fail_level: log::Level::Warn,
            ..Default::default()
        });
        let err = read_triplets(ByteSpan::whole(&buf), Enclosing::Unspecified, ctx).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CodecError>(),
            Some(&CodecError::SurplusBytes {
                offset: 11,
                remaining: 2,
                count: 1
            })
        );

        Ok(())
    }
}
