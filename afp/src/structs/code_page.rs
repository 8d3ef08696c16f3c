//! Code page resource records.
//!
//! A Code Page Control announces the width of each Code Page Index entry.
//! The index cannot be framed without it, so the control leaves a
//! [`CodePageLayout`] in the decode context.

use anyhow::{Result, bail};
use log::debug;

use crate::define_flags;
use crate::process::context::{ContextKind, ContextValue, DecodeContext};
use crate::process::iterate::{ElementWriter, FramingPolicy, Stop, SubRecords};
use crate::utils::byteorder::WriteBytesBe;
use crate::utils::charset::SPACE;
use crate::utils::errors::CodecError;
use crate::utils::flags::FlagSet;
use crate::utils::span::{ByteSpan, Threshold};

const NAME_LEN: usize = 8;

define_flags! {
    pub enum CharacterFlag {
        Invalid = (0x80, 0x80),
        NoPresentation = (0x40, 0x40),
        NoIncrement = (0x20, 0x20),
    }
}

define_flags! {
    pub enum ControlFlag {
        SortedByCharacterId = (0x80, 0x00),
        SortedByCodePoint = (0x80, 0x80),
        VariableSpaceEnabled = (0x40, 0x40),
    }
}

/// Width of one Code Page Index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePageLayout {
    /// 10 bytes, 1-byte code point.
    SingleByte,
    /// 11 bytes, 2-byte code point.
    DoubleByte,
}

impl ContextValue for CodePageLayout {
    const KIND: ContextKind = ContextKind::CodePageLayout;
}

impl CodePageLayout {
    pub fn from_group_len(len: u8) -> Result<Self> {
        match len {
            10 => Ok(Self::SingleByte),
            11 => Ok(Self::DoubleByte),
            _ => bail!(CodecError::UnsupportedGroupLength(len)),
        }
    }

    pub fn group_len(self) -> u8 {
        match self {
            Self::SingleByte => 10,
            Self::DoubleByte => 11,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodePageDescriptor {
    pub description: String,
    pub gcgid_len: u16,
    pub code_points: u32,
    pub gcsgid: u16,
    pub cpgid: u16,
    pub encoding_scheme: Option<u16>,
}

impl CodePageDescriptor {
    const DESCRIPTION_LEN: usize = 32;
    const ENCODING_SCHEME: Threshold = Threshold::Above(42);

    pub fn read(data: ByteSpan<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        let reader = &mut data.reader();

        Ok(Self {
            description: ctx
                .charset()
                .decode_fixed(reader.take(Self::DESCRIPTION_LEN)?.bytes(), SPACE),
            gcgid_len: reader.get_u16()?,
            code_points: reader.get_u32()?,
            gcsgid: reader.get_u16()?,
            cpgid: reader.get_u16()?,
            encoding_scheme: reader.optional(Self::ENCODING_SCHEME, 2, |r| r.get_u16())?,
        })
    }

    pub fn write(&self, dst: &mut Vec<u8>, ctx: &mut DecodeContext) -> Result<()> {
        dst.extend(
            ctx.charset()
                .encode_fixed(&self.description, Self::DESCRIPTION_LEN, SPACE),
        );
        dst.extend(crate::join_bytes_be!(
            self.gcgid_len,
            self.code_points,
            self.gcsgid,
            self.cpgid,
            self.encoding_scheme
        ));

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodePageControl {
    pub default_character: String,
    pub default_flags: FlagSet<CharacterFlag>,
    pub layout: CodePageLayout,
    pub variable_space: [u8; 2],
    pub flags: FlagSet<ControlFlag>,
}

impl CodePageControl {
    pub fn read(data: ByteSpan<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        let reader = &mut data.reader();

        let control = Self {
            default_character: ctx
                .charset()
                .decode_fixed(reader.take(NAME_LEN)?.bytes(), SPACE),
            default_flags: FlagSet::decode(reader.get_u8()?)?,
            layout: CodePageLayout::from_group_len(reader.get_u8()?)?,
            variable_space: reader.get_array()?,
            flags: FlagSet::decode(reader.get_u8()?)?,
        };

        ctx.put(control.layout);

        Ok(control)
    }

    pub fn write(&self, dst: &mut Vec<u8>, ctx: &mut DecodeContext) -> Result<()> {
        dst.extend(
            ctx.charset()
                .encode_fixed(&self.default_character, NAME_LEN, SPACE),
        );
        dst.extend(crate::join_bytes_be!(
            self.default_flags,
            self.layout.group_len(),
            self.variable_space,
            self.flags
        ));

        ctx.put(self.layout);

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterEntry {
    pub character_id: String,
    pub flags: FlagSet<CharacterFlag>,
    pub code_point: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodePageIndex {
    pub entries: Vec<CharacterEntry>,
}

impl CodePageIndex {
    pub fn read(data: ByteSpan<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        let layout = *ctx.get::<CodePageLayout>()?;
        let charset = ctx.charset();

        let entries = SubRecords::new(
            data,
            FramingPolicy::Stride(layout.group_len() as usize),
            Stop::ByteCount,
            ctx.config.fail_level,
        )
        .map(|element| {
            let reader = &mut element?.data.reader();

            Ok(CharacterEntry {
                character_id: charset.decode_fixed(reader.take(NAME_LEN)?.bytes(), SPACE),
                flags: FlagSet::decode(reader.get_u8()?)?,
                code_point: match layout {
                    CodePageLayout::SingleByte => reader.get_u8()? as u16,
                    CodePageLayout::DoubleByte => reader.get_u16()?,
                },
            })
        })
        .collect::<Result<Vec<_>>>()?;

        debug!("Code page index: {} entries, {layout:?}", entries.len());

        Ok(Self { entries })
    }

    pub fn write(&self, dst: &mut Vec<u8>, ctx: &mut DecodeContext) -> Result<()> {
        let layout = *ctx.get::<CodePageLayout>()?;
        let charset = ctx.charset();
        let mut writer = ElementWriter::new(FramingPolicy::Stride(layout.group_len() as usize));

        for entry in &self.entries {
            let mut data = charset.encode_fixed(&entry.character_id, NAME_LEN, SPACE);
            entry.flags.write_be(&mut data);

            match layout {
                CodePageLayout::SingleByte => {
                    let code_point =
                        u8::try_from(entry.code_point).map_err(|_| CodecError::ValueTooLarge {
                            what: "Single-byte code point",
                            length: entry.code_point as usize,
                            max: u8::MAX as usize,
                        })?;
                    data.push(code_point);
                }
                CodePageLayout::DoubleByte => entry.code_point.write_be(&mut data),
            }

            writer.write(dst, 0, &data)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::context::DecoderConfig;

    const CONTROL: [u8; 13] = [
        0xC7, 0xF1, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, // G1000000
        0x00, 0x0A, 0x40, 0x00, 0x80,
    ];

    const INDEX: [u8; 20] = [
        0xD3, 0xC1, 0xF0, 0xF1, 0xF0, 0xF0, 0xF0, 0xF0, 0x00, 0xC1, // LA010000 -> A
        0xD3, 0xC2, 0xF0, 0xF1, 0xF0, 0xF0, 0xF0, 0xF0, 0x80, 0xC2, // LB010000 -> B
    ];

    #[test]
    fn index_needs_control() -> Result<()> {
        let ctx = &mut DecodeContext::default();

        let err = CodePageIndex::read(ByteSpan::whole(&INDEX), ctx).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CodecError>(),
            Some(&CodecError::MissingContext(ContextKind::CodePageLayout))
        );

        let control = CodePageControl::read(ByteSpan::whole(&CONTROL), ctx)?;
        assert_eq!(control.default_character, "G1000000");
        assert_eq!(control.layout, CodePageLayout::SingleByte);
        assert!(control.flags.contains(ControlFlag::SortedByCodePoint));

        let first = CodePageIndex::read(ByteSpan::whole(&INDEX), ctx)?;
        let again = CodePageIndex::read(ByteSpan::whole(&INDEX), ctx)?;
        assert_eq!(first, again);
        assert_eq!(first.entries.len(), 2);
        assert_eq!(first.entries[1].character_id, "LB010000");
        assert_eq!(first.entries[1].code_point, 0xC2);
        assert!(first.entries[1].flags.contains(CharacterFlag::Invalid));

        let mut out = Vec::new();
        first.write(&mut out, ctx)?;
        assert_eq!(out, INDEX);

        Ok(())
    }

    #[test]
    fn double_byte_index() -> Result<()> {
        let ctx = &mut DecodeContext::default();
        ctx.put(CodePageLayout::DoubleByte);

        let buf = [0xD3, 0xC1, 0xF0, 0xF1, 0xF0, 0xF0, 0xF0, 0xF0, 0x00, 0x42, 0xC1];
        let index = CodePageIndex::read(ByteSpan::whole(&buf), ctx)?;
        assert_eq!(index.entries[0].code_point, 0x42C1);

        ctx.put(CodePageLayout::SingleByte);
        let err = index.write(&mut Vec::new(), ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CodecError>(),
            Some(CodecError::ValueTooLarge { length: 0x42C1, .. })
        ));

        Ok(())
    }

    #[test]
    fn unsupported_group_length() {
        let mut control = CONTROL;
        control[9] = 0x0C;

        let ctx = &mut DecodeContext::default();
        let err = CodePageControl::read(ByteSpan::whole(&control), ctx).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CodecError>(),
            Some(&CodecError::UnsupportedGroupLength(12))
        );
        assert!(!ctx.contains(ContextKind::CodePageLayout));
    }

    #[test]
    fn partial_trailing_entry() -> Result<()> {
        let buf = &INDEX[..15];

        let ctx = &mut DecodeContext::default();
        ctx.put(CodePageLayout::SingleByte);
        assert_eq!(CodePageIndex::read(ByteSpan::whole(buf), ctx)?.entries.len(), 1);

        let ctx = &mut DecodeContext::new(DecoderConfig {
            fail_level: log::Level::Warn,
            ..Default::default()
        });
        ctx.put(CodePageLayout::SingleByte);
        let err = CodePageIndex::read(ByteSpan::whole(buf), ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CodecError>(),
            Some(CodecError::PartialElement { remaining: 5, .. })
        ));

        Ok(())
    }

    #[test]
    fn descriptor_encoding_scheme_threshold() -> Result<()> {
        let mut buf = vec![SPACE; 32];
        buf.extend([0x00, 0x08, 0x00, 0x00, 0x00, 0xFF, 0x03, 0xB9, 0x01, 0xF4]);

        let ctx = &mut DecodeContext::default();
        let cpd = CodePageDescriptor::read(ByteSpan::whole(&buf), ctx)?;
        assert_eq!(cpd.encoding_scheme, None);
        assert_eq!(cpd.code_points, 0xFF);

        buf.push(0x61);
        let err = CodePageDescriptor::read(ByteSpan::whole(&buf), ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CodecError>(),
            Some(CodecError::TruncatedRecord { offset: 42, .. })
        ));

        buf.push(0x00);
        let cpd = CodePageDescriptor::read(ByteSpan::whole(&buf), ctx)?;
        assert_eq!(cpd.encoding_scheme, Some(0x6100));

        let mut out = Vec::new();
        cpd.write(&mut out, ctx)?;
        assert_eq!(out, buf);

        Ok(())
    }
}
