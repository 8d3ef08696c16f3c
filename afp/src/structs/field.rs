//! Structured field envelope.
//!
//! ```text
//! [0x5A]? [length:2] [type:3] [flags:1] [reserved:2] [extension]? [data] [padding]?
//! ```
//!
//! `length` counts from its own first byte to the end of the field. The
//! extension and padding are framed here so that record bodies only ever see
//! `data`.

use std::fmt::{Display, Formatter};

use anyhow::{Result, bail, ensure};
use log::{trace, warn};

use crate::define_flags;
use crate::process::context::DecodeContext;
use crate::process::iterate::{Element, Framing, SubRecordHeader};
use crate::process::registry::Enclosing;
use crate::structs::record::{RECORDS, Record};
use crate::utils::errors::CodecError;
use crate::utils::flags::FlagSet;
use crate::utils::span::{ByteSpan, DeclaredLength};

/// Optional carriage-control byte in front of each field.
pub const CARRIAGE_CONTROL: u8 = 0x5A;

/// Length, type, flags and reserved bytes.
pub const HEADER_LEN: usize = 8;

/// 3-byte structured field identifier: class, type and category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const BEGIN_DOCUMENT: Self = Self(0xD3A8A8);
    pub const END_DOCUMENT: Self = Self(0xD3A9A8);
    pub const BEGIN_PAGE: Self = Self(0xD3A8AF);
    pub const END_PAGE: Self = Self(0xD3A9AF);
    pub const BEGIN_RESOURCE: Self = Self(0xD3A8CE);
    pub const END_RESOURCE: Self = Self(0xD3A9CE);
    pub const BEGIN_PRESENTATION_TEXT: Self = Self(0xD3A89B);
    pub const END_PRESENTATION_TEXT: Self = Self(0xD3A99B);
    pub const BEGIN_IMAGE: Self = Self(0xD3A8FB);
    pub const END_IMAGE: Self = Self(0xD3A9FB);
    pub const BEGIN_CODE_PAGE: Self = Self(0xD3A887);
    pub const END_CODE_PAGE: Self = Self(0xD3A987);

    pub const NO_OPERATION: Self = Self(0xD3EEEE);
    pub const TAG_LOGICAL_ELEMENT: Self = Self(0xD3A090);
    pub const PRESENTATION_TEXT: Self = Self(0xD3EE9B);
    pub const IMAGE_PICTURE_DATA: Self = Self(0xD3EEFB);
    pub const CODE_PAGE_DESCRIPTOR: Self = Self(0xD3A687);
    pub const CODE_PAGE_CONTROL: Self = Self(0xD3A787);
    pub const CODE_PAGE_INDEX: Self = Self(0xD38C87);
    pub const MAP_CODED_FONT: Self = Self(0xD3AB8A);

    pub fn class(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn type_code(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn category(self) -> u8 {
        self.0 as u8
    }
}

impl Display for TypeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06X}", self.0)
    }
}

define_flags! {
    pub enum FieldFlag {
        Extension = (0x80, 0x80),
        Segmented = (0x20, 0x20),
        Padding = (0x08, 0x08),
    }
}

/// Trailing padding, stored by size and form. Fill bytes are not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padding {
    /// Total padding bytes, including the length byte(s).
    pub len: usize,
    /// Length held in a 16-bit value before a zero final byte.
    pub long_form: bool,
}

impl Padding {
    fn read(body: ByteSpan<'_>) -> Result<Self> {
        let bytes = body.bytes();
        let invalid = |padding| CodecError::InvalidPadding {
            offset: body.offset(),
            padding,
            available: bytes.len(),
        };

        let padding = match bytes {
            [] => bail!(invalid(1)),
            [.., 0] if bytes.len() < 3 => bail!(invalid(3)),
            [.., hi, lo, 0] => Self {
                len: u16::from_be_bytes([*hi, *lo]) as usize,
                long_form: true,
            },
            [.., len] => Self {
                len: *len as usize,
                long_form: false,
            },
        };

        let header = if padding.long_form { 3 } else { 1 };
        if padding.len < header || padding.len > bytes.len() {
            bail!(invalid(padding.len));
        }

        let fill = &bytes[bytes.len() - padding.len..bytes.len() - header];
        if fill.iter().any(|&b| b != 0) {
            warn!(
                "Padding at offset {:#X} has non-zero fill, it is re-emitted as zeros",
                body.offset() + bytes.len() - padding.len
            );
        }

        Ok(padding)
    }

    fn write(&self, dst: &mut Vec<u8>) -> Result<()> {
        if self.long_form {
            ensure!(self.len >= 3, "Long-form padding of {} bytes", self.len);
            let len = u16::try_from(self.len).map_err(|_| CodecError::ValueTooLarge {
                what: "Padding length",
                length: self.len,
                max: u16::MAX as usize,
            })?;

            dst.resize(dst.len() + self.len - 3, 0);
            dst.extend(len.to_be_bytes());
            dst.push(0);
        } else {
            ensure!(self.len >= 1, "Padding of zero bytes");
            let len = u8::try_from(self.len).map_err(|_| CodecError::ValueTooLarge {
                what: "Padding length",
                length: self.len,
                max: u8::MAX as usize,
            })?;

            dst.resize(dst.len() + self.len - 1, 0);
            dst.push(len);
        }

        Ok(())
    }
}

/// A framed structured field before its body is decoded.
#[derive(Debug, Clone)]
pub struct RawField<'a> {
    /// Absolute offset of the first byte, `0x5A` included.
    pub offset: usize,
    pub introducer: bool,
    pub type_id: TypeId,
    pub flags: FlagSet<FieldFlag>,
    pub reserved: u16,
    pub extension: Option<Vec<u8>>,
    pub padding: Option<Padding>,
    pub header_len: usize,
    pub data: ByteSpan<'a>,
    /// Absolute offset one past the last byte.
    pub end: usize,
}

impl<'a> RawField<'a> {
    pub fn read(buf: &'a [u8], offset: usize) -> Result<Self> {
        let lead = ByteSpan::resolve(buf, offset, DeclaredLength::Bounded(1))?;
        let introducer = lead.bytes()[0] == CARRIAGE_CONTROL;
        let start = offset + introducer as usize;

        let length = ByteSpan::resolve(buf, start, DeclaredLength::Unbounded)?
            .reader()
            .get_u16()? as usize;

        if length < HEADER_LEN {
            bail!(CodecError::InvalidFieldLength {
                offset: start,
                length,
            });
        }

        let field = ByteSpan::resolve(buf, start, DeclaredLength::Bounded(length))?;
        let mut reader = field.reader();

        reader.skip_n(2)?;
        let type_id = TypeId(reader.get_u24()?);
        let flags = FlagSet::<FieldFlag>::decode(reader.get_u8()?)?;
        let reserved = reader.get_u16()?;

        let extension = if flags.contains(FieldFlag::Extension) {
            let ext_len = reader.get_u8()? as usize;
            ensure!(
                ext_len >= 1,
                "Extension length of zero at offset {:#X}",
                start + HEADER_LEN
            );

            Some(reader.get_bytes(ext_len - 1)?)
        } else {
            None
        };

        let header_len = reader.position()?;
        let body = reader.take_rest()?;

        let (padding, data) = if flags.contains(FieldFlag::Padding) {
            let padding = Padding::read(body)?;
            let data = body.slice(0, DeclaredLength::Bounded(body.len() - padding.len))?;
            (Some(padding), data)
        } else {
            (None, body)
        };

        Ok(Self {
            offset,
            introducer,
            type_id,
            flags,
            reserved,
            extension,
            padding,
            header_len,
            data,
            end: field.end(),
        })
    }

    /// The body as a sub-record for registry dispatch.
    pub fn element(&self) -> Element<'a> {
        Element {
            header: SubRecordHeader {
                code: self.type_id.0,
                framing: Framing::Long,
                header_len: self.header_len,
                data_len: self.data.len(),
                chained: false,
            },
            offset: self.offset,
            data: self.data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredField {
    pub introducer: bool,
    /// Only [`FieldFlag::Segmented`] is kept as decoded, the rest follow
    /// from `extension` and `padding` on encode.
    pub flags: FlagSet<FieldFlag>,
    pub reserved: u16,
    pub extension: Option<Vec<u8>>,
    pub padding: Option<Padding>,
    pub record: Record,
}

impl StructuredField {
    pub fn new(record: Record) -> Self {
        Self {
            introducer: true,
            flags: FlagSet::empty(),
            reserved: 0,
            extension: None,
            padding: None,
            record,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.record.type_id()
    }

    /// Decodes the field at `offset`, returning it with the offset of the
    /// next field.
    pub fn read(buf: &[u8], offset: usize, ctx: &mut DecodeContext) -> Result<(Self, usize)> {
        let raw = RawField::read(buf, offset)?;

        trace!(
            "Field {} at {offset:#X}: {} data bytes, flags {:?}",
            raw.type_id,
            raw.data.len(),
            raw.flags
        );

        let record = RECORDS.decode(&raw.element(), Enclosing::Unspecified, ctx)?;

        let field = Self {
            introducer: raw.introducer,
            flags: raw.flags,
            reserved: raw.reserved,
            extension: raw.extension,
            padding: raw.padding,
            record,
        };

        Ok((field, raw.end))
    }

    pub fn write(&self, dst: &mut Vec<u8>, ctx: &mut DecodeContext) -> Result<()> {
        let body = self.record.write_body(ctx)?;

        let mut flags = self.flags;
        flags.toggle(FieldFlag::Extension, self.extension.is_some());
        flags.toggle(FieldFlag::Padding, self.padding.is_some());

        let extension_len = self.extension.as_ref().map_or(0, |ext| ext.len() + 1);
        let padding_len = self.padding.map_or(0, |padding| padding.len);
        let length = HEADER_LEN + extension_len + body.len() + padding_len;

        let length = u16::try_from(length).map_err(|_| CodecError::ValueTooLarge {
            what: "Structured field length",
            length,
            max: u16::MAX as usize,
        })?;

        if self.introducer {
            dst.push(CARRIAGE_CONTROL);
        }

        dst.extend(length.to_be_bytes());
        crate::utils::byteorder::write_u24(dst, self.type_id().0);
        dst.push(flags.encode());
        dst.extend(self.reserved.to_be_bytes());

        if let Some(extension) = &self.extension {
            let ext_len = u8::try_from(extension_len).map_err(|_| CodecError::ValueTooLarge {
                what: "Extension length",
                length: extension_len,
                max: u8::MAX as usize,
            })?;

            dst.push(ext_len);
            dst.extend_from_slice(extension);
        }

        dst.extend_from_slice(&body);

        if let Some(padding) = &self.padding {
            padding.write(dst)?;
        }

        Ok(())
    }
}

/// A fully decoded document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub fields: Vec<StructuredField>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_with_extension_and_padding() -> Result<()> {
        let buf = [
            0x5A, 0x00, 0x10, 0xD3, 0xEE, 0xEE, 0x88, 0x00, 0x00, // header, ext + padding
            0x03, 0xAA, 0xBB, // extension
            0x01, 0x02, // data
            0x00, 0x00, 0x03, // short padding
        ];

        let raw = RawField::read(&buf, 0)?;
        assert!(raw.introducer);
        assert_eq!(raw.type_id, TypeId::NO_OPERATION);
        assert_eq!(raw.extension.as_deref(), Some(&[0xAA, 0xBB][..]));
        assert_eq!(
            raw.padding,
            Some(Padding {
                len: 3,
                long_form: false
            })
        );
        assert_eq!(raw.data.bytes(), [0x01, 0x02]);
        assert_eq!((raw.data.offset(), raw.end), (12, 17));

        let ctx = &mut DecodeContext::default();
        let (field, end) = StructuredField::read(&buf, 0, ctx)?;
        assert_eq!(end, buf.len());
        assert_eq!(field.record, Record::NoOperation(vec![0x01, 0x02]));

        let mut out = Vec::new();
        field.write(&mut out, ctx)?;
        assert_eq!(out, buf);

        Ok(())
    }

    #[test]
    fn long_form_padding() -> Result<()> {
        let buf = [
            0x00, 0x0D, 0xD3, 0xEE, 0xEE, 0x08, 0x00, 0x00, // no introducer
            0xC1, // data
            0x00, 0x00, 0x04, 0x00, // padding of 4, long form
        ];

        let ctx = &mut DecodeContext::default();
        let (field, _) = StructuredField::read(&buf, 0, ctx)?;
        assert!(!field.introducer);
        assert_eq!(
            field.padding,
            Some(Padding {
                len: 4,
                long_form: true
            })
        );
        assert_eq!(field.record, Record::NoOperation(vec![0xC1]));

        let mut out = Vec::new();
        field.write(&mut out, ctx)?;
        assert_eq!(out, buf);

        Ok(())
    }

    #[test]
    fn padding_longer_than_body() {
        let buf = [0x00, 0x0A, 0xD3, 0xEE, 0xEE, 0x08, 0x00, 0x00, 0x00, 0x05];
        let err = RawField::read(&buf, 0).unwrap_err();

        assert_eq!(
            err.downcast_ref::<CodecError>(),
            Some(&CodecError::InvalidPadding {
                offset: 8,
                padding: 5,
                available: 2
            })
        );
    }

    #[test]
    fn length_below_header() {
        let buf = [0x5A, 0x00, 0x07, 0xD3, 0xEE, 0xEE, 0x00, 0x00, 0x00];
        let err = RawField::read(&buf, 0).unwrap_err();

        assert_eq!(
            err.downcast_ref::<CodecError>(),
            Some(&CodecError::InvalidFieldLength {
                offset: 1,
                length: 7
            })
        );
    }

    #[test]
    fn length_past_buffer() {
        let buf = [0x5A, 0x00, 0x0A, 0xD3, 0xEE, 0xEE, 0x00, 0x00, 0x00];
        let err = RawField::read(&buf, 0).unwrap_err();

        assert_eq!(
            err.downcast_ref::<CodecError>(),
            Some(&CodecError::TruncatedRecord {
                offset: 1,
                required: 10,
                available: 8
            })
        );
    }

    #[test]
    fn type_id_parts() {
        let id = TypeId::CODE_PAGE_INDEX;
        assert_eq!((id.class(), id.type_code(), id.category()), (0xD3, 0x8C, 0x87));
        assert_eq!(id.to_string(), "D38C87");
    }
}
