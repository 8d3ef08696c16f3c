//! Begin and End structured fields.
//!
//! Every object in a document is bracketed by a Begin (`D3A8xx`) and an End
//! (`D3A9xx`) with the same category byte.

use anyhow::{Result, bail};

use crate::process::context::DecodeContext;
use crate::process::registry::Enclosing;
use crate::structs::field::TypeId;
use crate::structs::triplet::{Triplet, read_triplets, write_triplets};
use crate::utils::charset::SPACE;
use crate::utils::span::{ByteSpan, Threshold};

const NAME_LEN: usize = 8;

/// Leading bytes of an End name that matches any Begin name.
const ANY_NAME: [u8; 2] = [0xFF, 0xFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Document,
    Page,
    Resource,
    PresentationText,
    Image,
    CodePage,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 6] = [
        ObjectKind::Document,
        ObjectKind::Page,
        ObjectKind::Resource,
        ObjectKind::PresentationText,
        ObjectKind::Image,
        ObjectKind::CodePage,
    ];

    pub fn from_category(category: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.category() == category)
    }

    pub fn category(self) -> u8 {
        match self {
            ObjectKind::Document => 0xA8,
            ObjectKind::Page => 0xAF,
            ObjectKind::Resource => 0xCE,
            ObjectKind::PresentationText => 0x9B,
            ObjectKind::Image => 0xFB,
            ObjectKind::CodePage => 0x87,
        }
    }

    pub fn begin_id(self) -> TypeId {
        TypeId(0xD3A800 | self.category() as u32)
    }

    pub fn end_id(self) -> TypeId {
        TypeId(0xD3A900 | self.category() as u32)
    }

    /// Begin Document and Begin Resource carry 2 reserved bytes after the name.
    fn has_reserved(self) -> bool {
        matches!(self, ObjectKind::Document | ObjectKind::Resource)
    }

    fn of(type_id: TypeId) -> Result<Self> {
        match ObjectKind::from_category(type_id.category()) {
            Some(kind) => Ok(kind),
            None => bail!("{type_id} is not a Begin or End of a known object"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Begin {
    pub kind: ObjectKind,
    pub name: String,
    pub reserved: Option<u16>,
    pub triplets: Vec<Triplet>,
}

impl Begin {
    const RESERVED: Threshold = Threshold::Above(NAME_LEN);

    pub fn read(type_id: TypeId, data: ByteSpan<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        let kind = ObjectKind::of(type_id)?;
        data.require_at_least(NAME_LEN)?;

        let reader = &mut data.reader();
        let name = ctx
            .charset()
            .decode_fixed(reader.take(NAME_LEN)?.bytes(), SPACE);

        let reserved = if kind.has_reserved() {
            reader.optional(Self::RESERVED, 2, |r| r.get_u16())?
        } else {
            None
        };

        let triplets = read_triplets(reader.take_rest()?, Enclosing::Field(type_id), ctx)?;

        Ok(Self {
            kind,
            name,
            reserved,
            triplets,
        })
    }

    pub fn write(&self, dst: &mut Vec<u8>, ctx: &DecodeContext) -> Result<()> {
        dst.extend(ctx.charset().encode_fixed(&self.name, NAME_LEN, SPACE));

        if self.kind.has_reserved() && (self.reserved.is_some() || !self.triplets.is_empty()) {
            dst.extend(self.reserved.unwrap_or_default().to_be_bytes());
        }

        write_triplets(dst, &self.triplets, ctx)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndName {
    /// No name bytes at all.
    Omitted,
    /// `0xFFFF...`, closes whatever Begin is open.
    Any,
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct End {
    pub kind: ObjectKind,
    pub name: EndName,
    pub triplets: Vec<Triplet>,
}

impl End {
    const NAME: Threshold = Threshold::Above(0);

    pub fn read(type_id: TypeId, data: ByteSpan<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        let kind = ObjectKind::of(type_id)?;
        let reader = &mut data.reader();

        let name = match reader.optional(Self::NAME, NAME_LEN, |r| r.get_array::<NAME_LEN>())? {
            None => EndName::Omitted,
            Some(bytes) if bytes.starts_with(&ANY_NAME) => EndName::Any,
            Some(bytes) => EndName::Named(ctx.charset().decode_fixed(&bytes, SPACE)),
        };

        let triplets = read_triplets(reader.take_rest()?, Enclosing::Field(type_id), ctx)?;

        Ok(Self {
            kind,
            name,
            triplets,
        })
    }

    pub fn write(&self, dst: &mut Vec<u8>, ctx: &DecodeContext) -> Result<()> {
        match &self.name {
            EndName::Omitted if self.triplets.is_empty() => {}
            EndName::Omitted | EndName::Any => dst.extend([0xFF; NAME_LEN]),
            EndName::Named(name) => dst.extend(ctx.charset().encode_fixed(name, NAME_LEN, SPACE)),
        }

        write_triplets(dst, &self.triplets, ctx)
    }
}
