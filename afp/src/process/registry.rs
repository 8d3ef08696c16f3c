//! Type code to variant dispatch.
//!
//! Each sub-record family owns one static [`Registry`]. Codes without an
//! entry fall back to the family's `unknown` constructor, which keeps the
//! payload verbatim. Codes whose meaning depends on the enclosing record are
//! listed in the collision table instead of the entry table.

use anyhow::Result;
use log::debug;

use crate::process::context::DecodeContext;
use crate::process::iterate::{Element, Framing};
use crate::structs::field::TypeId;

pub type Constructor<T> = fn(&Element<'_>, &mut DecodeContext) -> Result<T>;

/// The record a sub-record is nested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enclosing {
    Field(TypeId),
    /// Inside the payload of the triplet with this code.
    Triplet(u8),
    Unspecified,
}

pub struct Entry<T: 'static> {
    pub code: u32,
    pub framing: Framing,
    pub name: &'static str,
    pub decode: Constructor<T>,
}

pub struct Collision<T: 'static> {
    pub enclosing: Enclosing,
    pub code: u32,
    pub name: &'static str,
    pub decode: Constructor<T>,
}

pub struct Registry<T: 'static> {
    pub family: &'static str,
    pub entries: &'static [Entry<T>],
    pub collisions: &'static [Collision<T>],
    pub unknown: Constructor<T>,
}

impl<T> Registry<T> {
    fn lookup(
        &self,
        code: u32,
        framing: Framing,
        enclosing: Enclosing,
    ) -> Option<(&'static str, Constructor<T>)> {
        if self.collisions.iter().any(|row| row.code == code) {
            return self
                .collisions
                .iter()
                .find(|row| row.code == code && row.enclosing == enclosing)
                .map(|row| (row.name, row.decode));
        }

        self.entries
            .iter()
            .find(|entry| entry.code == code && entry.framing == framing)
            .map(|entry| (entry.name, entry.decode))
    }

    /// Constructor for `code`, or the unknown constructor.
    pub fn resolve(&self, code: u32, framing: Framing, enclosing: Enclosing) -> Constructor<T> {
        match self.lookup(code, framing, enclosing) {
            Some((_, decode)) => decode,
            None => {
                debug!(
                    "{}: no variant for {code:#X} ({framing:?}) in {enclosing:?}, kept raw",
                    self.family
                );
                self.unknown
            }
        }
    }

    pub fn name(&self, code: u32, framing: Framing, enclosing: Enclosing) -> Option<&'static str> {
        self.lookup(code, framing, enclosing).map(|(name, _)| name)
    }

    pub fn decode(
        &self,
        element: &Element<'_>,
        enclosing: Enclosing,
        ctx: &mut DecodeContext,
    ) -> Result<T> {
        let decode = self.resolve(element.header.code, element.header.framing, enclosing);
        decode(element, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::iterate::SubRecordHeader;
    use crate::utils::span::ByteSpan;

    #[derive(Debug, PartialEq, Eq)]
    enum Variant {
        Known(u8),
        Active,
        Retired,
        Unknown(u32),
    }

    fn known(element: &Element<'_>, _: &mut DecodeContext) -> Result<Variant> {
        Ok(Variant::Known(element.data.bytes()[0]))
    }

    fn active(_: &Element<'_>, _: &mut DecodeContext) -> Result<Variant> {
        Ok(Variant::Active)
    }

    fn retired(_: &Element<'_>, _: &mut DecodeContext) -> Result<Variant> {
        Ok(Variant::Retired)
    }

    fn unknown(element: &Element<'_>, _: &mut DecodeContext) -> Result<Variant> {
        Ok(Variant::Unknown(element.header.code))
    }

    static VARIANTS: Registry<Variant> = Registry {
        family: "variant",
        entries: &[
            Entry {
                code: 0x01,
                framing: Framing::Long,
                name: "Known",
                decode: known,
            },
            Entry {
                code: 0x21,
                framing: Framing::Long,
                name: "Shadowed",
                decode: known,
            },
        ],
        collisions: &[
            Collision {
                enclosing: Enclosing::Field(TypeId::BEGIN_DOCUMENT),
                code: 0x21,
                name: "Active",
                decode: active,
            },
            Collision {
                enclosing: Enclosing::Field(TypeId::BEGIN_RESOURCE),
                code: 0x21,
                name: "Retired",
                decode: retired,
            },
        ],
        unknown,
    };

    fn element(buf: &[u8], code: u32, framing: Framing) -> Element<'_> {
        Element {
            header: SubRecordHeader {
                code,
                framing,
                header_len: 0,
                data_len: buf.len(),
                chained: false,
            },
            offset: 0,
            data: ByteSpan::whole(buf),
        }
    }

    #[test]
    fn dispatch_and_fallback() -> Result<()> {
        let ctx = &mut DecodeContext::default();
        let buf = [0x7F];

        let long = element(&buf, 0x01, Framing::Long);
        let decoded = VARIANTS.decode(&long, Enclosing::Unspecified, ctx)?;
        assert_eq!(decoded, Variant::Known(0x7F));

        // same code, other framing
        let extended = element(&buf, 0x01, Framing::Extended);
        let decoded = VARIANTS.decode(&extended, Enclosing::Unspecified, ctx)?;
        assert_eq!(decoded, Variant::Unknown(0x01));

        assert_eq!(VARIANTS.name(0x01, Framing::Long, Enclosing::Unspecified), Some("Known"));
        assert_eq!(VARIANTS.name(0x99, Framing::Long, Enclosing::Unspecified), None);

        Ok(())
    }

    #[test]
    fn collision_follows_enclosing_record() -> Result<()> {
        let ctx = &mut DecodeContext::default();
        let buf = [0x00];
        let e = element(&buf, 0x21, Framing::Long);

        let cases = [
            (Enclosing::Field(TypeId::BEGIN_DOCUMENT), Variant::Active),
            (Enclosing::Field(TypeId::BEGIN_RESOURCE), Variant::Retired),
            (Enclosing::Field(TypeId::TAG_LOGICAL_ELEMENT), Variant::Unknown(0x21)),
            (Enclosing::Triplet(0x80), Variant::Unknown(0x21)),
            (Enclosing::Unspecified, Variant::Unknown(0x21)),
        ];

        for (enclosing, expected) in cases {
            assert_eq!(VARIANTS.decode(&e, enclosing, ctx)?, expected);
        }

        Ok(())
    }
}
