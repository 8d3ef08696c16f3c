//! Map Coded Font: self-describing repeating groups of triplets.

use anyhow::Result;

use crate::process::context::DecodeContext;
use crate::process::iterate::{ElementWriter, FramingPolicy, Stop, SubRecords};
use crate::process::registry::Enclosing;
use crate::structs::field::TypeId;
use crate::structs::triplet::{Triplet, read_triplets, write_triplets};
use crate::utils::span::ByteSpan;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapCodedFont {
    /// One triplet list per mapped font.
    pub groups: Vec<Vec<Triplet>>,
}

impl MapCodedFont {
    pub fn read(data: ByteSpan<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        let enclosing = Enclosing::Field(TypeId::MAP_CODED_FONT);
        let fail_level = ctx.config.fail_level;

        let walker =
            SubRecords::new(data, FramingPolicy::RepeatingGroup, Stop::ByteCount, fail_level);
        let groups = walker
            .map(|element| element.and_then(|element| read_triplets(element.data, enclosing, ctx)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { groups })
    }

    pub fn write(&self, dst: &mut Vec<u8>, ctx: &DecodeContext) -> Result<()> {
        let mut writer = ElementWriter::new(FramingPolicy::RepeatingGroup);

        for group in &self.groups {
            let mut data = Vec::new();
            write_triplets(&mut data, group, ctx)?;
            writer.write(dst, 0, &data)?;
        }

        Ok(())
    }
}
