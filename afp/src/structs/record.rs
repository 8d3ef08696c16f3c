//! The closed set of structured field bodies and their dispatch table.

use anyhow::Result;

use crate::process::context::DecodeContext;
use crate::process::iterate::{Element, Framing};
use crate::process::registry::{Enclosing, Entry, Registry};
use crate::structs::begin_end::{Begin, End};
use crate::structs::code_page::{CodePageControl, CodePageDescriptor, CodePageIndex};
use crate::structs::field::TypeId;
use crate::structs::font_map::MapCodedFont;
use crate::structs::image::{ImageSegment, read_segments, write_segments};
use crate::structs::text::PresentationText;
use crate::structs::triplet::{Triplet, read_triplets, write_triplets};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Begin(Begin),
    End(End),
    NoOperation(Vec<u8>),
    TagLogicalElement(Vec<Triplet>),
    PresentationText(PresentationText),
    ImagePictureData(Vec<ImageSegment>),
    CodePageDescriptor(CodePageDescriptor),
    CodePageControl(CodePageControl),
    CodePageIndex(CodePageIndex),
    MapCodedFont(MapCodedFont),
    Unknown { type_id: TypeId, data: Vec<u8> },
}

macro_rules! entry {
    ($id:expr, $name:expr, $decode:expr) => {
        Entry {
            code: $id.0,
            framing: Framing::Long,
            name: $name,
            decode: $decode,
        }
    };
}

pub static RECORDS: Registry<Record> = Registry {
    family: "structured field",
    entries: &[
        entry!(TypeId::BEGIN_DOCUMENT, "Begin Document", Record::read_begin),
        entry!(TypeId::END_DOCUMENT, "End Document", Record::read_end),
        entry!(TypeId::BEGIN_PAGE, "Begin Page", Record::read_begin),
        entry!(TypeId::END_PAGE, "End Page", Record::read_end),
        entry!(TypeId::BEGIN_RESOURCE, "Begin Resource", Record::read_begin),
        entry!(TypeId::END_RESOURCE, "End Resource", Record::read_end),
        entry!(
            TypeId::BEGIN_PRESENTATION_TEXT,
            "Begin Presentation Text Object",
            Record::read_begin
        ),
        entry!(TypeId::END_PRESENTATION_TEXT, "End Presentation Text Object", Record::read_end),
        entry!(TypeId::BEGIN_IMAGE, "Begin Image Object", Record::read_begin),
        entry!(TypeId::END_IMAGE, "End Image Object", Record::read_end),
        entry!(TypeId::BEGIN_CODE_PAGE, "Begin Code Page", Record::read_begin),
        entry!(TypeId::END_CODE_PAGE, "End Code Page", Record::read_end),
        entry!(TypeId::NO_OPERATION, "No Operation", Record::read_no_operation),
        entry!(
            TypeId::TAG_LOGICAL_ELEMENT,
            "Tag Logical Element",
            Record::read_tag_logical_element
        ),
        entry!(TypeId::PRESENTATION_TEXT, "Presentation Text Data", Record::read_presentation_text),
        entry!(TypeId::IMAGE_PICTURE_DATA, "Image Picture Data", Record::read_image_picture_data),
        entry!(
            TypeId::CODE_PAGE_DESCRIPTOR,
            "Code Page Descriptor",
            Record::read_code_page_descriptor
        ),
        entry!(TypeId::CODE_PAGE_CONTROL, "Code Page Control", Record::read_code_page_control),
        entry!(TypeId::CODE_PAGE_INDEX, "Code Page Index", Record::read_code_page_index),
        entry!(TypeId::MAP_CODED_FONT, "Map Coded Font", Record::read_map_coded_font),
    ],
    collisions: &[],
    unknown: Record::read_unknown,
};

fn type_id(element: &Element<'_>) -> TypeId {
    TypeId(element.header.code)
}

impl Record {
    fn read_begin(element: &Element<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        Begin::read(type_id(element), element.data, ctx).map(Self::Begin)
    }

    fn read_end(element: &Element<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        End::read(type_id(element), element.data, ctx).map(Self::End)
    }

    fn read_no_operation(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        Ok(Self::NoOperation(element.data.bytes().to_vec()))
    }

    fn read_tag_logical_element(element: &Element<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        read_triplets(element.data, Enclosing::Field(type_id(element)), ctx)
            .map(Self::TagLogicalElement)
    }

    fn read_presentation_text(element: &Element<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        PresentationText::read(element.data, ctx).map(Self::PresentationText)
    }

    fn read_image_picture_data(element: &Element<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        read_segments(element.data, ctx).map(Self::ImagePictureData)
    }

    fn read_code_page_descriptor(element: &Element<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        CodePageDescriptor::read(element.data, ctx).map(Self::CodePageDescriptor)
    }

    fn read_code_page_control(element: &Element<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        CodePageControl::read(element.data, ctx).map(Self::CodePageControl)
    }

    fn read_code_page_index(element: &Element<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        CodePageIndex::read(element.data, ctx).map(Self::CodePageIndex)
    }

    fn read_map_coded_font(element: &Element<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        MapCodedFont::read(element.data, ctx).map(Self::MapCodedFont)
    }

    fn read_unknown(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        Ok(Self::Unknown {
            type_id: type_id(element),
            data: element.data.bytes().to_vec(),
        })
    }

    pub fn type_id(&self) -> TypeId {
        match self {
            Record::Begin(begin) => begin.kind.begin_id(),
            Record::End(end) => end.kind.end_id(),
            Record::NoOperation(_) => TypeId::NO_OPERATION,
            Record::TagLogicalElement(_) => TypeId::TAG_LOGICAL_ELEMENT,
            Record::PresentationText(_) => TypeId::PRESENTATION_TEXT,
            Record::ImagePictureData(_) => TypeId::IMAGE_PICTURE_DATA,
            Record::CodePageDescriptor(_) => TypeId::CODE_PAGE_DESCRIPTOR,
            Record::CodePageControl(_) => TypeId::CODE_PAGE_CONTROL,
            Record::CodePageIndex(_) => TypeId::CODE_PAGE_INDEX,
            Record::MapCodedFont(_) => TypeId::MAP_CODED_FONT,
            Record::Unknown { type_id, .. } => *type_id,
        }
    }

    pub fn name(&self) -> &'static str {
        RECORDS
            .name(self.type_id().0, Framing::Long, Enclosing::Unspecified)
            .unwrap_or("Unknown")
    }

    /// Triplets directly attached to the record, grouped ones included.
    pub fn triplets(&self) -> Vec<&Triplet> {
        match self {
            Record::Begin(begin) => begin.triplets.iter().collect(),
            Record::End(end) => end.triplets.iter().collect(),
            Record::TagLogicalElement(triplets) => triplets.iter().collect(),
            Record::MapCodedFont(mcf) => mcf.groups.iter().flatten().collect(),
            _ => Vec::new(),
        }
    }

    /// Number of nested sub-records other than triplets.
    pub fn element_count(&self) -> usize {
        match self {
            Record::PresentationText(ptx) => ptx.sequences().count(),
            Record::ImagePictureData(segments) => segments.len(),
            Record::CodePageIndex(cpi) => cpi.entries.len(),
            Record::MapCodedFont(mcf) => mcf.groups.len(),
            _ => 0,
        }
    }

    pub fn write_body(&self, ctx: &mut DecodeContext) -> Result<Vec<u8>> {
        let mut dst = Vec::new();

        match self {
            Record::Begin(begin) => begin.write(&mut dst, ctx)?,
            Record::End(end) => end.write(&mut dst, ctx)?,
            Record::NoOperation(data) | Record::Unknown { data, .. } => dst.extend_from_slice(data),
            Record::TagLogicalElement(triplets) => write_triplets(&mut dst, triplets, ctx)?,
            Record::PresentationText(ptx) => ptx.write(&mut dst)?,
            Record::ImagePictureData(segments) => write_segments(&mut dst, segments)?,
            Record::CodePageDescriptor(cpd) => cpd.write(&mut dst, ctx)?,
            Record::CodePageControl(cpc) => cpc.write(&mut dst, ctx)?,
            Record::CodePageIndex(cpi) => cpi.write(&mut dst, ctx)?,
            Record::MapCodedFont(mcf) => mcf.write(&mut dst, ctx)?,
        }

        Ok(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::field::StructuredField;

    #[test]
    fn unknown_field_is_preserved() -> Result<()> {
        let buf = [0x5A, 0x00, 0x0B, 0xD3, 0xB2, 0x88, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03];

        let ctx = &mut DecodeContext::default();
        let (field, end) = StructuredField::read(&buf, 0, ctx)?;

        assert_eq!(end, buf.len());
        assert_eq!(
            field.record,
            Record::Unknown {
                type_id: TypeId(0xD3B288),
                data: vec![1, 2, 3]
            }
        );
        assert_eq!(field.record.name(), "Unknown");

        let mut out = Vec::new();
        field.write(&mut out, ctx)?;
        assert_eq!(out, buf);

        Ok(())
    }

    #[test]
    fn begin_of_unknown_category_is_unknown() -> Result<()> {
        let buf = [0x5A, 0x00, 0x08, 0xD3, 0xA8, 0x5F, 0x00, 0x00, 0x00];

        let ctx = &mut DecodeContext::default();
        let (field, _) = StructuredField::read(&buf, 0, ctx)?;
        assert!(matches!(field.record, Record::Unknown { .. }));

        Ok(())
    }

    #[test]
    fn names_and_counts() {
        let record = Record::TagLogicalElement(vec![Triplet::Comment("x".into())]);
        assert_eq!(record.name(), "Tag Logical Element");
        assert_eq!(record.triplets().len(), 1);
        assert_eq!(record.element_count(), 0);
        assert_eq!(Record::NoOperation(vec![]).type_id(), TypeId::NO_OPERATION);
    }
}
