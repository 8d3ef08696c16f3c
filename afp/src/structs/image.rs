//! Image self-defining fields carried by Image Picture Data.
//!
//! Segments use long framing except image data, which uses the extended
//! `0xFE92` code. Each Image Picture Data field is framed on its own.

use afp_macros::{ToBytes, fixed_layout};
use anyhow::Result;

use crate::process::context::DecodeContext;
use crate::process::iterate::{Element, ElementWriter, Framing, FramingPolicy, Stop, SubRecords};
use crate::process::registry::{Enclosing, Entry, Registry};
use crate::structs::field::TypeId;
use crate::utils::byteorder::{FixedLayout, WriteBytesBe};
use crate::utils::span::{ByteSpan, SpanReader, Threshold};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ToBytes)]
#[fixed_layout(0x94)]
pub struct ImageSize {
    pub unit_base: u8,
    pub h_resolution: u16,
    pub v_resolution: u16,
    pub h_size: u16,
    pub v_size: u16,
}

impl ImageSize {
    fn read(reader: &mut SpanReader) -> Result<Self> {
        Ok(Self {
            unit_base: reader.get_u8()?,
            h_resolution: reader.get_u16()?,
            v_resolution: reader.get_u16()?,
            h_size: reader.get_u16()?,
            v_size: reader.get_u16()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ToBytes)]
pub struct ImageEncoding {
    pub compression: u8,
    pub recording: u8,
    pub bit_order: Option<u8>,
}

impl ImageEncoding {
    const BIT_ORDER: Threshold = Threshold::Above(2);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSegment {
    BeginSegment { name: Option<[u8; 4]> },
    EndSegment,
    BeginImageContent { object_type: u8 },
    EndImageContent,
    ImageSize(ImageSize),
    ImageEncoding(ImageEncoding),
    IdeSize(u8),
    ImageData(Vec<u8>),
    Unknown { code: u16, data: Vec<u8> },
}

const SEGMENT_NAME: Threshold = Threshold::Above(0);

pub static IMAGE_SEGMENTS: Registry<ImageSegment> = Registry {
    family: "image segment",
    entries: &[
        Entry {
            code: 0x70,
            framing: Framing::Long,
            name: "Begin Segment",
            decode: ImageSegment::read_begin_segment,
        },
        Entry {
            code: 0x71,
            framing: Framing::Long,
            name: "End Segment",
            decode: ImageSegment::read_end_segment,
        },
        Entry {
            code: 0x91,
            framing: Framing::Long,
            name: "Begin Image Content",
            decode: ImageSegment::read_begin_image_content,
        },
        Entry {
            code: 0x93,
            framing: Framing::Long,
            name: "End Image Content",
            decode: ImageSegment::read_end_image_content,
        },
        Entry {
            code: 0x94,
            framing: Framing::Long,
            name: "Image Size",
            decode: ImageSegment::read_image_size,
        },
        Entry {
            code: 0x95,
            framing: Framing::Long,
            name: "Image Encoding",
            decode: ImageSegment::read_image_encoding,
        },
        Entry {
            code: 0x96,
            framing: Framing::Long,
            name: "IDE Size",
            decode: ImageSegment::read_ide_size,
        },
        Entry {
            code: 0xFE92,
            framing: Framing::Extended,
            name: "Image Data",
            decode: ImageSegment::read_image_data,
        },
    ],
    collisions: &[],
    unknown: ImageSegment::read_unknown,
};

impl ImageSegment {
    fn read_begin_segment(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        let name = element
            .data
            .reader()
            .optional(SEGMENT_NAME, 4, |r| r.get_array())?;

        Ok(Self::BeginSegment { name })
    }

    fn read_end_segment(_: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        Ok(Self::EndSegment)
    }

    fn read_begin_image_content(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        let object_type = element.data.reader().get_u8()?;
        Ok(Self::BeginImageContent { object_type })
    }

    fn read_end_image_content(_: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        Ok(Self::EndImageContent)
    }

    fn read_image_size(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        ImageSize::read(&mut element.data.reader()).map(Self::ImageSize)
    }

    fn read_image_encoding(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        let reader = &mut element.data.reader();

        Ok(Self::ImageEncoding(ImageEncoding {
            compression: reader.get_u8()?,
            recording: reader.get_u8()?,
            bit_order: reader.optional(ImageEncoding::BIT_ORDER, 1, |r| r.get_u8())?,
        }))
    }

    fn read_ide_size(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        let size = element.data.reader().get_u8()?;
        Ok(Self::IdeSize(size))
    }

    fn read_image_data(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        Ok(Self::ImageData(element.data.bytes().to_vec()))
    }

    fn read_unknown(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        Ok(Self::Unknown {
            code: element.header.code as u16,
            data: element.data.bytes().to_vec(),
        })
    }

    /// Type code, `0xFExx` for extended framing.
    pub fn code(&self) -> u16 {
        match self {
            Self::BeginSegment { .. } => 0x70,
            Self::EndSegment => 0x71,
            Self::BeginImageContent { .. } => 0x91,
            Self::EndImageContent => 0x93,
            Self::ImageSize(size) => size.type_code(),
            Self::ImageEncoding(_) => 0x95,
            Self::IdeSize(_) => 0x96,
            Self::ImageData(_) => 0xFE92,
            Self::Unknown { code, .. } => *code,
        }
    }

    pub fn name(&self) -> &'static str {
        let framing = if self.code() > 0xFF {
            Framing::Extended
        } else {
            Framing::Long
        };

        IMAGE_SEGMENTS
            .name(self.code() as u32, framing, Enclosing::Unspecified)
            .unwrap_or("Unknown")
    }

    pub fn data(&self) -> Vec<u8> {
        let mut dst = Vec::new();

        match self {
            Self::BeginSegment { name } => name.write_be(&mut dst),
            Self::EndSegment | Self::EndImageContent => {}
            Self::BeginImageContent { object_type } => dst.push(*object_type),
            Self::ImageSize(size) => return size.payload(),
            Self::ImageEncoding(encoding) => encoding.write_be(&mut dst),
            Self::IdeSize(size) => dst.push(*size),
            Self::ImageData(data) | Self::Unknown { data, .. } => dst.extend_from_slice(data),
        }

        dst
    }
}

pub fn read_segments(data: ByteSpan<'_>, ctx: &mut DecodeContext) -> Result<Vec<ImageSegment>> {
    let enclosing = Enclosing::Field(TypeId::IMAGE_PICTURE_DATA);

    SubRecords::new(data, FramingPolicy::SelfDefining, Stop::ByteCount, ctx.config.fail_level)
        .map(|element| element.and_then(|element| IMAGE_SEGMENTS.decode(&element, enclosing, ctx)))
        .collect()
}

pub fn write_segments(dst: &mut Vec<u8>, segments: &[ImageSegment]) -> Result<()> {
    let mut writer = ElementWriter::new(FramingPolicy::SelfDefining);

    for segment in segments {
        writer.write(dst, segment.code() as u32, &segment.data())?;
    }

    Ok(())
}
