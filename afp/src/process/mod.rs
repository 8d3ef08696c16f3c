/// Per-document sibling state and decoder options.
///
/// Provides the [`DecodeContext`](context::DecodeContext) that carries values
/// such as the Code Page Index layout from one structured field to the next.
pub mod context;

/// Walking nested, self-describing sub-records.
///
/// Provides [`SubRecords`](iterate::SubRecords) for decoding and
/// [`ElementWriter`](iterate::ElementWriter) for encoding every nested family
/// through one [`FramingPolicy`](iterate::FramingPolicy).
pub mod iterate;

/// Code to variant dispatch tables.
pub mod registry;

/// Whole-document decoding.
///
/// Provides the [`Reader`](read::Reader) for converting a byte buffer into a
/// [`Document`](crate::structs::field::Document).
pub mod read;

/// Whole-document encoding.
///
/// Provides the [`Writer`](write::Writer), the inverse of [`read`].
pub mod write;

/// A small document with one code page and one page holding text and an
/// image. Every field is in canonical form, so it survives a decode and
/// encode unchanged.
pub const EXAMPLE_DATA: &[u8] = &[
    0x5A, 0x00, 0x25, 0xD3, 0xA8, 0xA8, 0x00, 0x00, 0x00, 0xC4, 0xD6, 0xC3, 0xF0, 0xF0, 0xF0, 0xF0,
    0xF1, 0x00, 0x00, 0x06, 0x21, 0x0E, 0x00, 0x40, 0x00, 0x0D, 0x65, 0x81, 0x86, 0x97, 0x84, 0x40,
    0xA2, 0x81, 0x94, 0x97, 0x93, 0x85, 0x5A, 0x00, 0x10, 0xD3, 0xA8, 0x87, 0x00, 0x00, 0x00, 0xE3,
    0xF1, 0xF0, 0xF0, 0xF0, 0xF5, 0xF0, 0xF0, 0x5A, 0x00, 0x34, 0xD3, 0xA6, 0x87, 0x00, 0x00, 0x00,
    0xC5, 0xE7, 0xC1, 0xD4, 0xD7, 0xD3, 0xC5, 0x40, 0xC3, 0xD6, 0xC4, 0xC5, 0x40, 0xD7, 0xC1, 0xC7,
    0xC5, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40,
    0x00, 0x08, 0x00, 0x00, 0x00, 0x02, 0x03, 0xB9, 0x01, 0xF4, 0x61, 0x00, 0x5A, 0x00, 0x15, 0xD3,
    0xA7, 0x87, 0x00, 0x00, 0x00, 0xC7, 0xF1, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0x00, 0x0A, 0x40,
    0x00, 0x80, 0x5A, 0x00, 0x1C, 0xD3, 0x8C, 0x87, 0x00, 0x00, 0x00, 0xD3, 0xC1, 0xF0, 0xF1, 0xF0,
    0xF0, 0xF0, 0xF0, 0x00, 0xC1, 0xD3, 0xC2, 0xF0, 0xF1, 0xF0, 0xF0, 0xF0, 0xF0, 0x80, 0xC2, 0x5A,
    0x00, 0x10, 0xD3, 0xA9, 0x87, 0x00, 0x00, 0x00, 0xE3, 0xF1, 0xF0, 0xF0, 0xF0, 0xF5, 0xF0, 0xF0,
    0x5A, 0x00, 0x18, 0xD3, 0xA8, 0xAF, 0x00, 0x00, 0x00, 0xD7, 0xC1, 0xC7, 0xC5, 0xF0, 0xF0, 0xF0,
    0xF1, 0x08, 0x4B, 0x00, 0x00, 0x09, 0x60, 0x09, 0x60, 0x5A, 0x00, 0x10, 0xD3, 0xA8, 0x9B, 0x00,
    0x00, 0x00, 0xD7, 0xE3, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF1, 0x5A, 0x00, 0x20, 0xD3, 0xEE, 0x9B,
    0x00, 0x00, 0x00, 0x2B, 0xD3, 0x04, 0xC7, 0x00, 0x64, 0x04, 0xD3, 0x00, 0xC8, 0x03, 0xF1, 0x01,
    0x07, 0xDA, 0xC8, 0x85, 0x93, 0x93, 0x96, 0x2B, 0xD3, 0x02, 0xF8, 0x5A, 0x00, 0x10, 0xD3, 0xA9,
    0x9B, 0x00, 0x00, 0x00, 0xD7, 0xE3, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF1, 0x5A, 0x00, 0x10, 0xD3,
    0xA8, 0xFB, 0x00, 0x00, 0x00, 0xC9, 0xD4, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF1, 0x5A, 0x00, 0x2B,
    0xD3, 0xEE, 0xFB, 0x00, 0x00, 0x00, 0x70, 0x00, 0x91, 0x01, 0xFF, 0x94, 0x09, 0x00, 0x09, 0x60,
    0x09, 0x60, 0x00, 0x10, 0x00, 0x08, 0x95, 0x02, 0x03, 0x01, 0x96, 0x01, 0x01, 0xFE, 0x92, 0x00,
    0x04, 0xDE, 0xAD, 0xBE, 0xEF, 0x93, 0x00, 0x71, 0x00, 0x5A, 0x00, 0x10, 0xD3, 0xA9, 0xFB, 0x00,
    0x00, 0x00, 0xC9, 0xD4, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF1, 0x5A, 0x00, 0x1C, 0xD3, 0xA0, 0x90,
    0x00, 0x00, 0x00, 0x0B, 0x02, 0x0B, 0x00, 0xC1, 0x83, 0x83, 0x96, 0xA4, 0x95, 0xA3, 0x09, 0x36,
    0x00, 0x00, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0x5A, 0x00, 0x18, 0xD3, 0xAB, 0x8A, 0x00, 0x00, 0x00,
    0x00, 0x10, 0x0A, 0x02, 0x86, 0x00, 0xC3, 0xF0, 0xC8, 0xF2, 0xF0, 0xF0, 0x04, 0x24, 0x05, 0x01,
    0x5A, 0x00, 0x0F, 0xD3, 0xEE, 0xEE, 0x08, 0x00, 0x00, 0x81, 0x86, 0x97, 0x84, 0x00, 0x00, 0x03,
    0x5A, 0x00, 0x10, 0xD3, 0xA9, 0xAF, 0x00, 0x00, 0x00, 0xD7, 0xC1, 0xC7, 0xC5, 0xF0, 0xF0, 0xF0,
    0xF1, 0x5A, 0x00, 0x10, 0xD3, 0xA9, 0xA8, 0x00, 0x00, 0x00, 0xC4, 0xD6, 0xC3, 0xF0, 0xF0, 0xF0,
    0xF0, 0xF1,
];
