//! Presentation Text Data.
//!
//! The body is a sequence of control-sequence chains. Each chain starts with
//! `0x2BD3` and continues for as long as the previous function code is odd.
//! Bytes outside any chain are kept as they are.

use afp_macros::{ToBytes, fixed_layout};
use anyhow::Result;

use crate::process::context::DecodeContext;
use crate::process::iterate::{
    CONTROL_SEQUENCE_PREFIX, Element, ElementWriter, Framing, FramingPolicy, Stop, SubRecords,
};
use crate::process::registry::{Enclosing, Entry, Registry};
use crate::structs::field::TypeId;
use crate::utils::byteorder::{FixedLayout, WriteBytesBe};
use crate::utils::charset::Charset;
use crate::utils::span::{ByteSpan, DeclaredLength, Threshold};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ToBytes)]
pub struct RuleWidth {
    pub integer: i16,
    pub fraction: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ToBytes)]
#[fixed_layout(0xF6)]
pub struct TextOrientation {
    pub inline: u16,
    pub baseline: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Function {
    AbsoluteMoveInline(u16),
    RelativeMoveInline(i16),
    AbsoluteMoveBaseline(u16),
    RelativeMoveBaseline(i16),
    TransparentData(Vec<u8>),
    DrawInlineRule { length: i16, width: Option<RuleWidth> },
    SetCodedFontLocal(u8),
    SetTextOrientation(TextOrientation),
    NoOperation(Vec<u8>),
    Unknown { function: u8, data: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSequence {
    /// Another sequence follows without the `0x2BD3` prefix.
    pub chained: bool,
    pub function: Function,
}

const RULE_WIDTH: Threshold = Threshold::Above(2);

pub static CONTROL_SEQUENCES: Registry<ControlSequence> = Registry {
    family: "control sequence",
    entries: &[
        Entry {
            code: 0xC6,
            framing: Framing::Long,
            name: "Absolute Move Inline",
            decode: ControlSequence::read_absolute_move_inline,
        },
        Entry {
            code: 0xC8,
            framing: Framing::Long,
            name: "Relative Move Inline",
            decode: ControlSequence::read_relative_move_inline,
        },
        Entry {
            code: 0xD2,
            framing: Framing::Long,
            name: "Absolute Move Baseline",
            decode: ControlSequence::read_absolute_move_baseline,
        },
        Entry {
            code: 0xD4,
            framing: Framing::Long,
            name: "Relative Move Baseline",
            decode: ControlSequence::read_relative_move_baseline,
        },
        Entry {
            code: 0xDA,
            framing: Framing::Long,
            name: "Transparent Data",
            decode: ControlSequence::read_transparent_data,
        },
        Entry {
            code: 0xE6,
            framing: Framing::Long,
            name: "Draw I-axis Rule",
            decode: ControlSequence::read_draw_inline_rule,
        },
        Entry {
            code: 0xF0,
            framing: Framing::Long,
            name: "Set Coded Font Local",
            decode: ControlSequence::read_set_coded_font_local,
        },
        Entry {
            code: 0xF6,
            framing: Framing::Long,
            name: "Set Text Orientation",
            decode: ControlSequence::read_set_text_orientation,
        },
        Entry {
            code: 0xF8,
            framing: Framing::Long,
            name: "No Operation",
            decode: ControlSequence::read_no_operation,
        },
    ],
    collisions: &[],
    unknown: ControlSequence::read_unknown,
};

impl ControlSequence {
    fn new(element: &Element<'_>, function: Function) -> Self {
        Self {
            chained: element.header.chained,
            function,
        }
    }

    fn read_absolute_move_inline(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        let value = element.data.reader().get_u16()?;
        Ok(Self::new(element, Function::AbsoluteMoveInline(value)))
    }

    fn read_relative_move_inline(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        let value = element.data.reader().get_i16()?;
        Ok(Self::new(element, Function::RelativeMoveInline(value)))
    }

    fn read_absolute_move_baseline(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        let value = element.data.reader().get_u16()?;
        Ok(Self::new(element, Function::AbsoluteMoveBaseline(value)))
    }

    fn read_relative_move_baseline(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        let value = element.data.reader().get_i16()?;
        Ok(Self::new(element, Function::RelativeMoveBaseline(value)))
    }

    fn read_transparent_data(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        let data = element.data.bytes().to_vec();
        Ok(Self::new(element, Function::TransparentData(data)))
    }

    fn read_draw_inline_rule(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        let reader = &mut element.data.reader();
        let length = reader.get_i16()?;
        let width = reader.optional(RULE_WIDTH, 3, |r| {
            Ok(RuleWidth {
                integer: r.get_i16()?,
                fraction: r.get_u8()?,
            })
        })?;

        Ok(Self::new(element, Function::DrawInlineRule { length, width }))
    }

    fn read_set_coded_font_local(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        let value = element.data.reader().get_u8()?;
        Ok(Self::new(element, Function::SetCodedFontLocal(value)))
    }

    fn read_set_text_orientation(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        let reader = &mut element.data.reader();
        let orientation = TextOrientation {
            inline: reader.get_u16()?,
            baseline: reader.get_u16()?,
        };

        Ok(Self::new(element, Function::SetTextOrientation(orientation)))
    }

    fn read_no_operation(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        let data = element.data.bytes().to_vec();
        Ok(Self::new(element, Function::NoOperation(data)))
    }

    fn read_unknown(element: &Element<'_>, _: &mut DecodeContext) -> Result<Self> {
        let function = Function::Unknown {
            function: element.header.code as u8,
            data: element.data.bytes().to_vec(),
        };

        Ok(Self::new(element, function))
    }

    /// Function code with the chain bit cleared.
    pub fn function_code(&self) -> u8 {
        match &self.function {
            Function::AbsoluteMoveInline(_) => 0xC6,
            Function::RelativeMoveInline(_) => 0xC8,
            Function::AbsoluteMoveBaseline(_) => 0xD2,
            Function::RelativeMoveBaseline(_) => 0xD4,
            Function::TransparentData(_) => 0xDA,
            Function::DrawInlineRule { .. } => 0xE6,
            Function::SetCodedFontLocal(_) => 0xF0,
            Function::SetTextOrientation(sto) => sto.type_code() as u8,
            Function::NoOperation(_) => 0xF8,
            Function::Unknown { function, .. } => *function,
        }
    }

    pub fn name(&self) -> &'static str {
        CONTROL_SEQUENCES
            .name(self.function_code() as u32, Framing::Long, Enclosing::Unspecified)
            .unwrap_or("Unknown")
    }

    pub fn data(&self) -> Vec<u8> {
        let mut dst = Vec::new();

        match &self.function {
            Function::AbsoluteMoveInline(v) | Function::AbsoluteMoveBaseline(v) => {
                v.write_be(&mut dst)
            }
            Function::RelativeMoveInline(v) | Function::RelativeMoveBaseline(v) => {
                v.write_be(&mut dst)
            }
            Function::TransparentData(data) | Function::NoOperation(data) => {
                dst.extend_from_slice(data)
            }
            Function::DrawInlineRule { length, width } => {
                length.write_be(&mut dst);
                width.write_be(&mut dst);
            }
            Function::SetCodedFontLocal(lid) => dst.push(*lid),
            Function::SetTextOrientation(sto) => return sto.payload(),
            Function::Unknown { data, .. } => dst.extend_from_slice(data),
        }

        dst
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextItem {
    /// Bytes outside any chain.
    Text(Vec<u8>),
    Chain(Vec<ControlSequence>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentationText {
    pub items: Vec<TextItem>,
}

impl PresentationText {
    pub fn read(data: ByteSpan<'_>, ctx: &mut DecodeContext) -> Result<Self> {
        let prefix = CONTROL_SEQUENCE_PREFIX.to_be_bytes();
        let enclosing = Enclosing::Field(TypeId::PRESENTATION_TEXT);
        let fail_level = ctx.config.fail_level;

        let mut items = Vec::new();
        let mut position = 0;

        while position < data.len() {
            let rest = data.slice(position, DeclaredLength::Unbounded)?;

            if rest.bytes().starts_with(&prefix) {
                let mut walker = SubRecords::new(
                    rest,
                    FramingPolicy::ControlSequence,
                    Stop::ByteCount,
                    fail_level,
                );
                let chain = walker
                    .by_ref()
                    .map(|element| {
                        element.and_then(|element| {
                            CONTROL_SEQUENCES.decode(&element, enclosing, ctx)
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;

                position += walker.consumed();
                items.push(TextItem::Chain(chain));
            } else {
                let len = rest
                    .bytes()
                    .windows(2)
                    .position(|window| window == prefix)
                    .unwrap_or(rest.len());

                position += len;
                items.push(TextItem::Text(rest.bytes()[..len].to_vec()));
            }
        }

        Ok(Self { items })
    }

    pub fn write(&self, dst: &mut Vec<u8>) -> Result<()> {
        for item in &self.items {
            match item {
                TextItem::Text(bytes) => dst.extend_from_slice(bytes),
                TextItem::Chain(chain) => {
                    let mut writer = ElementWriter::new(FramingPolicy::ControlSequence);

                    for sequence in chain {
                        let code = sequence.function_code() as u32 | sequence.chained as u32;
                        writer.write(dst, code, &sequence.data())?;
                    }
                }
            }
        }

        Ok(())
    }

    pub fn sequences(&self) -> impl Iterator<Item = &ControlSequence> {
        self.items.iter().flat_map(|item| match item {
            TextItem::Chain(chain) => chain.as_slice(),
            TextItem::Text(_) => &[][..],
        })
    }

    /// Concatenated transparent data, transcoded with `charset`.
    pub fn text(&self, charset: Charset) -> String {
        self.sequences()
            .filter_map(|sequence| match &sequence.function {
                Function::TransparentData(data) => Some(charset.decode(data)),
                _ => None,
            })
            .collect()
    }
}
