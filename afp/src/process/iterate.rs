//! Walking nested self-describing sub-records.
//!
//! Triplets, repeating groups, image self-defining fields and text control
//! sequences differ only in how their headers are framed. [`SubRecords`]
//! walks any of them given a [`FramingPolicy`], and [`ElementWriter`] emits
//! them back with lengths recomputed from the payload.

use anyhow::{Result, bail, ensure};
use log::trace;

use crate::log_or_err;
use crate::utils::errors::CodecError;
use crate::utils::span::{ByteSpan, DeclaredLength};

/// Prefix of the first control sequence in a chain.
pub const CONTROL_SEQUENCE_PREFIX: u16 = 0x2BD3;

/// Leading byte of an extended self-defining field.
pub const EXTENDED_MARKER: u8 = 0xFE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framing {
    /// 1-byte type code and 1-byte length.
    Long,
    /// 2-byte type code starting with `0xFE` and 2-byte length.
    Extended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubRecordHeader {
    /// Type code including any `0xFE` marker. Control sequence functions
    /// are reported with the chain bit cleared.
    pub code: u32,
    pub framing: Framing,
    pub header_len: usize,
    /// Payload bytes after the header.
    pub data_len: usize,
    /// Set when the element announces that another sequence follows.
    pub chained: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingPolicy {
    /// Fixed-width elements without a header.
    Stride(usize),
    /// `[length:1][code:1][payload]`, length counts the header.
    Triplet,
    /// `[length:2][payload]`, length counts the header.
    RepeatingGroup,
    /// `[code:1][length:1][payload]` or `[0xFE][code:1][length:2][payload]`,
    /// length counts the payload only.
    SelfDefining,
    /// `[0x2B][0xD3][length:1][function:1][data]` for the first sequence of
    /// a chain, `[length:1][function:1][data]` after a chained one.
    ControlSequence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    /// Consume the whole span.
    ByteCount,
    /// Read exactly this many elements.
    Count(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    pub header: SubRecordHeader,
    /// Absolute offset of the first header byte.
    pub offset: usize,
    pub data: ByteSpan<'a>,
}

impl Element<'_> {
    /// Header and payload together.
    pub fn len(&self) -> usize {
        self.header.header_len + self.header.data_len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Iterator over the sub-records of one span.
///
/// Yields `Err` at most once and stops afterwards. A short trailing
/// remainder under [`FramingPolicy::Stride`] is reported through
/// [`log_or_err!`] at warn level and left unconsumed.
#[derive(Debug)]
pub struct SubRecords<'a> {
    span: ByteSpan<'a>,
    policy: FramingPolicy,
    stop: Stop,
    fail_level: log::Level,
    position: usize,
    count: usize,
    chained: bool,
    done: bool,
}

impl<'a> SubRecords<'a> {
    pub fn new(
        span: ByteSpan<'a>,
        policy: FramingPolicy,
        stop: Stop,
        fail_level: log::Level,
    ) -> Self {
        Self {
            span,
            policy,
            stop,
            fail_level,
            position: 0,
            count: 0,
            chained: false,
            done: false,
        }
    }

    /// Bytes walked so far, relative to the start of the span.
    pub fn consumed(&self) -> usize {
        self.position
    }

    /// The part of the span not yet walked.
    pub fn remainder(&self) -> ByteSpan<'a> {
        self.span
            .slice(self.position, DeclaredLength::Unbounded)
            .unwrap_or(self.span)
    }

    fn finished(&self) -> bool {
        match self.stop {
            Stop::ByteCount => self.position >= self.span.len(),
            Stop::Count(n) => self.count >= n,
        }
    }

    fn header_bytes(&self, n: usize) -> Result<&'a [u8]> {
        Ok(self
            .span
            .slice(self.position, DeclaredLength::Bounded(n))?
            .bytes())
    }

    fn read_header(&self) -> Result<SubRecordHeader> {
        let header = match self.policy {
            FramingPolicy::Stride(width) => SubRecordHeader {
                code: 0,
                framing: Framing::Long,
                header_len: 0,
                data_len: width,
                chained: false,
            },
            FramingPolicy::Triplet => {
                let bytes = self.header_bytes(2)?;
                let length = bytes[0] as usize;
                self.ensure_covers_header(length, 2)?;

                SubRecordHeader {
                    code: bytes[1] as u32,
                    framing: Framing::Long,
                    header_len: 2,
                    data_len: length - 2,
                    chained: false,
                }
            }
            FramingPolicy::RepeatingGroup => {
                let bytes = self.header_bytes(2)?;
                let length = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
                self.ensure_covers_header(length, 2)?;

                SubRecordHeader {
                    code: 0,
                    framing: Framing::Long,
                    header_len: 2,
                    data_len: length - 2,
                    chained: false,
                }
            }
            FramingPolicy::SelfDefining => {
                if self.header_bytes(1)?[0] == EXTENDED_MARKER {
                    let bytes = self.header_bytes(4)?;

                    SubRecordHeader {
                        code: u16::from_be_bytes([bytes[0], bytes[1]]) as u32,
                        framing: Framing::Extended,
                        header_len: 4,
                        data_len: u16::from_be_bytes([bytes[2], bytes[3]]) as usize,
                        chained: false,
                    }
                } else {
                    let bytes = self.header_bytes(2)?;

                    SubRecordHeader {
                        code: bytes[0] as u32,
                        framing: Framing::Long,
                        header_len: 2,
                        data_len: bytes[1] as usize,
                        chained: false,
                    }
                }
            }
            FramingPolicy::ControlSequence => {
                let prefix = if self.chained { 0 } else { 2 };
                let bytes = self.header_bytes(prefix + 2)?;

                if prefix != 0 {
                    let read = u16::from_be_bytes([bytes[0], bytes[1]]);

                    if read != CONTROL_SEQUENCE_PREFIX {
                        bail!(CodecError::IntroducerMismatch {
                            offset: self.span.offset() + self.position,
                            read,
                        });
                    }
                }

                let length = bytes[prefix] as usize;
                let function = bytes[prefix + 1];
                self.ensure_covers_header(length, 2)?;

                SubRecordHeader {
                    code: (function & !1) as u32,
                    framing: Framing::Long,
                    header_len: prefix + 2,
                    data_len: length - 2,
                    chained: function & 1 != 0,
                }
            }
        };

        Ok(header)
    }

    /// A self-declared length shorter than the header it counts is corrupt.
    fn ensure_covers_header(&self, length: usize, header: usize) -> Result<()> {
        if length < header {
            bail!(CodecError::OverrunSubRecord {
                offset: self.span.offset() + self.position,
                declared: length,
                remaining: self.span.len() - self.position,
            });
        }

        Ok(())
    }

    fn next_element(&mut self) -> Result<Option<Element<'a>>> {
        if self.finished() {
            return Ok(None);
        }

        let remaining = self.span.len() - self.position;
        let offset = self.span.offset() + self.position;

        if let FramingPolicy::Stride(width) = self.policy {
            ensure!(width > 0, "Stride of zero bytes at offset {offset:#X}");

            if remaining < width {
                self.done = true;

                if let Stop::Count(_) = self.stop {
                    bail!(CodecError::TruncatedRecord {
                        offset,
                        required: width,
                        available: remaining,
                    });
                }

                log_or_err!(
                    self,
                    log::Level::Warn,
                    CodecError::PartialElement {
                        offset,
                        remaining,
                        stride: width,
                    }
                );

                return Ok(None);
            }
        }

        let header = self.read_header()?;
        let total = header.header_len + header.data_len;

        if total > remaining {
            bail!(CodecError::OverrunSubRecord {
                offset,
                declared: total,
                remaining,
            });
        }

        let data = self.span.slice(
            self.position + header.header_len,
            DeclaredLength::Bounded(header.data_len),
        )?;

        trace!(
            "Sub-record {:#X} at {offset:#X}: {} + {} bytes",
            header.code, header.header_len, header.data_len
        );

        self.position += total;
        self.count += 1;

        if self.policy == FramingPolicy::ControlSequence {
            self.chained = header.chained;

            if !header.chained {
                self.done = true;
            }
        }

        Ok(Some(Element {
            header,
            offset,
            data,
        }))
    }
}

impl<'a> Iterator for SubRecords<'a> {
    type Item = Result<Element<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.next_element();

        if result.is_err() {
            self.done = true;
        }

        result.transpose()
    }
}

/// Emits sub-records with headers computed from their payloads.
#[derive(Debug, Clone, Copy)]
pub struct ElementWriter {
    policy: FramingPolicy,
    chain_open: bool,
}

impl ElementWriter {
    pub fn new(policy: FramingPolicy) -> Self {
        Self {
            policy,
            chain_open: false,
        }
    }

    /// Appends one element. `code` is ignored by header-less policies.
    ///
    /// Under [`FramingPolicy::ControlSequence`] an odd `code` keeps the chain
    /// open for the next call, and the first element of a chain gets the
    /// `0x2BD3` prefix.
    pub fn write(&mut self, dst: &mut Vec<u8>, code: u32, data: &[u8]) -> Result<()> {
        match self.policy {
            FramingPolicy::Stride(width) => {
                ensure!(
                    data.len() == width,
                    "Element of {} bytes in a {width}-byte stride",
                    data.len()
                );
            }
            FramingPolicy::Triplet => {
                dst.push(Self::fit_u8("Triplet length", data.len() + 2)?);
                dst.push(code as u8);
            }
            FramingPolicy::RepeatingGroup => {
                dst.extend(Self::fit_u16("Repeating group length", data.len() + 2)?.to_be_bytes());
            }
            FramingPolicy::SelfDefining => {
                if code > 0xFF {
                    dst.extend((code as u16).to_be_bytes());
                    let length = Self::fit_u16("Self-defining field length", data.len())?;
                    dst.extend(length.to_be_bytes());
                } else {
                    dst.push(code as u8);
                    dst.push(Self::fit_u8("Self-defining field length", data.len())?);
                }
            }
            FramingPolicy::ControlSequence => {
                let length = Self::fit_u8("Control sequence length", data.len() + 2)?;

                if !self.chain_open {
                    dst.extend(CONTROL_SEQUENCE_PREFIX.to_be_bytes());
                }

                dst.push(length);
                dst.push(code as u8);
                self.chain_open = code & 1 != 0;
            }
        }

        dst.extend_from_slice(data);

        Ok(())
    }

    fn fit_u8(what: &'static str, length: usize) -> Result<u8> {
        u8::try_from(length).map_err(|_| {
            CodecError::ValueTooLarge {
                what,
                length,
                max: u8::MAX as usize,
            }
            .into()
        })
    }

    fn fit_u16(what: &'static str, length: usize) -> Result<u16> {
        u16::try_from(length).map_err(|_| {
            CodecError::ValueTooLarge {
                what,
                length,
                max: u16::MAX as usize,
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrun(err: &anyhow::Error) -> Option<(usize, usize, usize)> {
        match err.downcast_ref::<CodecError>() {
            Some(CodecError::OverrunSubRecord {
                offset,
                declared,
                remaining,
            }) => Some((*offset, *declared, *remaining)),
            _ => None,
        }
    }

    fn walk(
        buf: &[u8],
        policy: FramingPolicy,
        stop: Stop,
        fail_level: log::Level,
    ) -> Result<Vec<(SubRecordHeader, Vec<u8>)>> {
        SubRecords::new(ByteSpan::whole(buf), policy, stop, fail_level)
            .map(|element| element.map(|e| (e.header, e.data.bytes().to_vec())))
            .collect()
    }

    #[test]
    fn chained_control_sequences() -> Result<()> {
        let buf = [
            0x2B, 0xD3, 0x04, 0xC7, 0x00, 0x64, // AMI, chained
            0x04, 0xD5, 0xFF, 0xF6, // RMB, chained
            0x03, 0xF0, 0x01, // SCFL, last
            0xDE, 0xAD, 0xBE, // garbage
        ];

        let mut walker = SubRecords::new(
            ByteSpan::whole(&buf),
            FramingPolicy::ControlSequence,
            Stop::ByteCount,
            log::Level::Warn,
        );
        let elements = walker.by_ref().collect::<Result<Vec<_>>>()?;

        assert_eq!(elements.len(), 3);
        assert_eq!(
            elements.iter().map(|e| e.header.header_len).collect::<Vec<_>>(),
            [4, 2, 2]
        );
        assert_eq!(
            elements.iter().map(|e| e.header.chained).collect::<Vec<_>>(),
            [true, true, false]
        );
        assert_eq!(
            elements.iter().map(|e| e.header.code).collect::<Vec<_>>(),
            [0xC6, 0xD4, 0xF0]
        );
        assert_eq!(elements[1].data.bytes(), [0xFF, 0xF6]);
        assert_eq!(elements[2].offset, 10);
        assert_eq!(walker.consumed(), 13);
        assert_eq!(walker.remainder().bytes(), [0xDE, 0xAD, 0xBE]);

        Ok(())
    }

    #[test]
    fn chain_must_start_with_prefix() {
        let buf = [0x04, 0xC7, 0x00, 0x64];
        let err = walk(
            &buf,
            FramingPolicy::ControlSequence,
            Stop::ByteCount,
            log::Level::Error,
        )
        .unwrap_err();

        assert_eq!(
            err.downcast_ref::<CodecError>(),
            Some(&CodecError::IntroducerMismatch {
                offset: 0,
                read: 0x04C7
            })
        );
    }

    #[test]
    fn overrun_by_one_byte() {
        // second triplet claims 4 bytes, 3 remain
        let buf = [0x03, 0x01, 0xAA, 0x04, 0x02, 0xBB];
        let err = walk(&buf, FramingPolicy::Triplet, Stop::ByteCount, log::Level::Error)
            .unwrap_err();

        assert_eq!(overrun(&err), Some((3, 4, 3)));
    }

    #[test]
    fn length_shorter_than_header() {
        let buf = [0x00, 0x01];
        let err = walk(
            &buf,
            FramingPolicy::RepeatingGroup,
            Stop::ByteCount,
            log::Level::Error,
        )
        .unwrap_err();

        assert_eq!(overrun(&err), Some((0, 1, 2)));
    }

    #[test]
    fn stride_remainder() -> Result<()> {
        let buf = [1u8, 2, 3, 4, 5, 6, 7];

        let elements = walk(&buf, FramingPolicy::Stride(3), Stop::ByteCount, log::Level::Error)?;
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[1].1, [4, 5, 6]);

        let err = walk(&buf, FramingPolicy::Stride(3), Stop::ByteCount, log::Level::Warn)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<CodecError>(),
            Some(&CodecError::PartialElement {
                offset: 6,
                remaining: 1,
                stride: 3
            })
        );

        Ok(())
    }

    #[test]
    fn count_stops_early() -> Result<()> {
        let buf = [0x02, 0x10, 0x03, 0x20, 0xFF, 0x02, 0x30];

        let elements = walk(&buf, FramingPolicy::Triplet, Stop::Count(2), log::Level::Warn)?;
        assert_eq!(
            elements.iter().map(|e| e.0.code).collect::<Vec<_>>(),
            [0x10, 0x20]
        );

        let err = walk(&buf, FramingPolicy::Triplet, Stop::Count(4), log::Level::Warn)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CodecError>(),
            Some(CodecError::TruncatedRecord { offset: 7, .. })
        ));

        Ok(())
    }

    #[test]
    fn self_defining_framing() -> Result<()> {
        let buf = [
            0x70, 0x00, // long, empty
            0xFE, 0x92, 0x00, 0x03, 0x01, 0x02, 0x03, // extended
            0x93, 0x00,
        ];

        let elements = walk(
            &buf,
            FramingPolicy::SelfDefining,
            Stop::ByteCount,
            log::Level::Warn,
        )?;

        assert_eq!(elements.len(), 3);
        assert_eq!(elements[1].0.code, 0xFE92);
        assert_eq!(elements[1].0.framing, Framing::Extended);
        assert_eq!(elements[1].0.header_len, 4);
        assert_eq!(elements[1].1, [1, 2, 3]);
        assert_eq!(elements[2].0.framing, Framing::Long);

        Ok(())
    }

    #[test]
    fn writer_recomputes_headers() -> Result<()> {
        let mut dst = Vec::new();
        let mut writer = ElementWriter::new(FramingPolicy::ControlSequence);
        writer.write(&mut dst, 0xC7, &[0x00, 0x64])?;
        writer.write(&mut dst, 0xF0, &[0x01])?;
        writer.write(&mut dst, 0xF8, &[])?;
        assert_eq!(
            dst,
            [0x2B, 0xD3, 0x04, 0xC7, 0x00, 0x64, 0x03, 0xF0, 0x01, 0x2B, 0xD3, 0x02, 0xF8]
        );

        let mut dst = Vec::new();
        let mut writer = ElementWriter::new(FramingPolicy::SelfDefining);
        writer.write(&mut dst, 0xFE92, &[0xAB])?;
        writer.write(&mut dst, 0x71, &[])?;
        assert_eq!(dst, [0xFE, 0x92, 0x00, 0x01, 0xAB, 0x71, 0x00]);

        let err = ElementWriter::new(FramingPolicy::Triplet)
            .write(&mut Vec::new(), 0x65, &[0u8; 254])
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<CodecError>(),
            Some(&CodecError::ValueTooLarge {
                what: "Triplet length",
                length: 256,
                max: 255
            })
        );

        Ok(())
    }
}
