//! Checked byte views and readers.
//!
//! A [`ByteSpan`] is a bounds-verified window into the document buffer. All
//! reads go through a [`SpanReader`], which never reads past the span and
//! reports overreads as [`CodecError::TruncatedRecord`] with the absolute
//! offset of the fault.

use std::io;
use std::io::SeekFrom;

use anyhow::{Result, bail, ensure};
use bitstream_io::{BigEndian, BitRead, BitReader, SignedInteger, UnsignedInteger};

use crate::utils::errors::CodecError;

/// Length a caller declares for a span before it is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredLength {
    Bounded(usize),
    /// Consume to the end of the enclosing buffer.
    Unbounded,
}

/// Presence rule of an optional trailing field, expressed on the actual
/// length of the record that carries it.
///
/// The literal comes from the format tables and is not always the offset of
/// the field, so it is kept as data next to each field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    /// Present iff `actual_len > k`.
    Above(usize),
}

impl Threshold {
    pub fn is_met(self, actual_len: usize) -> bool {
        match self {
            Threshold::Above(k) => actual_len > k,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ByteSpan<'a> {
    buf: &'a [u8],
    offset: usize,
    len: usize,
}

impl<'a> ByteSpan<'a> {
    /// Resolves `declared` against the bytes available after `offset`.
    pub fn resolve(buf: &'a [u8], offset: usize, declared: DeclaredLength) -> Result<Self> {
        let available = buf.len().saturating_sub(offset);

        let len = match declared {
            DeclaredLength::Bounded(len) => len,
            DeclaredLength::Unbounded => available,
        };

        if offset > buf.len() || len > available {
            bail!(CodecError::TruncatedRecord {
                offset,
                required: len,
                available,
            });
        }

        Ok(Self { buf, offset, len })
    }

    pub fn whole(buf: &'a [u8]) -> Self {
        Self {
            buf,
            offset: 0,
            len: buf.len(),
        }
    }

    /// Absolute offset of the first byte.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Absolute offset one past the last byte.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bytes(&self) -> &'a [u8] {
        &self.buf[self.offset..self.end()]
    }

    pub fn require_at_least(&self, n: usize) -> Result<()> {
        if self.len < n {
            bail!(CodecError::TruncatedRecord {
                offset: self.offset,
                required: n,
                available: self.len,
            });
        }

        Ok(())
    }

    /// Sub-span starting `start` bytes in. It can never extend past `self`.
    pub fn slice(&self, start: usize, declared: DeclaredLength) -> Result<ByteSpan<'a>> {
        ByteSpan::resolve(&self.buf[..self.end()], self.offset + start, declared)
    }

    pub fn has(&self, threshold: Threshold) -> bool {
        threshold.is_met(self.len)
    }

    pub fn reader(&self) -> SpanReader<'a> {
        SpanReader::new(*self)
    }
}

/// Big-endian reader over one [`ByteSpan`].
pub struct SpanReader<'a> {
    span: ByteSpan<'a>,
    bs: BitReader<io::Cursor<&'a [u8]>, BigEndian>,
}

impl std::fmt::Debug for SpanReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpanReader").field("span", &self.span).finish_non_exhaustive()
    }
}

impl<'a> SpanReader<'a> {
    pub fn new(span: ByteSpan<'a>) -> Self {
        Self {
            span,
            bs: BitReader::new(io::Cursor::new(span.bytes())),
        }
    }

    pub fn span(&self) -> ByteSpan<'a> {
        self.span
    }

    /// Bytes read so far.
    pub fn position(&mut self) -> Result<usize> {
        let bits = self.bs.position_in_bits()?;
        ensure!(bits & 7 == 0, "reader is not on a byte boundary ({bits} bits)");

        Ok((bits >> 3) as usize)
    }

    pub fn remaining(&mut self) -> Result<usize> {
        Ok(self.span.len() - self.position()?)
    }

    fn available_bits(&mut self) -> Result<u64> {
        Ok(((self.span.len() as u64) << 3) - self.bs.position_in_bits()?)
    }

    fn ensure_bits(&mut self, n: u64) -> Result<()> {
        let available = self.available_bits()?;

        if n > available {
            let consumed = (self.bs.position_in_bits()? >> 3) as usize;
            bail!(CodecError::TruncatedRecord {
                offset: self.span.offset() + consumed,
                required: n.div_ceil(8) as usize,
                available: (available >> 3) as usize,
            });
        }

        Ok(())
    }

    pub fn require(&mut self, n: usize) -> Result<()> {
        self.ensure_bits((n as u64) << 3)
    }

    #[inline(always)]
    pub fn get(&mut self) -> Result<bool> {
        self.ensure_bits(1)?;
        Ok(self.bs.read_bit()?)
    }

    #[inline(always)]
    pub fn get_n<I: UnsignedInteger>(&mut self, n: u32) -> Result<I> {
        self.ensure_bits(n as u64)?;
        Ok(self.bs.read_unsigned_var(n)?)
    }

    #[inline(always)]
    pub fn get_s<S: SignedInteger>(&mut self, n: u32) -> Result<S> {
        self.ensure_bits(n as u64)?;
        Ok(self.bs.read_signed_var(n)?)
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        self.get_n(8)
    }

    pub fn get_u16(&mut self) -> Result<u16> {
        self.get_n(16)
    }

    pub fn get_u24(&mut self) -> Result<u32> {
        self.get_n(24)
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        self.get_n(32)
    }

    pub fn get_i16(&mut self) -> Result<i16> {
        self.get_s(16)
    }

    pub fn get_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.require(N)?;

        let mut buf = [0u8; N];
        self.bs.read_bytes(&mut buf)?;

        Ok(buf)
    }

    /// Hands out the next `n` bytes as a span and skips over them.
    pub fn take(&mut self, n: usize) -> Result<ByteSpan<'a>> {
        let start = self.position()?;
        self.require(n)?;

        let span = self.span.slice(start, DeclaredLength::Bounded(n))?;
        self.bs.seek_bits(SeekFrom::Start(((start + n) as u64) << 3))?;

        Ok(span)
    }

    pub fn take_rest(&mut self) -> Result<ByteSpan<'a>> {
        let n = self.remaining()?;
        self.take(n)
    }

    pub fn get_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.take(n)?.bytes().to_vec())
    }

    pub fn skip_n(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Reads an optional trailing field of `width` bytes.
    ///
    /// Presence is decided by `threshold` on the whole span. Once present,
    /// the full width must be available.
    pub fn optional<T>(
        &mut self,
        threshold: Threshold,
        width: usize,
        read: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<Option<T>> {
        if !self.span.has(threshold) {
            return Ok(None);
        }

        self.require(width)?;
        read(self).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truncated(err: &anyhow::Error) -> Option<(usize, usize, usize)> {
        match err.downcast_ref::<CodecError>() {
            Some(CodecError::TruncatedRecord {
                offset,
                required,
                available,
            }) => Some((*offset, *required, *available)),
            _ => None,
        }
    }

    #[test]
    fn resolve_lengths() -> Result<()> {
        let buf = [0u8; 16];

        let span = ByteSpan::resolve(&buf, 4, DeclaredLength::Unbounded)?;
        assert_eq!(span.len(), 12);
        assert_eq!(span.end(), 16);

        let span = ByteSpan::resolve(&buf, 4, DeclaredLength::Bounded(12))?;
        assert_eq!(span.len(), 12);

        let err = ByteSpan::resolve(&buf, 4, DeclaredLength::Bounded(13)).unwrap_err();
        assert_eq!(truncated(&err), Some((4, 13, 12)));

        let err = ByteSpan::resolve(&buf, 17, DeclaredLength::Unbounded).unwrap_err();
        assert!(truncated(&err).is_some());

        Ok(())
    }

    #[test]
    fn slice_stays_inside_parent() -> Result<()> {
        let buf = [0u8; 16];
        let parent = ByteSpan::resolve(&buf, 2, DeclaredLength::Bounded(6))?;

        let child = parent.slice(2, DeclaredLength::Unbounded)?;
        assert_eq!((child.offset(), child.len()), (4, 4));

        let err = parent.slice(2, DeclaredLength::Bounded(5)).unwrap_err();
        assert_eq!(truncated(&err), Some((4, 5, 4)));

        Ok(())
    }

    #[test]
    fn require_at_least() {
        let buf = [1u8, 2, 3];
        let span = ByteSpan::whole(&buf);

        assert!(span.require_at_least(3).is_ok());
        assert_eq!(
            truncated(&span.require_at_least(4).unwrap_err()),
            Some((0, 4, 3))
        );
    }

    #[test]
    fn reader_reports_absolute_offsets() -> Result<()> {
        let buf = [0xAA, 0x12, 0x34, 0x56, 0xFF, 0xFE];
        let span = ByteSpan::resolve(&buf, 1, DeclaredLength::Bounded(5))?;
        let mut reader = span.reader();

        assert_eq!(reader.get_u24()?, 0x123456);
        assert_eq!(reader.get_i16()?, -2);
        assert_eq!(reader.remaining()?, 0);

        let err = reader.get_u8().unwrap_err();
        assert_eq!(truncated(&err), Some((6, 1, 0)));

        Ok(())
    }

    #[test]
    fn take_hands_out_sub_spans() -> Result<()> {
        let buf = [1u8, 2, 3, 4, 5];
        let mut reader = ByteSpan::whole(&buf).reader();

        reader.skip_n(1)?;
        let mid = reader.take(2)?;
        assert_eq!((mid.offset(), mid.bytes()), (1, &[2u8, 3][..]));
        assert_eq!(reader.get_u8()?, 4);
        assert_eq!(reader.take_rest()?.bytes(), &[5]);

        Ok(())
    }

    #[test]
    fn threshold_boundaries() {
        assert!(!Threshold::Above(15).is_met(15));
        assert!(Threshold::Above(15).is_met(16));
    }

    #[test]
    fn optional_trailing_field() -> Result<()> {
        const K: usize = 4;
        const FIELD: Threshold = Threshold::Above(K);

        let read = |buf: &[u8]| -> Result<Option<u16>> {
            let mut reader = ByteSpan::whole(buf).reader();
            reader.skip_n(K)?;
            reader.optional(FIELD, 2, |r| r.get_u16())
        };

        assert_eq!(read(&[0, 0, 0, 0])?, None);
        assert_eq!(read(&[0, 0, 0, 0, 0x12, 0x34])?, Some(0x1234));

        let err = read(&[0, 0, 0, 0, 0x12]).unwrap_err();
        assert_eq!(truncated(&err), Some((4, 2, 1)));

        Ok(())
    }
}
