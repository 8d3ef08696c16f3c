use log::{debug, trace};

use crate::process::context::{DecodeContext, DecoderConfig};
use crate::structs::field::{Document, StructuredField};
use crate::utils::charset::Charset;
use crate::utils::errors::DocumentError;

/// Decodes documents from materialised byte buffers.
///
/// Each call starts from an empty [`DecodeContext`], so one reader can be
/// shared by independent documents.
#[derive(Debug, Default, Clone)]
pub struct Reader {
    config: DecoderConfig,
}

impl Reader {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Sets the failure level for validation errors.
    ///
    /// - `log::Level::Error`: Only fail on Error level messages (default)
    /// - `log::Level::Warn`: Fail on Warning level and above (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.config.fail_level = level;
    }

    pub fn set_charset(&mut self, charset: Charset) {
        self.config.charset = charset;
    }

    /// Decodes every structured field of `buf`.
    ///
    /// The first fatal error aborts the document. Nothing after the failing
    /// field is decoded.
    pub fn read_document(&self, buf: &[u8]) -> Result<Document, DocumentError> {
        let fields = self.fields(buf).collect::<Result<Vec<_>, _>>()?;
        debug!("Decoded {} structured fields from {} bytes", fields.len(), buf.len());

        Ok(Document { fields })
    }

    /// Decodes structured fields one at a time.
    pub fn fields<'a>(&self, buf: &'a [u8]) -> Fields<'a> {
        Fields {
            buf,
            offset: 0,
            index: 0,
            ctx: DecodeContext::new(self.config.clone()),
            done: false,
        }
    }
}

/// Iterator over the structured fields of one document.
///
/// Yields [`DocumentError`] at most once and stops afterwards.
#[derive(Debug)]
pub struct Fields<'a> {
    buf: &'a [u8],
    offset: usize,
    index: usize,
    ctx: DecodeContext,
    done: bool,
}

impl Fields<'_> {
    /// Offset of the next field to decode.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn context(&self) -> &DecodeContext {
        &self.ctx
    }
}

impl Iterator for Fields<'_> {
    type Item = Result<StructuredField, DocumentError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.buf.len() {
            return None;
        }

        match StructuredField::read(self.buf, self.offset, &mut self.ctx) {
            Ok((field, end)) => {
                trace!(
                    "Field {} at {:#X}: {} {}",
                    self.index,
                    self.offset,
                    field.type_id(),
                    field.record.name()
                );

                self.offset = end;
                self.index += 1;

                Some(Ok(field))
            }
            Err(error) => {
                self.done = true;

                Some(Err(DocumentError {
                    index: self.index,
                    offset: self.offset,
                    error,
                }))
            }
        }
    }
}
