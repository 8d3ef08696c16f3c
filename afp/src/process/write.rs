use log::debug;

use crate::process::context::{DecodeContext, DecoderConfig};
use crate::structs::field::{Document, StructuredField};
use crate::utils::charset::Charset;
use crate::utils::errors::DocumentError;

/// Encodes documents back to bytes.
///
/// Lengths, flags and sub-record framing are recomputed from the decoded
/// values. Fields decoded from canonical input encode to the same bytes.
#[derive(Debug, Default, Clone)]
pub struct Writer {
    config: DecoderConfig,
}

impl Writer {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn set_charset(&mut self, charset: Charset) {
        self.config.charset = charset;
    }

    /// Encodes every field in order. On failure the error carries the index
    /// of the field and the output offset where it would have started.
    pub fn write_document(&self, document: &Document) -> Result<Vec<u8>, DocumentError> {
        let mut ctx = DecodeContext::new(self.config.clone());
        let mut dst = Vec::new();

        for (index, field) in document.fields.iter().enumerate() {
            let offset = dst.len();

            write_field(&mut dst, field, &mut ctx).map_err(|error| DocumentError {
                index,
                offset,
                error,
            })?;
        }

        debug!("Encoded {} structured fields into {} bytes", document.fields.len(), dst.len());

        Ok(dst)
    }
}

fn write_field(
    dst: &mut Vec<u8>,
    field: &StructuredField,
    ctx: &mut DecodeContext,
) -> anyhow::Result<()> {
    let start = dst.len();

    // a failed field leaves no partial bytes behind
    if let Err(err) = field.write(dst, ctx) {
        dst.truncate(start);
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::EXAMPLE_DATA;
    use crate::process::context::ContextKind;
    use crate::process::read::Reader;
    use crate::structs::code_page::{CharacterEntry, CodePageIndex};
    use crate::structs::record::Record;
    use crate::utils::errors::CodecError;
    use crate::utils::flags::FlagSet;
    use anyhow::Result;

    #[test]
    fn example_round_trip() -> Result<()> {
        let mut reader = Reader::default();
        reader.set_fail_level(log::Level::Warn);

        let document = reader.read_document(EXAMPLE_DATA)?;
        let bytes = Writer::default().write_document(&document)?;
        assert_eq!(bytes, EXAMPLE_DATA);

        let again = reader.read_document(&bytes)?;
        assert_eq!(again, document);

        Ok(())
    }

    #[test]
    fn index_without_control() {
        let document = Document {
            fields: vec![
                StructuredField::new(Record::NoOperation(vec![0x01])),
                StructuredField::new(Record::CodePageIndex(CodePageIndex {
                    entries: vec![CharacterEntry {
                        character_id: "LA010000".into(),
                        flags: FlagSet::empty(),
                        code_point: 0xC1,
                    }],
                })),
            ],
        };

        let err = Writer::default().write_document(&document).unwrap_err();
        assert_eq!((err.index, err.offset), (1, 10));
        assert_eq!(
            err.codec_error(),
            Some(&CodecError::MissingContext(ContextKind::CodePageLayout))
        );
    }

    #[test]
    fn oversized_field() {
        let document = Document {
            fields: vec![StructuredField::new(Record::NoOperation(vec![0; u16::MAX as usize]))],
        };

        let err = Writer::default().write_document(&document).unwrap_err();
        assert!(matches!(
            err.codec_error(),
            Some(CodecError::ValueTooLarge { what: "Structured field length", .. })
        ));
    }
}
