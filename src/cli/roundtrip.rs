use std::fs;

use afp::process::read::Reader;
use afp::process::write::Writer;
use afp::structs::field::Document;
use anyhow::{Context, Result, bail};
use indicatif::MultiProgress;

use super::command::{Cli, RoundtripArgs};
use super::progress::decode_document;
use super::{reader_for, writer_for};
use crate::input::{input_name, read_document_bytes};

pub fn cmd_roundtrip(args: &RoundtripArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Round-tripping AFP document: {}", input_name(&args.input));

    let data = read_document_bytes(&args.input)?;
    let reader = reader_for(cli);

    let document = decode_document(&reader, &data, multi, "Decoding...")?;
    let report = verify(&reader, &writer_for(cli), &document)?;

    if report.encoded == data {
        log::info!("{} fields re-encoded byte for byte", document.fields.len());
    } else {
        log::info!(
            "{} fields re-encoded equivalently, {} bytes in, {} bytes out",
            document.fields.len(),
            data.len(),
            report.encoded.len()
        );
    }

    if let Some(output) = &args.output {
        fs::write(output, &report.encoded)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        log::info!("Wrote normalised document to {}", output.display());
    }

    Ok(())
}

struct Report {
    encoded: Vec<u8>,
}

/// Encodes `document` and decodes it again, requiring the same fields back.
fn verify(reader: &Reader, writer: &Writer, document: &Document) -> Result<Report> {
    let encoded = writer.write_document(document)?;
    let decoded = reader.read_document(&encoded)?;

    if decoded.fields.len() != document.fields.len() {
        bail!(
            "Re-encoded document has {} fields, expected {}",
            decoded.fields.len(),
            document.fields.len()
        );
    }

    let mismatch = document
        .fields
        .iter()
        .zip(&decoded.fields)
        .position(|(before, after)| before != after);

    if let Some(index) = mismatch {
        bail!(
            "Structured field {index} ({}) changed after re-encoding",
            document.fields[index].type_id()
        );
    }

    Ok(Report { encoded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use afp::process::EXAMPLE_DATA;

    #[test]
    fn example_verifies() -> Result<()> {
        let reader = Reader::default();
        let document = reader.read_document(EXAMPLE_DATA)?;

        let report = verify(&reader, &Writer::default(), &document)?;
        assert_eq!(report.encoded, EXAMPLE_DATA);

        Ok(())
    }
}
