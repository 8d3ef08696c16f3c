use afp::process::read::Reader;
use afp::structs::field::Document;
use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

pub fn create_progress_bar(
    multi: &MultiProgress,
    total_bytes: u64,
    message: &str,
) -> Result<ProgressBar> {
    let pb = multi.add(ProgressBar::new(total_bytes));
    pb.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {bytes}/{total_bytes} ({percent}%)\n{msg} | elapsed: {elapsed_precise}",
    )?);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(message.to_string());

    Ok(pb)
}

/// Decodes `data`, advancing a progress bar by field when one is shown.
pub fn decode_document(
    reader: &Reader,
    data: &[u8],
    multi: Option<&MultiProgress>,
    message: &str,
) -> Result<Document> {
    let Some(multi) = multi else {
        return Ok(reader.read_document(data)?);
    };

    let pb = create_progress_bar(multi, data.len() as u64, message)?;
    let mut fields = reader.fields(data);
    let mut document = Document::default();

    while let Some(field) = fields.next() {
        match field {
            Ok(field) => document.fields.push(field),
            Err(e) => {
                pb.abandon_with_message("decode failed");
                return Err(e.into());
            }
        }

        if document.fields.len().is_multiple_of(64) {
            pb.set_position(fields.offset() as u64);
        }
    }

    pb.finish_and_clear();

    Ok(document)
}
