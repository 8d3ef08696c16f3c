use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};

/// Reads a whole document into memory. `-` reads stdin.
///
/// Structured fields are framed by absolute offsets, so the decoder always
/// works on a materialised buffer.
pub fn read_document_bytes(input_path: &Path) -> Result<Vec<u8>> {
    let data = if input_path.as_os_str() == "-" {
        let mut data = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut data)
            .context("Failed to read document from stdin")?;
        data
    } else {
        fs::read(input_path)
            .with_context(|| format!("Failed to read {}", input_path.display()))?
    };

    log::debug!("Read {} bytes from {}", data.len(), input_path.display());

    Ok(data)
}

/// Display name used in log lines.
pub fn input_name(input_path: &Path) -> String {
    if input_path.as_os_str() == "-" {
        "<stdin>".to_string()
    } else {
        input_path.display().to_string()
    }
}
