//! Reading source files as text.
//!
//! Both the content sniffer and the conversion pipeline go through here, so
//! binary detection and decoding behave the same everywhere.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{ConverterError, Result};

/// Bytes inspected when deciding whether content is binary.
const BINARY_SAMPLE_SIZE: usize = 8192;

/// Check if content appears to be binary.
pub fn is_binary_content(content: &[u8]) -> bool {
    let sample = &content[..content.len().min(BINARY_SAMPLE_SIZE)];

    // Null bytes are a strong indicator
    if sample.contains(&0) {
        return true;
    }

    let non_printable = sample
        .iter()
        .filter(|&&b| b < 32 && !matches!(b, 9 | 10 | 12 | 13))
        .count();

    !sample.is_empty() && (non_printable as f64 / sample.len() as f64) > 0.1
}

/// Normalize line endings to Unix-style (LF).
pub fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

/// DOS end-of-file marker (Ctrl-Z) that old editors leave at the end of text files.
const DOS_EOF: u8 = 0x1a;

/// Drop trailing DOS end-of-file markers.
fn trim_dos_eof(bytes: &mut Vec<u8>) {
    while bytes.last() == Some(&DOS_EOF) {
        bytes.pop();
    }
}

/// Decode file bytes as UTF-8 text with LF line endings, rejecting binary content.
pub fn decode_source(path: &Path, mut bytes: Vec<u8>) -> Result<String> {
    trim_dos_eof(&mut bytes);
    if is_binary_content(&bytes) {
        return Err(ConverterError::NotText(path.to_path_buf()));
    }
    let text = String::from_utf8(bytes)
        .map_err(|_| ConverterError::NotText(path.to_path_buf()))?;
    Ok(normalize_line_endings(&text))
}

/// Read a whole file as text.
pub fn read_source_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| ConverterError::io(path, e))?;
    decode_source(path, bytes)
}

/// Read at most `max_lines` lines from the start of a file.
///
/// Stops early at end of file. The lines read are checked as one sample, the
/// same way [`decode_source`] checks a whole file. Fails if the file cannot be
/// opened, or the sample looks binary or is not valid UTF-8.
pub fn read_leading_lines(path: &Path, max_lines: usize) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| ConverterError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut sample = Vec::new();
    let mut count = 0;

    while count < max_lines {
        let read = reader
            .read_until(b'\n', &mut sample)
            .map_err(|e| ConverterError::io(path, e))?;
        if read == 0 {
            break;
        }
        count += 1;
    }

    let text = decode_source(path, sample)?;
    Ok(text.lines().take(max_lines).map(str::to_string).collect())
}
