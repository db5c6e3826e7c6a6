//! File reading with encoding detection and text normalization

use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

/// Outcome of reading a scanned file
#[derive(Debug, Clone)]
pub enum FileContent {
    /// Decoded and normalized text
    Text(String),
    /// File exceeds the configured size cap and was skipped
    TooLarge { size_bytes: u64 },
    /// Bytes could not be represented as text (NUL bytes, decode errors)
    Binary,
}

/// Read a file as text.
///
/// Decoding preference: BOM-declared encoding, then strict UTF-8, then
/// Windows-1252 (which subsumes Latin-1 and never fails on single
/// bytes), finally lossy UTF-8. Files containing NUL bytes are treated
/// as binary.
///
/// # Errors
///
/// Returns the underlying IO error when the file cannot be read at all.
pub fn read_file_content(path: &Path, max_bytes: u64) -> std::io::Result<FileContent> {
    let bytes = std::fs::read(path)?;

    if bytes.len() as u64 > max_bytes {
        return Ok(FileContent::TooLarge {
            size_bytes: bytes.len() as u64,
        });
    }

    if bytes.contains(&0) {
        return Ok(FileContent::Binary);
    }

    let decoded = decode_bytes(&bytes);
    Ok(FileContent::Text(clean_text_content(&decoded)))
}

fn decode_bytes(bytes: &[u8]) -> String {
    if let Some((encoding, bom_length)) = encoding_rs::Encoding::for_bom(bytes) {
        let (decoded, _, malformed) = encoding.decode(bytes.get(bom_length..).unwrap_or(bytes));
        if !malformed {
            return decoded.into_owned();
        }
    }

    if let Ok(utf8) = std::str::from_utf8(bytes) {
        return utf8.to_string();
    }

    let (decoded, _, malformed) = encoding_rs::WINDOWS_1252.decode(bytes);
    if !malformed {
        return decoded.into_owned();
    }

    String::from_utf8_lossy(bytes).into_owned()
}

lazy_static! {
    // Control characters except newline and tab
    static ref CONTROL_CHARS: Regex =
        Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap();
    static ref TRAILING_WS: Regex = Regex::new(r"[ \t]+\n").unwrap();
    static ref EXCESS_NEWLINES: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Normalize decoded text: strip control characters, normalize line
/// endings, drop trailing whitespace, cap blank runs at one empty line.
pub fn clean_text_content(content: &str) -> String {
    let content = CONTROL_CHARS.replace_all(content, "");
    let content = content.replace("\r\n", "\n").replace('\r', "\n");
    let content = TRAILING_WS.replace_all(&content, "\n");
    let content = EXCESS_NEWLINES.replace_all(&content, "\n\n");
    content.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn reads_plain_utf8() {
        let file = write_temp("fn main() {}\n".as_bytes());
        let content = read_file_content(file.path(), 1024).unwrap();
        assert!(matches!(content, FileContent::Text(t) if t == "fn main() {}"));
    }

    #[test]
    fn decodes_utf8_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("x = 1".as_bytes());
        let file = write_temp(&bytes);
        let content = read_file_content(file.path(), 1024).unwrap();
        assert!(matches!(content, FileContent::Text(t) if t == "x = 1"));
    }

    #[test]
    fn decodes_latin1_fallback() {
        // 0xE9 is 'é' in Latin-1/Windows-1252, invalid standalone UTF-8
        let file = write_temp(&[b'c', b'a', b'f', 0xE9]);
        let content = read_file_content(file.path(), 1024).unwrap();
        assert!(matches!(content, FileContent::Text(t) if t == "café"));
    }

    #[test]
    fn nul_bytes_mean_binary() {
        let file = write_temp(&[b'a', 0, b'b']);
        let content = read_file_content(file.path(), 1024).unwrap();
        assert!(matches!(content, FileContent::Binary));
    }

    #[test]
    fn oversize_files_are_skipped() {
        let file = write_temp(&vec![b'a'; 64]);
        let content = read_file_content(file.path(), 16).unwrap();
        assert!(matches!(content, FileContent::TooLarge { size_bytes: 64 }));
    }

    #[test]
    fn cleaning_normalizes_whitespace() {
        let cleaned = clean_text_content("a  \r\nb\r\n\r\n\r\n\r\nc\x07d");
        assert_eq!(cleaned, "a\nb\n\ncd");
    }
}
