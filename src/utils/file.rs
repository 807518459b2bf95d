//! File utilities for ingestion.

use std::fs;
use std::io::Read;
use std::path::Path;

/// Check if a file is likely a text file.
///
/// Known binary extensions are rejected outright; anything else is sniffed
/// for NUL bytes in its first 512 bytes.
pub fn is_text_file(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        let ext = ext.to_string_lossy().to_lowercase();
        if is_binary_extension(&ext) {
            return false;
        }
        if is_text_extension(&ext) {
            return true;
        }
    }

    let Ok(file) = fs::File::open(path) else {
        return false;
    };
    let mut buffer = [0u8; 512];
    let mut reader = std::io::BufReader::new(file);
    match reader.read(&mut buffer) {
        Ok(n) => !buffer[..n].contains(&0),
        Err(_) => false,
    }
}

/// Read a file as text, refusing files over `max_size` bytes.
///
/// Bytes that are not valid UTF-8 are decoded as Windows-1252. When they
/// also use a byte Windows-1252 leaves undefined, decoding falls back to
/// UTF-8 with replacement characters.
pub fn read_text_file(path: &Path, max_size: u64) -> std::io::Result<String> {
    let metadata = fs::metadata(path)?;

    if metadata.len() > max_size {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "file exceeds maximum size: {} > {}",
                metadata.len(),
                max_size
            ),
        ));
    }

    let bytes = fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => decode_legacy(e.as_bytes()),
    })
}

fn decode_legacy(bytes: &[u8]) -> String {
    if bytes.iter().any(|b| matches!(b, 0x81 | 0x8D | 0x8F | 0x90 | 0x9D)) {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    encoding_rs::WINDOWS_1252
        .decode_without_bom_handling(bytes)
        .0
        .into_owned()
}

fn is_binary_extension(ext: &str) -> bool {
    matches!(
        ext,
        "exe"
            | "dll"
            | "so"
            | "dylib"
            | "o"
            | "png"
            | "jpg"
            | "jpeg"
            | "gif"
            | "bmp"
            | "ico"
            | "webp"
            | "mp3"
            | "mp4"
            | "wav"
            | "zip"
            | "tar"
            | "gz"
            | "7z"
            | "pdf"
            | "doc"
            | "docx"
            | "xls"
            | "xlsx"
            | "ppt"
            | "pptx"
            | "sqlite"
            | "db"
            | "bin"
            | "onnx"
    )
}

fn is_text_extension(ext: &str) -> bool {
    matches!(
        ext,
        "txt" | "text" | "md" | "markdown" | "rst" | "adoc" | "org" | "csv" | "tsv" | "log"
            | "html" | "htm" | "xml" | "json" | "yaml" | "yml" | "toml"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_is_binary_extension() {
        assert!(is_binary_extension("pdf"));
        assert!(is_binary_extension("png"));
        assert!(!is_binary_extension("md"));
    }

    #[test]
    fn test_is_text_file_by_extension() {
        assert!(is_text_file(&PathBuf::from("notes.md")));
        assert!(!is_text_file(&PathBuf::from("scan.pdf")));
    }

    #[test]
    fn test_is_text_file_sniffs_content() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("README");
        let binary = dir.path().join("blob");
        fs::write(&text, "hello").unwrap();
        fs::write(&binary, [0x7f, b'E', b'L', b'F', 0, 0, 1]).unwrap();
        assert!(is_text_file(&text));
        assert!(!is_text_file(&binary));
    }

    #[test]
    fn test_read_text_file_size_limit_and_windows_1252() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        fs::write(&path, [b'c', b'a', b'f', 0xE9, b' ', 0x93, b'o', b'k', 0x94]).unwrap();

        let text = read_text_file(&path, 1024).unwrap();
        assert_eq!(text, "café \u{201C}ok\u{201D}");

        assert!(read_text_file(&path, 2).is_err());
    }

    #[test]
    fn test_read_text_file_undefined_windows_1252_byte_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.txt");
        fs::write(&path, [b'c', b'a', b'f', 0xE9, 0x81]).unwrap();

        let text = read_text_file(&path, 1024).unwrap();
        assert!(text.starts_with("caf"));
        assert!(text.contains('\u{FFFD}'));
        assert!(!text.contains('é'));
    }

    #[test]
    fn test_read_text_file_valid_utf8_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("utf8.txt");
        fs::write(&path, "naïve café").unwrap();
        assert_eq!(read_text_file(&path, 1024).unwrap(), "naïve café");
    }
}
