use std::io;
use std::path::Path;

use crate::constants::{MIME_CSV, MIME_OCTET_STREAM};

/// コンテンツタイプ判定（外部のスニッフィング結果をそのまま採用）
pub trait Classifier: Send + Sync {
    fn classify(&self, path: &Path) -> io::Result<String>;
}

/// マジックバイト判定（infer）＋拡張子フォールバック
#[derive(Debug, Default, Clone, Copy)]
pub struct InferClassifier;

impl Classifier for InferClassifier {
    fn classify(&self, path: &Path) -> io::Result<String> {
        // 1. マジックバイト
        if let Some(kind) = infer::get_from_path(path)? {
            return Ok(kind.mime_type().to_string());
        }

        // 2. マジックバイトを持たないテキスト系は拡張子で判定
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if let Some(mime) = mime_from_extension(&ext) {
            return Ok(mime.to_string());
        }

        Ok(MIME_OCTET_STREAM.to_string())
    }
}

fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "csv" => Some(MIME_CSV),
        "tsv" => Some("text/tab-separated-values"),
        "txt" | "log" => Some("text/plain"),
        "md" | "markdown" => Some("text/markdown"),
        "json" => Some("application/json"),
        "xml" => Some("application/xml"),
        "html" | "htm" => Some("text/html"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn classify_bytes(name: &str, data: &[u8]) -> String {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, data).unwrap();
        InferClassifier.classify(&path).unwrap()
    }

    #[test]
    fn test_magic_bytes_win_over_extension() {
        let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(classify_bytes("not_really.txt", &png_magic), "image/png");
    }

    #[test]
    fn test_pdf_magic() {
        assert_eq!(classify_bytes("doc.bin", b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n"), "application/pdf");
    }

    #[test]
    fn test_csv_by_extension() {
        assert_eq!(classify_bytes("data.csv", b"a,b,c\n1,2,3\n"), MIME_CSV);
    }

    #[test]
    fn test_unknown_is_octet_stream() {
        assert_eq!(classify_bytes("blob.xyz", b"just some words"), MIME_OCTET_STREAM);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(InferClassifier.classify(&dir.path().join("missing")).is_err());
    }
}
