use std::fmt;
use serde::{Deserialize, Serialize};

use crate::constants::{MIME_PDF, OFFICE_MIME_TYPES, SPREADSHEET_MIME_TYPES};

/// コンテンツタイプごとの生成戦略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Image,
    Video,
    Pdf,
    OfficeDocument,
    Spreadsheet,
    Default,
}

impl Strategy {
    pub const ALL: [Strategy; 6] = [
        Strategy::Image,
        Strategy::Video,
        Strategy::Pdf,
        Strategy::OfficeDocument,
        Strategy::Spreadsheet,
        Strategy::Default,
    ];

    /// 固定の優先順で最初に一致した戦略を返す
    ///
    /// PDF は Office 文書より先に判定する。Office と表計算で重複する
    /// MIME タイプ（xls/xlsx）は Office 側が優先される。
    pub fn select(content_type: &str) -> Self {
        let mime = normalize(content_type);

        if mime.starts_with("image/") {
            Strategy::Image
        } else if mime.starts_with("video/") {
            Strategy::Video
        } else if mime == MIME_PDF {
            Strategy::Pdf
        } else if OFFICE_MIME_TYPES.contains(&mime.as_str()) {
            Strategy::OfficeDocument
        } else if SPREADSHEET_MIME_TYPES.contains(&mime.as_str()) {
            Strategy::Spreadsheet
        } else {
            Strategy::Default
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Image => "image",
            Strategy::Video => "video",
            Strategy::Pdf => "pdf",
            Strategy::OfficeDocument => "office_document",
            Strategy::Spreadsheet => "spreadsheet",
            Strategy::Default => "default",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// パラメータ（; charset=...）を除去して小文字化
fn normalize(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;

    #[test]
    fn test_prefix_rules() {
        assert_eq!(Strategy::select("image/png"), Strategy::Image);
        assert_eq!(Strategy::select("image/vnd.adobe.photoshop"), Strategy::Image);
        assert_eq!(Strategy::select("video/mp4"), Strategy::Video);
    }

    #[test]
    fn test_pdf_before_office() {
        assert_eq!(Strategy::select(MIME_PDF), Strategy::Pdf);
    }

    #[test]
    fn test_office_types() {
        for mime in [MIME_DOC, MIME_DOCX, MIME_PPT, MIME_PPTX] {
            assert_eq!(Strategy::select(mime), Strategy::OfficeDocument, "{mime}");
        }
    }

    #[test]
    fn test_workbooks_match_office_first() {
        assert_eq!(Strategy::select(MIME_XLS), Strategy::OfficeDocument);
        assert_eq!(Strategy::select(MIME_XLSX), Strategy::OfficeDocument);
    }

    #[test]
    fn test_csv_is_spreadsheet() {
        assert_eq!(Strategy::select("text/csv"), Strategy::Spreadsheet);
        assert_eq!(Strategy::select("text/csv; charset=utf-8"), Strategy::Spreadsheet);
    }

    #[test]
    fn test_everything_else_is_default() {
        assert_eq!(Strategy::select("text/plain"), Strategy::Default);
        assert_eq!(Strategy::select(MIME_OCTET_STREAM), Strategy::Default);
        assert_eq!(Strategy::select(""), Strategy::Default);
        // 接頭辞はスラッシュまで一致が必要
        assert_eq!(Strategy::select("imagery"), Strategy::Default);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(Strategy::select("Application/PDF"), Strategy::Pdf);
    }
}
