use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

// 分類済みの入力ファイル情報（分類後は読み取り専用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub size: u64,
    pub content_type: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, size: u64, content_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size,
            content_type: content_type.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ファイル名（表示用）
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    /// 小文字化した拡張子（なければ空文字）
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
    }
}
