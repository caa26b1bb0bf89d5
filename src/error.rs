use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::{FailureKind, FailureReason};

/// 1ファイル分の生成・保存で発生するエラー
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("読み込めないコンテンツ: {0}")]
    Unreadable(String),

    /// 終了コード異常・出力ファイルなし・タイムアウト
    #[error("外部プロセス失敗: {0}")]
    Process(String),

    #[error("パスワードが一致しません: {0}")]
    InvalidPassword(String),

    #[error("サポートされていないファイル形式: {0}")]
    Unsupported(String),

    #[error("処理がキャンセルされました")]
    Cancelled,

    #[error("内部エラー: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl GenerationError {
    /// 生成器が報告した失敗のみ再試行対象
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unreadable(_)
                | Self::Process(_)
                | Self::InvalidPassword(_)
                | Self::Io(_)
                | Self::Image(_)
        )
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unreadable(_) | Self::Image(_) | Self::Io(_) => FailureKind::UnreadableContent,
            Self::Process(_) => FailureKind::ProcessFailure,
            Self::InvalidPassword(_) => FailureKind::EncryptedContent,
            Self::Unsupported(_) => FailureKind::UnsupportedType,
            Self::Cancelled => FailureKind::Cancelled,
            Self::Internal(_) => FailureKind::Internal,
        }
    }
}

impl From<&GenerationError> for FailureReason {
    fn from(err: &GenerationError) -> Self {
        FailureReason::new(err.kind(), err.to_string())
    }
}

impl From<tokio::task::JoinError> for GenerationError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("ブロッキングタスク異常終了: {}", err))
    }
}

/// `process_path` 呼び出し単位のエラー
#[derive(Debug, Error)]
pub enum Error {
    #[error("パスが存在しません: {}", .0.display())]
    NotFound(PathBuf),

    #[error("ディレクトリ処理に失敗しました（{attempts}回試行）: {}: {message}", path.display())]
    Directory {
        path: PathBuf,
        attempts: u32,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(GenerationError::Unreadable("x".into()).is_retryable());
        assert!(GenerationError::Process("exit 1".into()).is_retryable());
        assert!(!GenerationError::Unsupported("x".into()).is_retryable());
        assert!(!GenerationError::Internal("panic".into()).is_retryable());
        assert!(!GenerationError::Cancelled.is_retryable());
    }

    #[test]
    fn test_failure_reason_from_error() {
        let reason = FailureReason::from(&GenerationError::Process("timeout".into()));
        assert_eq!(reason.kind, FailureKind::ProcessFailure);
        assert!(reason.message.contains("timeout"));
    }
}
