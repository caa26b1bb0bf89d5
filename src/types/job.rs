use std::fmt;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};

use crate::strategy::Strategy;
use crate::types::{OutputFormat, SourceFile};

/// 1ファイル分の生成ジョブ（並行呼び出し間で共有しない）
#[derive(Debug, Clone)]
pub struct ThumbnailJob {
    pub source: SourceFile,
    pub strategy: Strategy,
    pub output_format: Option<OutputFormat>,
    pub attempts: u32,
}

impl ThumbnailJob {
    pub fn new(source: SourceFile, strategy: Strategy) -> Self {
        Self {
            source,
            strategy,
            output_format: None,
            attempts: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailStatus {
    /// 第一戦略で生成
    Success,
    /// フォールバック（テキスト・プレースホルダー）で生成
    Degraded,
    /// サイズ超過で出力なし
    Rejected,
    /// デフォルト生成も失敗、またはキャンセル
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    SizeLimitExceeded,
    UnreadableContent,
    ProcessFailure,
    EncryptedContent,
    UnsupportedType,
    Cancelled,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
}

impl FailureReason {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// ジョブの最終結果（1ジョブにつき必ず1つ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailResult {
    pub source: PathBuf,
    pub status: ThumbnailStatus,
    pub strategy: Option<Strategy>,
    pub attempts: u32,
    pub output_path: Option<PathBuf>,
    pub failure: Option<FailureReason>,
}

impl ThumbnailResult {
    pub fn written(job: &ThumbnailJob, output_path: PathBuf, degraded: bool) -> Self {
        Self {
            source: job.source.path.clone(),
            status: if degraded {
                ThumbnailStatus::Degraded
            } else {
                ThumbnailStatus::Success
            },
            strategy: Some(job.strategy),
            attempts: job.attempts,
            output_path: Some(output_path),
            failure: None,
        }
    }

    pub fn rejected(source: PathBuf, reason: FailureReason) -> Self {
        Self {
            source,
            status: ThumbnailStatus::Rejected,
            strategy: None,
            attempts: 0,
            output_path: None,
            failure: Some(reason),
        }
    }

    pub fn failed(job: &ThumbnailJob, reason: FailureReason) -> Self {
        Self {
            source: job.source.path.clone(),
            status: ThumbnailStatus::Failed,
            strategy: Some(job.strategy),
            attempts: job.attempts,
            output_path: None,
            failure: Some(reason),
        }
    }

    /// 失敗理由を記録（Degraded の原因など）
    pub fn with_failure(mut self, reason: FailureReason) -> Self {
        self.failure = Some(reason);
        self
    }

    pub fn is_written(&self) -> bool {
        self.output_path.is_some()
    }
}
