//! サムネイル生成パイプライン
//!
//! 判定 → 戦略選択 → 生成（再試行あり）→ 保存。第一戦略が尽きたら
//! デフォルト生成器で 1 回だけ作り直す。

mod default;
mod image;
mod office;
mod pdf;
mod psd;
mod spreadsheet;
mod video;

pub use self::default::DefaultGenerator;
pub use self::image::ImageGenerator;
pub use self::office::{OfficeConvertGenerator, OfficeDirectGenerator};
pub use self::pdf::PdfGenerator;
pub use self::spreadsheet::{read_preview_lines, sanitize_line, SpreadsheetGenerator};
pub use self::video::VideoGenerator;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::classify::Classifier;
use crate::config::{OfficeMode, Settings};
use crate::constants::MIME_OCTET_STREAM;
use crate::error::GenerationError;
use crate::external::Backends;
use crate::persist::Persister;
use crate::strategy::Strategy;
use crate::types::{
    FailureKind, FailureReason, PreviewContent, SourceFile, ThumbnailJob, ThumbnailResult,
};

/// 戦略ごとのプレビュー生成器
///
/// 実装はメモリ上のラスターを返すだけで、ファイルには書かない。
#[async_trait]
pub trait Generator: Send + Sync {
    fn strategy(&self) -> Strategy;

    async fn generate(
        &self,
        source: &SourceFile,
        cancel: &CancellationToken,
    ) -> Result<PreviewContent, GenerationError>;
}

/// 戦略 → 生成器の対応表（全戦略を網羅）
pub struct GeneratorSet {
    image: ImageGenerator,
    video: VideoGenerator,
    pdf: Arc<PdfGenerator>,
    office: Box<dyn Generator>,
    spreadsheet: SpreadsheetGenerator,
    default: DefaultGenerator,
}

impl GeneratorSet {
    pub fn new(settings: &Settings, backends: &Backends) -> Self {
        let canvas = settings.dimensions();
        let pdf = Arc::new(PdfGenerator::new(Arc::clone(&backends.pdf), canvas));

        let office: Box<dyn Generator> = match settings.office_mode {
            OfficeMode::Direct => Box::new(OfficeDirectGenerator::new(canvas)),
            OfficeMode::Convert => Box::new(OfficeConvertGenerator::new(
                Arc::clone(&backends.converter),
                Arc::clone(&pdf),
                canvas,
            )),
        };

        Self {
            image: ImageGenerator::new(canvas),
            video: VideoGenerator::new(Arc::clone(&backends.frames), canvas),
            pdf,
            office,
            spreadsheet: SpreadsheetGenerator::new(canvas),
            default: DefaultGenerator::new(canvas),
        }
    }

    pub fn get(&self, strategy: Strategy) -> &dyn Generator {
        match strategy {
            Strategy::Image => &self.image,
            Strategy::Video => &self.video,
            Strategy::Pdf => self.pdf.as_ref(),
            Strategy::OfficeDocument => self.office.as_ref(),
            Strategy::Spreadsheet => &self.spreadsheet,
            Strategy::Default => &self.default,
        }
    }
}

/// 1 ファイル分の生成を担当（共有状態は持たない）
pub struct ThumbnailPipeline {
    classifier: Arc<dyn Classifier>,
    generators: GeneratorSet,
    persister: Arc<Persister>,
    max_attempts: u32,
    max_file_size: u64,
}

impl ThumbnailPipeline {
    pub fn new(settings: &Settings, backends: &Backends) -> Self {
        Self {
            classifier: Arc::clone(&backends.classifier),
            generators: GeneratorSet::new(settings, backends),
            persister: Arc::new(Persister::new(settings.dimensions(), settings.jpeg_quality)),
            max_attempts: settings.max_attempts.max(1),
            max_file_size: settings.max_file_size,
        }
    }

    pub async fn classify(&self, path: &Path) -> io::Result<String> {
        let classifier = Arc::clone(&self.classifier);
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || classifier.classify(&path))
            .await
            .map_err(io::Error::other)?
    }

    /// 1 ファイルのサムネイルを生成して保存する
    ///
    /// 必ず結果を 1 つ返す。エラーは結果の `failure` に記録される。
    pub async fn generate_thumbnail(
        &self,
        path: &Path,
        size: u64,
        cancel: &CancellationToken,
    ) -> ThumbnailResult {
        if size > self.max_file_size {
            info!(path = %path.display(), size, limit = self.max_file_size, "サイズ上限超過のためスキップ");
            return ThumbnailResult::rejected(
                path.to_path_buf(),
                FailureReason::new(
                    FailureKind::SizeLimitExceeded,
                    format!("{} バイト（上限 {} バイト）", size, self.max_file_size),
                ),
            );
        }

        let content_type = match self.classify(path).await {
            Ok(content_type) => content_type,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "コンテンツタイプ判定に失敗、デフォルト生成");
                let mut job = ThumbnailJob::new(
                    SourceFile::new(path, size, MIME_OCTET_STREAM),
                    Strategy::Default,
                );
                let reason = FailureReason::new(FailureKind::UnreadableContent, e.to_string());
                return self.degrade(&mut job, reason, cancel).await;
            }
        };
        let strategy = Strategy::select(&content_type);
        debug!(path = %path.display(), %content_type, %strategy, "戦略選択");

        let mut job = ThumbnailJob::new(SourceFile::new(path, size, content_type), strategy);
        let generator = self.generators.get(strategy);

        let last_error = loop {
            job.attempts += 1;
            match self.attempt(generator, &mut job, cancel).await {
                Ok((output, degraded)) => {
                    info!(
                        path = %path.display(),
                        output = %output.display(),
                        %strategy,
                        attempts = job.attempts,
                        "サムネイル生成完了"
                    );
                    return ThumbnailResult::written(&job, output, degraded);
                }
                Err(GenerationError::Cancelled) => {
                    return ThumbnailResult::failed(&job, FailureReason::from(&GenerationError::Cancelled));
                }
                Err(e) if e.is_retryable() && job.attempts < self.max_attempts => {
                    warn!(path = %path.display(), %strategy, attempt = job.attempts, error = %e, "生成失敗、再試行");
                }
                Err(e) => break e,
            }
        };

        let reason = FailureReason::from(&last_error);
        if strategy == Strategy::Default {
            error!(path = %path.display(), error = %last_error, "デフォルト生成にも失敗");
            return ThumbnailResult::failed(&job, reason);
        }

        warn!(path = %path.display(), %strategy, error = %last_error, "デフォルト生成にフォールバック");
        self.degrade(&mut job, reason, cancel).await
    }

    // 生成 → 保存。成功時は出力パスと劣化フラグを返す
    async fn attempt(
        &self,
        generator: &dyn Generator,
        job: &mut ThumbnailJob,
        cancel: &CancellationToken,
    ) -> Result<(PathBuf, bool), GenerationError> {
        if cancel.is_cancelled() {
            return Err(GenerationError::Cancelled);
        }
        let preview = generator.generate(&job.source, cancel).await?;
        if cancel.is_cancelled() {
            return Err(GenerationError::Cancelled);
        }

        let PreviewContent {
            image,
            format,
            degraded,
            ..
        } = preview;
        job.output_format = Some(format);

        let persister = Arc::clone(&self.persister);
        let source = job.source.path.clone();
        let output =
            tokio::task::spawn_blocking(move || persister.persist(&image, &source, format)).await??;
        Ok((output, degraded))
    }

    async fn degrade(
        &self,
        job: &mut ThumbnailJob,
        reason: FailureReason,
        cancel: &CancellationToken,
    ) -> ThumbnailResult {
        let default = self.generators.get(Strategy::Default);
        match self.attempt(default, job, cancel).await {
            Ok((output, _)) => ThumbnailResult::written(job, output, true).with_failure(reason),
            Err(e) => {
                error!(path = %job.source.path.display(), error = %e, "デフォルト生成にも失敗");
                ThumbnailResult::failed(job, FailureReason::from(&e))
            }
        }
    }
}
