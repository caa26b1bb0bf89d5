use std::sync::Arc;
use async_trait::async_trait;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::Generator;
use crate::error::GenerationError;
use crate::external::FrameExtractor;
use crate::image_utils::{fit_to_canvas, validate_dimensions};
use crate::strategy::Strategy;
use crate::types::{Dimensions, OutputFormat, PreviewContent, SourceFile};

/// 動画の 1 秒地点のフレームを JPEG プレビューにする
pub struct VideoGenerator {
    frames: Arc<dyn FrameExtractor>,
    canvas: Dimensions,
}

impl VideoGenerator {
    pub fn new(frames: Arc<dyn FrameExtractor>, canvas: Dimensions) -> Self {
        Self { frames, canvas }
    }
}

#[async_trait]
impl Generator for VideoGenerator {
    fn strategy(&self) -> Strategy {
        Strategy::Video
    }

    async fn generate(
        &self,
        source: &SourceFile,
        cancel: &CancellationToken,
    ) -> Result<PreviewContent, GenerationError> {
        // 中間フレームは TempDir ごと破棄される
        let work_dir = TempDir::new()?;
        let frame_path = work_dir.path().join("frame.jpg");

        self.frames
            .extract_frame(&source.path, &frame_path, cancel)
            .await?;
        if !frame_path.exists() {
            return Err(GenerationError::Process(format!(
                "フレームが出力されませんでした: {}",
                source.path.display()
            )));
        }
        debug!(frame = %frame_path.display(), "フレーム抽出完了");

        let canvas = self.canvas;
        let image = tokio::task::spawn_blocking(move || {
            let img = image::open(&frame_path)
                .map_err(|e| GenerationError::Unreadable(format!("フレーム読み込みエラー: {}", e)))?;
            validate_dimensions(img.width(), img.height())?;
            drop(work_dir);
            Ok::<_, GenerationError>(fit_to_canvas(img, canvas))
        })
        .await??;

        Ok(PreviewContent::rendered(image, OutputFormat::Jpeg))
    }
}
