use std::path::Path;
use std::time::Duration;
use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::process::{ensure_success, run_command};
use crate::constants::VIDEO_FRAME_TIMESTAMP;
use crate::error::GenerationError;

/// 動画から1フレームを画像ファイルとして取り出す
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    async fn extract_frame(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), GenerationError>;
}

/// ffmpeg -i <input> -ss 00:00:01.000 -vframes 1 <output>
pub struct FfmpegFrameExtractor {
    program: String,
    timeout: Duration,
}

impl FfmpegFrameExtractor {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn extract_frame(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), GenerationError> {
        let result = run_command(
            Command::new(&self.program)
                .arg("-i")
                .arg(input)
                .arg("-ss")
                .arg(VIDEO_FRAME_TIMESTAMP)
                .arg("-vframes")
                .arg("1")
                .arg(output),
            self.timeout,
            cancel,
        )
        .await?;
        ensure_success(&self.program, &result)?;

        // 終了コードが 0 でも出力がなければ失敗
        if !output.exists() {
            return Err(GenerationError::Process(format!(
                "{} がフレームを出力しませんでした: {}",
                self.program,
                output.display()
            )));
        }
        Ok(())
    }
}
