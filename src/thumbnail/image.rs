use std::fs;
use std::path::Path;
use async_trait::async_trait;
use image::{DynamicImage, ImageReader};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::psd::decode_psd;
use super::Generator;
use crate::constants::MIME_PSD;
use crate::error::GenerationError;
use crate::image_utils::{fit_to_canvas, output_format_for_extension, validate_dimensions};
use crate::strategy::Strategy;
use crate::types::{Dimensions, PreviewContent, SourceFile};

/// 画像ファイルをデコードしてキャンバスに収める
pub struct ImageGenerator {
    canvas: Dimensions,
}

impl ImageGenerator {
    pub fn new(canvas: Dimensions) -> Self {
        Self { canvas }
    }
}

#[async_trait]
impl Generator for ImageGenerator {
    fn strategy(&self) -> Strategy {
        Strategy::Image
    }

    async fn generate(
        &self,
        source: &SourceFile,
        _cancel: &CancellationToken,
    ) -> Result<PreviewContent, GenerationError> {
        let path = source.path.clone();
        let is_psd = source.content_type == MIME_PSD || source.extension() == "psd";
        let canvas = self.canvas;
        // 出力形式は拡張子のみで決める
        let format = output_format_for_extension(&source.extension());

        let image = tokio::task::spawn_blocking(move || decode_image(&path, is_psd, canvas)).await??;
        Ok(PreviewContent::rendered(image, format))
    }
}

fn decode_image(path: &Path, is_psd: bool, canvas: Dimensions) -> Result<DynamicImage, GenerationError> {
    debug!(path = %path.display(), "画像読み込み");

    let img = if is_psd {
        let data = fs::read(path)?;
        decode_psd(&data, canvas)?
    } else {
        ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| GenerationError::Unreadable(format!("画像読み込みエラー: {}", e)))?
    };

    validate_dimensions(img.width(), img.height())?;
    debug!(width = img.width(), height = img.height(), "元画像サイズ");

    Ok(fit_to_canvas(img, canvas))
}
