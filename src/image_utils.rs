use image::imageops::FilterType;
use image::DynamicImage;
use crate::constants::{LOSSY_EXTENSIONS, MAX_IMAGE_DIMENSION, MAX_PIXEL_COUNT};
use crate::error::GenerationError;
use crate::types::{Dimensions, OutputFormat};

// 画像サイズ検証（DoS防止）
pub fn validate_dimensions(width: u32, height: u32) -> Result<(), GenerationError> {
    if width == 0 || height == 0 {
        return Err(GenerationError::Unreadable(
            "無効な画像サイズ: 幅または高さが0".to_string(),
        ));
    }
    if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(GenerationError::Unreadable(format!(
            "画像サイズが大きすぎます: {}x{} (最大: {})",
            width, height, MAX_IMAGE_DIMENSION
        )));
    }
    let pixel_count = (width as u64) * (height as u64);
    if pixel_count > MAX_PIXEL_COUNT {
        return Err(GenerationError::Unreadable(format!(
            "ピクセル数が多すぎます: {} (最大: {})",
            pixel_count, MAX_PIXEL_COUNT
        )));
    }
    Ok(())
}

// 拡張子から出力形式を決定（内容は見ない）
pub fn output_format_for_extension(ext: &str) -> OutputFormat {
    if LOSSY_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
        OutputFormat::Jpeg
    } else {
        OutputFormat::Png
    }
}

// アスペクト比を保ったままキャンバス内に収める
pub fn fit_to_canvas(img: DynamicImage, canvas: Dimensions) -> DynamicImage {
    let (width, height) = fitted_size(img.width(), img.height(), canvas);
    if (width, height) == (img.width(), img.height()) {
        return img;
    }

    // Triangle: 高速なリサンプリングフィルタ（サムネイル用途では十分な品質）
    img.resize_exact(width, height, FilterType::Triangle)
}

// 収まる最大サイズ（拡大も含む）
pub fn fitted_size(width: u32, height: u32, canvas: Dimensions) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let width_ratio = canvas.width as f64 / width as f64;
    let height_ratio = canvas.height as f64 / height as f64;
    let ratio = width_ratio.min(height_ratio);

    let fitted_width = ((width as f64 * ratio).round() as u32).clamp(1, canvas.width);
    let fitted_height = ((height as f64 * ratio).round() as u32).clamp(1, canvas.height);
    (fitted_width, fitted_height)
}
