use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::{debug, warn};

use crate::constants::THUMBNAIL_PREFIX;
use crate::error::GenerationError;
use crate::image_utils::fit_to_canvas;
use crate::types::{Dimensions, OutputFormat};

/// サムネイルを元ファイルと同じディレクトリに保存する
#[derive(Debug, Clone)]
pub struct Persister {
    canvas: Dimensions,
    jpeg_quality: u8,
}

impl Persister {
    pub fn new(canvas: Dimensions, jpeg_quality: u8) -> Self {
        Self {
            canvas,
            jpeg_quality,
        }
    }

    /// 保存先: <元ディレクトリ>/thumb_<ベース名>.<拡張子>
    pub fn output_path(source: &Path, format: OutputFormat) -> PathBuf {
        let file_name = source
            .file_name()
            .unwrap_or_default()
            .to_string_lossy();
        let thumb_name = format!(
            "{}{}.{}",
            THUMBNAIL_PREFIX,
            sanitized_base_name(&file_name),
            format.extension()
        );
        match source.parent() {
            Some(parent) => parent.join(thumb_name),
            None => PathBuf::from(thumb_name),
        }
    }

    /// 保存して出力パスを返す
    ///
    /// 1. リサイズ付きの書き出し → 2. コーデックで直接書き出し →
    /// 3. 非可逆形式なら PNG で再試行。PNG でも失敗したらエラー。
    pub fn persist(
        &self,
        image: &DynamicImage,
        source: &Path,
        format: OutputFormat,
    ) -> Result<PathBuf, GenerationError> {
        let output = Self::output_path(source, format);
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        match self.write_thumbnail(image, &output, format) {
            Ok(()) => {
                debug!(output = %output.display(), "サムネイル保存");
                return Ok(output);
            }
            Err(e) => {
                warn!(output = %output.display(), error = %e, "リサイズ書き出しに失敗、コーデック直接書き出しを試行");
                discard_partial(&output);
            }
        }

        match write_raw(image, &output, format) {
            Ok(()) => Ok(output),
            Err(e) => {
                discard_partial(&output);
                if format.is_lossless() {
                    return Err(e);
                }
                warn!(output = %output.display(), error = %e, "{} での保存に失敗、PNG で再試行", format.extension());
                self.persist(image, source, OutputFormat::Png)
            }
        }
    }

    fn write_thumbnail(
        &self,
        image: &DynamicImage,
        output: &Path,
        format: OutputFormat,
    ) -> Result<(), GenerationError> {
        let fitted = fit_to_canvas(image.clone(), self.canvas);
        let mut writer = BufWriter::new(File::create(output)?);

        match format {
            OutputFormat::Jpeg => {
                // JPEG はアルファ非対応のため RGB に変換
                let rgb = DynamicImage::ImageRgb8(fitted.to_rgb8());
                let encoder = JpegEncoder::new_with_quality(&mut writer, self.jpeg_quality);
                rgb.write_with_encoder(encoder)?;
            }
            OutputFormat::Png => {
                fitted.write_to(&mut writer, format.image_format())?;
            }
        }
        Ok(())
    }
}

// コーデックでそのまま書き出す（変換なし）
fn write_raw(image: &DynamicImage, output: &Path, format: OutputFormat) -> Result<(), GenerationError> {
    image.save_with_format(output, format.image_format())?;
    Ok(())
}

// 書きかけのファイルを消す（ソース 1 つにつき成果物は 1 つ）
fn discard_partial(output: &Path) {
    if !output.is_file() {
        return;
    }
    if let Err(e) = fs::remove_file(output) {
        debug!(output = %output.display(), error = %e, "書きかけファイルの削除に失敗");
    }
}

// 英数字・'.'・'-' 以外を '_' に置換し、最後の拡張子を除く
fn sanitized_base_name(file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    match sanitized.rfind('.') {
        Some(index) if index > 0 => sanitized[..index].to_string(),
        _ => sanitized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn persister() -> Persister {
        Persister::new(Dimensions::new(400, 600), 90)
    }

    #[test]
    fn test_sanitized_base_name() {
        assert_eq!(sanitized_base_name("photo.jpg"), "photo");
        assert_eq!(sanitized_base_name("my report (v2).final.docx"), "my_report__v2_.final");
        assert_eq!(sanitized_base_name(".hidden"), ".hidden");
        assert_eq!(sanitized_base_name("README"), "README");
        assert_eq!(sanitized_base_name("写真.png"), "__");
    }

    #[test]
    fn test_output_path_is_sibling() {
        let path = Persister::output_path(Path::new("/data/in/clip.mp4"), OutputFormat::Jpeg);
        assert_eq!(path, PathBuf::from("/data/in/thumb_clip.jpg"));
        let path = Persister::output_path(Path::new("/data/in/logo.gif"), OutputFormat::Png);
        assert_eq!(path, PathBuf::from("/data/in/thumb_logo.png"));
    }

    #[test]
    fn test_persist_jpeg_fits_canvas() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("wide.bmp");
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(1600, 400, Rgb([10, 120, 200])));

        let output = persister().persist(&image, &source, OutputFormat::Jpeg).unwrap();
        assert_eq!(output, dir.path().join("thumb_wide.jpg"));

        let written = image::open(&output).unwrap();
        assert_eq!((written.width(), written.height()), (400, 100));
    }

    #[test]
    fn test_persist_rgba_as_jpeg() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("alpha.tif");
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 60, Rgba([0, 0, 0, 128])));

        let output = persister().persist(&image, &source, OutputFormat::Jpeg).unwrap();
        assert!(output.exists());
    }

    #[test]
    fn test_persist_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("nested").join("deeper").join("a.png");
        let image = DynamicImage::new_rgb8(10, 10);

        let output = persister().persist(&image, &source, OutputFormat::Png).unwrap();
        assert!(output.exists());
    }

    #[test]
    fn test_persist_overwrites() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.png");
        let p = persister();
        let first = p.persist(&DynamicImage::new_rgb8(10, 10), &source, OutputFormat::Png).unwrap();
        let second = p.persist(&DynamicImage::new_rgb8(20, 10), &source, OutputFormat::Png).unwrap();
        assert_eq!(first, second);
        let written = image::open(&second).unwrap();
        assert_eq!((written.width(), written.height()), (400, 200));
    }

    #[test]
    fn test_unwritable_target_fails_after_png_fallback() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.jpg");
        // 出力先と同名のディレクトリを作って書き込みを失敗させる
        fs::create_dir(dir.path().join("thumb_a.jpg")).unwrap();
        fs::create_dir(dir.path().join("thumb_a.png")).unwrap();

        let result = persister().persist(&DynamicImage::new_rgb8(10, 10), &source, OutputFormat::Jpeg);
        assert!(result.is_err());
    }

    #[test]
    fn test_failed_jpeg_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.jpg");
        // JPEG は 65535px を超える幅を書けないため、作成後に符号化が失敗する
        let wide = Persister::new(Dimensions::new(70_000, 10), 90);
        let image = DynamicImage::new_rgb8(70_000, 10);

        let output = wide.persist(&image, &source, OutputFormat::Jpeg).unwrap();
        assert_eq!(output, dir.path().join("thumb_a.png"));
        assert!(!dir.path().join("thumb_a.jpg").exists());
    }

    #[test]
    fn test_discard_partial_keeps_directories() {
        let dir = TempDir::new().unwrap();
        let partial = dir.path().join("thumb_x.jpg");
        fs::write(&partial, b"\xff\xd8").unwrap();
        discard_partial(&partial);
        assert!(!partial.exists());

        let blocked = dir.path().join("thumb_y.jpg");
        fs::create_dir(&blocked).unwrap();
        discard_partial(&blocked);
        assert!(blocked.is_dir());
    }

    #[test]
    fn test_png_fallback_when_jpeg_target_blocked() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.jpg");
        fs::create_dir(dir.path().join("thumb_a.jpg")).unwrap();

        let output = persister()
            .persist(&DynamicImage::new_rgb8(10, 10), &source, OutputFormat::Jpeg)
            .unwrap();
        assert_eq!(output, dir.path().join("thumb_a.png"));
    }
}
