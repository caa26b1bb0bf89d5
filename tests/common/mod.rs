#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use async_trait::async_trait;
use image::DynamicImage;
use tokio_util::sync::CancellationToken;

use thumbkit_lib::classify::{Classifier, InferClassifier};
use thumbkit_lib::external::{Backends, DocumentConverter, FrameExtractor, PdfBackend};
use thumbkit_lib::persist::Persister;
use thumbkit_lib::types::OutputFormat;
use thumbkit_lib::{GenerationError, Settings, ThumbnailService};

/// 常に失敗するフレーム抽出（呼び出し回数を記録）
#[derive(Default)]
pub struct FailingFrames {
    pub calls: AtomicU32,
}

impl FailingFrames {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameExtractor for FailingFrames {
    async fn extract_frame(
        &self,
        _input: &Path,
        _output: &Path,
        _cancel: &CancellationToken,
    ) -> Result<(), GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GenerationError::Process("ffmpeg exited with status 1".to_string()))
    }
}

/// 暗号化され、空パスワードでも描画・抽出できない PDF
pub struct LockedPdf;

#[async_trait]
impl PdfBackend for LockedPdf {
    async fn is_encrypted(&self, _path: &Path, _cancel: &CancellationToken) -> Result<bool, GenerationError> {
        Ok(true)
    }

    async fn render_page(
        &self,
        _path: &Path,
        _page_index: u32,
        _dpi: u32,
        _password: Option<&str>,
        _cancel: &CancellationToken,
    ) -> Result<DynamicImage, GenerationError> {
        Err(GenerationError::Process("pdftoppm: Incorrect password".to_string()))
    }

    async fn extract_text(
        &self,
        _path: &Path,
        _password: Option<&str>,
        _cancel: &CancellationToken,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::InvalidPassword("Incorrect password".to_string()))
    }
}

/// 1 ページ目を単色で返す PDF
pub struct PlainPdf;

#[async_trait]
impl PdfBackend for PlainPdf {
    async fn is_encrypted(&self, _path: &Path, _cancel: &CancellationToken) -> Result<bool, GenerationError> {
        Ok(false)
    }

    async fn render_page(
        &self,
        _path: &Path,
        _page_index: u32,
        _dpi: u32,
        _password: Option<&str>,
        _cancel: &CancellationToken,
    ) -> Result<DynamicImage, GenerationError> {
        Ok(DynamicImage::new_rgb8(1240, 1754))
    }

    async fn extract_text(
        &self,
        _path: &Path,
        _password: Option<&str>,
        _cancel: &CancellationToken,
    ) -> Result<String, GenerationError> {
        Ok(String::new())
    }
}

/// 出力ディレクトリに空の PDF を置くだけの変換
#[derive(Default)]
pub struct StubConverter {
    pub calls: AtomicU32,
}

#[async_trait]
impl DocumentConverter for StubConverter {
    async fn convert_to_pdf(
        &self,
        input: &Path,
        out_dir: &Path,
        _cancel: &CancellationToken,
    ) -> Result<PathBuf, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let stem = input.file_stem().unwrap_or_default().to_string_lossy().to_string();
        let output = out_dir.join(format!("{}.pdf", stem));
        fs::write(&output, b"%PDF-1.4\n")?;
        Ok(output)
    }
}

/// 判定結果を固定する
pub struct FixedClassifier(pub &'static str);

impl Classifier for FixedClassifier {
    fn classify(&self, _path: &Path) -> std::io::Result<String> {
        Ok(self.0.to_string())
    }
}

/// 判定が常に権限エラーになる
pub struct DeniedClassifier;

impl Classifier for DeniedClassifier {
    fn classify(&self, _path: &Path) -> std::io::Result<String> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"))
    }
}

pub fn backends() -> Backends {
    Backends {
        classifier: Arc::new(InferClassifier),
        pdf: Arc::new(PlainPdf),
        frames: Arc::new(FailingFrames::default()),
        converter: Arc::new(StubConverter::default()),
    }
}

pub fn service(settings: Settings) -> ThumbnailService {
    ThumbnailService::with_backends(settings, backends())
}

/// 同名ファイルを別ディレクトリで保存したときのバイト列
pub fn persisted_bytes(settings: &Settings, image: &DynamicImage, file_name: &str, format: OutputFormat) -> Vec<u8> {
    let dir = tempfile::TempDir::new().unwrap();
    let persister = Persister::new(settings.dimensions(), settings.jpeg_quality);
    let output = persister
        .persist(image, &dir.path().join(file_name), format)
        .unwrap();
    fs::read(output).unwrap()
}

pub fn thumbnails_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with("thumb_"))
        .collect();
    names.sort();
    names
}
