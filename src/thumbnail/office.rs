use std::fs;
use std::path::Path;
use std::sync::Arc;
use async_trait::async_trait;
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::pdf::PdfGenerator;
use super::spreadsheet::read_workbook_rows;
use super::Generator;
use crate::constants::{MIME_DOCX, MIME_XLS, MIME_XLSX, NO_TEXT_EXTRACTED};
use crate::error::GenerationError;
use crate::external::DocumentConverter;
use crate::render::{render_text_preview, render_titled_text};
use crate::strategy::Strategy;
use crate::types::{Dimensions, PreviewContent, PreviewKind, SourceFile};

/// 中身を直接読める Office 形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OfficeFormat {
    Docx,
    Xls,
    Xlsx,
    Other,
}

impl OfficeFormat {
    fn of(source: &SourceFile) -> Self {
        match source.content_type.as_str() {
            MIME_DOCX => Self::Docx,
            MIME_XLS => Self::Xls,
            MIME_XLSX => Self::Xlsx,
            _ => Self::Other,
        }
    }
}

/// 段落・セルのテキストをタイトル付きで直接描画する
pub struct OfficeDirectGenerator {
    canvas: Dimensions,
}

impl OfficeDirectGenerator {
    pub fn new(canvas: Dimensions) -> Self {
        Self { canvas }
    }
}

#[async_trait]
impl Generator for OfficeDirectGenerator {
    fn strategy(&self) -> Strategy {
        Strategy::OfficeDocument
    }

    async fn generate(
        &self,
        source: &SourceFile,
        _cancel: &CancellationToken,
    ) -> Result<PreviewContent, GenerationError> {
        let path = source.path.clone();
        let format = OfficeFormat::of(source);
        let canvas = self.canvas;

        match tokio::task::spawn_blocking(move || render_direct(&path, format, canvas)).await? {
            Ok(preview) => Ok(preview),
            Err(e) => {
                warn!(path = %source.path.display(), error = %e, "Office 直接描画に失敗、テキストプレビューを使用");
                text_fallback(source, self.canvas).await
            }
        }
    }
}

/// LibreOffice で PDF に変換し、PDF 生成器で描画する
pub struct OfficeConvertGenerator {
    converter: Arc<dyn DocumentConverter>,
    pdf: Arc<PdfGenerator>,
    canvas: Dimensions,
}

impl OfficeConvertGenerator {
    pub fn new(converter: Arc<dyn DocumentConverter>, pdf: Arc<PdfGenerator>, canvas: Dimensions) -> Self {
        Self { converter, pdf, canvas }
    }

    async fn convert_and_render(
        &self,
        source: &SourceFile,
        cancel: &CancellationToken,
    ) -> Result<PreviewContent, GenerationError> {
        let work_dir = TempDir::new()?;
        let pdf_path = self
            .converter
            .convert_to_pdf(&source.path, work_dir.path(), cancel)
            .await?;
        debug!(pdf = %pdf_path.display(), "PDF 変換完了");

        let preview = self.pdf.render_document(&pdf_path, cancel).await;

        // 中間 PDF は結果に関係なく削除
        if let Err(e) = fs::remove_file(&pdf_path) {
            debug!(pdf = %pdf_path.display(), error = %e, "中間 PDF の削除に失敗");
        }
        preview
    }
}

#[async_trait]
impl Generator for OfficeConvertGenerator {
    fn strategy(&self) -> Strategy {
        Strategy::OfficeDocument
    }

    async fn generate(
        &self,
        source: &SourceFile,
        cancel: &CancellationToken,
    ) -> Result<PreviewContent, GenerationError> {
        match self.convert_and_render(source, cancel).await {
            Ok(preview) => Ok(preview),
            Err(GenerationError::Cancelled) => Err(GenerationError::Cancelled),
            Err(e) => {
                warn!(path = %source.path.display(), error = %e, "PDF 変換に失敗、テキストプレビューを使用");
                text_fallback(source, self.canvas).await
            }
        }
    }
}

fn render_direct(path: &Path, format: OfficeFormat, canvas: Dimensions) -> Result<PreviewContent, GenerationError> {
    let (title, text) = match format {
        OfficeFormat::Docx => ("DOCX Preview", docx_text(path)?),
        OfficeFormat::Xls => ("XLS Preview", workbook_text(path)?),
        OfficeFormat::Xlsx => ("XLSX Preview", workbook_text(path)?),
        OfficeFormat::Other => {
            return Err(GenerationError::Unsupported(format!(
                "直接描画できない Office 形式: {}",
                path.display()
            )))
        }
    };

    let image = render_titled_text(title, &text, canvas);
    Ok(PreviewContent::synthetic(
        image,
        PreviewKind::TitledText {
            title: title.to_string(),
            text,
        },
    ))
}

// 抽出したテキストだけを描画する（失敗時はエラーを返し、上位でデフォルトへ）
async fn text_fallback(source: &SourceFile, canvas: Dimensions) -> Result<PreviewContent, GenerationError> {
    let path = source.path.clone();
    let format = OfficeFormat::of(source);

    tokio::task::spawn_blocking(move || {
        let text = extract_plain_text(&path, format)?;
        let image = render_text_preview(&text, canvas);
        Ok(PreviewContent::synthetic(image, PreviewKind::Text { text }).into_degraded())
    })
    .await?
}

fn extract_plain_text(path: &Path, format: OfficeFormat) -> Result<String, GenerationError> {
    let text = match format {
        OfficeFormat::Docx => docx_text(path)?,
        OfficeFormat::Xls | OfficeFormat::Xlsx => workbook_text(path)?,
        OfficeFormat::Other => String::new(),
    };

    if text.trim().is_empty() {
        Ok(NO_TEXT_EXTRACTED.to_string())
    } else {
        Ok(text)
    }
}

/// 段落ごとに改行で連結
fn docx_text(path: &Path) -> Result<String, GenerationError> {
    let data = fs::read(path)?;
    let docx = docx_rs::read_docx(&data)
        .map_err(|e| GenerationError::Unreadable(format!("DOCX 読み込みエラー: {}", e)))?;

    let mut paragraphs = Vec::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            let mut text = String::new();
            for paragraph_child in &paragraph.children {
                if let ParagraphChild::Run(run) = paragraph_child {
                    for run_child in &run.children {
                        if let RunChild::Text(t) = run_child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            paragraphs.push(text);
        }
    }
    Ok(paragraphs.join("\n"))
}

/// 最初のシートを行ごとに "a, b, c" 形式で連結
fn workbook_text(path: &Path) -> Result<String, GenerationError> {
    let rows = read_workbook_rows(path, None)?;
    Ok(rows
        .iter()
        .map(|row| row.join(", "))
        .collect::<Vec<_>>()
        .join("\n"))
}
