use std::path::Path;
use std::sync::Arc;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::Generator;
use crate::constants::{ELLIPSIS, PASSWORD_PROTECTED_TEXT, PDF_RENDER_DPI, PDF_TEXT_PREVIEW_CHARS};
use crate::error::GenerationError;
use crate::external::PdfBackend;
use crate::image_utils::fit_to_canvas;
use crate::render::render_text_preview;
use crate::strategy::Strategy;
use crate::types::{Dimensions, OutputFormat, PreviewContent, PreviewKind, SourceFile};

/// PDF の 1 ページ目を描画する
///
/// 暗号化 PDF は空パスワードで描画を試み、だめならテキスト抽出、
/// それも拒否されたらパスワード保護プレースホルダーにする。
pub struct PdfGenerator {
    backend: Arc<dyn PdfBackend>,
    canvas: Dimensions,
}

impl PdfGenerator {
    pub fn new(backend: Arc<dyn PdfBackend>, canvas: Dimensions) -> Self {
        Self { backend, canvas }
    }

    /// Office 変換後の PDF からも呼ばれる
    pub async fn render_document(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<PreviewContent, GenerationError> {
        let encrypted = match self.backend.is_encrypted(path, cancel).await {
            Ok(encrypted) => encrypted,
            Err(GenerationError::InvalidPassword(message)) => {
                debug!(path = %path.display(), %message, "パスワードなしで開けない PDF");
                return Ok(self.password_placeholder());
            }
            Err(e) => return Err(e),
        };

        if !encrypted {
            let page = self
                .backend
                .render_page(path, 0, PDF_RENDER_DPI, None, cancel)
                .await?;
            return Ok(self.page_preview(page));
        }

        match self
            .backend
            .render_page(path, 0, PDF_RENDER_DPI, Some(""), cancel)
            .await
        {
            Ok(page) => return Ok(self.page_preview(page)),
            Err(GenerationError::Cancelled) => return Err(GenerationError::Cancelled),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "暗号化 PDF の描画に失敗、テキスト抽出を試行");
            }
        }

        match self.backend.extract_text(path, Some(""), cancel).await {
            Ok(text) => {
                let text = preview_excerpt(&text);
                let image = render_text_preview(&text, self.canvas);
                Ok(PreviewContent::synthetic(image, PreviewKind::Text { text }).into_degraded())
            }
            Err(GenerationError::InvalidPassword(_)) => Ok(self.password_placeholder()),
            Err(e) => Err(e),
        }
    }

    fn page_preview(&self, page: image::DynamicImage) -> PreviewContent {
        PreviewContent::rendered(fit_to_canvas(page, self.canvas), OutputFormat::Jpeg)
    }

    fn password_placeholder(&self) -> PreviewContent {
        let image = render_text_preview(PASSWORD_PROTECTED_TEXT, self.canvas);
        PreviewContent::synthetic(
            image,
            PreviewKind::Text {
                text: PASSWORD_PROTECTED_TEXT.to_string(),
            },
        )
        .into_degraded()
    }
}

#[async_trait]
impl Generator for PdfGenerator {
    fn strategy(&self) -> Strategy {
        Strategy::Pdf
    }

    async fn generate(
        &self,
        source: &SourceFile,
        cancel: &CancellationToken,
    ) -> Result<PreviewContent, GenerationError> {
        self.render_document(&source.path, cancel).await
    }
}

// 先頭 200 文字、超える場合は "..." を付ける
fn preview_excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let excerpt: String = chars.by_ref().take(PDF_TEXT_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        excerpt + ELLIPSIS
    } else {
        excerpt
    }
}
