use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::Generator;
use crate::constants::DEFAULT_CAPTION;
use crate::error::GenerationError;
use crate::render::render_placeholder;
use crate::strategy::Strategy;
use crate::types::{Dimensions, PreviewContent, PreviewKind, SourceFile};

/// ファイルアイコンのプレースホルダー（常に成功）
#[derive(Debug, Clone)]
pub struct DefaultGenerator {
    canvas: Dimensions,
}

impl DefaultGenerator {
    pub fn new(canvas: Dimensions) -> Self {
        Self { canvas }
    }

    pub fn render(&self, file_name: &str) -> PreviewContent {
        PreviewContent::synthetic(
            render_placeholder(file_name, self.canvas),
            PreviewKind::Placeholder {
                caption: DEFAULT_CAPTION.to_string(),
            },
        )
    }
}

#[async_trait]
impl Generator for DefaultGenerator {
    fn strategy(&self) -> Strategy {
        Strategy::Default
    }

    async fn generate(
        &self,
        source: &SourceFile,
        _cancel: &CancellationToken,
    ) -> Result<PreviewContent, GenerationError> {
        Ok(self.render(&source.file_name()))
    }
}
