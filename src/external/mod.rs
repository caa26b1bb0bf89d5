//! 生成器が利用する外部ケイパビリティ（MIME 判定・PDF・動画・文書変換）

mod convert;
mod pdf;
mod process;
mod video;

pub use convert::{DocumentConverter, SofficeConverter};
pub use pdf::{PdfBackend, PopplerBackend};
pub use process::{ensure_success, run_command};
pub use video::{FfmpegFrameExtractor, FrameExtractor};

use std::sync::Arc;

use crate::classify::{Classifier, InferClassifier};
use crate::config::Settings;

/// ケイパビリティ一式（テストでは差し替える）
#[derive(Clone)]
pub struct Backends {
    pub classifier: Arc<dyn Classifier>,
    pub pdf: Arc<dyn PdfBackend>,
    pub frames: Arc<dyn FrameExtractor>,
    pub converter: Arc<dyn DocumentConverter>,
}

impl Backends {
    pub fn from_settings(settings: &Settings) -> Self {
        let timeout = settings.process_timeout();
        let tools = &settings.tools;

        Self {
            classifier: Arc::new(InferClassifier),
            pdf: Arc::new(PopplerBackend::new(
                &tools.pdfinfo,
                &tools.pdftoppm,
                &tools.pdftotext,
                timeout,
            )),
            frames: Arc::new(FfmpegFrameExtractor::new(&tools.ffmpeg, timeout)),
            converter: Arc::new(SofficeConverter::new(&tools.soffice, timeout)),
        }
    }
}
