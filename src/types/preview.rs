use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::constants::{THUMBNAIL_HEIGHT, THUMBNAIL_SQUARE_HEIGHT, THUMBNAIL_WIDTH};

/// 出力画像形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// 非可逆（写真向け）
    Jpeg,
    /// 可逆（図版・合成画像向け）
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }

    pub fn is_lossless(self) -> bool {
        matches!(self, Self::Png)
    }
}

/// キャンバスの縦横プロファイル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasProfile {
    /// 400x600
    #[default]
    Portrait,
    /// 400x400
    Square,
}

impl CanvasProfile {
    pub fn dimensions(self) -> Dimensions {
        match self {
            Self::Portrait => Dimensions::new(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT),
            Self::Square => Dimensions::new(THUMBNAIL_WIDTH, THUMBNAIL_SQUARE_HEIGHT),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        CanvasProfile::default().dimensions()
    }
}

/// プレビューの由来
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewKind {
    /// コーデック・レンダラーで描画した実画像
    Rendered,
    /// テキストを描画したプレビュー
    Text { text: String },
    /// タイトル付きテキストプレビュー（Office 直接描画）
    TitledText { title: String, text: String },
    /// 表形式プレビュー
    Table { lines: Vec<String> },
    /// 内容に依存しないプレースホルダー
    Placeholder { caption: String },
}

/// 生成済みのメモリ上ラスター（保存は Persister 経由のみ）
#[derive(Debug, Clone)]
pub struct PreviewContent {
    pub image: DynamicImage,
    pub format: OutputFormat,
    pub kind: PreviewKind,
    /// 入れ子のフォールバックで作られたかどうか
    pub degraded: bool,
}

impl PreviewContent {
    pub fn rendered(image: DynamicImage, format: OutputFormat) -> Self {
        Self {
            image,
            format,
            kind: PreviewKind::Rendered,
            degraded: false,
        }
    }

    pub fn synthetic(image: DynamicImage, kind: PreviewKind) -> Self {
        Self {
            image,
            format: OutputFormat::Jpeg,
            kind,
            degraded: false,
        }
    }

    pub fn into_degraded(mut self) -> Self {
        self.degraded = true;
        self
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
