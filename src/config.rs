//! 設定
//!
//! 既定値 → TOML ファイル → 環境変数（`THUMBKIT_` 接頭辞、階層は `__` 区切り）の順に上書きする。

use std::path::{Path, PathBuf};
use std::time::Duration;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_JPEG_QUALITY, DIRECTORY_RETRY_ATTEMPTS, DIRECTORY_RETRY_BACKOFF_MS,
    MAX_FILE_SIZE_BYTES, MAX_GENERATION_ATTEMPTS, MAX_WALK_DEPTH, PROCESSED_CACHE_CAPACITY,
    PROCESS_TIMEOUT_SECS,
};
use crate::types::{CanvasProfile, Dimensions};

const ENV_PREFIX: &str = "THUMBKIT";

/// Office 文書の生成方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfficeMode {
    /// 段落・セルのテキストを直接描画
    Direct,
    /// PDF に変換してから PDF 生成器に委譲
    #[default]
    Convert,
}

/// ディレクトリ一覧取得の再試行
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: DIRECTORY_RETRY_ATTEMPTS,
            backoff_ms: DIRECTORY_RETRY_BACKOFF_MS,
        }
    }
}

impl RetrySettings {
    /// n 回目の失敗後の待ち時間（線形）
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(attempt as u64))
    }
}

/// 処理済みパスキャッシュ
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub capacity: u64,
    /// 未指定なら期限なし
    pub ttl_secs: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: PROCESSED_CACHE_CAPACITY,
            ttl_secs: None,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

/// 外部ツールのコマンド名またはパス
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub ffmpeg: String,
    pub soffice: String,
    pub pdfinfo: String,
    pub pdftoppm: String,
    pub pdftotext: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            soffice: "soffice".to_string(),
            pdfinfo: "pdfinfo".to_string(),
            pdftoppm: "pdftoppm".to_string(),
            pdftotext: "pdftotext".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// これを超えるファイルは生成しない（バイト）
    pub max_file_size: u64,
    pub canvas: CanvasProfile,
    /// 同一戦略での最大試行回数
    pub max_attempts: u32,
    pub jpeg_quality: u8,
    pub office_mode: OfficeMode,
    /// 同時生成数およびディレクトリ展開幅
    pub concurrency: usize,
    pub max_depth: usize,
    /// ディレクトリ走査時に thumb_* を対象外にする
    pub skip_thumbnails: bool,
    pub process_timeout_secs: u64,
    pub directory_retry: RetrySettings,
    pub cache: CacheSettings,
    pub tools: ToolSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE_BYTES,
            canvas: CanvasProfile::default(),
            max_attempts: MAX_GENERATION_ATTEMPTS,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            office_mode: OfficeMode::default(),
            concurrency: default_concurrency(),
            max_depth: MAX_WALK_DEPTH,
            skip_thumbnails: true,
            process_timeout_secs: PROCESS_TIMEOUT_SECS,
            directory_retry: RetrySettings::default(),
            cache: CacheSettings::default(),
            tools: ToolSettings::default(),
        }
    }
}

impl Settings {
    /// ユーザー設定ファイルの既定パス
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("thumbkit").join("config.toml"))
    }

    /// 設定を読み込む
    ///
    /// `path` 指定時はそのファイルが必須、未指定時は既定パスがあれば読む。
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path).format(FileFormat::Toml));
            }
            None => {
                if let Some(default_path) = Self::default_path() {
                    builder = builder.add_source(
                        File::from(default_path)
                            .format(FileFormat::Toml)
                            .required(false),
                    );
                }
            }
        }

        let settings: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()
    }

    fn validate(mut self) -> Result<Self, ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Message("max_attempts は 1 以上が必要です".to_string()));
        }
        if self.concurrency == 0 {
            self.concurrency = 1;
        }
        if self.directory_retry.attempts == 0 {
            self.directory_retry.attempts = 1;
        }
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        Ok(self)
    }

    pub fn dimensions(&self) -> Dimensions {
        self.canvas.dimensions()
    }

    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_secs)
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
