use std::path::Path;
use std::process::Output;
use std::time::Duration;
use async_trait::async_trait;
use image::DynamicImage;
use tempfile::TempDir;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::process::{ensure_success, run_command};
use crate::error::GenerationError;

/// PDF の描画・テキスト抽出
#[async_trait]
pub trait PdfBackend: Send + Sync {
    /// パスワードなしで開けない場合は `InvalidPassword`
    async fn is_encrypted(&self, path: &Path, cancel: &CancellationToken) -> Result<bool, GenerationError>;

    async fn render_page(
        &self,
        path: &Path,
        page_index: u32,
        dpi: u32,
        password: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<DynamicImage, GenerationError>;

    async fn extract_text(
        &self,
        path: &Path,
        password: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String, GenerationError>;
}

/// poppler-utils（pdfinfo / pdftoppm / pdftotext）を利用
pub struct PopplerBackend {
    pdfinfo: String,
    pdftoppm: String,
    pdftotext: String,
    timeout: Duration,
}

impl PopplerBackend {
    pub fn new(
        pdfinfo: impl Into<String>,
        pdftoppm: impl Into<String>,
        pdftotext: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            pdfinfo: pdfinfo.into(),
            pdftoppm: pdftoppm.into(),
            pdftotext: pdftotext.into(),
            timeout,
        }
    }
}

#[async_trait]
impl PdfBackend for PopplerBackend {
    async fn is_encrypted(&self, path: &Path, cancel: &CancellationToken) -> Result<bool, GenerationError> {
        let output = run_command(Command::new(&self.pdfinfo).arg(path), self.timeout, cancel).await?;
        check_output(&self.pdfinfo, &output)?;
        Ok(parse_encrypted(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn render_page(
        &self,
        path: &Path,
        page_index: u32,
        dpi: u32,
        password: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<DynamicImage, GenerationError> {
        let work_dir = TempDir::new()?;
        let prefix = work_dir.path().join("page");
        // pdftoppm のページ番号は 1 始まり
        let page = (page_index + 1).to_string();

        let mut cmd = Command::new(&self.pdftoppm);
        cmd.arg("-f")
            .arg(&page)
            .arg("-l")
            .arg(&page)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg("-singlefile");
        if let Some(password) = password {
            cmd.arg("-upw").arg(password);
        }
        cmd.arg(path).arg(&prefix);

        let output = run_command(&mut cmd, self.timeout, cancel).await?;
        check_output(&self.pdftoppm, &output)?;

        let rendered = prefix.with_extension("png");
        if !rendered.exists() {
            return Err(GenerationError::Process(format!(
                "{} がページを出力しませんでした",
                self.pdftoppm
            )));
        }

        tokio::task::spawn_blocking(move || {
            // work_dir はデコード完了まで保持
            let _work_dir = work_dir;
            image::open(&rendered)
                .map_err(|e| GenerationError::Unreadable(format!("描画結果を読み込めません: {}", e)))
        })
        .await?
    }

    async fn extract_text(
        &self,
        path: &Path,
        password: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String, GenerationError> {
        let mut cmd = Command::new(&self.pdftotext);
        cmd.arg("-enc").arg("UTF-8");
        if let Some(password) = password {
            cmd.arg("-upw").arg(password);
        }
        // "-" は標準出力
        cmd.arg(path).arg("-");

        let output = run_command(&mut cmd, self.timeout, cancel).await?;
        check_output(&self.pdftotext, &output)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// パスワード不一致は InvalidPassword として区別する
fn check_output(program: &str, output: &Output) -> Result<(), GenerationError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if is_password_error(&stderr) {
        return Err(GenerationError::InvalidPassword(stderr.trim().to_string()));
    }
    ensure_success(program, output)
}

fn is_password_error(stderr: &str) -> bool {
    stderr.to_ascii_lowercase().contains("incorrect password")
}

fn parse_encrypted(info: &str) -> bool {
    info.lines()
        .filter_map(|line| line.strip_prefix("Encrypted:"))
        .any(|value| value.trim().starts_with("yes"))
}
