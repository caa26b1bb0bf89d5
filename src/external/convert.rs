use std::path::{Path, PathBuf};
use std::time::Duration;
use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::process::{ensure_success, run_command};
use crate::error::GenerationError;

/// Office 文書を PDF に変換する
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// 変換後の PDF パスを返す（`out_dir` 内に作成）
    async fn convert_to_pdf(
        &self,
        input: &Path,
        out_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, GenerationError>;
}

/// soffice --headless --convert-to pdf --outdir <dir> <input>
pub struct SofficeConverter {
    program: String,
    timeout: Duration,
}

impl SofficeConverter {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl DocumentConverter for SofficeConverter {
    async fn convert_to_pdf(
        &self,
        input: &Path,
        out_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, GenerationError> {
        let output = run_command(
            Command::new(&self.program)
                .arg("--headless")
                .arg("--convert-to")
                .arg("pdf")
                .arg("--outdir")
                .arg(out_dir)
                .arg(input),
            self.timeout,
            cancel,
        )
        .await?;
        ensure_success(&self.program, &output)?;

        let pdf_path = converted_path(input, out_dir);
        if !pdf_path.exists() {
            return Err(GenerationError::Process(format!(
                "{} が PDF を出力しませんでした: {}",
                self.program,
                pdf_path.display()
            )));
        }
        Ok(pdf_path)
    }
}

// soffice は <outdir>/<拡張子なしのファイル名>.pdf を出力する
fn converted_path(input: &Path, out_dir: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let mut file_name = stem.to_os_string();
    file_name.push(".pdf");
    out_dir.join(file_name)
}
