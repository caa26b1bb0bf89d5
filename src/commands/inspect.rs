use std::path::Path;
use anyhow::Context;

use crate::config::Settings;
use crate::image_utils::output_format_for_extension;
use crate::persist::Persister;
use crate::service::ThumbnailService;
use crate::strategy::Strategy;
use crate::types::OutputFormat;

/// 判定結果と書き出し先を表示する
pub async fn inspect(file: &Path, settings: Settings) -> anyhow::Result<()> {
    let metadata = tokio::fs::metadata(file)
        .await
        .with_context(|| format!("ファイル情報を取得できません: {}", file.display()))?;
    if metadata.is_dir() {
        anyhow::bail!("ディレクトリは指定できません: {}", file.display());
    }

    let max_file_size = settings.max_file_size;
    let service = ThumbnailService::new(settings);
    let content_type = service
        .pipeline()
        .classify(file)
        .await
        .with_context(|| format!("コンテンツタイプを判定できません: {}", file.display()))?;
    let strategy = Strategy::select(&content_type);

    let ext = file
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let format = expected_format(strategy, &ext);

    println!("path:         {}", file.display());
    println!("size:         {} bytes", metadata.len());
    println!("content type: {}", content_type);
    println!("strategy:     {}", strategy);
    println!("thumbnail:    {}", Persister::output_path(file, format).display());
    if metadata.len() > max_file_size {
        println!("note:         サイズ上限（{} バイト）を超えるため生成されません", max_file_size);
    }
    Ok(())
}

// 画像以外は描画結果を JPEG で保存する
fn expected_format(strategy: Strategy, ext: &str) -> OutputFormat {
    match strategy {
        Strategy::Image => output_format_for_extension(ext),
        _ => OutputFormat::Jpeg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_format() {
        assert_eq!(expected_format(Strategy::Image, "png"), OutputFormat::Png);
        assert_eq!(expected_format(Strategy::Image, "tif"), OutputFormat::Jpeg);
        assert_eq!(expected_format(Strategy::Pdf, "pdf"), OutputFormat::Jpeg);
        assert_eq!(expected_format(Strategy::Default, "png"), OutputFormat::Jpeg);
    }
}
