use std::path::{Path, PathBuf};
use serde::Serialize;
use tracing::{error, warn};

use crate::config::Settings;
use crate::service::ThumbnailService;
use crate::types::ThumbnailStatus;
use crate::walker::ProcessReport;

/// 引数 1 つ分の処理結果
#[derive(Serialize)]
struct PathOutcome {
    path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ProcessReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// 各パスを順に処理する。1 つでも `Err` があれば非 0 終了
pub async fn generate(paths: &[PathBuf], json: bool, settings: Settings) -> anyhow::Result<()> {
    let service = ThumbnailService::new(settings);

    // Ctrl-C で進行中の処理を中断
    let cancel = service.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("中断要求を受信しました");
            cancel.cancel();
        }
    });

    let mut outcomes = Vec::with_capacity(paths.len());
    let mut failures = 0usize;

    for path in paths {
        match service.process_path(path).await {
            Ok(report) => {
                if !json {
                    print_summary(path, &report);
                }
                outcomes.push(PathOutcome {
                    path: path.clone(),
                    report: Some(report),
                    error: None,
                });
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "処理に失敗しました");
                if !json {
                    eprintln!("{}: {}", path.display(), e);
                }
                failures += 1;
                outcomes.push(PathOutcome {
                    path: path.clone(),
                    report: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    }

    if failures > 0 {
        anyhow::bail!("{} 件のパスで処理に失敗しました", failures);
    }
    Ok(())
}

fn print_summary(path: &Path, report: &ProcessReport) {
    println!(
        "{}: written={} success={} degraded={} rejected={} failed={} cache_hits={}",
        path.display(),
        report.written(),
        report.count(ThumbnailStatus::Success),
        report.count(ThumbnailStatus::Degraded),
        report.count(ThumbnailStatus::Rejected),
        report.count(ThumbnailStatus::Failed),
        report.cache_hits,
    );
    for result in &report.results {
        match (&result.output_path, &result.failure) {
            (Some(output), _) => println!("  {} -> {}", result.source.display(), output.display()),
            (None, Some(reason)) => println!("  {} ({})", result.source.display(), reason),
            (None, None) => {}
        }
    }
    if report.depth_skipped > 0 {
        println!("  深さ上限でスキップ: {}", report.depth_skipped);
    }
    for failure in &report.directory_failures {
        println!(
            "  ディレクトリ失敗: {}（{}回試行）: {}",
            failure.path.display(),
            failure.attempts,
            failure.message
        );
    }
}
