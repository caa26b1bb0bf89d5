//! パス展開（ディレクトリは子要素を並行処理）

use std::path::{Path, PathBuf};
use std::sync::Arc;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::cache::PathCache;
use crate::config::{RetrySettings, Settings};
use crate::constants::THUMBNAIL_PREFIX;
use crate::error::{Error, Result};
use crate::thumbnail::ThumbnailPipeline;
use crate::types::{ThumbnailResult, ThumbnailStatus};

/// 走査の上限設定
#[derive(Debug, Clone)]
pub struct WalkLimits {
    pub max_depth: usize,
    pub concurrency: usize,
    pub skip_thumbnails: bool,
    pub retry: RetrySettings,
}

impl WalkLimits {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_depth: settings.max_depth,
            concurrency: settings.concurrency.max(1),
            skip_thumbnails: settings.skip_thumbnails,
            retry: settings.directory_retry.clone(),
        }
    }
}

/// 入れ子ディレクトリの一覧取得失敗（再試行を使い切ったもの）
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryFailure {
    pub path: PathBuf,
    pub attempts: u32,
    pub message: String,
}

/// `process_path` 1 回分の結果
#[derive(Debug, Default, Serialize)]
pub struct ProcessReport {
    pub results: Vec<ThumbnailResult>,
    pub cache_hits: usize,
    pub depth_skipped: usize,
    pub directory_failures: Vec<DirectoryFailure>,
}

impl ProcessReport {
    fn cache_hit() -> Self {
        Self {
            cache_hits: 1,
            ..Self::default()
        }
    }

    fn merge(&mut self, other: ProcessReport) {
        self.results.extend(other.results);
        self.cache_hits += other.cache_hits;
        self.depth_skipped += other.depth_skipped;
        self.directory_failures.extend(other.directory_failures);
    }

    pub fn count(&self, status: ThumbnailStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn written(&self) -> usize {
        self.results.iter().filter(|r| r.is_written()).count()
    }
}

pub struct PathWalker {
    pipeline: Arc<ThumbnailPipeline>,
    cache: Arc<dyn PathCache>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
    limits: WalkLimits,
}

impl PathWalker {
    pub fn new(
        pipeline: Arc<ThumbnailPipeline>,
        cache: Arc<dyn PathCache>,
        permits: Arc<Semaphore>,
        cancel: CancellationToken,
        limits: WalkLimits,
    ) -> Self {
        Self {
            pipeline,
            cache,
            permits,
            cancel,
            limits,
        }
    }

    /// ファイルまたはディレクトリを処理する
    ///
    /// 処理済みの絶対パスは何もしない。個々のファイルの失敗は結果に記録され、
    /// `Err` になるのはパスが存在しない場合と最上位ディレクトリの一覧取得失敗のみ。
    pub async fn process_path(&self, path: &Path) -> Result<ProcessReport> {
        let path = std::path::absolute(path)?;

        if !self.cache.claim(&path) {
            debug!(path = %path.display(), "処理済みのためスキップ");
            return Ok(ProcessReport::cache_hit());
        }

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                self.cache.invalidate(&path);
                return Err(if e.kind() == std::io::ErrorKind::NotFound {
                    Error::NotFound(path)
                } else {
                    Error::Io(e)
                });
            }
        };

        if !metadata.is_dir() {
            let mut report = ProcessReport::default();
            report.results.push(self.process_file(&path, metadata.len()).await);
            return Ok(report);
        }

        info!(path = %path.display(), "ディレクトリ処理開始");
        match self.walk_directory(&path, 0).await {
            Ok(report) => {
                info!(
                    path = %path.display(),
                    files = report.results.len(),
                    cache_hits = report.cache_hits,
                    "ディレクトリ処理完了"
                );
                Ok(report)
            }
            Err(failure) => {
                self.cache.invalidate(&path);
                Err(Error::Directory {
                    path: failure.path,
                    attempts: failure.attempts,
                    message: failure.message,
                })
            }
        }
    }

    async fn process_file(&self, path: &Path, size: u64) -> ThumbnailResult {
        // セマフォは閉じないので取得失敗は起きない
        let _permit = self.permits.acquire().await.ok();
        self.pipeline.generate_thumbnail(path, size, &self.cancel).await
    }

    fn walk_directory<'a>(
        &'a self,
        dir: &'a Path,
        depth: usize,
    ) -> BoxFuture<'a, std::result::Result<ProcessReport, DirectoryFailure>> {
        async move {
            let children = self.list_directory(dir).await?;
            debug!(path = %dir.display(), children = children.len(), depth, "ディレクトリ展開");

            let reports: Vec<ProcessReport> = stream::iter(children)
                .map(|child| self.visit(child, depth + 1))
                .buffer_unordered(self.limits.concurrency)
                .collect()
                .await;

            let mut report = ProcessReport::default();
            for child_report in reports {
                report.merge(child_report);
            }
            Ok(report)
        }
        .boxed()
    }

    async fn visit(&self, child: PathBuf, depth: usize) -> ProcessReport {
        let mut report = ProcessReport::default();
        if self.cancel.is_cancelled() {
            return report;
        }

        let metadata = match tokio::fs::symlink_metadata(&child).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %child.display(), error = %e, "メタデータ取得エラー");
                return report;
            }
        };

        // シンボリックリンクはファイルのみ辿る
        let metadata = if metadata.file_type().is_symlink() {
            match tokio::fs::metadata(&child).await {
                Ok(target) if target.is_file() => target,
                Ok(_) => {
                    debug!(path = %child.display(), "ディレクトリへのリンクはスキップ");
                    return report;
                }
                Err(e) => {
                    warn!(path = %child.display(), error = %e, "リンク切れ");
                    return report;
                }
            }
        } else {
            metadata
        };

        if metadata.is_dir() {
            if depth > self.limits.max_depth {
                debug!(path = %child.display(), depth, "深さ上限のためスキップ");
                report.depth_skipped += 1;
                return report;
            }
            if !self.cache.claim(&child) {
                report.cache_hits += 1;
                return report;
            }
            match self.walk_directory(&child, depth).await {
                Ok(child_report) => report.merge(child_report),
                Err(failure) => {
                    warn!(path = %child.display(), attempts = failure.attempts, error = %failure.message, "サブディレクトリ処理失敗");
                    self.cache.invalidate(&child);
                    report.directory_failures.push(failure);
                }
            }
        } else if metadata.is_file() {
            if self.limits.skip_thumbnails && is_thumbnail(&child) {
                return report;
            }
            if !self.cache.claim(&child) {
                report.cache_hits += 1;
                return report;
            }
            report.results.push(self.process_file(&child, metadata.len()).await);
        }

        report
    }

    // 一覧取得（失敗時は線形バックオフで再試行）
    async fn list_directory(&self, dir: &Path) -> std::result::Result<Vec<PathBuf>, DirectoryFailure> {
        let attempts = self.limits.retry.attempts.max(1);
        let mut message = String::new();

        for attempt in 1..=attempts {
            let owned = dir.to_path_buf();
            match tokio::task::spawn_blocking(move || read_children(&owned)).await {
                Ok(Ok(children)) => return Ok(children),
                Ok(Err(e)) => message = e.to_string(),
                Err(e) => message = e.to_string(),
            }
            warn!(path = %dir.display(), attempt, error = %message, "ディレクトリ一覧取得エラー");

            if attempt < attempts {
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        message = "処理がキャンセルされました".to_string();
                        return Err(DirectoryFailure { path: dir.to_path_buf(), attempts: attempt, message });
                    }
                    _ = tokio::time::sleep(self.limits.retry.backoff(attempt)) => {}
                }
            }
        }

        Err(DirectoryFailure {
            path: dir.to_path_buf(),
            attempts,
            message,
        })
    }
}

// 直下の子要素（自然順）
fn read_children(dir: &Path) -> std::result::Result<Vec<PathBuf>, walkdir::Error> {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by(|a, b| {
            natord::compare(
                &a.file_name().to_string_lossy(),
                &b.file_name().to_string_lossy(),
            )
        });

    let mut children = Vec::new();
    for entry in walker {
        children.push(entry?.into_path());
    }
    Ok(children)
}

fn is_thumbnail(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with(THUMBNAIL_PREFIX))
        .unwrap_or(false)
}
