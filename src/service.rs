use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::cache::{PathCache, ProcessedPathCache};
use crate::config::Settings;
use crate::error::Result;
use crate::external::Backends;
use crate::thumbnail::ThumbnailPipeline;
use crate::walker::{PathWalker, ProcessReport, WalkLimits};

/// サムネイル生成の入口
///
/// キャッシュ・キャンセルトークン・ケイパビリティを保持し、
/// 呼び出し間で共有するのはキャッシュと同時生成数の枠のみ。
pub struct ThumbnailService {
    settings: Settings,
    pipeline: Arc<ThumbnailPipeline>,
    cache: Arc<dyn PathCache>,
    /// 全呼び出しで共有する同時生成数の上限
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl ThumbnailService {
    pub fn new(settings: Settings) -> Self {
        let backends = Backends::from_settings(&settings);
        Self::with_backends(settings, backends)
    }

    pub fn with_backends(settings: Settings, backends: Backends) -> Self {
        let pipeline = Arc::new(ThumbnailPipeline::new(&settings, &backends));
        let cache: Arc<dyn PathCache> = Arc::new(ProcessedPathCache::from_settings(&settings.cache));
        let permits = Arc::new(Semaphore::new(settings.concurrency.max(1)));
        Self {
            settings,
            pipeline,
            cache,
            permits,
            cancel: CancellationToken::new(),
        }
    }

    /// キャッシュを差し替える（複数サービスで共有する場合など）
    pub fn with_cache(mut self, cache: Arc<dyn PathCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> &Arc<dyn PathCache> {
        &self.cache
    }

    pub fn pipeline(&self) -> &ThumbnailPipeline {
        &self.pipeline
    }

    /// キャンセルすると進行中の走査・外部プロセスが中断される
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn process_path(&self, path: &Path) -> Result<ProcessReport> {
        let walker = PathWalker::new(
            Arc::clone(&self.pipeline),
            Arc::clone(&self.cache),
            Arc::clone(&self.permits),
            self.cancel.clone(),
            WalkLimits::from_settings(&self.settings),
        );
        walker.process_path(path).await
    }
}
