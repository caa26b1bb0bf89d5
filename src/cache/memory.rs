use std::path::{Path, PathBuf};
use std::time::Duration;
use moka::sync::Cache;

use crate::config::CacheSettings;

/// 処理済みパスの記録（プロセス内、注入して使う）
pub trait PathCache: Send + Sync {
    /// 未処理なら処理済みとして登録して true を返す（登録は原子的）
    fn claim(&self, path: &Path) -> bool;

    fn contains(&self, path: &Path) -> bool;

    fn invalidate(&self, path: &Path);

    fn invalidate_all(&self);
}

/// moka によるメモリキャッシュ（容量上限・任意の TTL）
pub struct ProcessedPathCache {
    cache: Cache<PathBuf, ()>,
}

impl ProcessedPathCache {
    pub fn new(max_capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(max_capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            cache: builder.build(),
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.capacity, settings.ttl())
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl PathCache for ProcessedPathCache {
    fn claim(&self, path: &Path) -> bool {
        self.cache.entry(path.to_path_buf()).or_insert(()).is_fresh()
    }

    fn contains(&self, path: &Path) -> bool {
        self.cache.contains_key(path)
    }

    fn invalidate(&self, path: &Path) {
        self.cache.invalidate(path);
    }

    fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}
