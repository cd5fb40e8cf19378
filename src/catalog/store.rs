// src/catalog/store.rs

use std::sync::{Arc, RwLock};

use crate::catalog::creative::Catalog;

/// **素材库快照存储**
///
/// 请求只拿到一个 `Arc<Catalog>` 快照，重新加载时整体替换，
/// 读方永远不会看到加载到一半的素材库。
#[derive(Debug, Default)]
pub struct CatalogStore {
    current: RwLock<Arc<Catalog>>,
}

impl CatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        // 锁内只做 Arc 克隆，中毒时直接沿用旧值
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// 替换为新的素材库，返回旧快照
    pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        let next = Arc::new(catalog);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, next)
    }
}
