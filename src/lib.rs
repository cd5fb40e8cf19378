// src/lib.rs

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod selection;
pub mod vast;

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

pub use api::router;
pub use error::{Error, Result};

use catalog::CatalogStore;
use logging::SelectionLogger;
use selection::SelectionPolicy;
use vast::Assembler;

/// 请求处理共享的只读状态
///
/// 素材库通过 `CatalogStore` 以快照方式读取，其余字段启动后不再变化。
pub struct AppState {
    pub catalog: Arc<CatalogStore>,
    pub selection: SelectionPolicy,
    pub assembler: Assembler,
    pub selection_logger: SelectionLogger,
    /// `/files` 静态文件目录
    pub media_dir: PathBuf,
}

/// 等待退出信号；信号监听安装失败时只记录错误并一直等待，不触发退出
pub async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!("Shutting down gracefully..."),
        Err(e) => {
            tracing::error!("unable to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn shutdown_follows_the_signal() {
        let done = timeout(Duration::from_millis(100), wait_for_shutdown(async { Ok(()) })).await;
        assert!(done.is_ok());
    }

    #[tokio::test]
    async fn failed_signal_listener_keeps_serving() {
        let failed = async { Err(io::Error::other("no signal handler")) };
        let done = timeout(Duration::from_millis(100), wait_for_shutdown(failed)).await;
        assert!(done.is_err());
    }
}
