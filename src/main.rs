// src/main.rs

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use vast_pod_server::catalog::{load_dir, CatalogStore};
use vast_pod_server::config::{CliArgs, Settings};
use vast_pod_server::logging::{init_tracing, SelectionLogger, SelectionLoggerConfig};
use vast_pod_server::vast::Assembler;
use vast_pod_server::{router, wait_for_shutdown, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let settings = Settings::from_args(&args)?;

    // 初始化全局 tracing 日志
    std::fs::create_dir_all(&settings.log_dir)
        .with_context(|| format!("unable to create log dir {:?}", settings.log_dir))?;
    let _guard = init_tracing(&settings.log_dir).context("unable to set global tracing subscriber")?;
    info!("VAST pod server starting on {}", settings.addr);
    info!(
        "url prefix {}, addressing {:?}, tracking {:?}",
        settings.urls.prefix(),
        settings.urls.addressing(),
        settings.tracking
    );

    // 素材库加载失败直接退出，不带着残缺的素材库提供服务
    let catalog = load_dir(&settings.catalog_dir, settings.max_catalog_size)
        .with_context(|| format!("unable to load creatives from {:?}", settings.catalog_dir))?;
    info!("catalog ready with {} creatives", catalog.len());
    let store = Arc::new(CatalogStore::new(catalog));

    #[cfg(unix)]
    tokio::spawn(reload::on_sighup(
        store.clone(),
        settings.catalog_dir.clone(),
        settings.max_catalog_size,
    ));

    let (selection_logger, log_writer) = SelectionLogger::spawn(SelectionLoggerConfig::new(&settings.log_dir));

    let state = Arc::new(AppState {
        catalog: store,
        selection: settings.selection,
        assembler: Assembler::new(settings.urls.clone(), settings.tracking),
        selection_logger,
        media_dir: settings.catalog_dir.clone(),
    });

    let listener = TcpListener::bind(&settings.addr)
        .await
        .with_context(|| format!("unable to bind {}", settings.addr))?;
    info!("VAST pod server running at http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(wait_for_shutdown(signal::ctrl_c()))
        .await?;

    // 路由释放后所有 SelectionLogger 都已 drop，等待剩余日志写盘
    log_writer.await?;
    info!("VAST pod server shut down.");
    Ok(())
}

#[cfg(unix)]
mod reload {
    use std::path::PathBuf;
    use std::sync::Arc;

    use tokio::signal::unix::{signal, SignalKind};
    use tracing::{error, info, warn};

    use vast_pod_server::catalog::{load_dir, CatalogStore};

    /// 收到 SIGHUP 时重新扫描素材目录，成功后整体替换快照
    ///
    /// 新快照重新从 1 分配 ID，旧请求继续持有旧快照直到结束。
    pub async fn on_sighup(store: Arc<CatalogStore>, dir: PathBuf, max_items: usize) {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(hangup) => hangup,
            Err(e) => {
                warn!("catalog reload disabled: {}", e);
                return;
            }
        };
        while hangup.recv().await.is_some() {
            let scan_dir = dir.clone();
            match tokio::task::spawn_blocking(move || load_dir(&scan_dir, max_items)).await {
                Ok(Ok(catalog)) => {
                    let count = catalog.len();
                    store.replace(catalog);
                    info!("catalog reloaded with {} creatives", count);
                }
                Ok(Err(e)) => error!("catalog reload failed, keeping previous snapshot: {}", e),
                Err(e) => error!("catalog reload task failed: {}", e),
            }
        }
    }
}
