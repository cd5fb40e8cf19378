pub mod selection_log;
pub mod selection_logger;

pub use selection_log::{FillStatus, SelectionLog};
pub use selection_logger::{SelectionLogger, SelectionLoggerConfig};

use std::path::Path;

use tracing::subscriber::SetGlobalDefaultError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// 初始化全局 tracing：JSON 日志按小时滚动写入 `log_dir`，同时输出到标准输出
///
/// 返回的 guard 必须存活到进程退出，否则缓冲中的日志会丢失。
pub fn init_tracing(log_dir: &Path) -> Result<WorkerGuard, SetGlobalDefaultError> {
    let log_file = rolling::hourly(log_dir, "vast_pod_server.json");
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().json().with_writer(non_blocking))
        .with(fmt::layer().with_target(false));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guard)
}
