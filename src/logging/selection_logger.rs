// src/logging/selection_logger.rs

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tokio::task::{self, JoinHandle};
use tokio::time;
use tracing::{debug, warn};
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::fmt::MakeWriter;

use crate::logging::selection_log::SelectionLog;

/// 选片日志写入配置
#[derive(Debug, Clone)]
pub struct SelectionLoggerConfig {
    pub log_dir: PathBuf,
    /// 文件前缀，按小时滚动（最终文件名形如 adlist.json.2025-01-01-08）
    pub file_prefix: String,
    pub buffer_size: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub retention: Duration,
}

impl SelectionLoggerConfig {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            file_prefix: "adlist.json".to_string(),
            buffer_size: 1000,
            batch_size: 100,
            flush_interval: Duration::from_secs(1),
            retention: Duration::from_secs(72 * 3600),
        }
    }
}

/// **选片日志记录器**
///
/// 请求路径只做非阻塞投递，后台任务按批次或定时写盘。
/// 所有 `SelectionLogger` 克隆被释放后，后台任务写完剩余日志并退出。
#[derive(Clone)]
pub struct SelectionLogger {
    sender: Sender<SelectionLog>,
}

impl SelectionLogger {
    /// 启动后台写入任务与过期文件清理任务，返回写入任务的句柄
    pub fn spawn(config: SelectionLoggerConfig) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(config.buffer_size);
        let appender = Arc::new(rolling::hourly(&config.log_dir, &config.file_prefix));

        let writer = tokio::spawn(Self::background_log_writer(
            appender,
            receiver,
            config.batch_size.max(1),
            config.flush_interval.max(Duration::from_millis(1)),
        ));

        let log_dir = config.log_dir.clone();
        let prefix = config.file_prefix.clone();
        let retention = config.retention;
        tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_secs(3600));
            loop {
                interval.tick().await;
                Self::cleanup_old_logs(&log_dir, &prefix, retention).await;
            }
        });

        (Self { sender }, writer)
    }

    /// 投递一条日志；队列满时丢弃并告警，不阻塞请求
    pub fn record(&self, log: SelectionLog) {
        match self.sender.try_send(log) {
            Ok(()) => {}
            Err(TrySendError::Full(log)) => {
                warn!(request_id = %log.request_id, "selection log queue full, record dropped");
            }
            Err(TrySendError::Closed(log)) => {
                warn!(request_id = %log.request_id, "selection log writer stopped, record dropped");
            }
        }
    }

    async fn background_log_writer(
        appender: Arc<RollingFileAppender>,
        mut receiver: Receiver<SelectionLog>,
        batch_size: usize,
        flush_interval: Duration,
    ) {
        let mut buffer: Vec<String> = Vec::with_capacity(batch_size);
        let mut interval = time::interval(flush_interval);
        loop {
            tokio::select! {
                received = receiver.recv() => match received {
                    Some(log) => {
                        match serde_json::to_string(&log) {
                            Ok(line) => buffer.push(line),
                            Err(e) => warn!("failed to serialize selection log: {}", e),
                        }
                        if buffer.len() >= batch_size {
                            Self::write_logs_to_disk(&appender, &mut buffer).await;
                        }
                    }
                    None => {
                        Self::write_logs_to_disk(&appender, &mut buffer).await;
                        break;
                    }
                },
                _ = interval.tick() => {
                    Self::write_logs_to_disk(&appender, &mut buffer).await;
                }
            }
        }
        debug!("selection log writer stopped");
    }

    async fn write_logs_to_disk(appender: &Arc<RollingFileAppender>, buffer: &mut Vec<String>) {
        if buffer.is_empty() {
            return;
        }
        let content = buffer.join("\n") + "\n";
        buffer.clear();

        let appender = Arc::clone(appender);
        let written = task::spawn_blocking(move || {
            let mut writer = appender.make_writer();
            writer.write_all(content.as_bytes()).and_then(|_| writer.flush())
        })
        .await;
        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("failed to write selection logs: {}", e),
            Err(e) => warn!("selection log write task failed: {}", e),
        }
    }

    async fn cleanup_old_logs(log_dir: &Path, prefix: &str, retention: Duration) {
        let now = SystemTime::now();
        let mut dir = match tokio::fs::read_dir(log_dir).await {
            Ok(dir) => dir,
            Err(e) => {
                warn!("failed to read log directory {:?}: {}", log_dir, e);
                return;
            }
        };
        while let Ok(Some(entry)) = dir.next_entry().await {
            if !entry.file_name().to_string_lossy().starts_with(prefix) {
                continue;
            }
            let Ok(modified) = entry.metadata().await.and_then(|m| m.modified()) else {
                continue;
            };
            if now.duration_since(modified).unwrap_or_default() >= retention {
                let path = entry.path();
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => debug!("deleted old log file {:?}", path),
                    Err(e) => warn!("failed to delete old log file {:?}: {}", path, e),
                }
            }
        }
    }
}
