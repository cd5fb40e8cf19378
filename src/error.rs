// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// 服务内部错误
///
/// 选片（selection）本身不会失败：预算不足或素材库为空都返回 `None`，
/// 这里只覆盖启动期的素材加载、配置校验，以及组装时的空选片。
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// MP4 文件结构无法解析
    #[error("invalid mp4 {path}: {reason}")]
    Mp4 { path: PathBuf, reason: String },

    #[error("invalid url prefix {prefix:?}: {reason}")]
    InvalidUrlPrefix { prefix: String, reason: String },

    #[error("no playable mp4 file in {0}")]
    EmptyCatalog(PathBuf),

    /// 穷举搜索是指数级的，素材数量必须有上限
    #[error("catalog holds {found} creatives, limit is {limit}")]
    CatalogTooLarge { found: usize, limit: usize },

    #[error("cannot assemble a VAST document from an empty selection")]
    EmptySelection,
}

pub type Result<T> = std::result::Result<T, Error>;
