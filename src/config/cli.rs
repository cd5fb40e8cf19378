// src/config/cli.rs

use std::path::PathBuf;

use clap::Parser;

use crate::selection::TieBreak;

#[derive(Parser, Debug, Clone)]
#[command(author = "whiteCcinn", version = "1.0", about = "A VAST ad-pod simulator serving local MP4 creatives")]
pub struct CliArgs {
    /// 监听地址
    #[arg(long, default_value = "0.0.0.0:5000")]
    pub addr: String,
    /// 素材（mp4）所在目录
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
    /// 生成 VAST 中各类 URL 的前缀
    #[arg(long, default_value = "http://localhost:5000")]
    pub url_prefix: String,
    /// 选片时忽略毫秒（每个素材先截断到整秒）
    #[arg(long)]
    pub ignore_ms: bool,
    /// 监测地址经由 /redirect 跳转
    #[arg(long)]
    pub use_redirect: bool,
    /// 多个最优组合打平时的选择方式
    #[arg(long, value_enum, default_value_t = TieBreak::Random)]
    pub tie_break: TieBreak,
    /// 使用所有素材共用的固定监测地址
    #[arg(long)]
    pub legacy_tracking: bool,
    /// 素材数量上限，穷举搜索的耗时随数量指数增长
    #[arg(long, default_value_t = 24)]
    pub max_catalog_size: usize,
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,
}
