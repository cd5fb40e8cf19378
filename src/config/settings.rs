// src/config/settings.rs

use std::path::PathBuf;

use crate::config::cli::CliArgs;
use crate::error::Result;
use crate::selection::{RoundingMode, SelectionPolicy};
use crate::vast::{Addressing, TrackingMode, UrlPolicy};

/// **校验后的运行配置**
#[derive(Debug, Clone)]
pub struct Settings {
    pub addr: String,
    pub catalog_dir: PathBuf,
    pub max_catalog_size: usize,
    pub log_dir: PathBuf,
    pub selection: SelectionPolicy,
    pub urls: UrlPolicy,
    pub tracking: TrackingMode,
}

impl Settings {
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let rounding = if args.ignore_ms {
            RoundingMode::TruncateToSeconds
        } else {
            RoundingMode::Exact
        };
        let addressing = if args.use_redirect {
            Addressing::Redirect
        } else {
            Addressing::Direct
        };
        let tracking = if args.legacy_tracking {
            TrackingMode::Legacy
        } else {
            TrackingMode::PerCreative
        };

        Ok(Self {
            addr: args.addr.clone(),
            catalog_dir: args.dir.clone(),
            max_catalog_size: args.max_catalog_size,
            log_dir: args.log_dir.clone(),
            selection: SelectionPolicy {
                rounding,
                tie_break: args.tie_break,
            },
            urls: UrlPolicy::new(&args.url_prefix, addressing)?,
            tracking,
        })
    }
}
