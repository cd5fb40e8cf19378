// src/catalog/loader.rs

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::catalog::creative::{Catalog, CatalogBuilder};
use crate::catalog::mp4;
use crate::error::{Error, Result};

/// **从目录加载素材库**
///
/// 按文件名排序遍历 `dir`，只接受带 H.264 视频轨的 `.mp4` 文件。
/// 单个文件解析失败只记录警告并跳过；结果为空或超过 `max_items` 则返回错误。
pub fn load_dir(dir: &Path, max_items: usize) -> Result<Catalog> {
    let mut entries = fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut builder = CatalogBuilder::new();
    for entry in entries {
        let path = entry.path();
        if !entry.file_type()?.is_file() || path.extension().and_then(|e| e.to_str()) != Some("mp4") {
            continue;
        }
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            warn!("skip non utf-8 file name {:?}", path);
            continue;
        };

        let info = match mp4::probe_file(&path) {
            Ok(info) => info,
            Err(e) => {
                warn!("skip {}: {}", filename, e);
                continue;
            }
        };
        let Some((width, height)) = info.avc_dimensions else {
            warn!("skip {}: no h264 video track", filename);
            continue;
        };

        let creative = builder.push(filename, width, height, info.duration);
        info!("loaded {}", creative);
    }

    if builder.is_empty() {
        return Err(Error::EmptyCatalog(dir.to_path_buf()));
    }
    if builder.len() > max_items {
        return Err(Error::CatalogTooLarge {
            found: builder.len(),
            limit: max_items,
        });
    }
    Ok(builder.build())
}
