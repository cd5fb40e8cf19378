// src/catalog/creative.rs

use std::fmt;
use std::time::Duration;

/// 素材 ID（由 CatalogBuilder 分配，从 1 开始增长）
pub type CreativeId = u64;

/// **单个视频素材**
///
/// 加载完成后不可变，时长在选片过程中只读。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creative {
    id: CreativeId,
    filename: String,
    width: u32,
    height: u32,
    duration: Duration,
}

impl Creative {
    pub fn new(id: CreativeId, filename: &str, width: u32, height: u32, duration: Duration) -> Self {
        Self {
            id,
            filename: filename.to_string(),
            width,
            height,
            duration,
        }
    }

    pub fn id(&self) -> CreativeId {
        self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for Creative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{} {} {}x{} {:?}}}",
            self.id, self.filename, self.width, self.height, self.duration
        )
    }
}

/// **素材库快照**
///
/// 按加载顺序保存素材，搜索顺序即此顺序。
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    creatives: Vec<Creative>,
}

impl Catalog {
    pub fn creatives(&self) -> &[Creative] {
        &self.creatives
    }

    pub fn len(&self) -> usize {
        self.creatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creatives.is_empty()
    }
}

/// 构建素材库，并持有顺序 ID 计数器
///
/// 计数器只在加载期间使用，`build()` 消费 builder 之后不会再被触碰。
#[derive(Debug)]
pub struct CatalogBuilder {
    next_id: CreativeId,
    creatives: Vec<Creative>,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            creatives: Vec::new(),
        }
    }

    /// 添加一个素材并分配下一个 ID
    pub fn push(&mut self, filename: &str, width: u32, height: u32, duration: Duration) -> &Creative {
        let id = self.next_id;
        self.next_id += 1;
        self.creatives.push(Creative::new(id, filename, width, height, duration));
        &self.creatives[self.creatives.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.creatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creatives.is_empty()
    }

    pub fn build(self) -> Catalog {
        Catalog {
            creatives: self.creatives,
        }
    }
}
