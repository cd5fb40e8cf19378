// src/logging/selection_log.rs

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::selection::{RoundingMode, Selection, SelectionPolicy, TieBreak};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FillStatus {
    Filled,
    NoFill,
}

/// **单次 /adlist 请求的选片日志**
#[derive(Serialize, Debug, Clone)]
pub struct SelectionLog {
    pub timestamp: String,          // 记录时间
    pub log_type: &'static str,     // 固定为 "adlist_selection"
    pub request_id: String,         // 每个请求生成的 UUID
    pub pod_max_dur: Option<String>, // 原始请求参数
    pub budget_ms: u64,             // 解析后的预算
    pub rounding: RoundingMode,
    pub tie_break: TieBreak,
    pub status: FillStatus,
    pub slack_ms: Option<u64>,
    pub tied: usize,                // 打平的最优组合数量
    pub selected: Vec<SelectedCreative>,
}

/// 被选中的素材
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SelectedCreative {
    pub id: u64,
    pub filename: String,
    pub duration_ms: u64,
}

impl SelectionLog {
    pub fn new(request_id: &str, pod_max_dur: Option<&str>, budget: Duration, policy: SelectionPolicy) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            log_type: "adlist_selection",
            request_id: request_id.to_string(),
            pod_max_dur: pod_max_dur.map(str::to_string),
            budget_ms: millis(budget),
            rounding: policy.rounding,
            tie_break: policy.tie_break,
            status: FillStatus::NoFill, // 默认未填充，选片成功后更新
            slack_ms: None,
            tied: 0,
            selected: Vec::new(),
        }
    }

    /// 记录选片结果
    pub fn set_selection(&mut self, selection: &Selection<'_>) {
        self.status = FillStatus::Filled;
        self.slack_ms = Some(millis(selection.candidate.slack()));
        self.tied = selection.tied;
        self.selected = selection
            .candidate
            .creatives()
            .iter()
            .map(|c| SelectedCreative {
                id: c.id(),
                filename: c.filename().to_string(),
                duration_ms: millis(c.duration()),
            })
            .collect();
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
