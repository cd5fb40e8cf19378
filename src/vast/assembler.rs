// src/vast/assembler.rs

use serde::Serialize;

use crate::catalog::Creative;
use crate::error::{Error, Result};
use crate::vast::document::{Ad, Impression, InLine, Linear, LinearCreative, MediaFile, Tracking, TrackingEvent, Vast};
use crate::vast::url_policy::UrlPolicy;

pub const VAST_VERSION: &str = "3.0";
pub const AD_SYSTEM: &str = "dummy-ads";
pub const AD_TITLE: &str = "adTitle";
pub const MEDIA_DELIVERY: &str = "progressive";
pub const MEDIA_TYPE: &str = "video/mp4";

/// 旧版固定曝光 ID 与路径
const LEGACY_IMPRESSIONS: [(&str, &str); 2] = [("11111", "1111"), ("11112", "1112")];

/// 监测地址如何区分素材
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// 每个地址都带素材 ID 与文件名，同一广告位内不同素材的地址互不相同
    #[default]
    PerCreative,
    /// 所有素材共用固定的曝光 ID 和监测地址，无法按素材归因
    Legacy,
}

/// **VAST 响应组装器**
#[derive(Debug, Clone)]
pub struct Assembler {
    urls: UrlPolicy,
    tracking: TrackingMode,
}

impl Assembler {
    pub fn new(urls: UrlPolicy, tracking: TrackingMode) -> Self {
        Self { urls, tracking }
    }

    /// 每个素材生成一个 `<Ad>`，顺序与选片结果一致
    pub fn assemble(&self, creatives: &[&Creative]) -> Result<Vast> {
        if creatives.is_empty() {
            return Err(Error::EmptySelection);
        }
        Ok(Vast {
            version: VAST_VERSION.to_string(),
            ads: creatives.iter().map(|creative| self.ad(creative)).collect(),
        })
    }

    fn ad(&self, creative: &Creative) -> Ad {
        let id = creative.id().to_string();
        let filename = creative.filename();

        let (impressions, click_segments) = match self.tracking {
            TrackingMode::PerCreative => (
                vec![Impression {
                    id: id.clone(),
                    uri: self.endpoint(&["impression", id.as_str(), filename]),
                }],
                vec!["clickthrough", id.as_str(), filename],
            ),
            TrackingMode::Legacy => (
                LEGACY_IMPRESSIONS
                    .iter()
                    .map(|(impression_id, path)| Impression {
                        id: impression_id.to_string(),
                        uri: self.endpoint(&["impression", path]),
                    })
                    .collect(),
                vec!["clickthrough"],
            ),
        };

        let tracking_events = TrackingEvent::ALL
            .iter()
            .map(|event| {
                let uri = match self.tracking {
                    TrackingMode::PerCreative => self.endpoint(&["tracking", event.path_segment(), id.as_str(), filename]),
                    TrackingMode::Legacy => self.endpoint(&["tracking", event.path_segment()]),
                };
                Tracking { event: *event, uri }
            })
            .collect();

        Ad {
            id: id.clone(),
            in_line: InLine {
                ad_system: AD_SYSTEM.to_string(),
                ad_title: AD_TITLE.to_string(),
                errors: vec![self.endpoint(&["error"])],
                impressions,
                creatives: vec![LinearCreative {
                    ad_id: id.clone(),
                    sequence: 1,
                    linear: Linear {
                        duration: creative.duration(),
                        tracking_events,
                        click_throughs: vec![self.endpoint(&click_segments)],
                        media_files: vec![MediaFile {
                            delivery: MEDIA_DELIVERY.to_string(),
                            mime_type: MEDIA_TYPE.to_string(),
                            width: creative.width(),
                            height: creative.height(),
                            uri: self.urls.media(filename).into(),
                        }],
                    },
                }],
            },
        }
    }

    fn endpoint(&self, segments: &[&str]) -> String {
        self.urls.endpoint(segments).into()
    }
}
