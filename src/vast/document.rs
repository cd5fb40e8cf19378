// src/vast/document.rs

//! VAST 3.0 文档模型
//!
//! 字段顺序固定，序列化结果完全确定，便于做 golden 对比。
//! URI 一律放在 CDATA 中输出。

use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vast {
    pub version: String,
    pub ads: Vec<Ad>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ad {
    pub id: String,
    pub in_line: InLine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InLine {
    pub ad_system: String,
    pub ad_title: String,
    pub errors: Vec<String>,
    pub impressions: Vec<Impression>,
    pub creatives: Vec<LinearCreative>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Impression {
    pub id: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearCreative {
    pub ad_id: String,
    pub sequence: u32,
    pub linear: Linear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linear {
    pub duration: Duration,
    pub tracking_events: Vec<Tracking>,
    pub click_throughs: Vec<String>,
    pub media_files: Vec<MediaFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracking {
    pub event: TrackingEvent,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub delivery: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub uri: String,
}

/// 线性广告的生命周期事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackingEvent {
    CreativeView,
    Start,
    FirstQuartile,
    Midpoint,
    ThirdQuartile,
    Complete,
}

impl TrackingEvent {
    /// 按播放顺序排列
    pub const ALL: [TrackingEvent; 6] = [
        TrackingEvent::CreativeView,
        TrackingEvent::Start,
        TrackingEvent::FirstQuartile,
        TrackingEvent::Midpoint,
        TrackingEvent::ThirdQuartile,
        TrackingEvent::Complete,
    ];

    /// VAST 中 `event` 属性的取值
    pub fn vast_name(self) -> &'static str {
        match self {
            TrackingEvent::CreativeView => "creativeView",
            TrackingEvent::Start => "start",
            TrackingEvent::FirstQuartile => "firstQuartile",
            TrackingEvent::Midpoint => "midpoint",
            TrackingEvent::ThirdQuartile => "thirdQuartile",
            TrackingEvent::Complete => "complete",
        }
    }

    /// 监测地址中的路径片段
    pub fn path_segment(self) -> &'static str {
        match self {
            TrackingEvent::CreativeView => "creativeview",
            TrackingEvent::Start => "start",
            TrackingEvent::FirstQuartile => "firstquartile",
            TrackingEvent::Midpoint => "midpoint",
            TrackingEvent::ThirdQuartile => "thirdquartile",
            TrackingEvent::Complete => "complete",
        }
    }
}

impl Vast {
    pub fn to_xml(&self) -> String {
        self.to_string()
    }
}

impl Display for Vast {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<VAST version=\"{}\">", escape(&self.version))?;
        for ad in &self.ads {
            write!(f, "{}", ad)?;
        }
        f.write_str("</VAST>")
    }
}

impl Display for Ad {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<Ad id=\"{}\">{}</Ad>", escape(&self.id), self.in_line)
    }
}

impl Display for InLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("<InLine>")?;
        write!(f, "<AdSystem>{}</AdSystem>", escape(&self.ad_system))?;
        write!(f, "<AdTitle>{}</AdTitle>", Cdata(&self.ad_title))?;
        for error in &self.errors {
            write!(f, "<Error>{}</Error>", Cdata(error))?;
        }
        for impression in &self.impressions {
            write!(
                f,
                "<Impression id=\"{}\">{}</Impression>",
                escape(&impression.id),
                Cdata(&impression.uri)
            )?;
        }
        f.write_str("<Creatives>")?;
        for creative in &self.creatives {
            write!(f, "{}", creative)?;
        }
        f.write_str("</Creatives></InLine>")
    }
}

impl Display for LinearCreative {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Creative AdID=\"{}\" sequence=\"{}\">{}</Creative>",
            escape(&self.ad_id),
            self.sequence,
            self.linear
        )
    }
}

impl Display for Linear {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<Linear><Duration>{}</Duration>", VastDuration(self.duration))?;

        f.write_str("<TrackingEvents>")?;
        for tracking in &self.tracking_events {
            write!(
                f,
                "<Tracking event=\"{}\">{}</Tracking>",
                tracking.event.vast_name(),
                Cdata(&tracking.uri)
            )?;
        }
        f.write_str("</TrackingEvents>")?;

        f.write_str("<VideoClicks>")?;
        for uri in &self.click_throughs {
            write!(f, "<ClickThrough>{}</ClickThrough>", Cdata(uri))?;
        }
        f.write_str("</VideoClicks>")?;

        f.write_str("<MediaFiles>")?;
        for media in &self.media_files {
            write!(
                f,
                "<MediaFile delivery=\"{}\" type=\"{}\" width=\"{}\" height=\"{}\">{}</MediaFile>",
                escape(&media.delivery),
                escape(&media.mime_type),
                media.width,
                media.height,
                Cdata(&media.uri)
            )?;
        }
        f.write_str("</MediaFiles></Linear>")
    }
}

/// `HH:MM:SS`，毫秒不为零时输出 `HH:MM:SS.mmm`
struct VastDuration(Duration);

impl Display for VastDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        let millis = self.0.subsec_millis();
        write!(f, "{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)?;
        if millis != 0 {
            write!(f, ".{:03}", millis)?;
        }
        Ok(())
    }
}

struct Cdata<'a>(&'a str);

impl Display for Cdata<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // "]]>" 会提前结束 CDATA，拆成两段
        write!(f, "<![CDATA[{}]]>", self.0.replace("]]>", "]]]]><![CDATA[>"))
    }
}

fn escape(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}
