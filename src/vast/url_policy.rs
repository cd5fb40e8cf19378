// src/vast/url_policy.rs

use serde::Serialize;
use url::Url;

use crate::error::{Error, Result};

/// 播放器在发送请求前替换的宏，原样作为查询参数输出
pub const MACRO_QUERY: &str = "ADPLAYHEAD=[ADPLAYHEAD]\
&ADCOUNT=[ADCOUNT]\
&SERVERSIDE=[SERVERSIDE]\
&SERVERUA=[SERVERUA]\
&TIMESTAMP=[TIMESTAMP]\
&CACHEBUSTING=[CACHEBUSTING]\
&APPBUNDLE=[APPBUNDLE]";

const REDIRECT_SEGMENT: &str = "redirect";
const FILES_SEGMENT: &str = "files";

/// 监测地址的寻址方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Addressing {
    /// 直接指向逻辑路径，例如 `/tracking/start/...`
    #[default]
    Direct,
    /// 嵌套在 `/redirect` 下，由服务端 302 跳转到逻辑路径
    Redirect,
}

/// **URL 构造策略**
///
/// 纯字符串拼接，不做任何网络请求。
#[derive(Debug, Clone)]
pub struct UrlPolicy {
    prefix: Url,
    addressing: Addressing,
}

impl UrlPolicy {
    pub fn new(prefix: &str, addressing: Addressing) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidUrlPrefix {
            prefix: prefix.to_string(),
            reason: reason.to_string(),
        };
        let url = Url::parse(prefix).map_err(|e| invalid(&e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("not a base url"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("prefix must not carry a query or fragment"));
        }
        Ok(Self {
            prefix: url,
            addressing,
        })
    }

    pub fn prefix(&self) -> &Url {
        &self.prefix
    }

    pub fn addressing(&self) -> Addressing {
        self.addressing
    }

    /// 把 `segments` 拼接到前缀后面
    ///
    /// `include_macros` 表示面向播放器的监测地址：追加宏参数，
    /// 并在 Redirect 模式下加上 `/redirect` 前缀。空片段会被忽略。
    pub fn build(&self, segments: &[&str], include_macros: bool) -> Url {
        let mut url = self.prefix.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            if include_macros && self.addressing == Addressing::Redirect {
                path.push(REDIRECT_SEGMENT);
            }
            path.extend(segments.iter().filter(|s| !s.is_empty()));
        }
        if include_macros {
            url.set_query(Some(MACRO_QUERY));
        }
        url
    }

    /// 面向播放器的监测地址
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        self.build(segments, true)
    }

    /// 素材文件地址，永远直连
    pub fn media(&self, filename: &str) -> Url {
        self.build(&[FILES_SEGMENT, filename], false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct(prefix: &str) -> UrlPolicy {
        UrlPolicy::new(prefix, Addressing::Direct).unwrap()
    }

    #[test]
    fn endpoints_carry_literal_macros_in_order() {
        let url = direct("http://localhost:5000").endpoint(&["tracking", "start", "1", "a.mp4"]);
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/tracking/start/1/a.mp4?ADPLAYHEAD=[ADPLAYHEAD]&ADCOUNT=[ADCOUNT]\
&SERVERSIDE=[SERVERSIDE]&SERVERUA=[SERVERUA]&TIMESTAMP=[TIMESTAMP]&CACHEBUSTING=[CACHEBUSTING]\
&APPBUNDLE=[APPBUNDLE]"
        );
    }

    #[test]
    fn joins_without_duplicated_or_missing_separators() {
        for prefix in ["http://cdn.example.com/ads", "http://cdn.example.com/ads/"] {
            let url = direct(prefix).build(&["impression", "", "7"], false);
            assert_eq!(url.as_str(), "http://cdn.example.com/ads/impression/7");
        }
    }

    #[test]
    fn redirect_mode_nests_endpoints_but_not_media() {
        let policy = UrlPolicy::new("https://ads.example.com", Addressing::Redirect).unwrap();

        let endpoint = policy.endpoint(&["clickthrough"]);
        assert_eq!(endpoint.path(), "/redirect/clickthrough");
        assert_eq!(endpoint.query(), Some(MACRO_QUERY));

        let media = policy.media("spot.mp4");
        assert_eq!(media.as_str(), "https://ads.example.com/files/spot.mp4");
    }

    #[test]
    fn unsafe_characters_in_segments_are_encoded() {
        let url = direct("http://localhost:5000").media("my ad#1.mp4");
        assert_eq!(url.as_str(), "http://localhost:5000/files/my%20ad%231.mp4");
    }

    #[test]
    fn rejects_prefixes_that_cannot_be_joined() {
        for prefix in ["not a url", "mailto:ads@example.com", "http://localhost:5000/?x=1"] {
            assert!(
                matches!(UrlPolicy::new(prefix, Addressing::Direct), Err(Error::InvalidUrlPrefix { .. })),
                "{} should be rejected",
                prefix
            );
        }
    }
}
