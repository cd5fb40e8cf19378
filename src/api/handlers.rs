// src/api/handlers.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::logging::SelectionLog;
use crate::selection::select;
use crate::AppState;

pub const POD_MAX_DUR: &str = "pod_max_dur";
const REDIRECT_PREFIX: &str = "/redirect";

/// **处理广告列表请求** `GET /adlist?pod_max_dur=<秒>`
///
/// 选出的素材组装成 VAST 返回 200；没有可行组合时返回 404 空响应。
pub async fn handle_adlist(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let raw = params.get(POD_MAX_DUR).map(String::as_str);
    let budget = parse_pod_max_dur(raw);

    let catalog = state.catalog.snapshot();
    let mut log = SelectionLog::new(&request_id, raw, budget, state.selection);

    let response = match select(catalog.creatives(), budget, state.selection) {
        Some(selection) => {
            log.set_selection(&selection);
            let picked = selection
                .candidate
                .creatives()
                .iter()
                .map(|c| c.to_string())
                .collect::<String>();
            info!(
                %request_id,
                tied = selection.tied,
                total_ms = selection.candidate.total_duration().as_millis() as u64,
                "select du[{:?}]: {}",
                budget,
                picked
            );

            match state.assembler.assemble(selection.candidate.creatives()) {
                Ok(vast) => {
                    let body = vast.to_xml();
                    (
                        StatusCode::OK,
                        [
                            (header::CONTENT_TYPE, HeaderValue::from_static("application/xml")),
                            (header::CONTENT_LENGTH, HeaderValue::from(body.len())),
                        ],
                        body,
                    )
                        .into_response()
                }
                Err(e) => {
                    error!(%request_id, "failed to assemble VAST: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
        None => {
            info!(%request_id, "select du[{:?}]: not exists", budget);
            StatusCode::NOT_FOUND.into_response()
        }
    };

    state.selection_logger.record(log);
    response
}

/// 解析广告位时长（秒），缺失、非数字或负数都按 0 处理
pub fn parse_pod_max_dur(raw: Option<&str>) -> Duration {
    match raw.map(str::trim).map(str::parse::<i64>) {
        Some(Ok(secs)) if secs > 0 => Duration::from_secs(secs.unsigned_abs()),
        Some(Ok(_)) => Duration::ZERO,
        _ => {
            warn!("invalid pod_max_dur, {:?}", raw);
            Duration::ZERO
        }
    }
}

/// 曝光、监测、点击、错误上报的落地端点，只记录日志
pub async fn handle_beacon(uri: Uri) -> StatusCode {
    info!(path = %uri.path(), query = uri.query().unwrap_or(""), "beacon received");
    StatusCode::OK
}

/// `GET /redirect/<rest>` 302 跳转到 `/<rest>`，保留原始查询参数
///
/// 目标始终是本站的绝对路径，开头多余的 `/` 或 `\` 会被折叠。
pub async fn handle_redirect(uri: Uri) -> Response {
    let target = redirect_target(uri.path(), uri.query());
    match HeaderValue::from_str(&target) {
        Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

fn redirect_target(path: &str, query: Option<&str>) -> String {
    let rest = match path.strip_prefix(REDIRECT_PREFIX) {
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches(['/', '\\']),
        _ => "",
    };
    match query {
        Some(query) => format!("/{}?{}", rest, query),
        None => format!("/{}", rest),
    }
}

pub async fn handle_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "creatives": state.catalog.snapshot().len(),
    }))
}
