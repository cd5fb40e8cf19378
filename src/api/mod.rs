pub mod handlers;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// 组装全部路由
pub fn router(state: Arc<AppState>) -> Router {
    let files = ServeDir::new(&state.media_dir);
    Router::new()
        .route("/adlist", get(handlers::handle_adlist))
        .route("/error", get(handlers::handle_beacon))
        .route("/impression/{*rest}", get(handlers::handle_beacon))
        .route("/tracking/{*rest}", get(handlers::handle_beacon))
        .route("/clickthrough", get(handlers::handle_beacon))
        .route("/clickthrough/{*rest}", get(handlers::handle_beacon))
        .route("/redirect/{*rest}", get(handlers::handle_redirect))
        .route("/healthz", get(handlers::handle_health))
        .nest_service("/files", files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
