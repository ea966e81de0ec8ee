//! API 路由模块。
//!
//! 把 HTTP 请求翻译为文件服务调用，并统一包装为 `{code, message, data}` 响应。

pub mod files;
pub mod guard;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{Method, header};
use axum::middleware;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use files::create_file_router;
pub use state::AppState;

/// 组装完整的应用路由与中间件。
///
/// 中间件由外到内：请求日志、panic 恢复、CORS、路径校验。
pub fn create_router(state: Arc<AppState>, max_body_size: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    create_file_router()
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(middleware::from_fn(guard::validate_path_params))
        .layer(cors)
        .layer(CatchPanicLayer::new())
        .layer(trace)
}
