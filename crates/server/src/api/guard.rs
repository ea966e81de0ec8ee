//! 路径参数校验中间件。
//!
//! 在分发到 handler 之前检查 `path`、`src`、`dst` 查询参数，
//! 与文件服务的根目录限制相互独立。

use std::collections::HashMap;

use axum::extract::{Query, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jia_file_engine::validate_request_path;
use tracing::warn;

use super::files::ApiError;

pub async fn validate_path_params(request: Request, next: Next) -> Response {
    // 查询串无法解析时交给 handler 自己的提取器处理。
    if let Ok(Query(params)) = Query::<HashMap<String, String>>::try_from_uri(request.uri()) {
        if let Err(err) = check_params(&params) {
            warn!(uri = %request.uri(), "rejected request path parameter");
            return err.into_response();
        }
    }

    next.run(request).await
}

fn check_params(params: &HashMap<String, String>) -> Result<(), ApiError> {
    let present = |key: &str| params.get(key).filter(|value| !value.is_empty());

    if present("path").is_some_and(|path| validate_request_path(path).is_err()) {
        return Err(ApiError::param_missing("Path must be an absolute path"));
    }

    if ["src", "dst"]
        .into_iter()
        .filter_map(present)
        .any(|path| validate_request_path(path).is_err())
    {
        return Err(ApiError::param_missing(
            "Source and destination paths must be absolute paths",
        ));
    }

    Ok(())
}
