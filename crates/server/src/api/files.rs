//! 文件操作 API 路由。
//!
//! 每个路由只调用一次文件服务操作，结果统一包装为 [`ApiResponse`]。

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use jia_file_api_types::{
    ApiResponse, CreateDocumentRequest, CreateDocumentResponse, HealthCheckResponse, codes,
};
use jia_file_engine::{FileDescriptor, FileService, FileSystemError, validate_request_path};
use serde::Deserialize;
use tracing::{error, warn};

use super::state::AppState;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// 创建文件操作 API 路由。
pub fn create_file_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        // 列出目录内容
        .route("/list", get(list).fallback(method_not_allowed))
        // 创建目录
        .route("/mkdir", post(create_directory).fallback(method_not_allowed))
        // 创建文件，请求体即文件内容
        .route("/touch", post(create_file).fallback(method_not_allowed))
        // 删除文件或目录
        .route("/delete", delete(delete_entry).fallback(method_not_allowed))
        // 移动文件或目录
        .route("/move", post(move_entry).fallback(method_not_allowed))
        // 复制文件
        .route("/copy", post(copy_file).fallback(method_not_allowed))
        // 获取文件信息
        .route("/info", get(get_info).fallback(method_not_allowed))
        // 创建文档
        .route("/document", post(create_document).fallback(method_not_allowed))
}

/// 单路径查询参数。
#[derive(Debug, Deserialize)]
struct PathQuery {
    path: Option<String>,
}

impl PathQuery {
    fn require(self) -> Result<String, ApiError> {
        self.path
            .filter(|path| !path.is_empty())
            .ok_or_else(|| ApiError::param_missing("Missing path parameter"))
    }
}

/// 源/目标路径查询参数。
#[derive(Debug, Deserialize)]
struct TransferQuery {
    src: Option<String>,
    dst: Option<String>,
}

impl TransferQuery {
    fn require(self) -> Result<(String, String), ApiError> {
        match (self.src, self.dst) {
            (Some(src), Some(dst)) if !src.is_empty() && !dst.is_empty() => Ok((src, dst)),
            _ => Err(ApiError::param_missing("Missing src or dst parameter")),
        }
    }
}

async fn index() -> &'static str {
    "Welcome to jia-file server!"
}

async fn health() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse::ok())
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(codes::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// 列出目录内容。
async fn list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PathQuery>, QueryRejection>,
) -> ApiResult<Vec<FileDescriptor>> {
    let path = query?.0.require()?;
    let entries = run_blocking(&state, "list", move |files| files.list(&path)).await?;
    Ok(Json(ApiResponse::success("success", entries)))
}

/// 创建目录。
async fn create_directory(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PathQuery>, QueryRejection>,
) -> ApiResult<()> {
    let path = query?.0.require()?;
    run_blocking(&state, "create_directory", move |files| {
        files.create_directory(&path)
    })
    .await?;
    Ok(Json(ApiResponse::ok("Directory created successfully")))
}

/// 创建文件，请求体作为文件内容写入。
async fn create_file(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PathQuery>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<()> {
    let path = query?.0.require()?;
    let body = body?;
    run_blocking(&state, "create_file", move |files| {
        files.create_file(&path, &body)
    })
    .await?;
    Ok(Json(ApiResponse::ok("File created successfully")))
}

/// 删除文件或目录。
async fn delete_entry(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PathQuery>, QueryRejection>,
) -> ApiResult<()> {
    let path = query?.0.require()?;
    run_blocking(&state, "delete", move |files| files.delete(&path)).await?;
    Ok(Json(ApiResponse::ok(
        "File or directory deleted successfully",
    )))
}

/// 移动文件或目录。
async fn move_entry(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TransferQuery>, QueryRejection>,
) -> ApiResult<()> {
    let (src, dst) = query?.0.require()?;
    run_blocking(&state, "move", move |files| files.move_entry(&src, &dst)).await?;
    Ok(Json(ApiResponse::ok("File or directory moved successfully")))
}

/// 复制文件。
async fn copy_file(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TransferQuery>, QueryRejection>,
) -> ApiResult<()> {
    let (src, dst) = query?.0.require()?;
    run_blocking(&state, "copy", move |files| files.copy(&src, &dst)).await?;
    Ok(Json(ApiResponse::ok("File or directory copied successfully")))
}

/// 获取文件信息。
async fn get_info(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PathQuery>, QueryRejection>,
) -> ApiResult<FileDescriptor> {
    let path = query?.0.require()?;
    let info = run_blocking(&state, "get_info", move |files| files.get_info(&path)).await?;
    Ok(Json(ApiResponse::success("success", info)))
}

/// 创建文档。请求体为 JSON：`{path, type, content}`。
async fn create_document(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<CreateDocumentResponse> {
    let body = body?;
    let request: CreateDocumentRequest = serde_json::from_slice(&body).map_err(|err| {
        warn!(error = %err, "failed to decode create document request");
        ApiError::param_missing("Invalid request body")
    })?;

    if request.path.is_empty() || request.doc_type.is_empty() {
        return Err(ApiError::param_missing("Path and type are required"));
    }
    if validate_request_path(&request.path).is_err() {
        return Err(ApiError::param_missing("Path must be an absolute path"));
    }

    let written = run_blocking(&state, "create_document", move |files| {
        files.create_document(&request.path, &request.doc_type, &request.content)
    })
    .await?;

    Ok(Json(ApiResponse::success(
        "Document created successfully",
        CreateDocumentResponse {
            path: written.display().to_string(),
        },
    )))
}

/// 在阻塞线程池中执行文件操作，失败时记录日志并转换为 [`ApiError`]。
async fn run_blocking<T, F>(state: &AppState, operation: &'static str, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn FileService) -> jia_file_engine::Result<T> + Send + 'static,
{
    let files = Arc::clone(&state.files);
    let result = tokio::task::spawn_blocking(move || op(files.as_ref()))
        .await
        .map_err(|err| {
            error!(operation, error = %err, "file operation task failed");
            ApiError::new(codes::OPERATION_FAILED, format!("{operation} failed: {err}"))
        })?;

    result.map_err(|err| {
        error!(operation, error = %err, "file operation failed");
        ApiError::from(err)
    })
}

/// API 错误，序列化为 `code != 0` 的统一响应。
#[derive(Debug)]
pub struct ApiError {
    pub code: i32,
    pub message: String,
}

impl ApiError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn param_missing(message: impl Into<String>) -> Self {
        Self::new(codes::PARAM_MISSING, message)
    }
}

impl From<FileSystemError> for ApiError {
    fn from(err: FileSystemError) -> Self {
        let code = match &err {
            FileSystemError::InvalidArgument(_) => codes::PARAM_MISSING,
            FileSystemError::NotFound(_) => codes::PATH_NOT_EXIST,
            FileSystemError::OutsideRoot { .. }
            | FileSystemError::AlreadyExists(_)
            | FileSystemError::Io { .. } => codes::OPERATION_FAILED,
        };
        Self::new(code, err.to_string())
    }
}

/// 查询串无法反序列化（例如重复的参数）。
impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!(error = %rejection, "rejected query string");
        Self::param_missing(rejection.body_text())
    }
}

/// 请求体读取失败，包括超过大小上限。
impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        warn!(status = %rejection.status(), error = %rejection, "rejected request body");
        Self::new(codes::OPERATION_FAILED, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        Json(ApiResponse::<()>::failure(self.code, self.message)).into_response()
    }
}
