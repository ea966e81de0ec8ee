//! 统一的应用状态。

use std::sync::Arc;

use jia_file_engine::FileService;

/// 统一的应用状态，包含所有 handler 共享的数据。
#[derive(Clone)]
pub struct AppState {
    /// 文件服务（已包含根目录限制）。
    pub files: Arc<dyn FileService>,
}

impl AppState {
    /// 创建新的应用状态。
    pub fn new(files: Arc<dyn FileService>) -> Self {
        Self { files }
    }
}
