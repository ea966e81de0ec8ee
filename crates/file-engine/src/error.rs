use std::path::PathBuf;

use thiserror::Error;

/// 文件操作错误类型。
#[derive(Debug, Error)]
pub enum FileSystemError {
    #[error("参数无效: {0}")]
    InvalidArgument(String),

    #[error("路径超出根目录: {} (root: {})", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("路径不存在: {}", .0.display())]
    NotFound(PathBuf),

    #[error("文件已存在: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("IO 错误 ({}): {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FileSystemError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// 与 [`FileSystemError::io`] 相同，但把 `NotFound` 类 IO 错误映射为 [`FileSystemError::NotFound`]。
    pub(crate) fn io_or_not_found(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::io(path, source)
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, FileSystemError>;
