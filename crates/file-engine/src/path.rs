//! 路径解析模块。
//!
//! 把调用方传入的路径解析为实际用于 IO 的路径，并在配置了根目录时
//! 拒绝任何逃逸出根目录的路径。

use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{FileSystemError, Result};

/// 根目录限制。
///
/// 根目录在构造时规范化（绝对路径、解析符号链接）一次，之后不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootConfinement {
    root: PathBuf,
}

impl RootConfinement {
    /// 规范化根目录。根目录不存在或不是目录时返回错误，调用方应视为启动失败。
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let canonical = root
            .canonicalize()
            .map_err(|e| FileSystemError::io_or_not_found(root, e))?;

        if !canonical.is_dir() {
            return Err(FileSystemError::InvalidArgument(format!(
                "根目录不是目录: {}",
                canonical.display()
            )));
        }

        Ok(Self { root: canonical })
    }

    /// 规范化后的根目录。
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn confine(&self, raw: &Path, follow_final: bool) -> Result<PathBuf> {
        let joined = if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            self.root.join(raw)
        };
        let resolved = normalize_lexically(&joined);

        if !resolved.starts_with(&self.root) {
            warn!(
                path = %raw.display(),
                root = %self.root.display(),
                "path resolves outside root"
            );
            return Err(self.outside(raw));
        }

        // 已存在的部分可能经过指向根目录外的符号链接。
        // 不跟随末级链接的操作只检查父目录链。
        let checked = match resolved.parent() {
            Some(parent) if !follow_final && resolved != self.root => parent,
            _ => resolved.as_path(),
        };
        if let Some(real) = canonicalize_existing_prefix(checked) {
            if !real.starts_with(&self.root) {
                warn!(
                    path = %raw.display(),
                    real = %real.display(),
                    "path escapes root through a symlink"
                );
                return Err(self.outside(raw));
            }
        }

        Ok(resolved)
    }

    fn outside(&self, raw: &Path) -> FileSystemError {
        FileSystemError::OutsideRoot {
            path: raw.to_path_buf(),
            root: self.root.clone(),
        }
    }
}

/// 路径解析器：未配置根目录时直接透传，配置后强制限制在根目录内。
#[derive(Debug, Clone)]
pub enum PathResolver {
    /// 无根目录限制（兼容模式，不安全）。
    Unconfined,
    /// 所有路径必须落在根目录内。
    Confined(RootConfinement),
}

impl PathResolver {
    pub fn new(confinement: Option<RootConfinement>) -> Self {
        match confinement {
            Some(confinement) => Self::Confined(confinement),
            None => Self::Unconfined,
        }
    }

    pub fn root(&self) -> Option<&Path> {
        match self {
            Self::Unconfined => None,
            Self::Confined(confinement) => Some(confinement.root()),
        }
    }

    /// 解析调用方路径。
    ///
    /// - 空路径返回 `InvalidArgument`；
    /// - 未配置根目录时原样返回；
    /// - 相对路径拼接到根目录下；
    /// - 绝对路径在消解 `.`/`..` 后必须位于根目录内，否则返回 `OutsideRoot`。
    pub fn resolve(&self, raw: &str) -> Result<PathBuf> {
        self.resolve_with(raw, true)
    }

    /// 与 [`PathResolver::resolve`] 相同，但不跟随末级符号链接。
    ///
    /// 用于只作用于链接本身的操作（删除、查看信息、作为移动源），
    /// 这样根目录内指向外部的链接仍可被删除或查看。
    pub fn resolve_entry(&self, raw: &str) -> Result<PathBuf> {
        self.resolve_with(raw, false)
    }

    fn resolve_with(&self, raw: &str, follow_final: bool) -> Result<PathBuf> {
        if raw.is_empty() {
            return Err(FileSystemError::InvalidArgument("路径不能为空".to_string()));
        }

        let resolved = match self {
            Self::Unconfined => PathBuf::from(raw),
            Self::Confined(confinement) => confinement.confine(Path::new(raw), follow_final)?,
        };

        debug!(raw, resolved = %resolved.display(), "path resolved");
        Ok(resolved)
    }
}

/// 传输层的额外防线：路径必须是绝对路径，且不含 `.` 或 `..` 段。
///
/// 与根目录限制无关，未配置根目录时同样适用。
pub fn validate_request_path(raw: &str) -> Result<()> {
    if !Path::new(raw).is_absolute() {
        return Err(FileSystemError::InvalidArgument(format!(
            "路径必须是绝对路径: {raw}"
        )));
    }

    if raw
        .split(std::path::is_separator)
        .any(|segment| segment == "." || segment == "..")
    {
        return Err(FileSystemError::InvalidArgument(format!(
            "路径不能包含 . 或 .. 段: {raw}"
        )));
    }

    Ok(())
}

/// 不访问文件系统，按字面消解 `.` 与 `..`。
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                normalized.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
        }
    }
    normalized
}

/// 规范化路径中已存在的最长前缀。
fn canonicalize_existing_prefix(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .find_map(|ancestor| ancestor.canonicalize().ok())
}
