//! 文件服务门面。
//!
//! 传输层只通过 [`FileService`] 调用文件操作；每个路径参数都先经过
//! [`PathResolver`] 解析，解析失败时不会触发任何文件系统操作。

use std::path::PathBuf;

use tracing::warn;

use crate::engine::FileOperationEngine;
use crate::error::Result;
use crate::metadata::FileDescriptor;
use crate::path::{PathResolver, RootConfinement};

/// 文件服务配置，启动时构造一次。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileServiceConfig {
    /// 根目录；为 `None` 时不做任何路径限制。
    pub root_path: Option<PathBuf>,
}

impl FileServiceConfig {
    pub fn confined(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: Some(root_path.into()),
        }
    }

    pub fn unconfined() -> Self {
        Self::default()
    }
}

/// 文件服务接口。
pub trait FileService: Send + Sync {
    /// 列出目录的直接子项。
    fn list(&self, path: &str) -> Result<Vec<FileDescriptor>>;
    /// 递归创建目录。
    fn create_directory(&self, path: &str) -> Result<()>;
    /// 创建新文件并写入内容。
    fn create_file(&self, path: &str, content: &[u8]) -> Result<()>;
    /// 删除文件或目录。
    fn delete(&self, path: &str) -> Result<()>;
    /// 移动文件或目录。
    fn move_entry(&self, src: &str, dst: &str) -> Result<()>;
    /// 复制单个文件，返回复制的字节数。
    fn copy(&self, src: &str, dst: &str) -> Result<u64>;
    /// 获取文件信息。
    fn get_info(&self, path: &str) -> Result<FileDescriptor>;
    /// 创建文档文件，返回最终路径。
    fn create_document(&self, path: &str, doc_type: &str, content: &str) -> Result<PathBuf>;
}

/// 组合路径解析与操作引擎的默认实现。
#[derive(Debug, Clone)]
pub struct FileServiceFacade {
    resolver: PathResolver,
    engine: FileOperationEngine,
}

impl FileServiceFacade {
    /// 根据配置创建服务。配置了根目录但无法规范化时返回错误。
    pub fn new(config: &FileServiceConfig) -> Result<Self> {
        let confinement = config
            .root_path
            .as_ref()
            .map(RootConfinement::new)
            .transpose()?;

        if confinement.is_none() {
            warn!("no root path configured, file operations are not confined");
        }

        Ok(Self::with_resolver(PathResolver::new(confinement)))
    }

    pub fn with_resolver(resolver: PathResolver) -> Self {
        Self {
            resolver,
            engine: FileOperationEngine::new(),
        }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }
}

impl FileService for FileServiceFacade {
    fn list(&self, path: &str) -> Result<Vec<FileDescriptor>> {
        let path = self.resolver.resolve(path)?;
        self.engine.list(&path)
    }

    fn create_directory(&self, path: &str) -> Result<()> {
        let path = self.resolver.resolve(path)?;
        self.engine.create_directory(&path)
    }

    fn create_file(&self, path: &str, content: &[u8]) -> Result<()> {
        let path = self.resolver.resolve(path)?;
        self.engine.create_file(&path, content)
    }

    fn delete(&self, path: &str) -> Result<()> {
        let path = self.resolver.resolve_entry(path)?;
        self.engine.delete(&path)
    }

    fn move_entry(&self, src: &str, dst: &str) -> Result<()> {
        let src = self.resolver.resolve_entry(src)?;
        let dst = self.resolver.resolve(dst)?;
        self.engine.move_entry(&src, &dst)
    }

    fn copy(&self, src: &str, dst: &str) -> Result<u64> {
        let src = self.resolver.resolve(src)?;
        let dst = self.resolver.resolve(dst)?;
        self.engine.copy(&src, &dst)
    }

    fn get_info(&self, path: &str) -> Result<FileDescriptor> {
        let path = self.resolver.resolve_entry(path)?;
        self.engine.get_info(&path)
    }

    fn create_document(&self, path: &str, doc_type: &str, content: &str) -> Result<PathBuf> {
        let path = self.resolver.resolve(path)?;
        self.engine.create_document(&path, doc_type, content)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::FileSystemError;

    fn confined_facade(root: &std::path::Path) -> FileServiceFacade {
        FileServiceFacade::new(&FileServiceConfig::confined(root)).expect("facade")
    }

    #[test]
    fn test_missing_root_is_a_startup_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = FileServiceConfig::confined(dir.path().join("absent"));

        assert!(FileServiceFacade::new(&config).is_err());
    }

    #[test]
    fn test_unconfined_config() {
        let facade = FileServiceFacade::new(&FileServiceConfig::unconfined()).expect("facade");
        assert!(facade.resolver().root().is_none());
    }

    #[test]
    fn test_relative_paths_land_under_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let facade = confined_facade(dir.path());

        facade
            .create_file("inbox/hello.txt", b"hi")
            .expect("create file");

        assert_eq!(
            fs::read(dir.path().join("inbox").join("hello.txt")).expect("read"),
            b"hi"
        );
        let info = facade.get_info("inbox/hello.txt").expect("info");
        let root = facade.resolver().root().expect("confined");
        assert_eq!(
            info.path,
            root.join("inbox").join("hello.txt").display().to_string()
        );
    }

    #[test]
    fn test_rejected_paths_never_reach_the_filesystem() {
        let dir = tempfile::tempdir().expect("tempdir");
        let jail = dir.path().join("jail");
        fs::create_dir(&jail).expect("mkdir");
        let outside = dir.path().join("outside.txt");
        fs::write(&outside, b"keep me").expect("write");
        let outside_str = outside.to_str().expect("utf-8 path");

        let facade = confined_facade(&jail);

        let err = facade.delete(outside_str).expect_err("delete outside");
        assert!(matches!(err, FileSystemError::OutsideRoot { .. }));
        assert!(outside.exists());

        let err = facade
            .create_file("../escape.txt", b"x")
            .expect_err("create outside");
        assert!(matches!(err, FileSystemError::OutsideRoot { .. }));
        assert!(!dir.path().join("escape.txt").exists());

        // 目标路径越界时源文件保持不动。
        fs::write(jail.join("inside.txt"), b"in").expect("write");
        let err = facade
            .move_entry("inside.txt", "../moved.txt")
            .expect_err("move outside");
        assert!(matches!(err, FileSystemError::OutsideRoot { .. }));
        assert!(jail.join("inside.txt").exists());

        let err = facade
            .copy(outside_str, "copied.txt")
            .expect_err("copy from outside");
        assert!(matches!(err, FileSystemError::OutsideRoot { .. }));
        assert!(!jail.join("copied.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_link_to_outside_can_be_inspected_and_deleted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let jail = dir.path().join("jail");
        let outside = dir.path().join("outside");
        fs::create_dir(&jail).expect("mkdir jail");
        fs::create_dir(&outside).expect("mkdir outside");
        fs::write(outside.join("secret.txt"), b"secret").expect("write");
        std::os::unix::fs::symlink(&outside, jail.join("link")).expect("symlink");

        let facade = confined_facade(&jail);

        let err = facade.list("link").expect_err("listing through the link");
        assert!(matches!(err, FileSystemError::OutsideRoot { .. }));

        let info = facade.get_info("link").expect("info on the link");
        assert!(info.is_symlink);
        assert_eq!(info.symlink_target, outside.display().to_string());

        facade.delete("link").expect("delete the link");
        assert!(fs::symlink_metadata(jail.join("link")).is_err());
        assert_eq!(fs::read(outside.join("secret.txt")).expect("read"), b"secret");
    }

    #[test]
    fn test_create_document_resolves_before_completing_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let facade = confined_facade(dir.path());

        let written = facade
            .create_document("notes/todo", "txt", "- buy milk\n")
            .expect("create document");

        let root = facade.resolver().root().expect("confined");
        assert_eq!(written, root.join("notes").join("todo.txt"));
        assert_eq!(
            fs::read_to_string(&written).expect("read"),
            "- buy milk\n"
        );
    }
}
