//! 文件操作引擎。
//!
//! 所有方法接收的都是已经过根目录限制检查的路径，引擎本身不做任何限制。

use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{FileSystemError, Result};
use crate::metadata::{FileDescriptor, describe_entry, describe_path, extension_of};

/// 无状态的文件操作引擎，每次调用都直接访问文件系统。
#[derive(Debug, Clone, Copy, Default)]
pub struct FileOperationEngine;

impl FileOperationEngine {
    pub fn new() -> Self {
        Self
    }

    /// 列出目录的直接子项，保持文件系统返回的顺序。
    ///
    /// 无法读取元信息的条目会被跳过，不会导致整个列表失败。
    pub fn list(&self, path: &Path) -> Result<Vec<FileDescriptor>> {
        fs::metadata(path).map_err(|e| FileSystemError::io_or_not_found(path, e))?;

        info!(path = %path.display(), "listing directory");

        let entries = fs::read_dir(path).map_err(|e| FileSystemError::io(path, e))?;
        Ok(skip_unreadable(
            entries.map(|entry| entry.and_then(|entry| describe_entry(&entry))),
        ))
    }

    /// 递归创建目录，目录已存在时视为成功。
    pub fn create_directory(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| FileSystemError::io(path, e))?;
        info!(path = %path.display(), "directory created");
        Ok(())
    }

    /// 创建新文件并写入内容。目标已存在时返回 `AlreadyExists`。
    pub fn create_file(&self, path: &Path, content: &[u8]) -> Result<()> {
        if fs::symlink_metadata(path).is_ok() {
            return Err(FileSystemError::AlreadyExists(path.to_path_buf()));
        }

        ensure_parent(path)?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::AlreadyExists {
                    FileSystemError::AlreadyExists(path.to_path_buf())
                } else {
                    FileSystemError::io(path, e)
                }
            })?;
        file.write_all(content)
            .map_err(|e| FileSystemError::io(path, e))?;

        info!(path = %path.display(), bytes = content.len(), "file created");
        Ok(())
    }

    /// 删除文件或递归删除目录。符号链接只删除链接本身。
    pub fn delete(&self, path: &Path) -> Result<()> {
        let metadata =
            fs::symlink_metadata(path).map_err(|e| FileSystemError::io_or_not_found(path, e))?;

        let removed = if metadata.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        removed.map_err(|e| FileSystemError::io(path, e))?;

        info!(path = %path.display(), "deleted");
        Ok(())
    }

    /// 重命名/移动。跨设备移动由底层 `rename` 直接报错，不做复制回退。
    pub fn move_entry(&self, src: &Path, dst: &Path) -> Result<()> {
        fs::rename(src, dst).map_err(|e| FileSystemError::io(src, e))?;
        info!(src = %src.display(), dst = %dst.display(), "moved");
        Ok(())
    }

    /// 按字节流复制单个普通文件，不复制目录、FIFO 等特殊文件。
    ///
    /// 失败时目标可能只写入了一部分，调用方需自行清理。
    pub fn copy(&self, src: &Path, dst: &Path) -> Result<u64> {
        let metadata = fs::metadata(src).map_err(|e| FileSystemError::io_or_not_found(src, e))?;
        if !metadata.is_file() {
            return Err(FileSystemError::InvalidArgument(format!(
                "只能复制普通文件: {}",
                src.display()
            )));
        }

        let mut reader = File::open(src).map_err(|e| FileSystemError::io_or_not_found(src, e))?;
        // 目标与源是同一文件时，创建目标会先截断源文件。
        if is_same_file(src, &metadata, dst) {
            return Err(FileSystemError::InvalidArgument(format!(
                "源文件与目标文件相同: {}",
                dst.display()
            )));
        }
        let mut writer = File::create(dst).map_err(|e| FileSystemError::io(dst, e))?;

        let copied = io::copy(&mut reader, &mut writer).map_err(|e| FileSystemError::io(dst, e))?;
        writer.sync_all().map_err(|e| FileSystemError::io(dst, e))?;

        info!(src = %src.display(), dst = %dst.display(), bytes = copied, "copied");
        Ok(copied)
    }

    /// 获取路径本身的描述信息。
    pub fn get_info(&self, path: &Path) -> Result<FileDescriptor> {
        describe_path(path).map_err(|e| FileSystemError::io_or_not_found(path, e))
    }

    /// 创建文档文件并写入内容。
    ///
    /// 路径没有扩展名且给出了文档类型时自动补全扩展名；已存在的文件会被覆盖。
    /// 返回最终写入的路径。
    pub fn create_document(&self, path: &Path, doc_type: &str, content: &str) -> Result<PathBuf> {
        let path = complete_extension(path, doc_type);

        ensure_parent(&path)?;
        fs::write(&path, content).map_err(|e| FileSystemError::io(&path, e))?;

        info!(path = %path.display(), doc_type, bytes = content.len(), "document created");
        Ok(path)
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| FileSystemError::io(parent, e))
        }
        _ => Ok(()),
    }
}

#[cfg(unix)]
fn is_same_file(_src: &Path, src_metadata: &Metadata, dst: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    fs::metadata(dst)
        .is_ok_and(|dst| dst.dev() == src_metadata.dev() && dst.ino() == src_metadata.ino())
}

#[cfg(not(unix))]
fn is_same_file(src: &Path, _src_metadata: &Metadata, dst: &Path) -> bool {
    match (src.canonicalize(), dst.canonicalize()) {
        (Ok(src), Ok(dst)) => src == dst,
        _ => false,
    }
}

fn complete_extension(path: &Path, doc_type: &str) -> PathBuf {
    let doc_type = doc_type.trim_start_matches('.');
    let has_extension = path
        .file_name()
        .is_some_and(|name| !extension_of(&name.to_string_lossy()).is_empty());

    if has_extension || doc_type.is_empty() {
        return path.to_path_buf();
    }

    let mut completed = path.as_os_str().to_owned();
    completed.push(".");
    completed.push(doc_type);
    PathBuf::from(completed)
}

/// 收集可读的条目，跳过读取失败的条目。
fn skip_unreadable<I>(entries: I) -> Vec<FileDescriptor>
where
    I: IntoIterator<Item = io::Result<FileDescriptor>>,
{
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(descriptor) => Some(descriptor),
            Err(err) => {
                debug!(error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .collect()
}
