//! 文件元信息提取。

use std::fs::{self, DirEntry, Metadata};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mime::{EntryKind, detect_mime_type};

/// 单个文件或目录的描述信息。
///
/// JSON 字段名与既有客户端保持一致。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// 文件名。
    pub name: String,
    /// 是否为目录（符号链接本身不算目录）。
    #[serde(rename = "isDir")]
    pub is_directory: bool,
    /// 文件大小（字节）。
    #[serde(rename = "size")]
    pub size_bytes: u64,
    /// 人类可读的文件大小。
    #[serde(rename = "sizeHuman")]
    pub size_human: String,
    /// 解析后的完整路径。
    pub path: String,
    /// 扩展名，包含前导点；无扩展名时为空。
    #[serde(rename = "ext")]
    pub extension: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "createTime")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "modTime")]
    pub modified_at: DateTime<Utc>,
    #[serde(rename = "accessTime")]
    pub accessed_at: DateTime<Utc>,
    /// 权限字符串，例如 `-rw-r--r--`。
    #[serde(rename = "mode")]
    pub permission_string: String,
    #[serde(rename = "isHidden")]
    pub is_hidden: bool,
    #[serde(rename = "isSymlink")]
    pub is_symlink: bool,
    /// 符号链接目标，非符号链接或读取失败时为空。
    #[serde(rename = "symlinkTarget")]
    pub symlink_target: String,
}

/// 描述目录中的一个条目，不跟随符号链接。
pub fn describe_entry(entry: &DirEntry) -> std::io::Result<FileDescriptor> {
    let metadata = entry.metadata()?;
    let name = entry.file_name().to_string_lossy().into_owned();
    Ok(build_descriptor(&entry.path(), name, &metadata))
}

/// 描述单个路径本身（而不是它的子项），不跟随符号链接。
pub fn describe_path(path: &Path) -> std::io::Result<FileDescriptor> {
    let metadata = fs::symlink_metadata(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(build_descriptor(path, name, &metadata))
}

fn build_descriptor(path: &Path, name: String, metadata: &Metadata) -> FileDescriptor {
    let is_symlink = metadata.file_type().is_symlink();
    let symlink_target = if is_symlink {
        fs::read_link(path)
            .map(|target| target.display().to_string())
            .unwrap_or_default()
    } else {
        String::new()
    };

    let is_directory = metadata.is_dir();
    let modified = metadata.modified().unwrap_or(UNIX_EPOCH);
    let created = metadata.created().unwrap_or(modified);
    let accessed = metadata.accessed().unwrap_or(modified);

    FileDescriptor {
        extension: extension_of(&name),
        is_hidden: name.starts_with('.'),
        name,
        is_directory,
        size_bytes: metadata.len(),
        size_human: format_size(metadata.len()),
        path: path.display().to_string(),
        mime_type: detect_mime_type(path, EntryKind::from(metadata.file_type())),
        created_at: to_utc(created),
        modified_at: to_utc(modified),
        accessed_at: to_utc(accessed),
        permission_string: permission_string(metadata),
        is_symlink,
        symlink_target,
    }
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

/// 从文件名推导扩展名（含前导点）。只有前导点的隐藏文件没有扩展名。
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// 将字节数格式化为人类可读的大小（1024 进制）。
pub fn format_size(size: u64) -> String {
    const UNIT: u64 = 1024;
    const PREFIXES: &[u8] = b"KMGTPE";

    if size < UNIT {
        return format!("{size} B");
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = size / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!(
        "{:.1} {}B",
        size as f64 / div as f64,
        char::from(PREFIXES[exp])
    )
}

#[cfg(unix)]
fn permission_string(metadata: &Metadata) -> String {
    use std::os::unix::fs::{FileTypeExt, PermissionsExt};

    let file_type = metadata.file_type();
    let kind = if file_type.is_dir() {
        'd'
    } else if file_type.is_symlink() {
        'l'
    } else if file_type.is_fifo() {
        'p'
    } else if file_type.is_socket() {
        's'
    } else if file_type.is_char_device() {
        'c'
    } else if file_type.is_block_device() {
        'b'
    } else {
        '-'
    };

    render_mode(kind, metadata.permissions().mode())
}

#[cfg(not(unix))]
fn permission_string(metadata: &Metadata) -> String {
    let kind = if metadata.is_dir() { 'd' } else { '-' };
    let mode = if metadata.permissions().readonly() {
        0o444
    } else {
        0o666
    };
    render_mode(kind, mode)
}

/// 按 `ls -l` 的格式渲染权限位，包括 setuid/setgid/sticky。
fn render_mode(kind: char, mode: u32) -> String {
    let mut rendered = String::with_capacity(10);
    rendered.push(kind);

    for (shift, special_bit, special) in [(6, 0o4000, 's'), (3, 0o2000, 's'), (0, 0o1000, 't')] {
        let bits = (mode >> shift) & 0o7;
        rendered.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        rendered.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        rendered.push(match (mode & special_bit != 0, bits & 0o1 != 0) {
            (true, true) => special,
            (true, false) => special.to_ascii_uppercase(),
            (false, true) => 'x',
            (false, false) => '-',
        });
    }

    rendered
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1_048_576), "1.0 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.0 GB");
        assert_eq!(format_size(u64::MAX), "16.0 EB");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("report.pdf"), ".pdf");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("Makefile"), "");
        assert_eq!(extension_of(".hidden"), "");
    }

    #[test]
    fn test_render_mode() {
        assert_eq!(render_mode('-', 0o644), "-rw-r--r--");
        assert_eq!(render_mode('d', 0o755), "drwxr-xr-x");
        assert_eq!(render_mode('-', 0o4755), "-rwsr-xr-x");
        assert_eq!(render_mode('d', 0o1777), "drwxrwxrwt");
        assert_eq!(render_mode('-', 0o2640), "-rw-r-S---");
    }

    #[test]
    fn test_describe_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        fs::write(&path, vec![b'a'; 1536]).expect("write");

        let info = describe_path(&path).expect("describe");
        assert_eq!(info.name, "notes.txt");
        assert!(!info.is_directory);
        assert_eq!(info.size_bytes, 1536);
        assert_eq!(info.size_human, "1.5 KB");
        assert_eq!(info.path, path.display().to_string());
        assert_eq!(info.extension, ".txt");
        assert!(info.mime_type.starts_with("text/plain"));
        assert!(!info.is_hidden);
        assert!(!info.is_symlink);
        assert!(info.symlink_target.is_empty());
        assert_eq!(info.permission_string.len(), 10);
        assert!(info.permission_string.starts_with('-'));
        assert!(info.created_at <= Utc::now());
    }

    #[test]
    fn test_describe_directory_and_hidden() {
        let dir = tempfile::tempdir().expect("tempdir");
        let hidden = dir.path().join(".hidden");
        fs::create_dir(&hidden).expect("mkdir");

        let info = describe_path(&hidden).expect("describe");
        assert!(info.is_directory);
        assert!(info.is_hidden);
        assert_eq!(info.mime_type, "inode/directory");
        assert!(info.permission_string.starts_with('d'));
    }

    #[cfg(unix)]
    #[test]
    fn test_describe_symlink_is_not_followed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("target-dir");
        fs::create_dir(&target).expect("mkdir");
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).expect("symlink");

        let info = describe_path(&link).expect("describe");
        assert!(info.is_symlink);
        assert!(!info.is_directory);
        assert_eq!(info.symlink_target, target.display().to_string());
        assert!(info.permission_string.starts_with('l'));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_described() {
        let dir = tempfile::tempdir().expect("tempdir");
        let link = dir.path().join("dangling");
        std::os::unix::fs::symlink(dir.path().join("gone"), &link).expect("symlink");

        let info = describe_path(&link).expect("dangling link should still be described");
        assert!(info.is_symlink);
        assert_eq!(info.mime_type, "application/octet-stream");
    }

    #[cfg(unix)]
    #[test]
    fn test_describe_fifo_does_not_block() {
        let dir = tempfile::tempdir().expect("tempdir");
        let fifo = dir.path().join("events");
        let status = std::process::Command::new("mkfifo")
            .arg(&fifo)
            .status()
            .expect("run mkfifo");
        assert!(status.success());

        let info = describe_path(&fifo).expect("describe fifo");
        assert!(!info.is_directory);
        assert_eq!(info.mime_type, "application/octet-stream");
        assert!(info.permission_string.starts_with('p'));
    }

    #[test]
    fn test_descriptor_json_field_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.json");
        fs::write(&path, b"{}").expect("write");

        let info = describe_path(&path).expect("describe");
        let json = serde_json::to_value(&info).expect("serialize");
        for key in [
            "name",
            "isDir",
            "size",
            "sizeHuman",
            "path",
            "ext",
            "mimeType",
            "createTime",
            "modTime",
            "accessTime",
            "mode",
            "isHidden",
            "isSymlink",
            "symlinkTarget",
        ] {
            assert!(json.get(key).is_some(), "missing field {key}");
        }
        assert_eq!(json["ext"], ".json");
        assert_eq!(json["size"], 2);
    }
}
