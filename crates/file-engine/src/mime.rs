//! MIME 类型识别。
//!
//! 优先级：目录 > 扩展名 > 内容嗅探（前 512 字节，仅普通文件）> 文件名启发式。

use std::fs::{File, FileType};
use std::io::Read;
use std::path::{Component, Path};

use tracing::debug;

pub const DIRECTORY: &str = "inode/directory";
pub const OCTET_STREAM: &str = "application/octet-stream";
pub const TEXT_PLAIN: &str = "text/plain";
pub const GIT_OBJECT: &str = "application/x-git";

/// 内容嗅探读取的最大字节数。
pub const SNIFF_LEN: usize = 512;

const TEXT_UTF8: &str = "text/plain; charset=utf-8";

/// 条目类型，决定是否允许打开文件做内容嗅探。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    /// 普通文件。
    File,
    /// 符号链接、FIFO、socket、设备文件等；打开它们可能阻塞，只按名称判断。
    Special,
}

impl From<FileType> for EntryKind {
    fn from(file_type: FileType) -> Self {
        if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Special
        }
    }
}

/// 判断路径对应条目的 MIME 类型。
pub fn detect_mime_type(path: &Path, kind: EntryKind) -> String {
    if kind == EntryKind::Directory {
        return DIRECTORY.to_string();
    }

    if let Some(mime) = mime_guess::from_path(path).first_raw() {
        return mime.to_string();
    }

    if kind == EntryKind::Special {
        return OCTET_STREAM.to_string();
    }

    let head = match read_head(path) {
        Ok(head) => head,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "cannot read file for sniffing");
            return OCTET_STREAM.to_string();
        }
    };

    match sniff_content_type(&head) {
        OCTET_STREAM => classify_by_name(path).unwrap_or(OCTET_STREAM).to_string(),
        sniffed => sniffed.to_string(),
    }
}

fn read_head(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    Ok(head)
}

/// 对无法通过内容识别的常见无扩展名文件做兜底。
fn classify_by_name(path: &Path) -> Option<&'static str> {
    let name = path.file_name()?.to_string_lossy().to_lowercase();

    if name.starts_with('.')
        || ["readme", "license", "makefile"]
            .iter()
            .any(|keyword| name.contains(keyword))
    {
        return Some(TEXT_PLAIN);
    }

    if path
        .components()
        .any(|component| matches!(component, Component::Normal(segment) if segment == ".git"))
    {
        return Some(GIT_OBJECT);
    }

    None
}

/// 基于文件头部字节的内容嗅探，未能识别且含二进制字节时返回 `application/octet-stream`。
pub fn sniff_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    let start = data
        .iter()
        .position(|byte| !is_whitespace(*byte))
        .unwrap_or(data.len());
    let trimmed = &data[start..];

    if HTML_TAGS.iter().any(|tag| matches_html_tag(trimmed, tag)) {
        return "text/html; charset=utf-8";
    }
    if trimmed.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8";
    }

    if let Some((_, mime)) = MAGIC_NUMBERS
        .iter()
        .find(|(signature, _)| data.starts_with(signature))
    {
        return *mime;
    }

    if data.len() >= 12 && &data[0..4] == b"RIFF" {
        match &data[8..12] {
            b"WEBP" => return "image/webp",
            b"WAVE" => return "audio/wave",
            b"AVI " => return "video/avi",
            _ => {}
        }
    }

    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return "video/mp4";
    }

    if data.iter().any(|byte| is_binary(*byte)) {
        OCTET_STREAM
    } else {
        TEXT_UTF8
    }
}

const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

const MAGIC_NUMBERS: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"%!PS-Adobe-", "application/postscript"),
    (b"\xFE\xFF", "text/plain; charset=utf-16be"),
    (b"\xFF\xFE", "text/plain; charset=utf-16le"),
    (b"\xEF\xBB\xBF", TEXT_UTF8),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"\x00\x00\x02\x00", "image/x-icon"),
    (b"BM", "image/bmp"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"wOFF", "font/woff"),
    (b"wOF2", "font/woff2"),
    (b"OggS\x00", "application/ogg"),
    (b"ID3", "audio/mpeg"),
    (b"\x1A\x45\xDF\xA3", "video/webm"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1F\x8B\x08", "application/x-gzip"),
    (b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    (b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    (b"\x00asm", "application/wasm"),
];

/// 大小写不敏感地匹配 HTML 标签，且标签后必须是空格或 `>`。
fn matches_html_tag(data: &[u8], tag: &[u8]) -> bool {
    data.len() > tag.len()
        && data[..tag.len()].eq_ignore_ascii_case(tag)
        && matches!(data[tag.len()], b' ' | b'>')
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

fn is_binary(byte: u8) -> bool {
    matches!(byte, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}
