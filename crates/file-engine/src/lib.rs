//! jia-file engine - 受根目录限制的文件操作引擎。
//!
//! 该 crate 提供统一的文件服务接口，供 server 集成为 HTTP 路由：
//! 路径解析与根目录限制、文件元信息提取，以及列表/创建/删除/移动/复制等操作。

pub mod engine;
pub mod error;
pub mod metadata;
pub mod mime;
pub mod path;
pub mod service;

pub use engine::FileOperationEngine;
pub use error::{FileSystemError, Result};
pub use metadata::{FileDescriptor, describe_entry, describe_path, format_size};
pub use path::{PathResolver, RootConfinement, validate_request_path};
pub use service::{FileService, FileServiceConfig, FileServiceFacade};
