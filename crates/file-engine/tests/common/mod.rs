use std::path::{Path, PathBuf};

use jia_file_engine::{FileServiceConfig, FileServiceFacade};
use tempfile::TempDir;

/// 以临时目录为根目录的服务，测试结束时目录自动删除。
pub struct Sandbox {
    _dir: TempDir,
    root: PathBuf,
    pub service: FileServiceFacade,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let service =
            FileServiceFacade::new(&FileServiceConfig::confined(dir.path())).expect("facade");
        let root = service
            .resolver()
            .root()
            .expect("sandbox is confined")
            .to_path_buf();

        Self {
            _dir: dir,
            root,
            service,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 根目录下某个相对路径的绝对路径字符串。
    pub fn abs(&self, relative: &str) -> String {
        self.root.join(relative).display().to_string()
    }
}
