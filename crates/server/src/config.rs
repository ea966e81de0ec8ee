use std::path::{Path, PathBuf};

use anyhow::Context;
use jia_file_engine::FileServiceConfig;
use serde::Deserialize;
type Result<T> = anyhow::Result<T>;

/// 指定配置文件路径的环境变量。
pub const CONFIG_PATH_ENV: &str = "JIA_FILE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "jia-file.toml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub log: LogSection,
    #[serde(default)]
    pub file: FileSection,
}

impl ServerConfig {
    /// 读取配置文件（`JIA_FILE_CONFIG` 或 `jia-file.toml`），再应用环境变量覆盖。
    ///
    /// 默认配置文件不存在时使用默认值；显式指定的文件不存在则报错。
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to deserialize server config")
    }

    /// 用 `SERVER_PORT`、`LOG_LEVEL`、`LOG_DIR`、`JIA_FILE_ROOT`、`MAX_FILE_SIZE` 覆盖配置。
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid SERVER_PORT: {port}"))?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log.level = level;
        }
        if let Some(dir) = lookup("LOG_DIR") {
            self.log.dir = PathBuf::from(dir);
        }
        if let Some(root) = lookup("JIA_FILE_ROOT") {
            self.file.root_path = Some(PathBuf::from(root));
        }
        if let Some(max_size) = lookup("MAX_FILE_SIZE") {
            self.file.max_size = max_size
                .trim()
                .parse()
                .with_context(|| format!("invalid MAX_FILE_SIZE: {max_size}"))?;
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn file_service_config(&self) -> FileServiceConfig {
        FileServiceConfig {
            root_path: self.file.root_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LogSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 按天滚动的日志文件目录。
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FileSection {
    /// 所有文件操作的根目录；不配置时不做限制。
    #[serde(default)]
    pub root_path: Option<PathBuf>,
    /// 请求体大小上限（字节）。
    #[serde(default = "default_max_size")]
    pub max_size: usize,
}

impl Default for FileSection {
    fn default() -> Self {
        Self {
            root_path: None,
            max_size: default_max_size(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8190
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_max_size() -> usize {
    10 * 1024 * 1024
}
