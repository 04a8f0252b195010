use crate::Result;
use crate::config::Configuration;
use crate::error::ResterError;
use std::fs;
use std::path::Path;

/// 配置文件加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 配置文件名
    const CONFIG_FILE: &'static str = "rester.toml";

    /// 从指定路径加载配置文件
    ///
    /// 顶层键即配置键，例如：
    ///
    /// ```toml
    /// followRedirects = true
    /// redirectLimit = 5
    /// timeout = "10s"
    /// ```
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Configuration> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ResterError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Ok(toml::from_str(&content)?)
    }

    /// 查找并加载配置文件
    /// 查找顺序：
    /// 1. 当前目录
    /// 2. 父目录递归查找
    /// 3. 用户配置目录 ~/.config/rester/
    pub fn find_and_load() -> Option<Configuration> {
        Self::try_load_from_current_dir().or_else(Self::try_load_from_user_dir)
    }

    /// 尝试从当前目录及其父目录加载
    fn try_load_from_current_dir() -> Option<Configuration> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let config_path = current.join(Self::CONFIG_FILE);
            if config_path.exists() {
                return Self::load_logged(&config_path);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// 尝试从用户配置目录加载
    fn try_load_from_user_dir() -> Option<Configuration> {
        let home = dirs::home_dir()?;
        let config_path = home.join(".config").join("rester").join(Self::CONFIG_FILE);

        if config_path.exists() {
            Self::load_logged(&config_path)
        } else {
            None
        }
    }

    fn load_logged(path: &Path) -> Option<Configuration> {
        match Self::load_from_path(path) {
            Ok(config) => {
                tracing::debug!("Loaded configuration from {}", path.display());
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Ignoring config file {}: {}", path.display(), e);
                None
            }
        }
    }
}
