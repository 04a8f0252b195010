use thiserror::Error;

use crate::parser::ParseError;
use crate::transaction::TransactionError;

#[derive(Error, Debug)]
pub enum ResterError {
    #[error("解析错误: {0}")]
    ParseError(#[from] ParseError),

    #[error("请求失败: {0}")]
    TransactionError(#[from] TransactionError),

    #[error("HTTP 客户端错误: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON 解析错误: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML 解析错误: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("URL 解析错误: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for ResterError {
    fn from(err: anyhow::Error) -> Self {
        ResterError::Other(err.to_string())
    }
}

/// Result type for rester crate
pub type Result<T> = std::result::Result<T, ResterError>;
