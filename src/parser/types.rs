use crate::config::Configuration;
use crate::http::RequestOptions;

/// 解析后的请求
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    /// 方法、目标与 headers
    pub options: RequestOptions,

    /// 请求体；仅当文本中存在非空 body 或非空表单时为 `Some`
    pub body: Option<String>,

    /// 请求文本中 `@key: value` 指令给出的配置（URI 相关字段除外）
    pub configuration: Configuration,
}

impl ParsedRequest {
    pub fn new(options: RequestOptions) -> Self {
        Self {
            options,
            body: None,
            configuration: Configuration::new(),
        }
    }

    pub fn method(&self) -> &str {
        &self.options.method
    }

    pub fn path(&self) -> &str {
        &self.options.path
    }

    /// 不区分大小写查找 header
    pub fn header(&self, name: &str) -> Option<&str> {
        self.options.headers.get(name)
    }
}

/// 解析错误类型
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 文本中没有请求行
    #[error("No request line found")]
    MissingRequestLine,

    /// 无效的指令值
    #[error("Invalid directive value: {message}")]
    InvalidDirective { message: String },

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 解析结果类型别名
pub type ParseResult<T> = Result<T, ParseError>;
