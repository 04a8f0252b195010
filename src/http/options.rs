use serde::{Deserialize, Serialize};
use url::Url;

use crate::http::types::{HeaderList, Protocol};

/// 一次请求的目标与参数
///
/// 未出现在请求文本中的字段保持 `None`，以便之后由指令或 `Host` header 补全。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// HTTP 方法，按原样保留
    pub method: String,
    pub protocol: Protocol,
    /// "user:pass" 形式的凭据
    pub auth: Option<String>,
    pub hostname: Option<String>,
    pub port: Option<u16>,
    /// 路径，始终以 `/` 开头，包含查询串
    pub path: String,
    pub headers: HeaderList,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Self::DEFAULT_METHOD.to_string(),
            protocol: Protocol::default(),
            auth: None,
            hostname: None,
            port: None,
            path: "/".to_string(),
            headers: HeaderList::new(),
        }
    }
}

impl RequestOptions {
    pub const DEFAULT_METHOD: &'static str = "GET";

    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    /// 从绝对 URL 构造选项（不含 header）
    pub fn from_url(url: &Url, method: impl Into<String>) -> Self {
        let auth = if url.username().is_empty() {
            None
        } else {
            Some(match url.password() {
                Some(password) => format!("{}:{}", url.username(), password),
                None => url.username().to_string(),
            })
        };

        Self {
            method: method.into(),
            protocol: Protocol::normalize(url.scheme()),
            auth,
            hostname: url.host_str().map(str::to_string),
            port: url.port(),
            path: path_with_query(url),
            headers: HeaderList::new(),
        }
    }

    /// "hostname[:port]"
    pub fn host(&self) -> Option<String> {
        let hostname = self.hostname.as_deref()?;
        Some(match self.port {
            Some(port) => format!("{}:{}", hostname, port),
            None => hostname.to_string(),
        })
    }

    /// 组装绝对 URL（不含凭据），缺少 hostname 时返回 `EmptyHost`
    pub fn to_url(&self) -> Result<Url, url::ParseError> {
        let host = self.host().ok_or(url::ParseError::EmptyHost)?;
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        Url::parse(&format!("{}://{}{}", self.protocol.scheme(), host, path))
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// URL 的 path + "?" + query
pub fn path_with_query(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
