use url::Url;

use crate::http::options::RequestOptions;
use crate::http::types::HeaderList;

pub const USER_AGENT: &str = concat!("rester/", env!("CARGO_PKG_VERSION"));

/// 即将发送的请求
///
/// `headers` 是实际写到连接上的 header 列表，渲染请求文本时按此顺序输出。
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    /// 请求行中的路径（含查询串），按选项中的原样保留
    pub path: String,
    pub auth: Option<String>,
    pub headers: HeaderList,
    pub body: Option<String>,
}

impl Request {
    /// 由请求选项准备一次发送
    ///
    /// 补全 `Host`、`User-Agent`、`Accept` 以及（有 body 时）`Content-Length`，
    /// 用户已经设置的同名 header 不会被覆盖。
    pub fn from_options(options: &RequestOptions, body: Option<&str>) -> Result<Self, url::ParseError> {
        let url = options.to_url()?;
        let body = body.filter(|b| !b.is_empty()).map(str::to_string);

        let mut headers = options.headers.clone();
        if let Some(host) = options.host() {
            headers.insert_if_absent("Host", host);
        }
        headers.insert_if_absent("User-Agent", USER_AGENT);
        headers.insert_if_absent("Accept", "*/*");
        if let Some(body) = &body {
            headers.insert_if_absent("Content-Length", body.len().to_string());
        }

        Ok(Self {
            method: options.method.to_ascii_uppercase(),
            path: if options.path.is_empty() {
                "/".to_string()
            } else {
                options.path.clone()
            },
            url,
            auth: options.auth.clone(),
            headers,
            body,
        })
    }

    /// 拆分 "user:pass" 凭据
    pub fn credentials(&self) -> Option<(&str, Option<&str>)> {
        let auth = self.auth.as_deref()?;
        Some(match auth.split_once(':') {
            Some((user, password)) => (user, Some(password)),
            None => (auth, None),
        })
    }
}
