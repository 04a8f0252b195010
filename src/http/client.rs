use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::Configuration;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::types::HeaderList;

/// 请求无法交给传输层时的错误
#[derive(Error, Debug)]
pub enum PrepareError {
    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// 单跳传输
///
/// 不自动跟随重定向（由 `Transaction` 自己处理），只使用 HTTP/1.1。
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpClient {
    pub fn from_configuration(configuration: &Configuration) -> Result<Self, reqwest::Error> {
        let verify = configuration.verify_certificates();
        if !verify {
            tracing::debug!("TLS certificate validation disabled");
        }

        let inner = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .http1_only()
            .http1_title_case_headers()
            .danger_accept_invalid_certs(!verify)
            .build()?;

        Ok(Self {
            inner,
            timeout: configuration.timeout(),
        })
    }

    /// 构造底层请求
    ///
    /// 如果凭据生成了 `Authorization` header，会追加到 `request.headers`，
    /// 使渲染出的请求文本与实际发送的一致。
    pub fn prepare(&self, request: &mut Request) -> Result<reqwest::Request, PrepareError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| PrepareError::InvalidMethod(request.method.clone()))?;

        let mut builder = self.inner.request(method, request.url.clone());
        for (name, value) in request.headers.iter() {
            let (name, value) = typed_header(name, value)?;
            builder = builder.header(name, value);
        }

        let credentials = request
            .credentials()
            .map(|(user, password)| (user.to_string(), password.map(str::to_string)));
        if let Some((user, password)) = credentials
            && !request.headers.contains("Authorization")
        {
            builder = builder.basic_auth(user, password);
        }

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let prepared = builder.build()?;
        if !request.headers.contains("Authorization")
            && let Some(value) = prepared.headers().get(AUTHORIZATION)
        {
            request
                .headers
                .append("Authorization", String::from_utf8_lossy(value.as_bytes()));
        }

        Ok(prepared)
    }

    /// 发送并完整缓冲响应
    pub async fn execute(&self, prepared: reqwest::Request) -> Result<Response, reqwest::Error> {
        let start = Instant::now();
        let response = self.inner.execute(prepared).await?;

        let status = response.status().as_u16();
        let headers = header_list(response.headers());

        let bytes = response.bytes().await?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(Response::new(status, headers, body, start.elapsed()))
    }
}

/// 响应 header：名称为小写，同名的值聚在首次出现的位置
fn header_list(map: &HeaderMap) -> HeaderList {
    let mut headers = HeaderList::new();
    for (name, value) in map {
        headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
    }
    headers
}

fn typed_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), PrepareError> {
    let invalid = |message: String| PrepareError::InvalidHeader {
        name: name.to_string(),
        message,
    };
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
    let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::options::RequestOptions;

    fn request(options: RequestOptions) -> Request {
        Request::from_options(&options, None).unwrap()
    }

    fn localhost(method: &str) -> RequestOptions {
        let mut options = RequestOptions::new(method);
        options.hostname = Some("localhost".to_string());
        options
    }

    #[test]
    fn test_prepare_adds_basic_auth_header() {
        let client = HttpClient::from_configuration(&Configuration::new()).unwrap();
        let mut options = localhost("GET");
        options.auth = Some("fry:secret".to_string());
        let mut request = request(options);

        let prepared = client.prepare(&mut request).unwrap();
        assert!(prepared.headers().contains_key(AUTHORIZATION));
        assert_eq!(
            request.headers.get("authorization"),
            Some("Basic ZnJ5OnNlY3JldA==")
        );
    }

    #[test]
    fn test_prepare_rejects_invalid_header() {
        let client = HttpClient::from_configuration(&Configuration::new()).unwrap();
        let mut request = request(localhost("GET").with_header("Bad Header", "x"));

        let result = client.prepare(&mut request);
        assert!(matches!(result, Err(PrepareError::InvalidHeader { .. })));
    }

    #[test]
    fn test_prepare_rejects_invalid_method() {
        let client = HttpClient::from_configuration(&Configuration::new()).unwrap();
        let mut request = request(localhost("GE T"));

        let result = client.prepare(&mut request);
        assert!(matches!(result, Err(PrepareError::InvalidMethod(_))));
    }

    #[test]
    fn test_response_headers_are_lowercase_and_grouped() {
        let mut map = HeaderMap::new();
        let cookie = HeaderName::from_bytes(b"Set-Cookie").unwrap();
        map.append(cookie.clone(), HeaderValue::from_static("a=1"));
        map.append(
            HeaderName::from_bytes(b"X-Trace").unwrap(),
            HeaderValue::from_static("abc"),
        );
        map.append(cookie, HeaderValue::from_static("b=2"));

        let headers: Vec<(String, String)> = header_list(&map)
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        assert_eq!(
            headers,
            vec![
                ("set-cookie".to_string(), "a=1".to_string()),
                ("set-cookie".to_string(), "b=2".to_string()),
                ("x-trace".to_string(), "abc".to_string()),
            ]
        );
    }
}
