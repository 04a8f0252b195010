use crate::config::Configuration;
use crate::http::{Protocol, RequestOptions};
use crate::parser::directive::{self, HeaderLine, is_comment, value_to_string};
use crate::parser::form::FormParser;
use crate::parser::query::{merge_query, set_pair};
use crate::parser::types::{ParseError, ParseResult, ParsedRequest};
use serde_json::Value;
use std::path::Path;
use url::Url;

/// 请求文本解析器
///
/// 文本结构：
///
/// ```text
/// POST http://localhost:8080/cats
/// ?page=2
/// @followRedirects: true
/// Content-Type: application/json
///
/// {"name": "molly"}
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestParser {
    /// 行结束符与多行分隔符的来源
    configuration: Configuration,
}

impl RequestParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用配置中的 `eol` / `multilineStart` / `multilineEnd`
    pub fn from_configuration(configuration: &Configuration) -> Self {
        Self {
            configuration: configuration.clone(),
        }
    }

    pub fn eol(&self) -> &str {
        self.configuration.eol()
    }

    /// 从文件路径解析
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> ParseResult<ParsedRequest> {
        let content = std::fs::read_to_string(path.as_ref())?;
        self.parse(&content)
    }

    /// 解析请求文本
    pub fn parse(&self, text: &str) -> ParseResult<ParsedRequest> {
        let lines: Vec<&str> = text.split(self.eol()).collect();
        let mut line_index = 0;

        // 第一个非空、非注释行即请求行，之前的行全部忽略
        let mut options = loop {
            let Some(line) = lines.get(line_index) else {
                return Err(ParseError::MissingRequestLine);
            };
            line_index += 1;

            let line = line.trim();
            if line.is_empty() || is_comment(line) {
                continue;
            }
            break Self::parse_request_line(line)?;
        };

        let mut configuration = Configuration::new();
        let mut query = Vec::new();
        let mut body_lines: &[&str] = &[];

        // header 区，到第一个空行结束
        while line_index < lines.len() {
            let line = lines[line_index].trim();
            line_index += 1;

            if line.is_empty() {
                body_lines = &lines[line_index..];
                break;
            }

            match directive::classify_line(line) {
                HeaderLine::Header { name, value } => options.headers.insert(name, value),
                HeaderLine::Query { key, value } => set_pair(&mut query, key, value),
                HeaderLine::Directive { key, value } => {
                    Self::apply_directive(key, value, &mut options, &mut configuration)
                }
                HeaderLine::Comment | HeaderLine::Ignored => {}
            }
        }

        let body = self.parse_body(body_lines, &configuration, &mut options);

        // 没有显式 hostname 时由 Host header 补全
        if options.hostname.is_none()
            && let Some(host) = options.headers.get("host").map(str::to_string)
        {
            Self::apply_host_header(&host, &mut options);
        }

        options.path = merge_query(&options.path, &query);

        if let Some(body) = &body {
            options
                .headers
                .insert_if_absent("Content-Length", body.len().to_string());
        }

        Ok(ParsedRequest {
            options,
            body,
            configuration,
        })
    }

    /// 解析请求行（方法 + URI，其余 token 忽略）
    fn parse_request_line(line: &str) -> ParseResult<RequestOptions> {
        let tokens: Vec<&str> = line.split(' ').filter(|t| !t.is_empty()).collect();

        let (method, uri) = match tokens.as_slice() {
            [uri] => (RequestOptions::DEFAULT_METHOD, *uri),
            [method, uri, ..] => (*method, *uri),
            [] => return Err(ParseError::MissingRequestLine),
        };

        if uri.starts_with('/') {
            let mut options = RequestOptions::new(method);
            options.path = strip_fragment(uri).to_string();
            return Ok(options);
        }

        let absolute = if uri.contains("://") {
            uri.to_string()
        } else {
            format!("http://{}", uri)
        };

        match Url::parse(&absolute) {
            Ok(url) => Ok(RequestOptions::from_url(&url, method)),
            Err(e) => {
                // 只保留路径，host 交给 Host header 或指令补全
                tracing::warn!("Cannot parse URI '{}' ({}), keeping its path only", uri, e);
                let mut options = RequestOptions::new(method);
                options.path = fallback_path(uri).to_string();
                Ok(options)
            }
        }
    }

    /// `protocol` / `auth` / `hostname` / `port` 写入选项，其余进入配置
    fn apply_directive(
        key: String,
        value: Value,
        options: &mut RequestOptions,
        configuration: &mut Configuration,
    ) {
        match key.as_str() {
            "protocol" => options.protocol = Protocol::normalize(&value_to_string(&value)),
            "auth" => options.auth = Some(value_to_string(&value)),
            "hostname" => options.hostname = Some(value_to_string(&value)),
            "port" => match parse_port(&value) {
                Some(port) => options.port = Some(port),
                None => tracing::warn!("Ignoring invalid port directive: {}", value),
            },
            _ => {
                tracing::debug!("Configuration directive {} = {}", key, value);
                configuration.insert(key, value);
            }
        }
    }

    fn parse_body(
        &self,
        lines: &[&str],
        directives: &Configuration,
        options: &mut RequestOptions,
    ) -> Option<String> {
        // 指令中的 form / 分隔符在同一请求的 body 上生效
        let effective = self.configuration.merged(directives);

        if effective.form() {
            let form = FormParser::from_configuration(&effective).parse_lines(lines);
            if form.is_some() {
                options
                    .headers
                    .insert_if_absent("Content-type", "application/x-www-form-urlencoded");
            }
            return form;
        }

        let body = lines.join(self.eol());
        let body = body.trim();
        if body.is_empty() {
            None
        } else {
            Some(body.to_string())
        }
    }

    fn apply_host_header(host: &str, options: &mut RequestOptions) {
        let (hostname, port) = match host.split_once(':') {
            Some((hostname, port)) => (hostname.trim(), port.trim().parse::<u16>().ok()),
            None => (host.trim(), None),
        };

        if hostname.is_empty() {
            return;
        }
        options.hostname = Some(hostname.to_string());
        if options.port.is_none() {
            options.port = port;
        }
    }
}

/// 无法解析的 URI 中第一个 `/` 起的部分（跳过 scheme），没有时为 `/`
fn fallback_path(uri: &str) -> &str {
    let rest = uri.split_once("://").map(|(_, rest)| rest).unwrap_or(uri);
    match rest.find('/') {
        Some(pos) => strip_fragment(&rest[pos..]),
        None => "/",
    }
}

fn strip_fragment(uri: &str) -> &str {
    uri.split_once('#').map(|(path, _)| path).unwrap_or(uri)
}

fn parse_port(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
