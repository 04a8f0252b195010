use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::parser::directive::parse_duration;

/// 客户端配置
///
/// 键值来源（优先级从低到高）：内置默认值、配置文件、CLI 参数、请求文本中的 `@key: value` 指令。
/// 值保持 JSON 类型（bool / number / array / string），由各个访问器按需解释。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(Map<String, Value>);

impl Configuration {
    pub const FOLLOW_REDIRECTS: &'static str = "followRedirects";
    pub const REDIRECT_LIMIT: &'static str = "redirectLimit";
    pub const REDIRECT_STATUS_CODES: &'static str = "redirectStatusCodes";
    pub const FORM: &'static str = "form";
    pub const EOL: &'static str = "eol";
    pub const MULTILINE_START: &'static str = "multilineStart";
    pub const MULTILINE_END: &'static str = "multilineEnd";
    pub const TIMEOUT: &'static str = "timeout";
    pub const VERIFY_CERTIFICATES: &'static str = "verifyCertificates";

    /// 默认行结束符
    pub const DEFAULT_EOL: &'static str = "\n";
    /// 默认多行字段分隔符
    pub const DEFAULT_MULTILINE_MARKER: &'static str = "\"\"\"";

    pub fn new() -> Self {
        Self::default()
    }

    /// `Client` 使用的默认值
    pub fn client_defaults() -> Self {
        Self::new()
            .with(Self::FOLLOW_REDIRECTS, true)
            .with(
                Self::REDIRECT_STATUS_CODES,
                vec![300u16, 301, 302, 303, 307, 308],
            )
            .with(Self::REDIRECT_LIMIT, 10)
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// 将 `other` 合并到当前配置，`other` 中的键覆盖已有值
    pub fn merge(&mut self, other: &Configuration) {
        for (key, value) in other.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// 返回合并后的新配置，`other` 优先
    pub fn merged(&self, other: &Configuration) -> Self {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }

    /// 宽松的真值判断：false / 0 / "" / null / 缺失 都视为假
    pub fn is_truthy(&self, key: &str) -> bool {
        match self.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        }
    }

    pub fn follow_redirects(&self) -> bool {
        self.is_truthy(Self::FOLLOW_REDIRECTS)
    }

    /// 重定向上限；未配置时不限制次数（仍然有循环检测）
    pub fn redirect_limit(&self) -> Option<u64> {
        match self.get(Self::REDIRECT_LIMIT)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn redirect_status_codes(&self) -> Vec<u16> {
        match self.get(Self::REDIRECT_STATUS_CODES) {
            Some(Value::Array(codes)) => codes
                .iter()
                .filter_map(|code| code.as_u64())
                .filter_map(|code| u16::try_from(code).ok())
                .collect(),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|code| u16::try_from(code).ok())
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn form(&self) -> bool {
        self.get(Self::FORM) == Some(&Value::Bool(true))
    }

    pub fn eol(&self) -> &str {
        self.non_empty_str(Self::EOL).unwrap_or(Self::DEFAULT_EOL)
    }

    pub fn multiline_start(&self) -> &str {
        self.non_empty_str(Self::MULTILINE_START)
            .unwrap_or(Self::DEFAULT_MULTILINE_MARKER)
    }

    pub fn multiline_end(&self) -> &str {
        self.non_empty_str(Self::MULTILINE_END)
            .unwrap_or(Self::DEFAULT_MULTILINE_MARKER)
    }

    /// 单跳超时：数字按毫秒处理，字符串支持 "500ms" / "5s" / "2m"
    pub fn timeout(&self) -> Option<Duration> {
        match self.get(Self::TIMEOUT)? {
            Value::Number(n) => n.as_u64().map(Duration::from_millis),
            Value::String(s) => parse_duration(s).ok(),
            _ => None,
        }
    }

    /// HTTPS 证书校验，默认关闭
    pub fn verify_certificates(&self) -> bool {
        self.is_truthy(Self::VERIFY_CERTIFICATES)
    }

    fn non_empty_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

impl From<Map<String, Value>> for Configuration {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
