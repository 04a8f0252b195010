use crate::parser::types::{ParseError, ParseResult};
use serde_json::Value;
use std::time::Duration;

/// header 区中一行的分类结果
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderLine {
    /// `#` 或 `//` 开头
    Comment,
    /// `?key=value` / `&key: value`
    Query { key: String, value: String },
    /// `@key: value` / `@flag`
    Directive { key: String, value: Value },
    /// `Name: value`
    Header { name: String, value: String },
    /// 无法识别的行（例如没有冒号的 header），直接丢弃
    Ignored,
}

/// 主解析函数（统一入口），`line` 应已去除首尾空白
pub fn classify_line(line: &str) -> HeaderLine {
    let line = line.trim();
    if is_comment(line) {
        return HeaderLine::Comment;
    }

    match line.chars().next() {
        Some('@') => parse_directive(&line[1..]),
        Some('?') | Some('&') => parse_query(&line[1..]),
        _ => parse_header(line),
    }
}

/// 判断是否为注释行
pub fn is_comment(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("//")
}

/// 在 `:` 与 `=` 中最先出现的那个位置切分
///
/// 分隔符之后的全部内容（包括再次出现的分隔符）都属于右侧。
pub fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let pos = match (line.find(':'), line.find('=')) {
        (Some(colon), Some(equals)) => colon.min(equals),
        (Some(pos), None) | (None, Some(pos)) => pos,
        (None, None) => return None,
    };
    Some((&line[..pos], &line[pos + 1..]))
}

/// 指令值优先按 JSON 解析，失败时退回去除空白的原始字符串
pub fn parse_directive_value(raw: &str) -> Value {
    let raw = raw.trim();
    serde_json::from_str(raw).unwrap_or_else(|_| {
        tracing::debug!("Directive value {:?} is not JSON, keeping it as a string", raw);
        Value::String(raw.to_string())
    })
}

// === 各个解析器实现 ===

fn parse_directive(content: &str) -> HeaderLine {
    let content = content.trim();
    match split_key_value(content) {
        Some((key, value)) => HeaderLine::Directive {
            key: key.trim().to_string(),
            value: parse_directive_value(value),
        },
        // 无分隔符表示布尔标志
        None if !content.is_empty() => HeaderLine::Directive {
            key: content.to_string(),
            value: Value::Bool(true),
        },
        None => HeaderLine::Ignored,
    }
}

fn parse_query(content: &str) -> HeaderLine {
    let content = content.trim();
    let (key, value) = match split_key_value(content) {
        Some((key, value)) => (key.trim(), value.trim()),
        None => (content, ""),
    };

    if key.is_empty() {
        return HeaderLine::Ignored;
    }

    HeaderLine::Query {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_header(line: &str) -> HeaderLine {
    match line.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => HeaderLine::Header {
            name: name.trim().to_string(),
            value: value.trim().to_string(),
        },
        _ => HeaderLine::Ignored,
    }
}

/// 指令值转为字符串：字符串取其内容，其余取 JSON 文本
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 解析时间字符串（支持 "5s", "1000ms", "2m"）
pub fn parse_duration(s: &str) -> ParseResult<Duration> {
    let s = s.trim();
    let invalid = || ParseError::InvalidDirective {
        message: format!("Invalid duration: {}", s),
    };

    if let Some(ms) = s.strip_suffix("ms") {
        let millis: u64 = ms.trim().parse().map_err(|_| invalid())?;
        Ok(Duration::from_millis(millis))
    } else if let Some(sec) = s.strip_suffix('s') {
        let secs: u64 = sec.trim().parse().map_err(|_| invalid())?;
        Ok(Duration::from_secs(secs))
    } else if let Some(min) = s.strip_suffix('m') {
        let mins: u64 = min.trim().parse().map_err(|_| invalid())?;
        Ok(Duration::from_secs(mins * 60))
    } else {
        Err(ParseError::InvalidDirective {
            message: format!("Duration must end with 'ms', 's', or 'm': {}", s),
        })
    }
}
