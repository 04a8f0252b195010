pub mod directive;
pub mod form;
pub mod query;
pub mod request_text;
pub mod types;

// Re-export commonly used types
pub use form::FormParser;
pub use query::merge_query;
pub use request_text::RequestParser;
pub use types::{ParseError, ParseResult, ParsedRequest};

use crate::config::Configuration;

/// 从字符串内容解析请求，`configuration` 提供 `eol` 与多行分隔符
pub fn parse_request(text: &str, configuration: Option<&Configuration>) -> ParseResult<ParsedRequest> {
    match configuration {
        Some(configuration) => RequestParser::from_configuration(configuration).parse(text),
        None => RequestParser::new().parse(text),
    }
}
