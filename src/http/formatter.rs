//! 将请求与响应渲染为 HTTP/1.1 报文文本，用于显示与历史记录。

use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::types::HeaderList;

const CRLF: &str = "\r\n";

/// 报文渲染：起始行 + header 行 + 可选 body
pub trait MessageFormatter {
    type Message;

    fn start_line(&self, message: &Self::Message) -> String;

    fn headers<'a>(&self, message: &'a Self::Message) -> &'a HeaderList;

    fn body<'a>(&self, message: &'a Self::Message) -> Option<&'a str>;

    fn format(&self, message: &Self::Message) -> String {
        let mut formatted = self.start_line(message);
        formatted.push_str(&header_lines(self.headers(message)));
        if let Some(body) = self.body(message).filter(|b| !b.is_empty()) {
            formatted.push_str(CRLF);
            formatted.push_str(body);
        }
        formatted
    }
}

/// "{Name}: {Value}\r\n"，保持原有顺序
fn header_lines(headers: &HeaderList) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{}: {}{}", name, value, CRLF))
        .collect()
}

pub struct RequestFormatter;

impl MessageFormatter for RequestFormatter {
    type Message = Request;

    fn start_line(&self, request: &Request) -> String {
        format!("{} {} HTTP/1.1{}", request.method, request.path, CRLF)
    }

    fn headers<'a>(&self, request: &'a Request) -> &'a HeaderList {
        &request.headers
    }

    fn body<'a>(&self, request: &'a Request) -> Option<&'a str> {
        request.body.as_deref()
    }
}

pub struct ResponseFormatter;

impl MessageFormatter for ResponseFormatter {
    type Message = Response;

    fn start_line(&self, response: &Response) -> String {
        format!(
            "HTTP/1.1 {} {}{}",
            response.status.code(),
            response.reason,
            CRLF
        )
    }

    fn headers<'a>(&self, response: &'a Response) -> &'a HeaderList {
        &response.headers
    }

    fn body<'a>(&self, response: &'a Response) -> Option<&'a str> {
        Some(response.body.as_str())
    }
}

pub fn format_request(request: &Request) -> String {
    RequestFormatter.format(request)
}

pub fn format_response(response: &Response) -> String {
    ResponseFormatter.format(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::options::RequestOptions;
    use std::time::Duration;

    #[test]
    fn test_format_request_without_body() {
        let mut options = RequestOptions::new("GET")
            .with_header("X-First", "1")
            .with_header("X-Second", "2");
        options.hostname = Some("localhost".to_string());
        options.path = "/hello".to_string();

        let request = Request::from_options(&options, None).unwrap();
        let text = format_request(&request);

        assert!(text.starts_with("GET /hello HTTP/1.1\r\nX-First: 1\r\nX-Second: 2\r\nHost: localhost\r\n"));
        assert!(text.ends_with("\r\n"));
        assert!(!text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_format_request_with_body() {
        let mut options = RequestOptions::new("POST");
        options.hostname = Some("localhost".to_string());
        options.path = "/echo".to_string();

        let request = Request::from_options(&options, Some("ping")).unwrap();
        let text = format_request(&request);
        assert!(text.contains("Content-Length: 4\r\n"));
        assert!(text.ends_with("\r\n\r\nping"));
    }

    #[test]
    fn test_format_response() {
        let mut headers = HeaderList::new();
        headers.append("content-type", "text/plain");
        headers.append("x-custom-header", "custom-header-value");
        let response = Response::new(
            200,
            headers,
            "Hello, world!".to_string(),
            Duration::from_millis(3),
        );

        assert_eq!(
            format_response(&response),
            "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\nx-custom-header: custom-header-value\r\n\r\nHello, world!"
        );
    }

    #[test]
    fn test_format_response_without_body() {
        let mut headers = HeaderList::new();
        headers.append("location", "/hello");
        let response = Response::new(302, headers, String::new(), Duration::ZERO);

        assert_eq!(
            format_response(&response),
            "HTTP/1.1 302 Found\r\nlocation: /hello\r\n"
        );
    }
}
