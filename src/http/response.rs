use crate::http::types::{HeaderList, Status};
use std::time::Duration;

/// 已完整接收的响应（body 已缓冲为 UTF-8 文本）
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: Status,
    pub reason: String,
    /// 按接收顺序保存的 header
    pub headers: HeaderList,
    pub body: String,
    pub duration: Duration,
}

impl Response {
    pub fn new(status: u16, headers: HeaderList, body: String, duration: Duration) -> Self {
        let status = Status::new(status);
        Self {
            reason: status.reason_phrase().to_string(),
            status,
            headers,
            body,
            duration,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_redirect(&self) -> bool {
        self.status.is_redirect()
    }

    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get("location")
    }
}
