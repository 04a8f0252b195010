use std::sync::Arc;
use thiserror::Error;

use crate::http::PrepareError;

/// 事务向订阅者发出的事件
#[derive(Debug, Clone)]
pub enum TransactionEvent {
    /// `send()` 开始时发出一次
    Request,
    /// 每一跳完整收到响应后发出
    Response { status: u16 },
    /// 决定跟随重定向后发出，`location` 为解析后的绝对 URL
    Redirect { location: String },
    /// 成功结束
    End,
    /// 失败结束
    Error(TransactionError),
}

impl TransactionEvent {
    /// 是否为终止事件（`End` 或 `Error`）
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionEvent::End | TransactionEvent::Error(_))
    }
}

/// 事务状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    #[default]
    Created,
    Sending { hop: usize },
    AwaitingResponse { hop: usize },
    Redirecting { hop: usize },
    Done,
    Failed,
}

impl TransactionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionState::Done | TransactionState::Failed)
    }
}

/// 事务错误类型
#[derive(Error, Debug, Clone)]
pub enum TransactionError {
    /// 连接或传输失败
    #[error("Transport error: {0}")]
    Transport(Arc<reqwest::Error>),

    #[error("Redirect limit of {limit} exceeded")]
    RedirectLimitExceeded { limit: u64 },

    #[error("Redirect loop detected at {location}")]
    RedirectLoopDetected { location: String },

    /// `Location` header 无法解析为绝对 URL
    #[error("Invalid redirect location '{location}': {message}")]
    InvalidLocation { location: String, message: String },

    #[error("Request has no host")]
    MissingHost,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Transaction has already been sent")]
    AlreadySent,
}

impl From<reqwest::Error> for TransactionError {
    fn from(err: reqwest::Error) -> Self {
        TransactionError::Transport(Arc::new(err))
    }
}

impl From<PrepareError> for TransactionError {
    fn from(err: PrepareError) -> Self {
        match err {
            PrepareError::Http(e) => e.into(),
            other => TransactionError::InvalidRequest(other.to_string()),
        }
    }
}

impl From<url::ParseError> for TransactionError {
    fn from(err: url::ParseError) -> Self {
        match err {
            url::ParseError::EmptyHost => TransactionError::MissingHost,
            other => TransactionError::InvalidRequest(other.to_string()),
        }
    }
}
