use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::transaction::{Transaction, TransactionError};

/// 历史记录条目，每个事务一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// 唯一 ID (UUID)
    pub id: String,

    /// 发送时间
    pub timestamp: DateTime<Utc>,

    /// 整个事务的耗时 (毫秒)
    pub duration_ms: u64,

    pub method: String,

    /// 第一跳的绝对 URL
    pub url: String,

    /// 每一跳渲染后的请求与响应文本
    pub hops: Vec<HopRecord>,

    pub outcome: Outcome,

    /// 最后收到的响应状态码
    pub final_status: Option<u16>,
}

/// 一跳的报文快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HopRecord {
    pub request: String,
    /// 传输失败的一跳没有响应
    pub response: Option<String>,
}

/// 事务的终止结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Outcome {
    End,
    Error(String),
}

impl Outcome {
    pub fn is_end(&self) -> bool {
        matches!(self, Outcome::End)
    }
}

impl HistoryEntry {
    /// 从已结束的事务生成条目
    pub fn from_transaction(
        transaction: &Transaction,
        result: &Result<(), TransactionError>,
        duration: Duration,
    ) -> Self {
        let url = match transaction.history().first() {
            Some(url) => url.to_string(),
            None => transaction
                .options()
                .to_url()
                .map(|url| url.to_string())
                .unwrap_or_else(|_| transaction.options().path.clone()),
        };

        let responses = transaction.responses();
        let hops = transaction
            .requests()
            .iter()
            .enumerate()
            .map(|(i, request)| HopRecord {
                request: request.clone(),
                response: responses.get(i).cloned(),
            })
            .collect();

        let outcome = match result {
            Ok(()) => Outcome::End,
            Err(e) => Outcome::Error(e.to_string()),
        };

        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            duration_ms: duration.as_millis() as u64,
            method: transaction.options().method.to_ascii_uppercase(),
            url,
            hops,
            outcome,
            final_status: transaction.last_response().map(|r| r.status.code()),
        }
    }

    /// 前 8 位 ID
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }
}
