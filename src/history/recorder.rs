use crate::history::model::HistoryEntry;
use crate::history::storage::{HistoryStorage, get_storage};
use crate::transaction::{Transaction, TransactionError};
use std::time::Duration;
use tracing::warn;

/// 记录一次事务
///
/// Best-effort：写入失败只打印警告，不返回错误。
pub fn record_transaction(
    transaction: &Transaction,
    result: &Result<(), TransactionError>,
    duration: Duration,
) {
    record_transaction_in(get_storage(), transaction, result, duration);
}

pub fn record_transaction_in(
    storage: &HistoryStorage,
    transaction: &Transaction,
    result: &Result<(), TransactionError>,
    duration: Duration,
) {
    let entry = HistoryEntry::from_transaction(transaction, result, duration);
    if let Err(e) = storage.append(&entry) {
        warn!("Failed to save request history: {}", e);
    }
}
