pub mod engine;
pub mod types;

// Re-export commonly used types
pub use engine::Transaction;
pub use types::{TransactionError, TransactionEvent, TransactionState};
