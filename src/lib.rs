pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod http;
pub mod logger;
pub mod parser;
pub mod transaction;
pub mod utils;

// Re-export commonly used types
pub use client::Client;
pub use config::Configuration;
pub use error::{Result, ResterError};
pub use http::{HeaderList, Protocol, RequestOptions};
pub use parser::{ParsedRequest, RequestParser, parse_request};
pub use transaction::{Transaction, TransactionError, TransactionEvent, TransactionState};
