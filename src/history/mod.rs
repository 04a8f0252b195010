pub mod model;
pub mod printer;
pub mod recorder;
pub mod storage;

pub use model::{HistoryEntry, HopRecord, Outcome};
pub use storage::HistoryStorage;
