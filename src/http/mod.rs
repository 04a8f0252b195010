pub mod client;
pub mod formatter;
pub mod options;
pub mod request;
pub mod response;
pub mod types;

// Re-export commonly used types for convenient access
pub use client::{HttpClient, PrepareError};
pub use formatter::{MessageFormatter, RequestFormatter, ResponseFormatter, format_request, format_response};
pub use options::RequestOptions;
pub use request::Request;
pub use response::Response;
pub use types::{HeaderList, Protocol, Status};
