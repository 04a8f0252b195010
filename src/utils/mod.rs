pub mod formatter;
pub mod pipe;

pub use formatter::{OutputFormatter, OutputMode};
pub use pipe::{pipe_through, tokenize_command};
