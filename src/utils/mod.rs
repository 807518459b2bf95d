//! Utility modules.

pub mod file;
pub mod retry;
pub mod text;

pub use file::{is_text_file, read_text_file};
pub use retry::{RetryConfig, RetryResult, Retryable, with_retry};
pub use text::printable_ratio;
