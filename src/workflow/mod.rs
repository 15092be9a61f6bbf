pub mod document_ctx;
pub mod document_flow;
pub mod retry;

pub use document_ctx::DocumentCtx;
pub use document_flow::DocumentFlow;
pub use retry::{run_with_retry, Attempts, RetryPolicy, Retryable};
