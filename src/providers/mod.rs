//! Abstractive summarization providers.
//!
//! [`SummaryProvider`] is the seam between the pipeline and a remote
//! model. [`OpenAiProvider`] is the production implementation and
//! [`RetryingProvider`] adds bounded retries on top of any provider.

pub mod openai;
pub mod prompt;
pub mod retry;
pub mod traits;

pub use openai::OpenAiProvider;
pub use retry::{RetryConfig, RetryingProvider};
pub use traits::SummaryProvider;
