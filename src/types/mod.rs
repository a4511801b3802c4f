//! Public types for the Precis API.

mod request;
mod response;

pub use request::{
    DEFAULT_MAX_TEXT_LENGTH, DEFAULT_OUTPUT_TOKENS, Language, MAX_OUTPUT_TOKENS,
    MIN_OUTPUT_TOKENS, SummaryRequest, Tone,
};
pub use response::{Generation, SummaryResult, Usage};
