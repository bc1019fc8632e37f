use arbiter_common::types::Language;
use thiserror::Error;

/// Client-facing failures raised before a submission reaches the sandbox.
///
/// Once the gateway has been called every outcome is folded into a
/// `SubmissionResult` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("no entry-point function found in {0} source")]
    MissingEntryPoint(Language),
    #[error("invalid entry-point name: {0}")]
    InvalidEntryPoint(String),
    #[error("source code is {size} bytes, limit is {limit}")]
    SourceTooLarge { size: usize, limit: usize },
    #[error("{count} test cases submitted, limit is {limit}")]
    TooManyTestCases { count: usize, limit: usize },
    #[error("test case {index} input is {size} bytes, limit is {limit}")]
    InputTooLarge {
        index: usize,
        size: usize,
        limit: usize,
    },
    #[error("language configuration error: {0}")]
    Config(String),
}
