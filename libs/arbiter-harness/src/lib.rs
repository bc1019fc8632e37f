//! Grading harness: argument parsing, driver synthesis, remote execution
//! and verdict demultiplexing for single-function submissions.

pub mod driver;
pub mod error;
pub mod evaluator;
pub mod gateway;
pub mod harness;
pub mod languages;
pub mod parser;


pub use error::HarnessError;
pub use gateway::{ExecutionBackend, ExecutionGateway, ExecutionResult, GatewayError};
pub use harness::grade;
pub use languages::LanguageTable;
