// Prometheus metrics for the grading API

use arbiter_common::types::Language;
use arbiter_harness::driver::SynthesizedProgram;
use arbiter_harness::{ExecutionBackend, ExecutionResult, GatewayError};
use async_trait::async_trait;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    pub static ref SUBMISSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "arbiter_submissions_total",
        "Graded submissions by language and outcome",
        &["language", "outcome"]
    )
    .unwrap();
    pub static ref GATEWAY_FAILURES_TOTAL: IntCounter = register_int_counter!(
        "arbiter_gateway_failures_total",
        "Execution endpoint calls that ended in a gateway error"
    )
    .unwrap();
    pub static ref GATEWAY_LATENCY_SECONDS: Histogram = register_histogram!(
        "arbiter_gateway_latency_seconds",
        "Round-trip latency of execution endpoint calls",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0]
    )
    .unwrap();
}

/// Bounded `language` label: the canonical allow-list name, or
/// `unsupported` for any tag outside it
pub fn language_label(tag: &str) -> &'static str {
    Language::from_tag(tag).map_or("unsupported", |language| language.as_str())
}

pub fn record_submission(language: &str, outcome: &str) {
    SUBMISSIONS_TOTAL.with_label_values(&[language, outcome]).inc();
}

/// Render every registered metric in the Prometheus text format
pub fn render() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Backend wrapper recording latency and failures of the inner backend
pub struct MeteredBackend<B> {
    inner: B,
}

impl<B> MeteredBackend<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<B: ExecutionBackend> ExecutionBackend for MeteredBackend<B> {
    async fn execute(&self, program: &SynthesizedProgram) -> Result<ExecutionResult, GatewayError> {
        let timer = GATEWAY_LATENCY_SECONDS.start_timer();
        let result = self.inner.execute(program).await;
        timer.observe_duration();
        if result.is_err() {
            GATEWAY_FAILURES_TOTAL.inc();
        }
        result
    }
}
