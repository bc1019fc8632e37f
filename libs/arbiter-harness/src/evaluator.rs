/// Result Demultiplexer & Verifier
///
/// **Core Responsibility:**
/// Split one combined output stream back into per-case segments and judge
/// each segment's return value against the expected literal.
///
/// **Critical Properties:**
/// - Knows nothing about HTTP or the sandbox
/// - Knows nothing about language runtimes
/// - Pure function: (combined output, test cases) → verdicts
/// - Always returns exactly one verdict per submitted case, in order
///
/// **Comparison Rule:**
/// A case passes iff its return value and the expected output are equal
/// once every whitespace character is removed from both. This absorbs
/// pretty-printing differences between JSON serializers but is not
/// structural equality: `{"a":1,"b":2}` and `{"b":2,"a":1}` do NOT match.

use crate::driver::{CASE_START_MARKER, RETURN_VALUE_MARKER};
use crate::gateway::ExecutionResult;
use arbiter_common::types::{CaseVerdict, SubmissionResult, TestCase};
use tracing::{debug, warn};

/// `actual` for a call that never printed a return value
pub const NO_VALUE_PRODUCED: &str = "<no value produced>";

/// Strip every whitespace character
fn normalize(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Outcome of one case's output segment before comparison
#[derive(Debug, Clone, PartialEq, Eq)]
struct CaseSegment {
    stdout: String,
    return_value: Option<String>,
}

impl CaseSegment {
    fn parse(segment: &str) -> Self {
        match segment.split_once(RETURN_VALUE_MARKER) {
            Some((stdout, value)) => Self {
                stdout: stdout.trim().to_string(),
                return_value: Some(value.trim().to_string()),
            },
            None => Self {
                stdout: segment.trim().to_string(),
                return_value: None,
            },
        }
    }
}

/// Judge a single case
pub fn verify_case(test_case: &TestCase, segment: Option<&str>) -> CaseVerdict {
    let parsed = segment.map(CaseSegment::parse).unwrap_or(CaseSegment {
        stdout: String::new(),
        return_value: None,
    });

    let (actual, passed) = match parsed.return_value {
        Some(value) => {
            let passed = normalize(&value) == normalize(&test_case.output);
            (value, passed)
        }
        None => (NO_VALUE_PRODUCED.to_string(), false),
    };

    CaseVerdict {
        input: test_case.input.clone(),
        expected: test_case.output.clone(),
        actual,
        stdout: parsed.stdout,
        passed,
    }
}

/// Split combined output into `(preamble, per-case segments)`
pub fn demultiplex(output: &str) -> (&str, Vec<&str>) {
    let mut parts = output.split(CASE_START_MARKER);
    let preamble = parts.next().unwrap_or("");
    (preamble, parts.collect())
}

/// Turn one execution result into the caller-facing submission result.
///
/// Cases whose segment is missing (the process died early) are reported
/// as failures, never dropped.
pub fn evaluate(test_cases: &[TestCase], execution: &ExecutionResult) -> SubmissionResult {
    let (preamble, segments) = demultiplex(&execution.output);

    if segments.len() > test_cases.len() {
        warn!(
            segments = segments.len(),
            test_count = test_cases.len(),
            "More case markers than test cases; ignoring the extra segments"
        );
    } else if segments.len() < test_cases.len() {
        warn!(
            segments = segments.len(),
            test_count = test_cases.len(),
            code = ?execution.code,
            signal = ?execution.signal,
            "Output truncated; missing cases marked as failed"
        );
    }

    let results: Vec<CaseVerdict> = test_cases
        .iter()
        .enumerate()
        .map(|(idx, tc)| {
            let verdict = verify_case(tc, segments.get(idx).copied());
            debug!(
                test_num = idx + 1,
                passed = verdict.passed,
                "Case evaluated"
            );
            verdict
        })
        .collect();

    let mut compiler_output = preamble.trim().to_string();
    if let Some(signal) = &execution.signal {
        if !compiler_output.is_empty() {
            compiler_output.push('\n');
        }
        compiler_output.push_str(&format!("Process terminated by signal {}", signal));
    }

    SubmissionResult::from_verdicts(results, compiler_output)
}
