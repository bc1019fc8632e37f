/// Submission Grading - High-Level Orchestration
///
/// **Responsibility:**
/// Run one submission through parse → synthesize → execute → demultiplex.
///
/// **Architecture:**
/// 1. `parser` turns each case's input into argument literals
/// 2. `driver` builds one program calling the entry point per case
/// 3. an `ExecutionBackend` runs it remotely (gateway.rs)
/// 4. `evaluator` turns the combined output into verdicts
///
/// Nothing here is shared between submissions, so `grade` may be called
/// concurrently without locking. Errors before the backend call are
/// returned as `HarnessError`; everything after is folded into the
/// `SubmissionResult`.

use crate::driver::{self, DriverTemplate, PreparedCase, SynthesizedProgram};
use crate::error::HarnessError;
use crate::evaluator;
use crate::gateway::ExecutionBackend;
use crate::languages::LanguageTable;
use crate::parser::parse_arguments;
use arbiter_common::types::{Language, Submission, SubmissionResult, TestCase};
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Safety limits to keep pathological submissions away from the sandbox
pub const MAX_SOURCE_CODE_BYTES: usize = 1024 * 1024; // 1MB
pub const MAX_TEST_CASES: usize = 256;
pub const MAX_TEST_INPUT_BYTES: usize = 64 * 1024; // 64KB

/// A submission that passed validation and has its program built
#[derive(Debug, Clone)]
pub struct PreparedSubmission {
    pub language: Language,
    pub entry_point: String,
    pub program: SynthesizedProgram,
    /// Number of cases whose input failed to parse
    pub malformed_cases: usize,
}

fn check_limits(submission: &Submission) -> Result<(), HarnessError> {
    if submission.source_code.len() > MAX_SOURCE_CODE_BYTES {
        return Err(HarnessError::SourceTooLarge {
            size: submission.source_code.len(),
            limit: MAX_SOURCE_CODE_BYTES,
        });
    }
    if submission.test_cases.len() > MAX_TEST_CASES {
        return Err(HarnessError::TooManyTestCases {
            count: submission.test_cases.len(),
            limit: MAX_TEST_CASES,
        });
    }
    if let Some((index, tc)) = submission
        .test_cases
        .iter()
        .enumerate()
        .find(|(_, tc)| tc.input.len() > MAX_TEST_INPUT_BYTES)
    {
        return Err(HarnessError::InputTooLarge {
            index,
            size: tc.input.len(),
            limit: MAX_TEST_INPUT_BYTES,
        });
    }
    Ok(())
}

fn parse_cases(test_cases: &[TestCase]) -> Vec<PreparedCase> {
    test_cases
        .iter()
        .enumerate()
        .map(|(idx, tc)| {
            let parsed = parse_arguments(&tc.input);
            if let Err(e) = &parsed {
                warn!(test_num = idx + 1, error = %e, "Malformed test case input");
            }
            parsed
        })
        .collect()
}

/// Validate a submission and build its program without running it
pub fn prepare(table: &LanguageTable, submission: &Submission) -> Result<PreparedSubmission, HarnessError> {
    check_limits(submission)?;

    let (language, selector) = table.resolve(&submission.language)?;
    let entry_point = driver::resolve_entry_point(
        language,
        &submission.source_code,
        submission.entry_point.as_deref(),
    )?;

    let cases = if DriverTemplate::for_language(language).synthesizes() {
        parse_cases(&submission.test_cases)
    } else {
        Vec::new()
    };
    let malformed_cases = cases.iter().filter(|c| c.is_err()).count();

    let program = driver::synthesize(
        language,
        selector,
        &submission.source_code,
        &entry_point,
        &cases,
    );

    Ok(PreparedSubmission {
        language,
        entry_point,
        program,
        malformed_cases,
    })
}

/// Grade one submission end to end.
///
/// Dropping the returned future cancels the outbound request; no partial
/// verdicts are ever produced.
#[instrument(
    skip_all,
    fields(
        submission_id = %uuid::Uuid::new_v4(),
        language = %submission.language,
        test_count = submission.test_cases.len()
    )
)]
pub async fn grade(
    backend: &dyn ExecutionBackend,
    table: &LanguageTable,
    submission: &Submission,
) -> Result<SubmissionResult, HarnessError> {
    let prepared = prepare(table, submission)?;

    info!(
        entry_point = %prepared.entry_point,
        malformed_cases = prepared.malformed_cases,
        program_size = prepared.program.content.len(),
        "Submission prepared"
    );

    let start = Instant::now();
    let execution = match backend.execute(&prepared.program).await {
        Ok(execution) => execution,
        Err(e) => {
            warn!(error = %e, "Execution failed; reporting submission as failed");
            return Ok(SubmissionResult::failure(e.compiler_output()));
        }
    };

    let result = evaluator::evaluate(&submission.test_cases, &execution);

    info!(
        success = result.success,
        passed = result.passed_count(),
        total = result.results.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Submission graded"
    );

    Ok(result)
}
