use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Languages the harness knows how to grade.
///
/// This is a closed set: adding a language means adding a variant here,
/// an engine mapping in `arbiter_harness::languages` and (optionally) a
/// driver template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Python,
    Java,
    Cpp,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Javascript,
        Language::Python,
        Language::Java,
        Language::Cpp,
    ];

    /// Resolve a user-supplied language tag (case-insensitive, aliases allowed)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "javascript" | "js" | "node" => Some(Language::Javascript),
            "python" | "py" | "python3" => Some(Language::Python),
            "java" => Some(Language::Java),
            "cpp" | "c++" => Some(Language::Cpp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One literal test case as supplied by the question source.
///
/// `input` is a comma-separated list of argument literals, `output` the
/// expected return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub output: String,
}

impl TestCase {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Verdict for a single test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseVerdict {
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub stdout: String,
    pub passed: bool,
}

/// Caller-facing result of one graded submission.
///
/// `success` holds iff at least one case exists and every case passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub success: bool,
    pub results: Vec<CaseVerdict>,
    pub compiler_output: String,
}

impl SubmissionResult {
    pub fn from_verdicts(results: Vec<CaseVerdict>, compiler_output: String) -> Self {
        let success = !results.is_empty() && results.iter().all(|r| r.passed);
        Self {
            success,
            results,
            compiler_output,
        }
    }

    /// A submission that never produced per-case output (sandbox or network failure)
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            compiler_output: message.into(),
        }
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }
}

/// A user submission: one entry-point function plus the cases to grade it against
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub language: String,
    pub source_code: String,
    pub test_cases: Vec<TestCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
}

/// Problem definition as delivered by the question source.
///
/// Treated as opaque input; only `test_cases` and `boilerplates` are
/// consumed by the harness and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<TestCase>,
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub boilerplates: HashMap<String, String>,
}

impl Question {
    /// Find the boilerplate for a language, accepting any alias used as a key
    pub fn boilerplate_for(&self, language: Language) -> Option<&str> {
        self.boilerplates
            .iter()
            .find(|(key, _)| Language::from_tag(key) == Some(language))
            .map(|(_, skeleton)| skeleton.as_str())
    }
}
