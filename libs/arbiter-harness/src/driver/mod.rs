/// Driver Code Synthesizer
///
/// **Core Responsibility:**
/// Turn the user's source plus N parsed test cases into one runnable
/// program that calls the entry point once per case.
///
/// **Output Protocol (per case, in order):**
/// 1. `---TEST-CASE-START---` on its own line
/// 2. the call's own stdout, if any
/// 3. on success: `---RVAL---` followed by the return value as compact JSON
/// 4. on a runtime exception: the exception message instead of step 3
///
/// A failing call never stops the cases after it, and each call is
/// evaluated from text so a bad argument literal fails only its own case.
/// Output is flushed per line so a run killed mid-case keeps the verdicts
/// of the cases before it. Passthrough languages
/// get the user's code unchanged and none of these guarantees.

mod javascript;
mod python;

use crate::error::HarnessError;
use crate::languages::EngineSelector;
use crate::parser::{ParseError, ParsedArguments};
use arbiter_common::types::Language;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

pub const CASE_START_MARKER: &str = "---TEST-CASE-START---";
pub const RETURN_VALUE_MARKER: &str = "---RVAL---";

/// Parse outcome for one test case, in submission order
pub type PreparedCase = Result<ParsedArguments, ParseError>;

/// Program ready to hand to the execution gateway.
///
/// Built fresh for every submission and dropped once the gateway returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedProgram {
    pub language: String,
    pub version: String,
    pub content: String,
}

/// How a language's driver is generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverTemplate {
    /// try/catch per call inside one async IIFE, `JSON.stringify`
    EventLoop,
    /// try/except per call, `json.dumps`
    Interpreted,
    /// No driver: the code runs as submitted
    Passthrough,
}

impl DriverTemplate {
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Javascript => DriverTemplate::EventLoop,
            Language::Python => DriverTemplate::Interpreted,
            Language::Java | Language::Cpp => DriverTemplate::Passthrough,
        }
    }

    pub fn synthesizes(&self) -> bool {
        !matches!(self, DriverTemplate::Passthrough)
    }

    /// Render the full program text
    pub fn render(&self, source: &str, entry_point: &str, cases: &[PreparedCase]) -> String {
        match self {
            DriverTemplate::EventLoop => javascript::render(source, entry_point, cases),
            DriverTemplate::Interpreted => python::render(source, entry_point, cases),
            DriverTemplate::Passthrough => source.to_string(),
        }
    }
}

lazy_static! {
    static ref JS_FUNCTION: Regex = Regex::new(
        r"(?m)^\s*(?:export\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)\s*\("
    )
    .unwrap();
    static ref JS_BINDING: Regex = Regex::new(
        r"(?m)^\s*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*=>|[A-Za-z_$][\w$]*\s*=>)"
    )
    .unwrap();
    static ref PY_DEF: Regex = Regex::new(r"(?m)^def\s+([A-Za-z_]\w*)\s*\(").unwrap();
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_$][\w$]*$").unwrap();
}

/// Pick the function the driver calls.
///
/// An explicit name wins; otherwise the first function defined in the
/// source. Passthrough languages need none and get an empty name.
pub fn resolve_entry_point(
    language: Language,
    source: &str,
    explicit: Option<&str>,
) -> Result<String, HarnessError> {
    let template = DriverTemplate::for_language(language);
    if !template.synthesizes() {
        return Ok(String::new());
    }

    if let Some(name) = explicit.map(str::trim).filter(|n| !n.is_empty()) {
        let valid = IDENTIFIER.is_match(name)
            && !(language == Language::Python && name.contains('$'));
        if !valid {
            return Err(HarnessError::InvalidEntryPoint(name.to_string()));
        }
        return Ok(name.to_string());
    }

    let found = match language {
        Language::Javascript => {
            let by_function = JS_FUNCTION.captures(source);
            let by_binding = JS_BINDING.captures(source);
            // Earliest definition in the file wins
            match (by_function, by_binding) {
                (Some(f), Some(b)) => {
                    if f.get(0).map(|m| m.start()) <= b.get(0).map(|m| m.start()) {
                        f.get(1)
                    } else {
                        b.get(1)
                    }
                }
                (Some(f), None) => f.get(1),
                (None, Some(b)) => b.get(1),
                (None, None) => None,
            }
            .map(|m| m.as_str().to_string())
        }
        Language::Python => PY_DEF
            .captures(source)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        Language::Java | Language::Cpp => None,
    };

    found.ok_or(HarnessError::MissingEntryPoint(language))
}

/// Build the program for one submission
pub fn synthesize(
    language: Language,
    selector: &EngineSelector,
    source: &str,
    entry_point: &str,
    cases: &[PreparedCase],
) -> SynthesizedProgram {
    let template = DriverTemplate::for_language(language);
    if !template.synthesizes() {
        debug!(
            language = %language,
            test_count = cases.len(),
            "No driver synthesis for language; running source as submitted"
        );
    }

    SynthesizedProgram {
        language: selector.engine_language.clone(),
        version: selector.engine_version.clone(),
        content: template.render(source, entry_point, cases),
    }
}

/// Literal printed in place of a call whose input could not be parsed
pub(crate) fn malformed_case_message(err: &ParseError) -> String {
    let message = format!("invalid test case input: {}", err);
    serde_json::Value::String(message).to_string()
}

/// Call text for one case as a string literal, evaluated at run time.
///
/// A literal that is a syntax error in the target language then raises
/// inside that case's try block instead of failing the whole program.
pub(crate) fn call_expression(entry_point: &str, args: &ParsedArguments) -> String {
    quoted(&format!("{}({})", entry_point, args.call_list()))
}

/// Marker text as a string literal valid in both driver languages
pub(crate) fn quoted(marker: &str) -> String {
    serde_json::Value::String(marker.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_arguments;

    #[test]
    fn test_entry_point_javascript() {
        let src = "function solution(a, b) {\n  return a + b;\n}\n";
        assert_eq!(resolve_entry_point(Language::Javascript, src, None).unwrap(), "solution");

        let arrow = "const helper = 1;\nconst twoSum = (nums, target) => {\n  return [];\n};\n";
        assert_eq!(resolve_entry_point(Language::Javascript, arrow, None).unwrap(), "twoSum");

        let async_fn = "async function fetchAll(xs) { return xs; }";
        assert_eq!(resolve_entry_point(Language::Javascript, async_fn, None).unwrap(), "fetchAll");
    }

    #[test]
    fn test_entry_point_prefers_earliest_definition() {
        let src = "const first = (x) => x;\nfunction second(y) { return y; }\n";
        assert_eq!(resolve_entry_point(Language::Javascript, src, None).unwrap(), "first");
    }

    #[test]
    fn test_entry_point_python_ignores_nested_defs() {
        let src = "import math\n\ndef solve(n):\n    def inner(x):\n        return x\n    return inner(n)\n";
        assert_eq!(resolve_entry_point(Language::Python, src, None).unwrap(), "solve");
    }

    #[test]
    fn test_entry_point_explicit_and_missing() {
        assert_eq!(
            resolve_entry_point(Language::Python, "x = 1", Some("main")).unwrap(),
            "main"
        );
        assert_eq!(
            resolve_entry_point(Language::Python, "x = 1", None).unwrap_err(),
            HarnessError::MissingEntryPoint(Language::Python)
        );
        assert!(matches!(
            resolve_entry_point(Language::Javascript, "", Some("a b")),
            Err(HarnessError::InvalidEntryPoint(_))
        ));
        assert_eq!(resolve_entry_point(Language::Java, "class Main {}", None).unwrap(), "");
    }

    #[test]
    fn test_passthrough_keeps_source_verbatim() {
        let selector = EngineSelector {
            engine_language: "java".to_string(),
            engine_version: "15.0.2".to_string(),
        };
        let source = "public class Main { public static void main(String[] a) {} }";
        let cases = vec![parse_arguments("1, 2")];
        let program = synthesize(Language::Java, &selector, source, "", &cases);
        assert_eq!(program.content, source);
        assert_eq!(program.language, "java");
        assert_eq!(program.version, "15.0.2");
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let selector = EngineSelector {
            engine_language: "javascript".to_string(),
            engine_version: "18.15.0".to_string(),
        };
        let source = "function solution(a, b) { return a + b; }";
        let cases = vec![parse_arguments("2, 3"), parse_arguments("[1], x")];
        let first = synthesize(Language::Javascript, &selector, source, "solution", &cases);
        let second = synthesize(Language::Javascript, &selector, source, "solution", &cases);
        assert_eq!(first, second);
    }

    #[test]
    fn test_call_expression_is_a_string_literal() {
        let args = parse_arguments(r#"[1,2], "hi""#).unwrap();
        let literal = call_expression("solution", &args);
        let decoded: String = serde_json::from_str(&literal).unwrap();
        assert_eq!(decoded, r#"solution([1,2], "hi")"#);
    }

    #[test]
    fn test_malformed_message_is_a_string_literal() {
        let err = parse_arguments("[1, \"2").unwrap_err();
        let literal = malformed_case_message(&err);
        assert!(literal.starts_with('"') && literal.ends_with('"'));
        let decoded: String = serde_json::from_str(&literal).unwrap();
        assert!(decoded.starts_with("invalid test case input: "));
    }
}
