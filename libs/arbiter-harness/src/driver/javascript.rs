// Event-loop driver: every call is awaited inside a single async IIFE so
// both plain and async entry points are graded in order.
//
// The IIFE opens with `;` so a source ending in an expression without a
// semicolon cannot absorb it as call arguments.

use super::{
    call_expression, malformed_case_message, quoted, PreparedCase, CASE_START_MARKER,
    RETURN_VALUE_MARKER,
};
use std::fmt::Write;

pub(super) fn render(source: &str, entry_point: &str, cases: &[PreparedCase]) -> String {
    let start = quoted(CASE_START_MARKER);
    let rval = quoted(RETURN_VALUE_MARKER);

    let mut program = String::with_capacity(source.len() + cases.len() * 320);
    program.push_str(source);
    program.push_str("\n\n;(async () => {\n");

    for case in cases {
        // writeln! into a String cannot fail
        let _ = match case {
            Ok(args) => writeln!(
                program,
                "  {{\n    console.log({start});\n    try {{\n      const __arbiterResult = await eval({call});\n      const __arbiterJson = JSON.stringify(__arbiterResult);\n      console.log({rval});\n      console.log(__arbiterJson);\n    }} catch (__arbiterError) {{\n      console.log(__arbiterError && __arbiterError.message !== undefined ? __arbiterError.message : String(__arbiterError));\n    }}\n  }}",
                call = call_expression(entry_point, args),
            ),
            Err(err) => writeln!(
                program,
                "  console.log({start});\n  console.log({message});",
                message = malformed_case_message(err),
            ),
        };
    }

    program.push_str("})();\n");
    program
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_arguments;

    #[test]
    fn test_render_wraps_each_call() {
        let source = "function solution(a, b) { return a + b; }";
        let cases = vec![parse_arguments("2,3"), parse_arguments("[1,2], hi")];
        let program = render(source, "solution", &cases);

        assert!(program.starts_with(source));
        assert_eq!(program.matches("console.log(\"---TEST-CASE-START---\")").count(), 2);
        assert_eq!(program.matches("try {").count(), 2);
        assert!(program.contains(r#"await eval("solution(2, 3)")"#));
        assert!(program.contains(r#"await eval("solution([1,2], \"hi\")")"#));
        assert!(program.contains("JSON.stringify(__arbiterResult)"));
        assert!(program.trim_end().ends_with("})();"));
    }

    #[test]
    fn test_render_malformed_case_keeps_marker() {
        let cases = vec![parse_arguments("[1, 2"), parse_arguments("4")];
        let program = render("function f(x) { return x; }", "f", &cases);

        assert_eq!(program.matches("---TEST-CASE-START---").count(), 2);
        assert!(program.contains("invalid test case input"));
        // Only the well-formed case calls the function
        assert_eq!(program.matches("await eval(\"f(").count(), 1);
    }

    #[test]
    fn test_driver_starts_a_new_statement() {
        // No trailing semicolon: `b\n\n(async ...)` would parse as a call to `b`
        let source = "const solution = (a, b) => a + b";
        let program = render(source, "solution", &[parse_arguments("2,3")]);
        assert!(program.contains("a + b\n\n;(async () => {\n"));
    }

    #[test]
    fn test_render_no_cases() {
        let program = render("function f() {}", "f", &[]);
        assert!(!program.contains("---TEST-CASE-START---"));
    }
}
