// Interpreted driver: a try/except block per call at module level.
//
// Argument literals arrive in JSON/JavaScript spelling, so the prelude
// binds `true`, `false` and `null` to their Python counterparts. It also
// switches stdout to line buffering: a sandbox captures through a pipe, and
// a block-buffered pipe loses every finished case when the run is killed.

use super::{
    call_expression, malformed_case_message, quoted, PreparedCase, CASE_START_MARKER,
    RETURN_VALUE_MARKER,
};
use std::fmt::Write;

const PRELUDE: &str = "import sys as _arbiter_sys\n\
_arbiter_sys.stdout.reconfigure(line_buffering=True)\n\
true, false, null = True, False, None\n\
import json as _arbiter_json\n";

pub(super) fn render(source: &str, entry_point: &str, cases: &[PreparedCase]) -> String {
    let start = quoted(CASE_START_MARKER);
    let rval = quoted(RETURN_VALUE_MARKER);

    let mut program = String::with_capacity(source.len() + cases.len() * 280);
    program.push_str(source);
    program.push_str("\n\n\n");
    program.push_str(PRELUDE);

    for case in cases {
        program.push('\n');
        // writeln! into a String cannot fail
        let _ = match case {
            Ok(args) => writeln!(
                program,
                "print({start}, flush=True)\ntry:\n    _arbiter_result = eval({call})\n    _arbiter_out = _arbiter_json.dumps(_arbiter_result, separators=(\",\", \":\"))\n    print({rval}, flush=True)\n    print(_arbiter_out, flush=True)\nexcept Exception as _arbiter_error:\n    print(_arbiter_error, flush=True)",
                call = call_expression(entry_point, args),
            ),
            Err(err) => writeln!(
                program,
                "print({start}, flush=True)\nprint({message}, flush=True)",
                message = malformed_case_message(err),
            ),
        };
    }

    program
}
