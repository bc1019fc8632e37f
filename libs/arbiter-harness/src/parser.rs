/// Argument Literal Parser
///
/// Splits one test case's raw `input` string into the ordered list of
/// argument literals that get interpolated into the entry-point call.
///
/// **Splitting Rules:**
/// - A comma separates arguments only at nesting depth zero and outside quotes
/// - `[`, `{`, `(` open a nesting level; the matching closer ends it
/// - `"` and `'` open a quoted run that only the same, un-escaped quote closes
/// - A backslash escapes the next character
///
/// **Literal Rules (applied per argument after trimming):**
/// - Quoted strings, bracketed/braced structures, numbers, `true`/`false`:
///   passed through verbatim
/// - Anything else is a bare word and becomes a double-quoted string
///
/// Unbalanced brackets or quotes and empty arguments are rejected rather
/// than guessed at.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unterminated {quote} string starting at offset {offset}")]
    UnterminatedString { quote: char, offset: usize },
    #[error("unexpected '{found}' at offset {offset} with nothing open")]
    UnexpectedClose { found: char, offset: usize },
    #[error("mismatched '{found}' at offset {offset}, expected '{expected}'")]
    MismatchedClose {
        expected: char,
        found: char,
        offset: usize,
    },
    #[error("unclosed '{open}' opened at offset {offset}")]
    UnclosedBracket { open: char, offset: usize },
    #[error("argument {index} is empty")]
    EmptyArgument { index: usize },
}

/// Ordered, individually well-formed argument literals for one call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArguments(Vec<String>);

impl ParsedArguments {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Argument list as it appears between the call parentheses
    pub fn call_list(&self) -> String {
        self.0.join(", ")
    }
}

impl fmt::Display for ParsedArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.call_list())
    }
}

fn closer_for(open: char) -> char {
    match open {
        '[' => ']',
        '{' => '}',
        _ => ')',
    }
}

/// Parse one `input` string into argument literals
pub fn parse_arguments(input: &str) -> Result<ParsedArguments, ParseError> {
    if input.trim().is_empty() {
        return Ok(ParsedArguments::default());
    }

    let raw = split_top_level(input)?;
    let mut literals = Vec::with_capacity(raw.len());
    for (index, arg) in raw.iter().enumerate() {
        let trimmed = arg.trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptyArgument { index });
        }
        literals.push(to_literal(trimmed));
    }

    Ok(ParsedArguments(literals))
}

/// Split on depth-zero, unquoted commas, validating bracket and quote balance
fn split_top_level(input: &str) -> Result<Vec<String>, ParseError> {
    let mut args = Vec::new();
    let mut current = String::new();
    // (opening char, byte offset)
    let mut open: Vec<(char, usize)> = Vec::new();
    let mut quote: Option<(char, usize)> = None;
    let mut escaped = false;

    for (offset, c) in input.char_indices() {
        if escaped {
            escaped = false;
            current.push(c);
            continue;
        }

        match c {
            '\\' => {
                escaped = true;
                current.push(c);
            }
            '"' | '\'' => {
                match quote.map(|(active, _)| active) {
                    Some(active) if active == c => quote = None,
                    Some(_) => {}
                    None => quote = Some((c, offset)),
                }
                current.push(c);
            }
            _ if quote.is_some() => current.push(c),
            '[' | '{' | '(' => {
                open.push((c, offset));
                current.push(c);
            }
            ']' | '}' | ')' => {
                match open.pop() {
                    None => return Err(ParseError::UnexpectedClose { found: c, offset }),
                    Some((opener, _)) if closer_for(opener) != c => {
                        return Err(ParseError::MismatchedClose {
                            expected: closer_for(opener),
                            found: c,
                            offset,
                        })
                    }
                    Some(_) => {}
                }
                current.push(c);
            }
            ',' if open.is_empty() => {
                args.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }

    if let Some((quote, offset)) = quote {
        return Err(ParseError::UnterminatedString { quote, offset });
    }
    if let Some((open, offset)) = open.pop() {
        return Err(ParseError::UnclosedBracket { open, offset });
    }

    args.push(current);
    Ok(args)
}

/// Pass recognised literals through; quote everything else as a bare string
fn to_literal(trimmed: &str) -> String {
    if is_numeric(trimmed) {
        strip_leading_zeros(trimmed)
    } else if is_literal(trimmed) {
        trimmed.to_string()
    } else {
        // JSON string syntax is a valid string literal in every driver language
        serde_json::Value::String(trimmed.to_string()).to_string()
    }
}

fn is_literal(value: &str) -> bool {
    if value.starts_with(['"', '\'', '[', '{', '(']) {
        return true;
    }
    if value == "true" || value == "false" {
        return true;
    }
    is_numeric(value)
}

/// Numbers in the syntax shared by JSON, JavaScript and Python.
///
/// `str::parse::<f64>` alone would also accept `inf` and `NaN`, which are
/// not literals in the target languages.
fn is_numeric(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        && value.chars().any(|c| c.is_ascii_digit())
        && value.parse::<f64>().is_ok()
}

/// `007` is a syntax error in Python and a legacy octal in JavaScript;
/// both drivers get the plain decimal spelling instead.
fn strip_leading_zeros(value: &str) -> String {
    let (sign, rest) = match value.as_bytes().first() {
        Some(b'+') | Some(b'-') => value.split_at(1),
        _ => ("", value),
    };
    let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let (int_part, tail) = rest.split_at(int_len);

    let digits = int_part.trim_start_matches('0');
    let digits = if digits.is_empty() && !int_part.is_empty() {
        "0"
    } else {
        digits
    };
    format!("{}{}{}", sign, digits, tail)
}
