//! Placeholder scanning for positional parameters.
//!
//! Statements bind `RowValues` positionally, so before anything is sent to the
//! driver the number of placeholders in the SQL text is compared against the
//! number of parameters supplied.

mod parsers;
mod scanner;

use parsers::{is_block_comment_end, is_block_comment_start, is_doubled, is_line_comment_start};
use scanner::{State, scan_digits};

use crate::error::SqlHelperError;

/// Largest `?NNN` index `SQLite` accepts.
pub const MAX_PARAMETER_INDEX: usize = 32766;

/// Count the positional parameters a statement expects.
///
/// Follows `SQLite` numbering: a bare `?` takes the largest index seen so far
/// plus one, `?NNN` takes index `NNN`, and the statement expects as many
/// parameters as the largest index. Placeholders inside string literals,
/// quoted identifiers and comments are skipped by a small state machine.
///
/// ```rust
/// use sql_helper::translation::count_placeholders;
///
/// assert_eq!(count_placeholders("UPDATE t SET a = ?, b = ? WHERE id = ?"), 3);
/// assert_eq!(count_placeholders("SELECT '?' FROM t WHERE a = ?2 OR b = ?2"), 2);
/// ```
#[must_use]
pub fn count_placeholders(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut state = State::Normal;
    let mut highest = 0usize;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'`' => state = State::Backticked,
                b'[' => state = State::Bracketed,
                _ if is_line_comment_start(bytes, idx) => {
                    state = State::LineComment;
                    idx += 1;
                }
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment;
                    idx += 1;
                }
                b'?' => {
                    if let Some((digits_end, digits)) = scan_digits(bytes, idx + 1) {
                        let explicit = digits.parse::<usize>().unwrap_or(usize::MAX);
                        highest = highest.max(explicit);
                        idx = digits_end - 1;
                    } else {
                        highest = highest.saturating_add(1);
                    }
                }
                _ => {}
            },
            State::SingleQuoted => state = close_quoted(bytes, &mut idx, b'\'', state),
            State::DoubleQuoted => state = close_quoted(bytes, &mut idx, b'"', state),
            State::Backticked => state = close_quoted(bytes, &mut idx, b'`', state),
            State::Bracketed => {
                if b == b']' {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if is_block_comment_end(bytes, idx) {
                    state = State::Normal;
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    highest
}

fn close_quoted(bytes: &[u8], idx: &mut usize, quote: u8, current: State) -> State {
    if bytes[*idx] != quote {
        return current;
    }
    if is_doubled(bytes, *idx, quote) {
        *idx += 1;
        current
    } else {
        State::Normal
    }
}

/// Reject a statement whose placeholder count differs from the parameter count.
///
/// # Errors
/// Returns `SqlHelperError::ParameterError` describing both counts.
pub fn check_param_count(sql: &str, param_count: usize) -> Result<(), SqlHelperError> {
    let expected = count_placeholders(sql);
    if expected > MAX_PARAMETER_INDEX {
        return Err(SqlHelperError::ParameterError(format!(
            "placeholder index exceeds the SQLite limit of {MAX_PARAMETER_INDEX}"
        )));
    }
    if expected == param_count {
        Ok(())
    } else {
        Err(SqlHelperError::ParameterError(format!(
            "statement expects {expected} parameter(s) but {param_count} were supplied"
        )))
    }
}
