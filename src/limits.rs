//! DoS prevention constants.
//!
//! These limits keep pathological inputs from causing
//! quadratic or worse time complexity.

/// Default maximum nesting depth for block containers (lists, blockquotes,
/// footnote definitions). Exceeding it aborts the parse.
pub const MAX_BLOCK_NESTING: usize = 100;

/// Default maximum input size in bytes. Exceeding it aborts the parse.
pub const MAX_INPUT_LEN: usize = 64 * 1024 * 1024;

/// Maximum bracket openers tracked per inline run; further `[` are literal.
pub const MAX_BRACKET_DEPTH: usize = 1024;

/// Maximum delimiter runs tracked per inline run; further runs are literal.
pub const MAX_DELIMITER_STACK: usize = 4096;

/// Maximum backtick run length for code spans.
/// Longer runs are treated as literal text.
pub const MAX_CODE_SPAN_BACKTICKS: usize = 32;

/// Maximum parentheses nesting in link destinations (CommonMark: 32)
pub const MAX_LINK_PAREN_DEPTH: usize = 32;

/// Maximum digits in ordered list marker (prevents big-integer parsing)
pub const MAX_LIST_MARKER_DIGITS: usize = 9;

/// Maximum length of a link label in characters.
pub const MAX_LINK_LABEL_LEN: usize = 999;

/// Maximum table columns
pub const MAX_TABLE_COLUMNS: usize = 128;

/// Caller-adjustable limits, carried in [`Options`](crate::Options).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Maximum total input length in bytes.
    pub max_input_len: usize,
    /// Maximum depth of nested block containers.
    pub max_nesting: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_input_len: MAX_INPUT_LEN,
            max_nesting: MAX_BLOCK_NESTING,
        }
    }
}
