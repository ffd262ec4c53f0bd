//! Error types.
//!
//! Markdown has no syntax errors: every input has a defined parse. The only
//! failures are resource limits hit during parsing and caller-level problems
//! around the parse (unreadable files, bad bytes, unknown extension names).

use std::path::PathBuf;

/// Everything that can go wrong in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A resource limit was exceeded. The parse is abandoned.
    #[error(transparent)]
    ResourceLimit(#[from] ResourceLimitError),

    /// The input file could not be read.
    #[error("Unable to open file with name: {}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Byte input was not valid UTF-8 and `validate_utf8` was off.
    #[error("input is not valid UTF-8 (byte offset {offset})")]
    InvalidUtf8 { offset: usize },

    /// No extension with this name is registered.
    #[error("unknown syntax extension: {0}")]
    UnknownExtension(String),

    /// Extension registration was rejected.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Resource exhaustion during a parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceLimitError {
    #[error("block nesting depth {depth} exceeds limit of {limit}")]
    NestingTooDeep { depth: usize, limit: usize },
    #[error("input of {len} bytes exceeds limit of {limit} bytes")]
    InputTooLarge { len: usize, limit: usize },
}

/// Rejections from [`ExtensionRegistry::register`](crate::ext::ExtensionRegistry::register).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("an extension named `{0}` is already registered")]
    DuplicateName(String),
    #[error("extension `{extension}` claims node kind `{kind}`, already owned by `{owner}`")]
    KindClaimed {
        extension: String,
        kind: String,
        owner: String,
    },
    #[error("extension `{extension}` claims core node kind `{kind}`")]
    CoreKind { extension: String, kind: String },
}

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_error_message_names_file() {
        let err = Error::Input {
            path: PathBuf::from("missing.md"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.to_string(), "Unable to open file with name: missing.md");
    }

    #[test]
    fn resource_limit_is_transparent() {
        let err: Error = ResourceLimitError::NestingTooDeep { depth: 101, limit: 100 }.into();
        assert_eq!(err.to_string(), "block nesting depth 101 exceeds limit of 100");
    }
}
