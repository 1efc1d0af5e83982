//! Fatal errors. Anything recoverable is a [`crate::model::Warning`] instead.

use thiserror::Error;

/// Boxed error returned by annotation resolve steps.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// The scan cannot begin: a source path or pattern matched nothing.
    #[error("source not found: {0}")]
    SourceNotFound(String),

    #[error("invalid source pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Source text the lexer cannot make sense of.
    #[error("syntax error in {path}:{line}: {reason}")]
    Syntax {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("annotation `{annotation}` failed to resolve in {path}:{line}: {source}")]
    Resolve {
        annotation: String,
        path: String,
        line: usize,
        #[source]
        source: BoxError,
    },

    #[error("invalid option `{option}`: {reason}")]
    InvalidOption { option: String, reason: String },

    /// Error reported by whoever feeds the parse stream.
    #[error("input error: {0}")]
    Input(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_message_names_location() {
        let err = Error::Syntax {
            path: "fake".into(),
            line: 2,
            reason: "unexpected `$`".into(),
        };
        assert_eq!(err.to_string(), "syntax error in fake:2: unexpected `$`");
    }

    #[test]
    fn resolve_keeps_source() {
        let err = Error::Resolve {
            annotation: "async".into(),
            path: "a.scss".into(),
            line: 1,
            source: "boom".into(),
        };
        assert!(err.to_string().contains("boom"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
