use std::path::PathBuf;
use thiserror::Error;

/// Core error type for propmangle operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}:{line}:{column}: {message}")]
    Parse {
        path: PathBuf,
        message: String,
        line: u32,
        column: u32,
    },

    #[error("Failed to read name map at {path}: {source}")]
    NameMapRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse name map at {path}: {source}")]
    NameMapParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid alphabet: {0}")]
    Alphabet(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Attach a file path and a line/column position to a parse error.
    #[must_use]
    pub fn parse(path: impl Into<PathBuf>, source: &str, err: &propmangle_parser::ParseError) -> Self {
        let index = propmangle_parser::LineIndex::new(source);
        let (line, column) = index.line_col(err.span.start);
        Self::Parse {
            path: path.into(),
            message: err.message.clone(),
            line,
            column,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use propmangle_parser::{ParseError, Span};

    #[test]
    fn test_parse_error_position() {
        let source = "var a = 1;\nvar = 2;";
        let err = ParseError::new("Expected identifier", Span::new(15, 16));
        let err = Error::parse("input.js", source, &err);
        assert_eq!(err.to_string(), "input.js:2:5: Expected identifier");
    }

    #[test]
    fn test_other() {
        assert_eq!(Error::other("boom").to_string(), "boom");
    }
}
