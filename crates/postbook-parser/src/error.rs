use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Reason a post could not be turned into a [`crate::Document`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("file is not valid UTF-8 (invalid byte at offset {0})")]
    InvalidEncoding(usize),

    #[error("missing front matter: the first line must be '---'")]
    MissingOpeningDelimiter,

    #[error("front matter is not closed by a '---' line")]
    MissingClosingDelimiter,

    #[error("invalid front matter YAML: {0}")]
    InvalidYaml(String),

    #[error("front matter must be a mapping of keys to values")]
    NotAMapping,

    #[error("missing required front matter key '{0}'")]
    MissingKey(String),

    #[error("front matter key '{0}' must be a non-empty scalar")]
    InvalidValue(String),

    #[error("document body is empty")]
    EmptyBody,

    #[error("filename date prefix '{0}' is not a valid calendar date")]
    InvalidDate(String),

    #[error("filename does not start with a YYYY-MM-DD- date prefix")]
    MissingDate,
}

/// A malformed post, tagged with the file it came from.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{}: {kind}", path.display())]
pub struct ParseError {
    pub path: PathBuf,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(path: impl Into<PathBuf>, kind: ParseErrorKind) -> Self {
        ParseError {
            path: path.into(),
            kind,
        }
    }
}

/// Failure while reading and parsing a post from disk.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Parse(#[from] ParseError),
}
