//! Error type for the fatal band of the pipeline.
//!
//! Lexical, syntactic, and emitter failures terminate compilation at the
//! point of detection. Static-semantic findings are *not* errors in this
//! sense; they are collected as [`crate::diag::Diagnostic`] values instead.

use std::fmt;

/// A fatal compilation error, with the 1-based `(line, col)` of the
/// offending character when one is known.
#[derive(Debug, Clone)]
pub struct Error {
    pub msg: String,
    pub span: Option<(usize, usize)>,
}

impl Error {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            span: None,
        }
    }

    pub fn at(line: usize, col: usize, msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            span: Some((line, col)),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some((line, col)) => write!(f, "{} at {}:{}", self.msg, line, col),
            None => f.write_str(&self.msg),
        }
    }
}

impl std::error::Error for Error {}

/// Specialized `Result` used throughout the compiler.
pub type Result<T> = std::result::Result<T, Error>;

/// Shorthand for `Err(Error::at(line, col, msg))`.
pub fn error_at<T>(line: usize, col: usize, msg: impl Into<String>) -> Result<T> {
    Err(Error::at(line, col, msg))
}
