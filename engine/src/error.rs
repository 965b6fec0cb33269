//! Syntax and runtime error types.
//!
//! Two distinct kinds mirror the two failure points in the pipeline: the
//! tokenizer/compiler raise [`SyntaxError`], value operations and function
//! dispatch raise [`RuntimeError`]. Both are collected under [`Error`], the
//! error type returned by [`crate::evaluate`].

use std::fmt;

/// The eight runtime failure codes.
///
/// Messages are fixed English and stable; callers and tests may match on
/// them directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    DivByZero,
    InvalidArgs,
    FuncUndef,
    TypeMismatch,
    TypeIllegal,
    InvIdentif,
    ValOutOfRange,
    VarUndef,
}

impl ErrorCode {
    /// The fixed English message for this code, independent of any
    /// statement prefix.
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::DivByZero => "division by zero",
            ErrorCode::InvalidArgs => "invalid arguments",
            ErrorCode::FuncUndef => "function not defined",
            ErrorCode::TypeMismatch => "type mismatch",
            ErrorCode::TypeIllegal => "type illegal",
            ErrorCode::InvIdentif => "invalid identifier",
            ErrorCode::ValOutOfRange => "value out of range",
            ErrorCode::VarUndef => "variable not defined",
        }
    }

    /// The numeric value used as a process exit code by the CLI.
    pub fn code(self) -> i32 {
        match self {
            ErrorCode::DivByZero => 1,
            ErrorCode::InvalidArgs => 2,
            ErrorCode::FuncUndef => 3,
            ErrorCode::TypeMismatch => 4,
            ErrorCode::TypeIllegal => 5,
            ErrorCode::InvIdentif => 6,
            ErrorCode::ValOutOfRange => 7,
            ErrorCode::VarUndef => 8,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// A runtime failure raised by value operations or function dispatch.
///
/// `stmt` is the identifier or function name the failure is attributed to,
/// when one is available.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.render())]
pub struct RuntimeError {
    pub code: ErrorCode,
    pub stmt: Option<String>,
}

impl RuntimeError {
    pub fn new(code: ErrorCode) -> Self {
        RuntimeError { code, stmt: None }
    }

    pub fn with_stmt(code: ErrorCode, stmt: impl Into<String>) -> Self {
        RuntimeError {
            code,
            stmt: Some(stmt.into()),
        }
    }

    fn render(&self) -> String {
        match &self.stmt {
            Some(stmt) => format!("{}: {}", stmt, self.code.message()),
            None => self.code.message().to_string(),
        }
    }
}

/// A syntax failure raised by the tokenizer or compiler.
///
/// Rendered as `<message> at (<pos+1>):\n<source>\n<spaces>^^^^...` with a
/// caret run from the offending byte position to the end of the source
/// string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.render())]
pub struct SyntaxError {
    pub message: String,
    pub position: usize,
    pub source: String,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, position: usize, source: impl Into<String>) -> Self {
        SyntaxError {
            message: message.into(),
            position,
            source: source.into(),
        }
    }

    fn render(&self) -> String {
        let carets: String = std::iter::repeat('^')
            .take(self.source.len().saturating_sub(self.position).max(1))
            .collect();
        let padding: String = std::iter::repeat(' ').take(self.position).collect();
        format!(
            "{} at ({}):\n{}\n{}{}",
            self.message,
            self.position + 1,
            self.source,
            padding,
            carets
        )
    }
}

/// The top-level error type returned by [`crate::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Error {
    /// The process exit code the CLI should use for this error: 1 for any
    /// syntax error, the runtime error's own numeric code otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Syntax(_) => 1,
            Error::Runtime(e) => e.code.code(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_caret_from_position_to_end() {
        let err = SyntaxError::new("unexpected token", 3, "1+@+2");
        let rendered = err.to_string();
        assert_eq!(rendered, "unexpected token at (4):\n1+@+2\n   ^^");
    }

    #[test]
    fn runtime_error_includes_stmt_prefix_when_present() {
        let err = RuntimeError::with_stmt(ErrorCode::FuncUndef, "foo");
        assert_eq!(err.to_string(), "foo: function not defined");
    }

    #[test]
    fn runtime_error_without_stmt_is_bare_message() {
        let err = RuntimeError::new(ErrorCode::DivByZero);
        assert_eq!(err.to_string(), "division by zero");
    }

    #[test]
    fn exit_code_mapping() {
        let syntax: Error = SyntaxError::new("x", 0, "x").into();
        assert_eq!(syntax.exit_code(), 1);
        let runtime: Error = RuntimeError::new(ErrorCode::VarUndef).into();
        assert_eq!(runtime.exit_code(), 8);
    }
}
