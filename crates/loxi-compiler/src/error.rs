//! Compile-time error type. Hand-rolled (no `thiserror`), matching the
//! teacher's `CodeGenError` pattern: a plain `Display`/`Error` impl is all a
//! single-message diagnostic needs.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
    pub line: i32,
}

impl CompileError {
    pub fn new(message: impl Into<String>, line: i32) -> Self {
        CompileError {
            message: message.into(),
            line,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] {}", self.line, self.message)
    }
}

impl std::error::Error for CompileError {}
