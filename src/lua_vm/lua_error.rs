// Runtime errors with a source-level traceback

use std::fmt;
use thiserror::Error;

/// Classification of the errors the interpreter core raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LuaErrorKind {
    /// Indexing or assigning through a nil target.
    #[error("attempt to index a nil value")]
    IndexNil,
    /// Arithmetic operand not coercible to a number and no metamethod.
    #[error("attempt to perform arithmetic on a non-numeric value")]
    ArithOnNonNumeric,
    /// Concatenation operand not a string or number and no `__concat`.
    #[error("attempt to concatenate a non-string value")]
    ConcatOnNonStringNumber,
    /// Length of nil.
    #[error("attempt to get length of a nil value")]
    LengthOfNil,
    /// CALL/TAILCALL target is not callable.
    #[error("attempt to call a non-function value")]
    CallNonCallable,
    /// Dispatch failure; an implementation bug, not user-facing.
    #[error("unknown opcode")]
    UnknownOpcode,
    /// A host (native) call failed outside the language error model.
    #[error("error in host call")]
    HostError,
    /// Everything else: explicit `error()`, stack overflow, malformed chunks.
    #[error("runtime error")]
    Runtime,
}

/// One synthetic frame of the source-level stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFrame {
    pub source: String,
    pub line: u32,
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {} on line {}", self.source, self.line)
    }
}

/// A language error. Every activation the error propagates through appends
/// exactly one frame to `trace`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct LuaError {
    pub kind: LuaErrorKind,
    pub message: String,
    pub trace: Vec<TraceFrame>,
}

impl LuaError {
    pub fn new(kind: LuaErrorKind, message: impl Into<String>) -> Self {
        LuaError {
            kind,
            message: message.into(),
            trace: Vec::new(),
        }
    }

    /// An error carrying the kind's default message.
    pub fn from_kind(kind: LuaErrorKind) -> Self {
        let message = kind.to_string();
        LuaError {
            kind,
            message,
            trace: Vec::new(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        LuaError::new(LuaErrorKind::Runtime, message)
    }

    pub fn host(message: impl Into<String>) -> Self {
        LuaError::new(
            LuaErrorKind::HostError,
            format!("Error in host call: {}", message.into()),
        )
    }

    pub fn unknown_opcode(byte: u8) -> Self {
        LuaError::new(LuaErrorKind::UnknownOpcode, format!("unknown opcode {}", byte))
    }

    pub fn push_frame(&mut self, source: &str, line: u32) {
        self.trace.push(TraceFrame {
            source: source.to_string(),
            line,
        });
    }

    /// Message plus the accumulated source stack, innermost frame first.
    pub fn traceback(&self) -> String {
        let mut out = self.message.clone();
        for frame in &self.trace {
            out.push('\n');
            out.push_str(&frame.to_string());
        }
        out
    }
}
