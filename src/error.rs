// Error types for the template language evaluator

use thiserror::Error;

/// Semantic evaluation error. Any of these aborts the whole pass: the driver
/// catches it once, appends it to the console log as an Error entry, and the
/// pass yields no result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A type or function name was registered twice. The original entry is
    /// left unchanged.
    #[error("redefinition of '{0}'")]
    DuplicateDefinition(String),

    #[error("undefined type '{0}'")]
    UndefinedType(String),

    #[error("undefined function '{0}'")]
    UndefinedFunction(String),

    #[error("undefined identifier '{0}'")]
    UndefinedIdentifier(String),

    #[error("type '{type_name}' has no member '{member}'")]
    UndefinedMember { type_name: String, member: String },

    #[error("function '{name}' expects {expected} argument(s), got {got}")]
    ArityMismatch {
        name: String,
        expected: String,
        got: usize,
    },

    /// A node or value of one kind was supplied where another was required.
    #[error("{0}")]
    TypeMismatch(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("read of {size} byte(s) at offset {offset:#x} is out of bounds (data size {available:#x})")]
    OutOfBounds {
        offset: u64,
        size: u64,
        available: u64,
    },

    #[error("invalid size: {0}")]
    InvalidSize(String),

    #[error("recursion limit of {0} exceeded")]
    RecursionLimit(u32),

    #[error("assertion failed: {0}")]
    AssertionFailed(String),
}
