// Binary template language evaluator library

pub mod ast;
pub mod console;
pub mod error;
pub mod eval;

// Re-export key types for public API
pub use ast::{
    ArrayDecl, ArraySize, AstNode, BitfieldDef, BuiltinType, Endianness, EnumDef, Expr, Literal,
    Operator, PointerDecl, StructDef, TypeExpr, UnionDef, VarDecl,
};
pub use console::{ConsoleLog, LogLevel};
pub use error::EvalError;
pub use eval::{ByteSource, Evaluator, LayoutNode, LayoutValue, SliceSource, Value};
