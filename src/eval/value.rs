// Runtime value type for scalar expression evaluation

use std::fmt;

use crate::error::EvalError;

/// A scalar produced while evaluating an expression.
#[derive(Debug, Clone)]
pub enum Value {
    Unsigned(u128),
    Signed(i128),
    Float(f64),
    Bool(bool),
    Char(char),
    /// Message arguments for `assert`/`warnAssert`/`print`. Not a number:
    /// numeric conversions on strings fail with `TypeMismatch`.
    String(String),
}

impl Value {
    pub fn to_unsigned(&self) -> Result<u128, EvalError> {
        match self {
            Value::Unsigned(v) => Ok(*v),
            Value::Signed(v) => Ok(*v as u128),
            Value::Float(v) => Ok(*v as u128),
            Value::Bool(v) => Ok(u128::from(*v)),
            Value::Char(v) => Ok(*v as u128),
            Value::String(_) => Err(EvalError::TypeMismatch(
                "expected a numeric value, got a string".into(),
            )),
        }
    }

    pub fn to_signed(&self) -> Result<i128, EvalError> {
        match self {
            Value::Unsigned(v) => Ok(*v as i128),
            Value::Signed(v) => Ok(*v),
            Value::Float(v) => Ok(*v as i128),
            Value::Bool(v) => Ok(i128::from(*v)),
            Value::Char(v) => Ok(*v as i128),
            Value::String(_) => Err(EvalError::TypeMismatch(
                "expected a numeric value, got a string".into(),
            )),
        }
    }

    pub fn to_float(&self) -> Result<f64, EvalError> {
        match self {
            Value::Unsigned(v) => Ok(*v as f64),
            Value::Signed(v) => Ok(*v as f64),
            Value::Float(v) => Ok(*v),
            Value::Bool(v) => Ok(if *v { 1.0 } else { 0.0 }),
            _ => Err(EvalError::TypeMismatch(format!(
                "cannot convert {} to float",
                self.kind_name()
            ))),
        }
    }

    pub fn to_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Unsigned(v) => Ok(*v != 0),
            Value::Signed(v) => Ok(*v != 0),
            Value::Float(v) => Ok(*v != 0.0),
            Value::Bool(v) => Ok(*v),
            Value::Char(v) => Ok(*v != '\0'),
            Value::String(_) => Err(EvalError::TypeMismatch(
                "expected a condition value, got a string".into(),
            )),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Value::Unsigned(_) => "unsigned",
            Value::Signed(_) => "signed",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::String(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unsigned(v) => write!(f, "{}", v),
            Value::Signed(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unsigned(a), Value::Unsigned(b)) => a == b,
            (Value::Signed(a), Value::Signed(b)) => a == b,
            (Value::Unsigned(a), Value::Signed(b)) => (*a as i128) == *b,
            (Value::Signed(a), Value::Unsigned(b)) => *a == (*b as i128),
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}
