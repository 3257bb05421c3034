// Built-in function table and implementations
use super::*;

use std::fmt;

/// Argument-count constraint for a built-in function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(u32),
    AtLeast(u32),
    AtMost(u32),
    Any,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == *n as usize,
            Arity::AtLeast(n) => count >= *n as usize,
            Arity::AtMost(n) => count <= *n as usize,
            Arity::Any => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::AtMost(n) => write!(f, "at most {}", n),
            Arity::Any => write!(f, "any number of"),
        }
    }
}

/// Which built-in a table entry dispatches to. Built-ins need access to the
/// cursor, byte source, and console, so dispatch goes through evaluator
/// methods rather than boxed closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    FindSequence,
    ReadUnsigned,
    ReadSigned,
    Assert,
    WarnAssert,
    Print,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Function {
    pub arity: Arity,
    pub kind: Builtin,
}

const BUILTINS: &[(&str, Arity, Builtin)] = &[
    ("findSequence", Arity::AtLeast(1), Builtin::FindSequence),
    ("readUnsigned", Arity::AtLeast(2), Builtin::ReadUnsigned),
    ("readSigned", Arity::AtLeast(2), Builtin::ReadSigned),
    ("assert", Arity::Exact(2), Builtin::Assert),
    ("warnAssert", Arity::Exact(2), Builtin::WarnAssert),
    ("print", Arity::Any, Builtin::Print),
];

/// Name → function descriptor table.
#[derive(Debug, Default)]
pub(crate) struct FunctionTable {
    funcs: FxHashMap<String, Function>,
}

impl FunctionTable {
    /// Table preloaded with the fixed built-in set.
    pub fn with_builtins() -> Self {
        let mut table = Self::default();
        for (name, arity, kind) in BUILTINS {
            table.funcs.insert(
                (*name).to_string(),
                Function {
                    arity: *arity,
                    kind: *kind,
                },
            );
        }
        table
    }

    /// Register a function descriptor. Fails with `DuplicateDefinition` if
    /// the name is taken; the original entry is left unchanged.
    pub fn register(&mut self, name: &str, arity: Arity, kind: Builtin) -> Result<(), EvalError> {
        if self.funcs.contains_key(name) {
            return Err(EvalError::DuplicateDefinition(name.to_string()));
        }
        self.funcs.insert(name.to_string(), Function { arity, kind });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Function> {
        self.funcs.get(name).copied()
    }
}

impl<'a> Evaluator<'a> {
    /// Dispatch a built-in by descriptor. Arguments are already reduced to
    /// scalars. Returns `None` for functions without a return value.
    pub(crate) fn call_builtin(
        &mut self,
        kind: Builtin,
        name: &str,
        args: &[Value],
    ) -> Result<Option<Value>, EvalError> {
        match kind {
            Builtin::FindSequence => self.builtin_find_sequence(args).map(Some),
            Builtin::ReadUnsigned => self.builtin_read(name, args, false).map(Some),
            Builtin::ReadSigned => self.builtin_read(name, args, true).map(Some),
            Builtin::Assert => self.builtin_assert(args).map(Some),
            Builtin::WarnAssert => self.builtin_warn_assert(args).map(Some),
            Builtin::Print => {
                self.builtin_print(args);
                Ok(None)
            }
        }
    }

    /// Scan the byte source forward from offset 0 for the first occurrence
    /// of the given byte sequence. Returns its absolute offset, or the
    /// sentinel `-1` when the sequence is absent — absence is not an error,
    /// so callers can branch on the result.
    fn builtin_find_sequence(&mut self, args: &[Value]) -> Result<Value, EvalError> {
        let mut needle = Vec::with_capacity(args.len());
        for arg in args {
            let byte = arg.to_unsigned()?;
            if byte > 0xFF {
                return Err(EvalError::TypeMismatch(format!(
                    "findSequence arguments must be byte values, got {}",
                    byte
                )));
            }
            needle.push(byte as u8);
        }
        let haystack = self.source.read(0, self.source.size())?;
        match haystack
            .windows(needle.len())
            .position(|window| window == needle.as_slice())
        {
            Some(pos) => Ok(Value::Unsigned(pos as u128)),
            None => Ok(Value::Signed(-1)),
        }
    }

    /// `readUnsigned(address, size, endian?)` / `readSigned(...)`.
    /// Sizes 1/2/4/8 only. The optional third argument selects the byte
    /// order (0 = little, 1 = big); absent means the current endianness.
    fn builtin_read(&mut self, name: &str, args: &[Value], signed: bool) -> Result<Value, EvalError> {
        if args.len() > 3 {
            return Err(EvalError::ArityMismatch {
                name: name.to_string(),
                expected: "at most 3".to_string(),
                got: args.len(),
            });
        }
        let address = args[0].to_unsigned()? as u64;
        let size = args[1].to_unsigned()? as u64;
        if !matches!(size, 1 | 2 | 4 | 8) {
            return Err(EvalError::InvalidSize(format!(
                "{} supports sizes 1, 2, 4 and 8, got {}",
                name, size
            )));
        }
        let endian = match args.get(2) {
            None => self.endian.current(),
            Some(arg) => match arg.to_unsigned()? {
                0 => Endianness::Little,
                1 => Endianness::Big,
                other => {
                    return Err(EvalError::TypeMismatch(format!(
                        "endianness selector must be 0 (little) or 1 (big), got {}",
                        other
                    )))
                }
            },
        };
        let bytes = self.source.read(address, size)?;
        let raw = assemble_unsigned(&bytes, endian);
        if signed {
            Ok(Value::Signed(sign_extend(raw, size * 8)))
        } else {
            Ok(Value::Unsigned(raw))
        }
    }

    /// `assert(condition, message)`: a zero condition aborts the pass.
    fn builtin_assert(&mut self, args: &[Value]) -> Result<Value, EvalError> {
        let cond = args[0].to_bool()?;
        if !cond {
            return Err(EvalError::AssertionFailed(args[1].to_string()));
        }
        Ok(Value::Bool(true))
    }

    /// `warnAssert(condition, message)`: a zero condition logs a warning and
    /// evaluation continues.
    fn builtin_warn_assert(&mut self, args: &[Value]) -> Result<Value, EvalError> {
        let cond = args[0].to_bool()?;
        if !cond {
            self.console
                .warning(format!("assertion failed: {}", args[1]));
        }
        Ok(Value::Bool(cond))
    }

    /// `print(values...)`: logs an Info entry. No return value.
    fn builtin_print(&mut self, args: &[Value]) {
        let parts: Vec<String> = args.iter().map(|v| v.to_string()).collect();
        self.console.info(parts.join(" "));
    }
}

/// Reassemble raw bytes into an unsigned value honoring byte order.
pub(crate) fn assemble_unsigned(bytes: &[u8], endian: Endianness) -> u128 {
    let mut value: u128 = 0;
    match endian {
        Endianness::Big => {
            for byte in bytes {
                value = (value << 8) | *byte as u128;
            }
        }
        Endianness::Little => {
            for byte in bytes.iter().rev() {
                value = (value << 8) | *byte as u128;
            }
        }
    }
    value
}

/// Sign-extend from the most significant bit of the read width.
pub(crate) fn sign_extend(raw: u128, bits: u64) -> i128 {
    if bits >= 128 {
        return raw as i128;
    }
    let sign_bit = 1u128 << (bits - 1);
    if raw & sign_bit != 0 {
        (raw | !((1u128 << bits) - 1)) as i128
    } else {
        raw as i128
    }
}
