// Endianness stack following syntax-tree nesting

use smallvec::{smallvec, SmallVec};

use crate::ast::Endianness;

/// Stack of active byte orders. The bottom entry is the pass default and is
/// never popped, so `current` always has something to read.
#[derive(Debug, Clone)]
pub struct EndianStack {
    stack: SmallVec<[Endianness; 4]>,
}

impl EndianStack {
    pub fn new(default: Endianness) -> Self {
        Self {
            stack: smallvec![default],
        }
    }

    pub fn current(&self) -> Endianness {
        *self.stack.last().unwrap_or(&Endianness::Little)
    }

    /// Enter a scope with an explicit byte-order directive.
    pub fn push(&mut self, endian: Endianness) {
        self.stack.push(endian);
    }

    /// Leave the scope. The pass-default bottom entry stays in place.
    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }
}
