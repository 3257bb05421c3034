// Linear read cursor with bounds checking and detour support

use crate::error::EvalError;

/// The evaluator's current read position within the byte source.
///
/// Within one linear scan the position only moves forward; pointer detours
/// and per-element array positioning use `snapshot`/`restore` so the caller
/// resumes exactly where it left off.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pos: u64,
    /// Addressable extent of the byte source.
    end: u64,
}

impl Cursor {
    pub fn new(end: u64) -> Self {
        Self { pos: 0, end }
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Move forward by `n` bytes. Fails without moving when the new position
    /// would exceed the addressable extent.
    pub fn advance(&mut self, n: u64) -> Result<(), EvalError> {
        let new_pos = self.pos.checked_add(n).ok_or(EvalError::OutOfBounds {
            offset: self.pos,
            size: n,
            available: self.end,
        })?;
        if new_pos > self.end {
            return Err(EvalError::OutOfBounds {
                offset: self.pos,
                size: n,
                available: self.end,
            });
        }
        self.pos = new_pos;
        Ok(())
    }

    /// Jump to an absolute position, e.g. a placement address or a pointer
    /// target. Fails when the position lies past the addressable extent.
    pub fn jump(&mut self, pos: u64) -> Result<(), EvalError> {
        if pos > self.end {
            return Err(EvalError::OutOfBounds {
                offset: pos,
                size: 0,
                available: self.end,
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Capture the current position for a later `restore`.
    pub fn snapshot(&self) -> u64 {
        self.pos
    }

    /// Return to a previously snapshotted position.
    pub fn restore(&mut self, pos: u64) {
        self.pos = pos;
    }
}
