// ByteSource trait: abstraction over random-access binary data

use crate::error::EvalError;

/// Random-access provider of raw bytes during evaluation.
pub trait ByteSource {
    /// Read `size` bytes starting at `offset`.
    fn read(&self, offset: u64, size: u64) -> Result<Vec<u8>, EvalError>;

    /// Total addressable extent in bytes.
    fn size(&self) -> u64;
}

/// ByteSource backed by a byte slice (useful for testing).
pub struct SliceSource<'a> {
    data: &'a [u8],
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> ByteSource for SliceSource<'a> {
    fn read(&self, offset: u64, size: u64) -> Result<Vec<u8>, EvalError> {
        let start = offset as usize;
        let end = start.checked_add(size as usize).unwrap_or(usize::MAX);
        if end > self.data.len() {
            return Err(EvalError::OutOfBounds {
                offset,
                size,
                available: self.data.len() as u64,
            });
        }
        Ok(self.data[start..end].to_vec())
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
