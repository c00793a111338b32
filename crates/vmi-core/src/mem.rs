use thiserror::Error;

use crate::layout::WORD_BYTES;

/// A failed read. Expected and recoverable: the inspected process may have
/// unmapped, relocated, or never owned the address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemError {
    #[error("unreadable memory at {addr:#x} (+{len} bytes)")]
    Unmapped { addr: u64, len: usize },
}

/// Read capability over the inspected process. All pointer following in the
/// decoder goes through this trait; implementations must never block
/// unboundedly.
pub trait MemoryReader {
    fn read_word(&self, addr: u64) -> Result<u64, MemError>;
    fn read_bytes(&self, addr: u64, len: usize) -> Result<Vec<u8>, MemError>;
}

impl<R: MemoryReader + ?Sized> MemoryReader for &R {
    fn read_word(&self, addr: u64) -> Result<u64, MemError> {
        (**self).read_word(addr)
    }

    fn read_bytes(&self, addr: u64, len: usize) -> Result<Vec<u8>, MemError> {
        (**self).read_bytes(addr, len)
    }
}

/// A contiguous little-endian memory snapshot at a fixed base address.
///
/// Doubles as a builder: tests and hosts replaying captured memory append
/// boxes with `append_words`/`append_bytes` and read them back through
/// `MemoryReader`.
#[derive(Debug, Clone, Default)]
pub struct MemImage {
    base: u64,
    bytes: Vec<u8>,
}

impl MemImage {
    pub fn new(base: u64) -> Self {
        Self {
            base,
            bytes: Vec::new(),
        }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    /// One past the last mapped address.
    pub fn end(&self) -> u64 {
        self.base + self.bytes.len() as u64
    }

    /// Append words at the next aligned address and return that address.
    pub fn append_words(&mut self, words: &[u64]) -> u64 {
        self.align();
        let addr = self.end();
        for word in words {
            self.bytes.extend_from_slice(&word.to_le_bytes());
        }
        addr
    }

    /// Append raw bytes and return their address.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> u64 {
        let addr = self.end();
        self.bytes.extend_from_slice(bytes);
        addr
    }

    /// Overwrite one word at an already-mapped address.
    pub fn write_word(&mut self, addr: u64, word: u64) -> Result<(), MemError> {
        let offset = self
            .offset_of(addr, WORD_BYTES as usize)
            .ok_or(MemError::Unmapped {
                addr,
                len: WORD_BYTES as usize,
            })?;
        self.bytes[offset..offset + WORD_BYTES as usize].copy_from_slice(&word.to_le_bytes());
        Ok(())
    }

    fn align(&mut self) {
        while self.bytes.len() % WORD_BYTES as usize != 0 {
            self.bytes.push(0);
        }
    }

    fn offset_of(&self, addr: u64, len: usize) -> Option<usize> {
        if addr < self.base {
            return None;
        }
        let offset = (addr - self.base) as usize;
        if offset.checked_add(len)? > self.bytes.len() {
            return None;
        }
        Some(offset)
    }
}

impl MemoryReader for MemImage {
    fn read_word(&self, addr: u64) -> Result<u64, MemError> {
        let offset = self.offset_of(addr, WORD_BYTES as usize).ok_or(MemError::Unmapped {
            addr,
            len: WORD_BYTES as usize,
        })?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.bytes[offset..offset + 8]);
        Ok(u64::from_le_bytes(buf))
    }

    fn read_bytes(&self, addr: u64, len: usize) -> Result<Vec<u8>, MemError> {
        let offset = self
            .offset_of(addr, len)
            .ok_or(MemError::Unmapped { addr, len })?;
        Ok(self.bytes[offset..offset + len].to_vec())
    }
}
