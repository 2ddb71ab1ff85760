//! Reassembly buffer: one ALPDU being reconstructed from fragments.

use crate::MAX_ALPDU_SIZE;

/// Preallocated byte arena accumulating ALPDU fragments.
///
/// `reset` arms it with the total length announced by the START header;
/// `append` refuses to write past that total.
#[derive(Debug)]
pub(crate) struct RasmBuffer {
    arena: Vec<u8>,
    expected: usize,
}

impl Default for RasmBuffer {
    fn default() -> Self {
        Self {
            arena: Vec::with_capacity(MAX_ALPDU_SIZE),
            expected: 0,
        }
    }
}

impl RasmBuffer {
    /// Arm the buffer for an ALPDU of `total_len` bytes.
    pub fn reset(&mut self, total_len: usize) {
        self.arena.clear();
        self.expected = total_len;
    }

    /// Append fragment bytes. Returns `false` when the write would
    /// exceed the expected total; the buffer is left unchanged.
    #[must_use]
    pub fn append(&mut self, bytes: &[u8]) -> bool {
        if self.arena.len() + bytes.len() > self.expected {
            return false;
        }
        self.arena.extend_from_slice(bytes);
        true
    }

    /// Bytes received so far.
    pub fn received(&self) -> usize {
        self.arena.len()
    }

    /// Total ALPDU length announced by START.
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Whether the announced total has been assembled.
    pub fn is_complete(&self) -> bool {
        self.arena.len() == self.expected
    }

    /// The assembled ALPDU bytes.
    pub fn as_alpdu(&self) -> &[u8] {
        &self.arena
    }
}
