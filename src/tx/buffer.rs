//! Fragmentation buffer: one ALPDU being sliced into PPDUs.

use crate::MAX_ALPDU_SIZE;

/// Preallocated byte arena holding the ALPDU under fragmentation.
///
/// `load` lays out `[ptype_field?][sdu][crc?]`; `peek`/`commit` walk an
/// emit cursor over it. The cursor advances only on `commit`, so a failed
/// pack attempt leaves the buffer untouched.
#[derive(Debug)]
pub(crate) struct FragBuffer {
    arena: Vec<u8>,
    emit_cursor: usize,
}

impl Default for FragBuffer {
    fn default() -> Self {
        Self {
            arena: Vec::with_capacity(MAX_ALPDU_SIZE),
            emit_cursor: 0,
        }
    }
}

impl FragBuffer {
    /// Replace the buffer contents with a freshly built ALPDU.
    pub fn load(&mut self, ptype_field: &[u8], sdu: &[u8], crc: Option<u32>) {
        self.arena.clear();
        self.arena.extend_from_slice(ptype_field);
        self.arena.extend_from_slice(sdu);
        if let Some(crc) = crc {
            self.arena.extend_from_slice(&crc.to_be_bytes());
        }
        self.emit_cursor = 0;
    }

    /// Total ALPDU length.
    pub fn alpdu_len(&self) -> usize {
        self.arena.len()
    }

    /// Bytes not yet committed to a PPDU.
    pub fn remaining(&self) -> usize {
        self.arena.len() - self.emit_cursor
    }

    /// Next slice to emit, at most `max` bytes. Does not advance.
    pub fn peek(&self, max: usize) -> &[u8] {
        let end = (self.emit_cursor + max).min(self.arena.len());
        &self.arena[self.emit_cursor..end]
    }

    /// Advance the emit cursor after the caller committed `n` bytes to a
    /// PPDU.
    pub fn commit(&mut self, n: usize) {
        debug_assert!(n <= self.remaining());
        self.emit_cursor += n;
    }
}
