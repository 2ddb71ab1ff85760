//! Error types for the RLE core.
//!
//! Every error is reported to the caller; the core never panics on wire
//! input and never logs in place of returning an error.

use thiserror::Error;

/// Errors rejected at transmitter/receiver construction.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The configured implicit protocol type is a reserved code.
    #[error("unsupported implicit protocol type {0:#06x}")]
    UnsupportedImplicitPtype(u16),
}

/// Errors raised by [`Transmitter::encap`](crate::Transmitter::encap).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncapError {
    /// Fragment IDs are 3-bit values; anything above 7 names no context.
    #[error("invalid fragment id {0}")]
    InvalidFragId(u8),

    /// The SDU exceeds the maximum the link can carry. The SDU is
    /// dropped and counted.
    #[error("SDU of {len} bytes exceeds the {max}-byte maximum")]
    SduTooLarge {
        /// Length of the rejected SDU.
        len: usize,
        /// Maximum SDU length on this link.
        max: usize,
    },

    /// The context already holds an SDU in flight; retry on another
    /// fragment ID or pack the pending one first.
    #[error("fragment id {0} already has an SDU in flight")]
    ContextBusy(u8),
}

/// Errors raised by [`Transmitter::pack`](crate::Transmitter::pack).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackError {
    /// Fragment IDs are 3-bit values; anything above 7 names no context.
    #[error("invalid fragment id {0}")]
    InvalidFragId(u8),

    /// Nothing is queued on this fragment ID.
    #[error("no SDU queued on fragment id {0}")]
    QueueEmpty(u8),

    /// The burst budget cannot fit the smallest legal PPDU for the
    /// current state. No state is changed; retry with a larger budget.
    #[error("burst budget of {budget} bytes below the {needed}-byte minimum")]
    BurstTooSmall {
        /// Budget the caller offered.
        budget: usize,
        /// Smallest budget that would make progress.
        needed: usize,
    },
}

/// Errors raised by [`Receiver::deencap`](crate::Receiver::deencap).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeencapError {
    /// The PPDU header violates the wire format.
    #[error("malformed PPDU header: {0}")]
    MalformedHeader(&'static str),

    /// A CONT or END PPDU arrived on a fragment ID with no reassembly in
    /// progress; the preceding fragments were lost.
    #[error("orphan fragment on fragment id {0}")]
    OrphanFragment(u8),

    /// A fragment would write past the total ALPDU length announced by
    /// the START header.
    #[error("fragment overflows the {expected}-byte ALPDU on fragment id {frag_id}")]
    Overflow {
        /// Fragment ID of the released context.
        frag_id: u8,
        /// Total ALPDU length announced by START.
        expected: usize,
    },

    /// The END PPDU arrived before the announced ALPDU total was
    /// assembled.
    #[error("incomplete ALPDU on fragment id {frag_id}: {received} of {expected} bytes")]
    Incomplete {
        /// Fragment ID of the released context.
        frag_id: u8,
        /// Total ALPDU length announced by START.
        expected: usize,
        /// Bytes actually assembled.
        received: usize,
    },

    /// CRC-32 verification of the reassembled SDU failed.
    #[error("CRC mismatch on fragment id {frag_id}: computed {computed:#010x}, stored {stored:#010x}")]
    CrcMismatch {
        /// Fragment ID of the released context.
        frag_id: u8,
        /// CRC computed over the reassembled SDU.
        computed: u32,
        /// CRC carried in the ALPDU trailer.
        stored: u32,
    },

    /// The sequence byte of a CONT or END PPDU broke the running count.
    #[error("sequence mismatch on fragment id {frag_id}: expected {expected}, got {got}")]
    SeqMismatch {
        /// Fragment ID of the released context.
        frag_id: u8,
        /// Sequence number the receiver expected.
        expected: u8,
        /// Sequence byte carried by the PPDU.
        got: u8,
    },

    /// A COMPLETE PPDU arrived while all eight contexts were busy.
    #[error("no free reassembly context for COMPLETE PPDU")]
    TableExhausted,
}
